//! Customer support chat server - Library exports for testing
//!
//! (c) Softlandia 2025

pub mod api;
pub mod client;
pub mod config;
pub mod core;
pub mod infrastructure;
