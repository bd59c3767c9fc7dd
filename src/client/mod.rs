//! Typed client for the chat service.
//!
//! [`store::Store`] holds the session state and only changes through
//! [`store::reduce`]. [`controller::ChatSessionController`] performs the I/O
//! through a [`api::ChatApi`] and dispatches actions around it.

pub mod api;
pub mod controller;
pub mod error;
pub mod forms;
pub mod store;
