pub mod account;
pub mod assistant;
pub mod chat;
pub mod credentials;
pub mod error;
pub mod services;
pub mod traits;
