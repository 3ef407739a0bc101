//! Chatrooms domain - the message log behind a matched conversation.

pub mod actions;
pub mod data;
pub mod error;
pub mod models;
pub mod store;

pub use error::ChatError;
pub use models::*;
pub use store::PostgresMessageLog;
