//! Auth domain actions - business logic functions
//!
//! Actions are async functions called directly from HTTP handlers.

mod login;
mod logout;
mod register;

pub use login::{login, LoginOutcome};
pub use logout::logout;
pub use register::{register, RegisterInput};
