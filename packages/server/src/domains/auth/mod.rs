//! Auth domain - accounts, sessions and tokens
//!
//! Responsibilities:
//! - Registration with Argon2 password hashing
//! - Login / logout
//! - Server-side session state (current chat, prompt counter)
//! - JWT issuance naming the session

pub mod actions;
pub mod error;
pub mod jwt;
pub mod password;
pub mod session;

pub use error::AuthError;
pub use jwt::{Claims, JwtService};
pub use session::{Session, SessionData, SessionStore};
