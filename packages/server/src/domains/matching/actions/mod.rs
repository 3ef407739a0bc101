//! Matching actions - the session-facing side of the coordinator

mod cancel_match;
mod request_match;

pub use cancel_match::cancel_match;
pub use request_match::request_match;
