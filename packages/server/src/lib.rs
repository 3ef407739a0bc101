// Disagree to Agree - API Core
//
// Backend for pairing people with opposing political views into one-on-one
// conversations. Architecture follows domain-driven design: domains hold the
// business rules, the kernel holds infrastructure traits and wiring.
//
// The matchmaking protocol lives in domains/matching/coordinator.rs.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
