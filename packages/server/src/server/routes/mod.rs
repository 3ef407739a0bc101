// HTTP routes
pub mod auth;
pub mod bot;
pub mod chat;
pub mod health;
pub mod matchmaking;
pub mod profile;
pub mod stream;

pub use auth::*;
pub use bot::*;
pub use chat::*;
pub use health::*;
pub use matchmaking::*;
pub use profile::*;
pub use stream::*;
