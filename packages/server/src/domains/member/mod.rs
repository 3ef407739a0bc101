//! Member domain - registered users and the profile matchmaking reads

pub mod data;
pub mod models;
pub mod store;

pub use data::MemberData;
pub use models::member::Member;
pub use store::PostgresMemberStore;
