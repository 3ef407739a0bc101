// Business domains
pub mod auth;
pub mod chatrooms;
pub mod matching;
pub mod member;
pub mod prompts;
