//! Prompts domain - scripted questions that keep a matched conversation going

pub mod actions;
pub mod questions;

pub use questions::{Topic, UnknownTopic};
