pub mod message;

pub use message::MessageData;
