use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Not signed in")]
    NotSignedIn,

    #[error("Not a participant of this conversation")]
    NotParticipant,

    #[error("Message must not be empty")]
    EmptyMessage,

    #[error("Chat storage error: {0}")]
    Storage(#[from] anyhow::Error),
}
