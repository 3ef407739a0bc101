use thiserror::Error;

/// Authentication and registration errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Email existed")]
    EmailExists,

    #[error("Username existed")]
    UsernameExists,

    #[error("Email doesn't exist")]
    UnknownEmail,

    #[error("Wrong password")]
    WrongPassword,

    #[error("Not signed in")]
    AuthenticationRequired,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}
