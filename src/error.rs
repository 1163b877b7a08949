use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashcamError {
    #[error("Dashcam not connected")]
    NotConnected,

    #[error("Already connected")]
    AlreadyConnected,

    #[error("Failed to connect: {0}")]
    ConnectionFailed(#[source] Box<DashcamError>),

    #[error("Lost connection")]
    ConnectionLost,

    #[error("Bad status returned for command {opcode}: {status}")]
    CommandRejected { opcode: i32, status: i32 },

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DashcamError {
    /// Whether reconnecting and repeating the call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DashcamError::ConnectionLost
                | DashcamError::ConnectionFailed(_)
                | DashcamError::Transport(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DashcamError>;
