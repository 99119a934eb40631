use thiserror::Error;

/// Rejections raised by the player state machine and the registry.
///
/// Every check that can fail runs before any field is touched, so an `Err`
/// never leaves a partially advanced player behind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("player already registered: {0}")]
    DuplicatePlayer(String),
    #[error("player not found: {0}")]
    PlayerNotFound(String),
    #[error("wrong stage: {stage} requires progress {expected} (player is at {actual})")]
    WrongStage {
        stage: &'static str,
        expected: u8,
        actual: u8,
    },
    #[error("player already completed the hunt: {0}")]
    AlreadyCompleted(String),
}

/// Result type for player operations.
pub type Result<T> = std::result::Result<T, Error>;
