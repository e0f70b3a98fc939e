use std::time::Duration;

/// Outcome of a single failed control call.
///
/// Transport errors are folded into these variants at the control client
/// boundary; nothing above it ever sees a `reqwest::Error`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControlFailure {
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("HTTP error: status {0}")]
    HttpError(u16),
    #[error("Empty response body")]
    EmptyBody,
    #[error("Call cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TetherError {
    #[error("No network interface reaches {0}")]
    InterfaceNotFound(String),
    #[error("Reconnect gave up after {attempts} attempts")]
    RetryExhausted { attempts: u32 },
    #[error("Deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
    #[error("Camera control error: {0}")]
    Control(#[from] ControlFailure),
    #[error("Invalid serial number: {0}")]
    InvalidSerial(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Superseded by a newer attach event")]
    Superseded,
    #[error("Platform error: {0}")]
    Platform(String),
}

pub type Result<T> = std::result::Result<T, TetherError>;
