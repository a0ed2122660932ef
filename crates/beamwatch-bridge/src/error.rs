/// Failures talking to the companion process. All of them are recoverable:
/// the caller drops the current command sequence and tries again next tick.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("remote call timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("remote fault {code}: {message}")]
    Fault { code: i64, message: String },

    #[error("malformed response: {0}")]
    Protocol(String),

    #[error("companion process: {0}")]
    Process(String),

    #[error("no companion attached")]
    Detached,
}

impl BridgeError {
    pub(crate) fn from_ureq(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Timeout(_) => BridgeError::Timeout,
            ureq::Error::Io(e) if e.kind() == std::io::ErrorKind::TimedOut => BridgeError::Timeout,
            ureq::Error::StatusCode(code) => BridgeError::Transport(format!("HTTP {code}")),
            other => BridgeError::Transport(other.to_string()),
        }
    }
}
