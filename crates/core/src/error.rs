/// Error taxonomy for the aggregation core.
///
/// Transport-layer variants (`Unreachable` / `Timeout` / `CircuitOpen` /
/// `Protocol`) come out of the RCON client and the ping probe. File-level
/// problems for "expected to sometimes be absent" artifacts never reach this
/// enum -- the readers in [`crate::save`] degrade to defaults instead.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The RCON port did not accept a TCP connection within the probe window.
    #[error("RCON unreachable")]
    Unreachable,

    /// A connect or command phase exceeded its configured deadline.
    #[error("{0} timed out")]
    Timeout(&'static str),

    /// The circuit breaker is open; no connection attempt was made.
    #[error("RCON circuit open")]
    CircuitOpen,

    /// The server rejected the RCON password.
    #[error("RCON authentication rejected")]
    AuthFailed,

    /// Any other transport-level failure (socket error, malformed frame).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// An aggregate view cannot be computed at all (e.g. the stats
    /// directory exists but cannot be enumerated). The one error class the
    /// HTTP boundary maps to a request-level failure.
    #[error("data unavailable: {0}")]
    DataUnavailable(String),

    /// The server-distribution archive could not be opened or scanned.
    /// Callers fall back to the persisted catalog snapshot explicitly.
    #[error("archive error: {0}")]
    Archive(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::Protocol(err.to_string())
    }
}
