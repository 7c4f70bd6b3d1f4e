use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse config RON: {0}")]
    ParseError(String),

    #[error("Invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Errors at the worker boundary. Only transport failures surface here;
/// the computations behind the boundary are infallible.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Failed to spawn worker thread: {0}")]
    SpawnFailed(String),

    #[error("Worker request channel disconnected")]
    Disconnected,
}
