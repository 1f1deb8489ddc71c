use thiserror::Error;

/// All errors produced by oratio-core.
#[derive(Debug, Error)]
pub enum OratioError {
    #[error("cannot bind TCP port {port} (is it taken?): {source}")]
    Bind {
        port: u16,
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("recognizer error: {0}")]
    Recognizer(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, OratioError>;
