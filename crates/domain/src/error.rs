/// Shared error type used across all Courier crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("transport {tier}: {message}")]
    Transport { tier: String, message: String },

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("upload: {0}")]
    Upload(String),

    #[error("a message is already being delivered")]
    Busy,

    #[error("config: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
