use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsoleError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("request failed (status {status}): {message}")]
    Status { status: u16, message: String },

    /// Login endpoint answered with an error body; `message` is shown verbatim.
    #[error("{message}")]
    LoginRejected { status: u16, message: String },

    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Failed to read config file at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid value for '{key}' at {path}:{line}: {value}")]
    ConfigValue {
        path: PathBuf,
        line: usize,
        key: String,
        value: String,
    },

    #[error("Could not determine config directory")]
    NoConfigDir,
}

pub type Result<T> = std::result::Result<T, ConsoleError>;
