use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GateError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Config error in {path}: {message}")]
    ConfigError { path: String, message: String },
    #[error("Unknown session event kind: {0}")]
    InvalidEventKind(String),
    #[error("Session store unavailable: {0}")]
    StoreUnavailable(String),
}
