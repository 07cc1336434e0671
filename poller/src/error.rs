use std::fmt::Debug;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing `{0}` environment variable")]
    MissingEnvVar(String),

    #[error("Invalid value for `{0}`: `{1}`")]
    InvalidConfig(String, String),

    #[error("Invalid factory address `{0}`")]
    InvalidFactoryAddress(String),

    #[error("Invalid event signature `{0}`")]
    InvalidEventSignature(String),

    #[error("Max retries ({0}) exceeded fetching logs")]
    MaxRetriesExceeded(u32),

    #[error("Log decode error: {0}")]
    Decode(String),
}
