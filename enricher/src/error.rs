use std::fmt::Debug;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid value for `{0}`: `{1}`")]
    InvalidConfig(String, String),

    #[error("Aggregator HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
