//! ClickHouse client errors.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid ClickHouse configuration: {0}")]
    InvalidConfig(String),
}
