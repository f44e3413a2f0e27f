//! Error types for saat

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Index corruption: {0}")]
    Corruption(String),

    #[error("Sizing overflow: {0}")]
    Sizing(String),

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("Unknown codec: {0}")]
    UnknownCodec(String),
}

pub type Result<T> = std::result::Result<T, Error>;
