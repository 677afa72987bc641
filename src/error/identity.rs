use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Failed to read identity file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Identity address in '{path}' is empty.")]
    EmptyAddress { path: PathBuf },
    #[error("Invalid private key in '{path}': {source}")]
    InvalidKey {
        path: PathBuf,
        #[source]
        source: base64::DecodeError,
    },
    #[error("Private key in '{path}' has {len} bytes, expected {expected}.")]
    KeyLength {
        path: PathBuf,
        len: usize,
        expected: usize,
    },
}
