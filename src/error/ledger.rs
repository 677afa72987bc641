use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{message}")]
    AlreadyExists { message: String },
    #[error("Ledger rejected request: {message}")]
    Rejected { message: String },
    #[error("Invalid ledger host '{host}': {source}")]
    InvalidHost {
        host: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Unsupported ledger scheme '{scheme}'. Use http, https, or memory.")]
    UnsupportedScheme { scheme: String },
    #[error("Ledger transport error: {source}")]
    Transport {
        #[from]
        source: reqwest::Error,
    },
    #[error("Malformed ledger response: {message}")]
    MalformedResponse { message: String },
}

impl LedgerError {
    /// Classifies a backend error message, mapping "already exists" conditions
    /// to [`LedgerError::AlreadyExists`].
    #[must_use]
    pub fn from_message(message: &str) -> Self {
        if message.to_ascii_lowercase().contains("already exists") {
            LedgerError::AlreadyExists {
                message: message.to_owned(),
            }
        } else {
            LedgerError::Rejected {
                message: message.to_owned(),
            }
        }
    }

    #[must_use]
    pub const fn is_already_exists(&self) -> bool {
        matches!(self, LedgerError::AlreadyExists { .. })
    }
}
