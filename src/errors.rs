use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures along the credential-resolution and scan path.
///
/// Every variant is fatal for the command-line tool; callers are expected to
/// report the error once and stop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("metadata service unavailable at {url}: {reason}")]
    Unavailable { url: String, reason: String },
    #[error("failed to decode {what}: {reason}")]
    Decode { what: &'static str, reason: String },
    #[error("cannot sign request: {0}")]
    Signing(String),
    #[error("scan of table {table} failed: {reason}")]
    Query { table: String, reason: String },
    #[error("failed to build http client: {0}")]
    Client(String),
}

impl Error {
    pub(crate) fn unavailable(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Unavailable {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn decode(what: &'static str, reason: impl ToString) -> Self {
        Self::Decode {
            what,
            reason: reason.to_string(),
        }
    }

    pub(crate) fn query(table: impl Into<String>, reason: impl ToString) -> Self {
        Self::Query {
            table: table.into(),
            reason: reason.to_string(),
        }
    }
}
