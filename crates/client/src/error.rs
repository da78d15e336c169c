use std::sync::Arc;

/// Errors from the remote store adapter.
///
/// Rejected mutations are not errors; they come back as
/// [`MutationOutcome::Rejected`](crate::remote::MutationOutcome::Rejected).
/// Cloneable so every reader waiting on one fetch gets its failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Transport(#[source] Arc<reqwest::Error>),

    /// The server answered, but not with the shape the protocol promises.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The queried entity does not exist, or is outside the named scope.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The server returned a non-2xx status for a query.
    #[error("Taskhub API error ({status}, {code}): {message}")]
    Remote {
        status: u16,
        code: String,
        message: String,
    },
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(Arc::new(err))
    }
}

impl ClientError {
    /// Transport-level failures and server errors may succeed on retry.
    /// Nothing retries automatically; this only informs the caller.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport(_) | ClientError::Malformed(_) => true,
            ClientError::Remote { status, .. } => *status >= 500,
            ClientError::NotFound(_) => false,
        }
    }
}
