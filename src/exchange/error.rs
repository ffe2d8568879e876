use thiserror::Error;

/// Failure of a single exchange request/response call.
///
/// No variant is retried by the client itself; callers pick a policy using
/// [`ExchangeError::is_transient`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExchangeError {
    /// Connection, timeout or non-success HTTP status without a structured body
    #[error("transport error: {0}")]
    Transport(String),

    /// The exchange answered with its own error code and message
    #[error("request rejected by exchange (code {code}): {msg}")] Rejected {
        code: i64,
        msg: String,
    },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("failed to sign request: {0}")]
    Signing(String),
}

impl ExchangeError {
    #[inline]
    pub fn is_transient(&self) -> bool {
        matches!(self, ExchangeError::Transport(_))
    }
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        ExchangeError::Transport(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transport_failures_are_transient() {
        assert!(ExchangeError::Transport("reset".into()).is_transient());
        assert!(
            !(ExchangeError::Rejected { code: -2010, msg: "insufficient balance".into() }).is_transient()
        );
        assert!(!ExchangeError::Decode("eof".into()).is_transient());
    }

    #[test]
    fn rejection_keeps_code_and_message() {
        let err = ExchangeError::Rejected { code: -1013, msg: "Filter failure: LOT_SIZE".into() };
        assert_eq!(err.to_string(), "request rejected by exchange (code -1013): Filter failure: LOT_SIZE");
    }
}
