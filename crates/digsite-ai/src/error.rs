use digsite_core::TierError;
use thiserror::Error;

/// Failure of a single call to the inference server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Timeouts and refused connections are worth retrying; everything else is final.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Connect(_))
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        // Connect timeouts report both; treat them as timeouts.
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Status {
                status: status.as_u16(),
                body: e.to_string(),
            }
        } else {
            Self::Other(e.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Tier(#[from] TierError),

    #[error("prompt must not be empty")]
    EmptyPrompt,

    /// Every attempt failed transiently; `source` is the last cause.
    #[error("generation failed after {attempts} attempts: {source}")]
    GenerationFailed {
        attempts: u32,
        #[source]
        source: TransportError,
    },

    /// Non-retryable failure from the inference server.
    #[error("inference backend error: {0}")]
    Backend(#[source] TransportError),

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("local classifier failed: {0}")]
    Classifier(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn transient_classification() {
        assert!(TransportError::Timeout("t".into()).is_transient());
        assert!(TransportError::Connect("refused".into()).is_transient());
        assert!(
            !TransportError::Status {
                status: 500,
                body: "boom".into()
            }
            .is_transient()
        );
        assert!(!TransportError::Decode("bad json".into()).is_transient());
        assert!(!TransportError::Other("?".into()).is_transient());
    }

    #[test]
    fn generation_failed_exposes_last_cause() {
        let err = AnalysisError::GenerationFailed {
            attempts: 3,
            source: TransportError::Timeout("third".into()),
        };
        assert_eq!(
            err.to_string(),
            "generation failed after 3 attempts: request timed out: third"
        );
        let cause = err.source().unwrap().downcast_ref::<TransportError>().unwrap();
        assert_eq!(cause, &TransportError::Timeout("third".into()));
    }
}
