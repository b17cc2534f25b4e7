//! Engine-level errors for the donorprobe investigation engine.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while retrieving, scoring, or orchestrating
/// investigation data.
///
/// Absence (unknown person, session, or bill) is deliberately *not* an error:
/// lookups return empty collections or `Option::None`, since absence is a
/// valid real-world state. Budget exhaustion is a terminal loop state, also
/// not an error.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An upstream collaborator asked us to back off. Carries the suggested
    /// wait so the loop can surface it into the conversation instead of
    /// blindly retrying.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    /// Transient I/O failure (network, pool timeout). Safe to retry
    /// immediately a small fixed number of times.
    #[error("transient I/O failure: {0}")]
    TransientIo(String),

    /// A tool call's arguments failed validation against the tool's declared
    /// schema. Rejected before dispatch.
    #[error("invalid tool arguments: {0}")]
    ToolArgumentInvalid(String),

    /// LLM-authored structured content failed validation against its fixed
    /// schema (e.g. a theme with confidence outside [0, 1]).
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    /// The backing store is unreachable or the completion capability failed
    /// unrecoverably. The only class of error that aborts an investigation.
    #[error("fatal: {0}")]
    Fatal(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Returns true if the error is transient and eligible for immediate
    /// retry. Rate limits are *not* transient in this sense: retrying them
    /// immediately wastes budget, so they surface a wait instead.
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::TransientIo(_))
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(e) => EngineError::TransientIo(e.to_string()),
            sqlx::Error::PoolTimedOut => {
                EngineError::TransientIo("connection pool timed out".to_string())
            }
            other => EngineError::Fatal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_io_is_transient() {
        assert!(EngineError::TransientIo("reset".into()).is_transient());
    }

    #[test]
    fn rate_limited_is_not_transient() {
        let err = EngineError::RateLimited {
            retry_after: Duration::from_secs(60),
        };
        assert!(!err.is_transient());
    }

    #[test]
    fn fatal_is_not_transient() {
        assert!(!EngineError::Fatal("store unreachable".into()).is_transient());
    }
}
