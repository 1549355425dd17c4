//! Error taxonomy shared by every upstream source.

use thiserror::Error;

/// Errors that an upstream source can report.
///
/// `NoUpcomingPass` is a valid empty result rather than a failure; see
/// [`SourceError::is_failure`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// Network error, timeout, or non-2xx response.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The provider answered with a payload we could not interpret.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The pass provider returned an empty result set.
    #[error("No upcoming pass scheduled")]
    NoUpcomingPass,
}

impl SourceError {
    /// Returns true for genuine failures, false for valid empty results.
    pub fn is_failure(&self) -> bool {
        !matches!(self, SourceError::NoUpcomingPass)
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(e: serde_json::Error) -> Self {
        SourceError::Parse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_upcoming_pass_is_not_a_failure() {
        assert!(!SourceError::NoUpcomingPass.is_failure());
        assert!(SourceError::UpstreamUnavailable("timeout".into()).is_failure());
        assert!(SourceError::Parse("bad".into()).is_failure());
    }

    #[test]
    fn test_from_serde_error() {
        let err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let source_err: SourceError = err.into();
        assert!(matches!(source_err, SourceError::Parse(_)));
    }
}
