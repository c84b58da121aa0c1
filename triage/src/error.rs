//! Top-level triage errors.
//!
//! The engine recovers internally from every collaborator failure; the only
//! error a caller can observe is malformed input. Expected degradation is
//! carried in typed stage results, never raised.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TriageError {
    /// The symptom description was empty or whitespace. Rejected before the
    /// pipeline runs.
    #[error("symptom description must not be empty")]
    EmptySymptoms,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            TriageError::EmptySymptoms.to_string(),
            "symptom description must not be empty"
        );
    }
}
