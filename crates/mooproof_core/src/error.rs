//! crates/mooproof_core/src/error.rs
//!
//! Error types raised by the submission and chat workflows.

use crate::domain::RatePeriod;
use crate::ports::PortError;

/// Failures while turning an uploaded file into plain text.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Failed to decode uploaded file")]
    UndecodablePayload,

    #[error("Cannot open DOCX file - file may be corrupted")]
    CannotOpenContainer,

    #[error("Invalid DOCX file format")]
    InvalidDocument(String),

    /// Carries the upper-cased format name, e.g. `DOCX`.
    #[error("Could not extract text from {0} file. The file may be empty, corrupted, or contain only images")]
    NoTextExtracted(String),
}

/// Every way a submission or chat request can fail.
#[derive(Debug, thiserror::Error)]
pub enum ProofError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("You have reached your limit of {limit} submissions {label}. Please try again later.", label = .period.label())]
    RateLimitReached { limit: u32, period: RatePeriod },

    #[error("Your paper has {count} words, which exceeds the maximum of {max} words.")]
    WordLimitExceeded { count: u32, max: u32 },

    #[error("You have reached the maximum number of questions for this submission.")]
    ChatLimitReached,

    /// The provider answered but reported a failure.
    #[error("{0}")]
    AiGenerationFailed(String),

    /// Talking to the provider raised an error.
    #[error("Error: {0}")]
    ProviderException(String),

    #[error("Resource not found")]
    ResourceNotFound,

    #[error("You do not have permission to submit papers to this resource")]
    NotPermitted,

    /// The store failed. The detail is for the logs, never for the client.
    #[error("Error: Your request could not be saved. Please try again later.")]
    Storage(PortError),
}

impl ProofError {
    /// The `remaining` value reported to the client alongside this failure.
    ///
    /// `0` tells the client the relevant control must stay disabled, `-1` means
    /// the quota was never reached.
    pub fn remaining_hint(&self) -> i64 {
        match self {
            ProofError::RateLimitReached { .. } | ProofError::ChatLimitReached => 0,
            _ => -1,
        }
    }

    /// The word count reported to the client alongside this failure.
    pub fn word_count_hint(&self) -> u32 {
        match self {
            ProofError::WordLimitExceeded { count, .. } => *count,
            _ => 0,
        }
    }
}

impl From<PortError> for ProofError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound(_) => ProofError::ResourceNotFound,
            PortError::Unauthorized => ProofError::NotPermitted,
            other => ProofError::Storage(other),
        }
    }
}

pub type ProofResult<T> = Result<T, ProofError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_message_names_limit_and_period() {
        let err = ProofError::RateLimitReached {
            limit: 5,
            period: RatePeriod::Hour,
        };
        assert_eq!(
            err.to_string(),
            "You have reached your limit of 5 submissions per hour. Please try again later."
        );
        assert_eq!(err.remaining_hint(), 0);
    }

    #[test]
    fn word_limit_reports_count_but_no_quota() {
        let err = ProofError::WordLimitExceeded { count: 12, max: 10 };
        assert_eq!(err.remaining_hint(), -1);
        assert_eq!(err.word_count_hint(), 12);
        assert!(err.to_string().contains("12 words"));
    }

    #[test]
    fn extraction_errors_keep_their_message() {
        let err: ProofError = ExtractError::UnsupportedFileType("pdf".into()).into();
        assert_eq!(err.to_string(), "Unsupported file type: pdf");
    }

    #[test]
    fn storage_failures_hide_the_database_detail() {
        let err: ProofError =
            PortError::Unexpected("duplicate key value violates unique constraint".into()).into();
        assert!(matches!(err, ProofError::Storage(_)));
        assert_eq!(
            err.to_string(),
            "Error: Your request could not be saved. Please try again later."
        );
        assert!(format!("{err:?}").contains("duplicate key"));
    }
}
