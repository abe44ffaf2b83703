//! Structured error types with machine-readable codes
//!
//! Two failure classes matter at runtime:
//! - Setup errors (missing/invalid artifacts, feature contract mismatches)
//!   abort context construction before any session is processed.
//! - Scoring errors are recoverable per event type: the affected list comes
//!   back empty while the other two event types complete normally.

use std::fmt;
use std::path::PathBuf;

use crate::session::EventType;

/// Pipeline error types with proper categorization
#[derive(Debug)]
pub enum RecError {
    /// An artifact file could not be read
    ArtifactUnreadable { name: String, path: PathBuf, source: std::io::Error },

    /// An artifact file was read but failed validation or parsing
    ArtifactInvalid { name: String, reason: String },

    /// A model's declared feature inputs do not match the feature builder
    FeatureContractMismatch {
        event_type: EventType,
        expected: Vec<String>,
        declared: Vec<String>,
    },

    /// A model's declared feature width does not match the feature builder
    FeatureWidthMismatch {
        event_type: EventType,
        expected: usize,
        declared: usize,
    },

    /// A scoring call failed for one event type (recoverable)
    ScoringFailed { event_type: EventType, reason: String },

    /// Generic wrapper for external errors
    Internal(anyhow::Error),
}

impl RecError {
    /// Get error code for client identification
    pub fn code(&self) -> &'static str {
        match self {
            Self::ArtifactUnreadable { .. } => "ARTIFACT_UNREADABLE",
            Self::ArtifactInvalid { .. } => "ARTIFACT_INVALID",
            Self::FeatureContractMismatch { .. } => "FEATURE_CONTRACT_MISMATCH",
            Self::FeatureWidthMismatch { .. } => "FEATURE_WIDTH_MISMATCH",
            Self::ScoringFailed { .. } => "SCORING_FAILED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the pipeline can keep serving other event types after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::ScoringFailed { .. })
    }

    /// Get detailed error message
    pub fn message(&self) -> String {
        match self {
            Self::ArtifactUnreadable { name, path, source } => {
                format!("Cannot read {name} artifact at {}: {source}", path.display())
            }
            Self::ArtifactInvalid { name, reason } => {
                format!("Invalid {name} artifact: {reason}")
            }
            Self::FeatureContractMismatch {
                event_type,
                expected,
                declared,
            } => {
                format!(
                    "Model for '{event_type}' declares features {declared:?} but the \
                     feature builder produces {expected:?}"
                )
            }
            Self::FeatureWidthMismatch {
                event_type,
                expected,
                declared,
            } => {
                format!(
                    "Model for '{event_type}' expects {declared} features but the \
                     feature builder produces {expected}"
                )
            }
            Self::ScoringFailed { event_type, reason } => {
                format!("Scoring failed for '{event_type}': {reason}")
            }
            Self::Internal(err) => format!("Internal error: {err}"),
        }
    }
}

impl fmt::Display for RecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for RecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ArtifactUnreadable { source, .. } => Some(source),
            Self::Internal(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

/// Convert from anyhow::Error to RecError
impl From<anyhow::Error> for RecError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

/// Type alias for Results using RecError
pub type Result<T> = std::result::Result<T, RecError>;
