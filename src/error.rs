use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Snapshot serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Comparison unavailable: {reason}")]
    ComparisonUnavailable { reason: ComparisonGap },

    #[error("Confirmation unavailable: expected exactly one face, found {faces}")]
    ConfirmationUnavailable { faces: usize },

    #[error("Confirmation unavailable: the face has no landmark points")]
    ReferenceWithoutLandmarks,

    #[error("Cannot {action} while {from}")]
    InvalidTransition {
        from: crate::session::Phase,
        action: &'static str,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

/// Why two landmark sets could not be scored against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonGap {
    MissingCurrent,
    MissingReference,
    LengthMismatch { current: usize, reference: usize },
}

impl std::fmt::Display for ComparisonGap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComparisonGap::MissingCurrent => write!(f, "current face has no landmark points"),
            ComparisonGap::MissingReference => write!(f, "reference face has no landmark points"),
            ComparisonGap::LengthMismatch { current, reference } => write!(
                f,
                "point count mismatch (current {}, reference {})",
                current, reference
            ),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
