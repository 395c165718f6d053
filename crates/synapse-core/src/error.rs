//! Error handling for the Synapse pipeline
//!
//! One error type crosses every crate boundary. Low-level I/O and DSP
//! failures are classified into these variants at the component edge so
//! the operator-facing layer never sees a raw error unlabelled.

use std::fmt;

/// Result type alias for Synapse pipeline operations
pub type SynapseResult<T> = Result<T, SynapseError>;

/// Error taxonomy for acquisition, conditioning and prediction
#[derive(Debug)]
#[non_exhaustive]
pub enum SynapseError {
    /// Device unreachable or the connection dropped before any use
    Connection {
        /// What the connection attempt was for
        context: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// A capture ended below the usable completeness threshold
    InsufficientData {
        /// Samples actually captured before padding
        captured: usize,
        /// Samples expected for a full window
        expected: usize,
    },

    /// Degenerate parameters that would corrupt the signal path
    Configuration {
        /// Description of the invalid configuration
        message: String,
    },

    /// Predicted class index has no entry in the label set
    ClassIndexOutOfRange {
        /// Index reported by the classifier
        index: usize,
        /// Number of known labels
        label_count: usize,
    },

    /// Model or label state required for prediction does not exist yet
    NotTrained {
        /// Which piece of state is missing
        what: &'static str,
    },

    /// Persistent state could not be read or written
    Storage {
        /// Operation that failed
        context: String,
        /// Underlying I/O error, if any
        source: Option<std::io::Error>,
    },

    /// Internal processing failure (kept rare; most DSP errors are
    /// configuration errors caught up front)
    Processing {
        /// Description of the failure
        message: String,
    },
}

impl fmt::Display for SynapseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynapseError::Connection { context, source } => {
                write!(f, "Connection error during {}: {}", context, source)
            }
            SynapseError::InsufficientData { captured, expected } => {
                write!(
                    f,
                    "Insufficient data: captured {} of {} expected samples",
                    captured, expected
                )
            }
            SynapseError::Configuration { message } => {
                write!(f, "Configuration error: {}", message)
            }
            SynapseError::ClassIndexOutOfRange { index, label_count } => {
                write!(
                    f,
                    "Predicted class index {} out of range for {} labels",
                    index, label_count
                )
            }
            SynapseError::NotTrained { what } => {
                write!(f, "Not trained yet: {} is missing", what)
            }
            SynapseError::Storage { context, source } => match source {
                Some(io) => write!(f, "Storage error during {}: {}", context, io),
                None => write!(f, "Storage error during {}", context),
            },
            SynapseError::Processing { message } => {
                write!(f, "Processing error: {}", message)
            }
        }
    }
}

impl std::error::Error for SynapseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SynapseError::Connection { source, .. } => Some(source),
            SynapseError::Storage {
                source: Some(io), ..
            } => Some(io),
            _ => None,
        }
    }
}

impl SynapseError {
    /// Shorthand for configuration errors
    pub fn config(message: impl Into<String>) -> Self {
        SynapseError::Configuration {
            message: message.into(),
        }
    }

    /// Shorthand for storage errors with an I/O cause
    pub fn storage(context: impl Into<String>, source: std::io::Error) -> Self {
        SynapseError::Storage {
            context: context.into(),
            source: Some(source),
        }
    }

    /// True for errors that abort only the current unit of work
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SynapseError::Connection { .. } | SynapseError::InsufficientData { .. }
        )
    }
}
