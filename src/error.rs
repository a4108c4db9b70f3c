//! Error types for the head orientation library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding or decoding failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Landmark geometry cannot produce an orientation
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    /// Calibration did not collect enough readings
    #[error("Calibration aborted: {0}")]
    CalibrationAborted(String),

    /// A serial line that does not match any known record layout
    #[error("Malformed stream record {line:?}: {reason}")]
    MalformedStreamRecord {
        /// The offending line, without terminator
        line: String,
        /// Why it was rejected
        reason: String,
    },

    /// Ctrl-C handler could not be installed
    #[error("Interrupt handler error: {0}")]
    Interrupt(#[from] ctrlc::Error),

    /// Camera, replay file or serial port could not be opened
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Filter initialization error
    #[error("Filter error: {0}")]
    FilterError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl Error {
    /// Whether the main loops should skip the item and keep going
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::DegenerateGeometry(_) | Self::MalformedStreamRecord { .. } | Self::CalibrationAborted(_)
        )
    }
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_kinds() {
        assert!(Error::DegenerateGeometry("face too narrow".to_string()).is_recoverable());
        assert!(Error::CalibrationAborted("frame source ended".to_string()).is_recoverable());
        assert!(Error::MalformedStreamRecord {
            line: "GPS,1".to_string(),
            reason: "unknown tag".to_string(),
        }
        .is_recoverable());

        assert!(!Error::Io(std::io::ErrorKind::BrokenPipe.into()).is_recoverable());
        assert!(!Error::SourceUnavailable("/dev/ttyACM0".to_string()).is_recoverable());
    }
}
