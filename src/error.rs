//! Error types for the N-body core.
//!
//! Every fallible operation returns `Result<T, SimError>`. Numerical
//! degradation and invalid bodies are classified separately from hard
//! failures: the step loop reports them and keeps running.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for simulation operations.
pub type SimResult<T> = Result<T, SimError>;

/// Unified error type for the crate.
#[derive(Debug, Error)]
pub enum SimError {
    // ===== Numerical degradation =====
    /// Non-finite value (NaN or Inf) detected in body state.
    #[error("non-finite value detected at {location}")]
    NonFiniteValue {
        /// Location where the non-finite value was detected.
        location: String,
    },

    /// Body cannot take part in the dynamics (zero mass, non-finite state).
    #[error("invalid body {index}: {reason}")]
    InvalidBody {
        /// Slot index of the body.
        index: usize,
        /// Why the body was rejected.
        reason: String,
    },

    /// Energy drift beyond the configured tolerance.
    #[error("energy drift {drift:.6e} exceeds tolerance {tolerance:.6e}")]
    EnergyDrift {
        /// Relative drift from the baseline energy.
        drift: f64,
        /// Configured tolerance.
        tolerance: f64,
    },

    // ===== Configuration =====
    /// Invalid configuration parameter.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// Scenario could not be built.
    #[error("Scenario error: {0}")]
    Scenario(String),

    // ===== I/O =====
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Background simulation thread terminated abnormally.
    #[error("simulation worker failed: {0}")]
    Worker(String),

    /// Snapshot or history export failed.
    #[error("export to {} failed: {source}", path.display())]
    Export {
        /// Destination that could not be written.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
}

impl SimError {
    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a scenario error.
    #[must_use]
    pub fn scenario(message: impl Into<String>) -> Self {
        Self::Scenario(message.into())
    }

    /// Create an export error for `path`.
    #[must_use]
    pub fn export(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Export {
            path: path.into(),
            source,
        }
    }

    /// Check if this error is a degradation the step loop reports and survives.
    #[must_use]
    pub const fn is_degradation(&self) -> bool {
        matches!(
            self,
            Self::NonFiniteValue { .. } | Self::InvalidBody { .. } | Self::EnergyDrift { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degradation_detection() {
        let non_finite = SimError::NonFiniteValue {
            location: "body 3 position".to_string(),
        };
        assert!(non_finite.is_degradation());

        let energy = SimError::EnergyDrift {
            drift: 0.001,
            tolerance: 0.0001,
        };
        assert!(energy.is_degradation());

        let invalid = SimError::InvalidBody {
            index: 0,
            reason: "zero mass".to_string(),
        };
        assert!(invalid.is_degradation());

        assert!(!SimError::config("invalid").is_degradation());
    }

    #[test]
    fn test_error_display() {
        let err = SimError::EnergyDrift {
            drift: 0.001_234_567,
            tolerance: 0.000_001,
        };
        let msg = err.to_string();
        assert!(msg.contains("energy drift"));
        assert!(msg.contains("1.234567e-3"));
    }

    #[test]
    fn test_error_config() {
        let err = SimError::config("base_dt must be positive");
        let msg = err.to_string();
        assert!(msg.contains("Configuration error"));
        assert!(msg.contains("base_dt"));
    }

    #[test]
    fn test_error_export_names_path() {
        let err = SimError::export(
            "/nonexistent/out.csv",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(!err.is_degradation());
        let msg = err.to_string();
        assert!(msg.contains("/nonexistent/out.csv"));
        assert!(msg.contains("missing"));
    }

    #[test]
    fn test_error_invalid_body_display() {
        let err = SimError::InvalidBody {
            index: 4,
            reason: "mass 0e0 below minimum".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("invalid body 4"));
        assert!(msg.contains("below minimum"));
    }

    #[test]
    fn test_error_scenario() {
        let err = SimError::scenario("random scenario needs at least one body");
        assert!(err.to_string().contains("Scenario error"));
    }
}
