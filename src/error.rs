//! Error types for the energy engine.
//!
//! All errors are strongly typed using thiserror. Every failure mode is a
//! contract violation on the input side: validation runs before any
//! simulation state is created, so an error never leaves a partially
//! mutated state behind.

use thiserror::Error;

/// Validation errors raised while checking a pillar set or configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Pillar '{pillar}' must be exactly two characters, got {actual}")]
    InvalidPillarLength {
        pillar: &'static str,
        actual: usize,
    },

    #[error("Character '{character}' is not a heavenly stem")]
    UnknownStem {
        character: char,
    },

    #[error("Character '{character}' is not an earthly branch")]
    UnknownBranch {
        character: char,
    },

    #[error("Configuration field '{field}' has invalid value {value}")]
    ConfigOutOfRange {
        field: &'static str,
        value: f64,
    },

    #[error("Configuration bounds are inverted: min {min} >= max {max}")]
    InvertedEnergyBounds {
        min: f64,
        max: f64,
    },
}

/// Top-level error type for the engine.
///
/// The pipeline itself has no runtime failure modes: it performs no I/O
/// and guards every division. Anything surfaced here means the caller
/// violated the input contract.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl EngineError {
    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_stem_message() {
        let err = ValidationError::UnknownStem { character: 'x' };
        let msg = format!("{err}");
        assert!(msg.contains('x'));
        assert!(msg.contains("heavenly stem"));
    }

    #[test]
    fn test_pillar_length_message() {
        let err = ValidationError::InvalidPillarLength {
            pillar: "month",
            actual: 3,
        };
        let msg = format!("{err}");
        assert!(msg.contains("month"));
        assert!(msg.contains('3'));
    }

    #[test]
    fn test_config_out_of_range_message() {
        let err = ValidationError::ConfigOutOfRange {
            field: "punish_loss_ratio",
            value: -0.5,
        };
        let msg = format!("{err}");
        assert!(msg.contains("punish_loss_ratio"));
        assert!(msg.contains("-0.5"));
    }

    #[test]
    fn test_engine_error_from_validation() {
        let err: EngineError = ValidationError::UnknownBranch { character: '?' }.into();
        assert!(err.is_validation());
        assert!(format!("{err}").contains("earthly branch"));
    }
}
