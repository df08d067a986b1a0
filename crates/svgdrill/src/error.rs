//! User-facing failures of an export run.

use thiserror::Error;

/// Errors that abort an export before any output file is written.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExportError {
    /// The scope search yielded zero circles.
    #[error("No circles found in the specified scope.")]
    NoCircles,

    /// Clearance height is not strictly above the drill start height.
    #[error("Z-Clear must be ABOVE Z-Start (z_clear={z_clear}, z_start={z_start})")]
    ClearanceNotAboveStart { z_clear: f64, z_start: f64 },

    /// End depth is not strictly below the drill start height.
    #[error(
        "Z-End must be BELOW Z-Start. (Z-End should often be negative) (z_start={z_start}, z_end={z_end})"
    )]
    EndNotBelowStart { z_start: f64, z_end: f64 },

    /// An option value could not be understood.
    #[error("invalid value '{value}' for option '{key}'")]
    InvalidOption { key: String, value: String },

    /// The input drawing could not be parsed.
    #[error("could not parse SVG document: {0}")]
    Document(String),
}

impl ExportError {
    pub fn invalid_option(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidOption {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_circles_message_is_user_facing() {
        assert_eq!(
            ExportError::NoCircles.to_string(),
            "No circles found in the specified scope."
        );
    }

    #[test]
    fn test_z_errors_name_the_offending_heights() {
        let err = ExportError::EndNotBelowStart {
            z_start: 0.1,
            z_end: 0.5,
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Z-End must be BELOW Z-Start"));
        assert!(msg.contains("z_end=0.5"));
    }
}
