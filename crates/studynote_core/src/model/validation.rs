//! Input validation shared by every write path.
//!
//! # Invariants
//! - Text fields that must be present are trimmed before storage.
//! - Exam progress is always within `0..=100` once wrapped in [`Progress`].

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static CSS_COLOR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(#([0-9a-fA-F]{3}|[0-9a-fA-F]{4}|[0-9a-fA-F]{6}|[0-9a-fA-F]{8})|(rgb|rgba|hsl|hsla)\([0-9.,%\s/+-]+\)|[a-zA-Z]+)$",
    )
    .expect("valid css color regex")
});

pub const PROGRESS_MIN: i64 = 0;
pub const PROGRESS_MAX: i64 = 100;

/// Input rejected before storage is touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required text field is empty after trimming.
    EmptyField(&'static str),
    /// Value is not a recognizable CSS color.
    InvalidColor(String),
    /// Exam progress outside `0..=100`.
    ProgressOutOfRange(i64),
    /// Calendar window with `from > to`.
    InvalidDateRange { from: NaiveDate, to: NaiveDate },
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "`{field}` must not be empty"),
            Self::InvalidColor(value) => write!(f, "invalid color value `{value}`"),
            Self::ProgressOutOfRange(value) => write!(
                f,
                "progress must be within {PROGRESS_MIN}..={PROGRESS_MAX}, got {value}"
            ),
            Self::InvalidDateRange { from, to } => {
                write!(f, "date range start {from} is after end {to}")
            }
        }
    }
}

impl Error for ValidationError {}

/// Exam preparation progress in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Progress(u8);

impl Progress {
    pub const ZERO: Progress = Progress(0);

    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if (PROGRESS_MIN..=PROGRESS_MAX).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ValidationError::ProgressOutOfRange(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Progress {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Progress> for i64 {
    fn from(value: Progress) -> Self {
        i64::from(value.0)
    }
}

/// Returns the trimmed value, or `EmptyField` when nothing is left.
pub fn require_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(trimmed.to_string())
}

/// Accepts hex, functional (`rgb()`/`hsl()` families) or keyword CSS colors.
pub fn normalize_color(value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField("color"));
    }
    if !CSS_COLOR_RE.is_match(trimmed) {
        return Err(ValidationError::InvalidColor(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Drops blank optional text so storage never keeps whitespace-only values.
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

pub fn require_date_range(from: NaiveDate, to: NaiveDate) -> Result<(), ValidationError> {
    if from > to {
        return Err(ValidationError::InvalidDateRange { from, to });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{normalize_color, optional_text, require_text, Progress, ValidationError};

    #[test]
    fn require_text_trims_and_rejects_blank() {
        assert_eq!(require_text("name", "  Physics ").unwrap(), "Physics");
        assert_eq!(
            require_text("name", "   ").unwrap_err(),
            ValidationError::EmptyField("name")
        );
    }

    #[test]
    fn color_accepts_common_css_forms() {
        for value in ["#fff", "#2196f3", "#2196f3cc", "rgb(10, 20, 30)", "hsl(200 50% 50%)", "teal"] {
            assert!(normalize_color(value).is_ok(), "{value} should be accepted");
        }
    }

    #[test]
    fn color_rejects_garbage() {
        for value in ["#12", "#zzzzzz", "red;drop", "12345"] {
            assert!(
                matches!(normalize_color(value), Err(ValidationError::InvalidColor(_))),
                "{value} should be rejected"
            );
        }
    }

    #[test]
    fn progress_bounds_are_inclusive() {
        assert_eq!(Progress::new(0).unwrap().value(), 0);
        assert_eq!(Progress::new(100).unwrap().value(), 100);
        assert_eq!(
            Progress::new(150).unwrap_err(),
            ValidationError::ProgressOutOfRange(150)
        );
        assert!(Progress::new(-1).is_err());
    }

    #[test]
    fn progress_deserialization_rejects_out_of_range() {
        assert!(serde_json::from_str::<Progress>("101").is_err());
        assert_eq!(serde_json::from_str::<Progress>("42").unwrap().value(), 42);
    }

    #[test]
    fn optional_text_drops_blank_values() {
        assert_eq!(optional_text(Some("  ")), None);
        assert_eq!(optional_text(Some(" ch. 5 ")).as_deref(), Some("ch. 5"));
        assert_eq!(optional_text(None), None);
    }
}
