//! Request Validator (C6): filename-safety and resource-limit bounds checks
//! that run before any sandbox work is attempted.
//!
//! No regex dependency — the filename contract (`^[A-Za-z0-9_-]+\.[A-Za-z0-9_-]+$`)
//! is simple enough to check with a `split` and a char-class predicate.

use std::str::FromStr;

use thiserror::Error;

use crate::config::ValidationConfig;
use crate::language::{Language, LanguageRegistry};
use crate::service::Request;

/// A candidate request as received at the transport boundary, before its
/// filenames, limits, and language tag have been checked.
#[derive(Debug, Clone)]
pub struct RawRequest {
    pub language_tag: String,
    pub source_filename: String,
    pub source: Vec<u8>,
    pub expected_output_filename: String,
    pub expected_output: Vec<u8>,
    pub input_filename: Option<String>,
    pub input: Option<Vec<u8>>,
    pub time_limit: f64,
    pub memory_limit_mb: u64,
}

/// Errors a [`RawRequest`] can fail with before an [`crate::execution::Execution`]
/// is ever created. Every variant is surfaced to callers as `400 BadRequest`.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error(
        "invalid {field} filename '{value}': must match ^[A-Za-z0-9_-]+\\.[A-Za-z0-9_-]+$"
    )]
    InvalidFilename { field: &'static str, value: String },

    #[error("time limit {value} outside allowed range {min}..={max}")]
    TimeLimitOutOfRange { value: f64, min: f64, max: f64 },

    #[error("memory limit {value} outside allowed range {min}..={max}")]
    MemoryLimitOutOfRange { value: u64, min: u64, max: u64 },

    #[error("unknown language '{0}'")]
    UnknownLanguage(String),
}

/// Validate `raw` against the filename contract, configured limit bounds,
/// and the language registry, producing a [`Request`] ready for admission.
pub fn validate(
    raw: RawRequest,
    registry: &LanguageRegistry,
    bounds: &ValidationConfig,
) -> Result<Request, ValidationError> {
    check_filename("sourceCode", &raw.source_filename)?;
    check_filename("expectedOutput", &raw.expected_output_filename)?;
    if let Some(ref input_filename) = raw.input_filename {
        check_filename("input", input_filename)?;
    }

    if raw.time_limit < bounds.min_execution_time || raw.time_limit > bounds.max_execution_time {
        return Err(ValidationError::TimeLimitOutOfRange {
            value: raw.time_limit,
            min: bounds.min_execution_time,
            max: bounds.max_execution_time,
        });
    }

    if raw.memory_limit_mb < bounds.min_execution_memory
        || raw.memory_limit_mb > bounds.max_execution_memory
    {
        return Err(ValidationError::MemoryLimitOutOfRange {
            value: raw.memory_limit_mb,
            min: bounds.min_execution_memory,
            max: bounds.max_execution_memory,
        });
    }

    let language = Language::from_str(&raw.language_tag)
        .map_err(|_| ValidationError::UnknownLanguage(raw.language_tag.clone()))?;
    registry
        .get(language)
        .map_err(|_| ValidationError::UnknownLanguage(raw.language_tag.clone()))?;

    Ok(Request {
        language,
        source: raw.source,
        expected_output: raw.expected_output,
        input: raw.input,
        time_limit: raw.time_limit,
        memory_limit_mb: raw.memory_limit_mb,
    })
}

fn check_filename(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if is_safe_filename(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidFilename {
            field,
            value: value.to_string(),
        })
    }
}

fn is_safe_filename(name: &str) -> bool {
    let mut parts = name.split('.');
    let (stem, ext) = match (parts.next(), parts.next()) {
        (Some(stem), Some(ext)) => (stem, ext),
        _ => return false,
    };
    if parts.next().is_some() {
        return false; // more than one '.'
    }
    !stem.is_empty()
        && !ext.is_empty()
        && stem.chars().all(is_filename_char)
        && ext.chars().all(is_filename_char)
}

fn is_filename_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}
