//! Payload Validation
//!
//! Inbound frames are relayed only if they parse as a JSON document.
//! Any document is accepted: objects, arrays, strings, numbers and literals.
//! The parsed value is thrown away; the original text is what gets forwarded.

use serde::de::IgnoredAny;
use thiserror::Error;

/// Payload failed to parse as JSON
#[derive(Debug, Error)]
#[error("invalid JSON at line {line}, column {column}: {source}")]
pub struct PayloadError {
    pub line: usize,
    pub column: usize,
    #[source]
    pub source: serde_json::Error,
}

/// Check that `text` is a syntactically valid JSON document.
pub fn validate(text: &str) -> Result<(), PayloadError> {
    serde_json::from_str::<IgnoredAny>(text)
        .map(|_| ())
        .map_err(|source| PayloadError {
            line: source.line(),
            column: source.column(),
            source,
        })
}
