// @awa-component: AUTH-ErrorNormalizer
//
//! Converts failures into the `{message, debug}` record shown to users.

use serde::Serialize;

/// Separates diagnostic detail from the user-facing message in string errors.
pub const DEBUG_DELIMITER: char = '|';

/// A displayable error.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ErrorRecord {
    pub message: String,
    pub debug: Option<String>,
}

impl ErrorRecord {
    pub fn new(message: impl Into<String>, debug: Option<String>) -> Self {
        Self {
            message: message.into(),
            debug: debug.filter(|d| !d.is_empty()),
        }
    }
}

impl std::fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.debug {
            Some(debug) => write!(f, "{} ({debug})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Normalize a string failure.
///
/// `"detail|message"` yields `debug = "detail"` and `message = "message"`.
/// Without a delimiter the whole string is the message.
pub fn normalize_text(text: &str) -> ErrorRecord {
    match text.split_once(DEBUG_DELIMITER) {
        Some((debug, message)) => ErrorRecord::new(message, Some(debug.to_string())),
        None => ErrorRecord::new(text, None),
    }
}

/// Normalize an error value: its display text becomes the message and its
/// full debug dump the diagnostic detail.
pub fn normalize_error<E>(error: &E) -> ErrorRecord
where
    E: std::error::Error + ?Sized,
{
    ErrorRecord::new(error.to_string(), Some(format!("{error:?}")))
}
