//! Error types for the cubic client and the invoice pipeline.
//!
//! [`CubicError`] is the closed set of failures a client operation can end
//! with. Validation and section errors are raised before anything is sent;
//! the remaining variants come from the transport.

use std::path::PathBuf;

/// Failures of a cubic API operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CubicError {
    /// A required argument was missing, empty or malformed. Never sent over the wire.
    #[error("{message}")]
    Validation {
        /// Wire name of the offending field, e.g. `cubicId`.
        field: &'static str,
        /// Human readable description.
        message: &'static str,
    },

    /// The section category is not one of image, music, video or files.
    #[error("Section name is not valid: {0}")]
    InvalidSection(String),

    /// The server answered with a status outside the accepted set.
    #[error("{status_text}")]
    HttpStatus { status: u16, status_text: String },

    /// The request was cancelled or ran out of time.
    #[error("Request timed out")]
    Timeout,

    /// Any other network failure.
    #[error("{0}")]
    Transport(String),
}

impl CubicError {
    pub(crate) fn validation(field: &'static str, message: &'static str) -> Self {
        Self::Validation { field, message }
    }

    /// Offending field name for validation failures.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CubicError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Failures of the template renderer.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to read template {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A placeholder names a key the data record does not have.
    #[error("template references missing key `{0}`")]
    MissingKey(String),

    #[error("invalid template: {0}")]
    Template(String),
}

/// Failures of the render-and-upload invoice pipeline.
#[derive(Debug, thiserror::Error)]
pub enum InvoiceError {
    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    #[error("{context} {path:?}: {source}")]
    Io {
        context: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("upload failed: {0}")]
    Api(#[from] CubicError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_status_displays_status_text() {
        let err = CubicError::HttpStatus {
            status: 500,
            status_text: "Internal Server Error".to_string(),
        };
        assert_eq!(err.to_string(), "Internal Server Error");
    }

    #[test]
    fn validation_carries_field() {
        let err = CubicError::validation("cubicId", "Provide valid cubic ID");
        assert_eq!(err.field(), Some("cubicId"));
        assert_eq!(err.to_string(), "Provide valid cubic ID");
        assert_eq!(CubicError::Timeout.field(), None);
    }

    #[test]
    fn invoice_error_wraps_api_error() {
        let err: InvoiceError = CubicError::Timeout.into();
        assert_eq!(err.to_string(), "upload failed: Request timed out");
    }
}
