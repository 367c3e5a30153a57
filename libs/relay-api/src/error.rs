use std::fmt;

/// Error kind for relay errors.
///
/// The task uses the kind to decide what a failure means for the batch:
/// `Config` aborts startup, `Conversion` aborts the record (and the batch),
/// `Format` is the designed-for fallback of embedded document parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Conversion,
    Format,
    Dispatch,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Config => f.write_str("config"),
            ErrorKind::Conversion => f.write_str("conversion"),
            ErrorKind::Format => f.write_str("format"),
            ErrorKind::Dispatch => f.write_str("dispatch"),
        }
    }
}

/// Error returned by converters, parsers and dispatchers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayError {
    pub kind: ErrorKind,
    pub message: String,
}

impl RelayError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Config, message: msg.into() }
    }

    pub fn conversion(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Conversion, message: msg.into() }
    }

    pub fn format(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Format, message: msg.into() }
    }

    pub fn dispatch(msg: impl Into<String>) -> Self {
        Self { kind: ErrorKind::Dispatch, message: msg.into() }
    }

    /// Add context to the error, preserving the original ErrorKind.
    ///
    /// Produces: `"context: original message"`.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        Self {
            kind: self.kind,
            message: format!("{ctx}: {}", self.message),
        }
    }
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for RelayError {}

// ---------------------------------------------------------------------------
// From impls: standard error types → RelayError with correct ErrorKind
// ---------------------------------------------------------------------------

impl From<serde_json::Error> for RelayError {
    fn from(e: serde_json::Error) -> Self {
        Self::format(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_keeps_kind() {
        let err = RelayError::conversion("field '3' missing").with_context("struct 'user'");
        assert_eq!(err.kind, ErrorKind::Conversion);
        assert_eq!(err.message, "struct 'user': field '3' missing");
        assert_eq!(err.to_string(), "conversion: struct 'user': field '3' missing");
    }

    #[test]
    fn json_errors_are_format_errors() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(RelayError::from(parse).kind, ErrorKind::Format);
    }
}
