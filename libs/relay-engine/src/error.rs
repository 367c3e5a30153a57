use relay_api::error::RelayError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid property '{property}'{}: {reason}", value_suffix(.value))]
    Config {
        property: String,
        value: Option<String>,
        reason: String,
    },

    #[error("conversion error: {0}")]
    Conversion(RelayError),

    #[error("no address could be resolved for record {index}")]
    UnresolvedAddress { index: usize },

    #[error("dispatch error: {0}")]
    Dispatch(RelayError),

    #[error("envelope error: {0}")]
    Envelope(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

fn value_suffix(value: &Option<String>) -> String {
    match value {
        Some(v) => format!(" (value '{v}')"),
        None => String::new(),
    }
}

impl EngineError {
    pub fn config(
        property: impl Into<String>,
        value: Option<&str>,
        reason: impl Into<String>,
    ) -> Self {
        EngineError::Config {
            property: property.into(),
            value: value.map(str::to_string),
            reason: reason.into(),
        }
    }

    /// Add context to the error.
    ///
    /// For `Conversion` and `Dispatch`, context is added to the inner `RelayError`.
    /// For `Envelope`, context is prepended to the message.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            EngineError::Conversion(e) => EngineError::Conversion(e.with_context(ctx)),
            EngineError::Dispatch(e) => EngineError::Dispatch(e.with_context(ctx)),
            EngineError::Envelope(msg) => EngineError::Envelope(format!("{ctx}: {msg}")),
            other => other,
        }
    }

    /// Property the error is keyed by, for configuration errors.
    pub fn property(&self) -> Option<&str> {
        match self {
            EngineError::Config { property, .. } => Some(property),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_message_names_property_and_value() {
        let err = EngineError::config("host-endpoint-uri", Some("bad"), "must start with warp:// or warps://");
        assert_eq!(
            err.to_string(),
            "invalid property 'host-endpoint-uri' (value 'bad'): must start with warp:// or warps://"
        );
        assert_eq!(err.property(), Some("host-endpoint-uri"));
    }

    #[test]
    fn config_error_without_value() {
        let err = EngineError::config("destination-uri", None, "not defined");
        assert_eq!(err.to_string(), "invalid property 'destination-uri': not defined");
    }

    #[test]
    fn context_reaches_inner_error() {
        let err = EngineError::Conversion(RelayError::conversion("boom")).with_context("record 3");
        assert_eq!(err.to_string(), "conversion error: conversion: record 3: boom");
    }
}
