use crate::error::RelayError;
use crate::value::Value;

/// Outbound channel to the remote agent runtime.
///
/// `send` hands one command over; delivery, retries and connection
/// management belong to the implementation.
pub trait Dispatcher: Send + Sync {
    fn send(
        &self,
        host_endpoint: &str,
        address: &str,
        destination: &str,
        payload: &Value,
    ) -> Result<(), RelayError>;
}

/// Parser for structured documents embedded in text values.
///
/// Text that is not a document should be reported with kind `Format`. The
/// schemaless converter keeps such text as a literal leaf. Any other error
/// kind is logged as a parser fault, and the text is still kept.
pub trait DocumentParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<Value, RelayError>;
}
