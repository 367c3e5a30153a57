use std::io::Write;

use relay_api::dispatch::Dispatcher;
use relay_api::error::RelayError;
use relay_api::value::Value;
use serde::Serialize;

/// Writes every command to stdout as one JSON object per line.
#[derive(Debug, Default)]
pub struct StdoutDispatcher;

#[derive(Serialize)]
struct Command<'a> {
    host: &'a str,
    address: &'a str,
    destination: &'a str,
    payload: &'a Value,
}

impl Dispatcher for StdoutDispatcher {
    fn send(
        &self,
        host_endpoint: &str,
        address: &str,
        destination: &str,
        payload: &Value,
    ) -> Result<(), RelayError> {
        let line = serde_json::to_string(&Command {
            host: host_endpoint,
            address,
            destination,
            payload,
        })?;
        let mut out = std::io::stdout().lock();
        writeln!(out, "{line}").map_err(|e| RelayError::dispatch(format!("stdout: {e}")))
    }
}
