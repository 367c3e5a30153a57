use std::collections::HashMap;

use relay_api::config::ConfigParam;

use crate::config::{SinkConfig, SinkProps};
use crate::error::EngineError;

/// Connector entry point. Validates the properties once and hands a copy
/// of them to every task.
#[derive(Debug, Clone)]
pub struct SinkConnector {
    props: HashMap<String, String>,
}

impl SinkConnector {
    pub fn start(props: HashMap<String, String>) -> Result<Self, EngineError> {
        SinkConfig::from_properties(&props)?;
        tracing::info!(properties = props.len(), "sink connector started");
        Ok(Self { props })
    }

    /// Property sets for up to `max_tasks` tasks; every task gets the same
    /// properties.
    pub fn task_configs(&self, max_tasks: usize) -> Vec<HashMap<String, String>> {
        vec![self.props.clone(); max_tasks]
    }

    pub fn config_params() -> Vec<ConfigParam> {
        SinkProps::config_params()
    }

    pub fn stop(self) {
        tracing::info!("sink connector stopped");
    }

    pub fn version(&self) -> &'static str {
        crate::VERSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ADDRESS_TEMPLATE, DESTINATION_URI, HOST_ENDPOINT_URI};
    use relay_api::config::Importance;

    fn props() -> HashMap<String, String> {
        HashMap::from([
            (HOST_ENDPOINT_URI.to_string(), "warps://swim.example:443".to_string()),
            (ADDRESS_TEMPLATE.to_string(), "/sensor/:id".to_string()),
            (DESTINATION_URI.to_string(), "reading".to_string()),
        ])
    }

    #[test]
    fn every_task_gets_the_same_properties() {
        let connector = SinkConnector::start(props()).unwrap();
        let configs = connector.task_configs(3);
        assert_eq!(configs.len(), 3);
        assert!(configs.iter().all(|c| *c == props()));
        assert!(connector.task_configs(0).is_empty());
    }

    #[test]
    fn start_rejects_invalid_properties() {
        let mut bad = props();
        bad.insert(HOST_ENDPOINT_URI.to_string(), "http://swim.example".to_string());
        let err = SinkConnector::start(bad).unwrap_err();
        assert_eq!(err.property(), Some(HOST_ENDPOINT_URI));
    }

    #[test]
    fn params_are_declared_with_importance() {
        let params = SinkConnector::config_params();
        let host = params.iter().find(|p| p.name == HOST_ENDPOINT_URI).unwrap();
        assert!(host.required);
        assert_eq!(host.importance, Importance::High);
        let selector = params.iter().find(|p| p.name == "identifier-selector").unwrap();
        assert!(!selector.required);
        assert_eq!(selector.importance, Importance::Medium);
    }

    #[test]
    fn version_is_crate_version() {
        let connector = SinkConnector::start(props()).unwrap();
        assert_eq!(connector.version(), env!("CARGO_PKG_VERSION"));
    }
}
