use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use relay_api::ConfigParams;
use relay_api::config::{ConfigParam, ConfigValues, ParamType, ParamValue};
use serde::Deserialize;
use url::Url;

use crate::error::EngineError;
use crate::selector::Selector;
use crate::uri_template::UriTemplate;

pub const HOST_ENDPOINT_URI: &str = "host-endpoint-uri";
pub const ADDRESS_TEMPLATE: &str = "address-template";
pub const DESTINATION_URI: &str = "destination-uri";
pub const USE_VALUE_FOR_IDENTIFICATION: &str = "use-value-for-identification";
pub const IDENTIFIER_SELECTOR: &str = "identifier-selector";

const HOST_SCHEMES: [&str; 2] = ["warp://", "warps://"];

/// Raw connector properties, typed but not yet validated.
#[derive(ConfigParams, Debug, Clone, Default)]
pub struct SinkProps {
    #[param(
        name = "host-endpoint-uri",
        importance = "high",
        required,
        description = "Endpoint of the remote runtime, e.g. warp://localhost:9001"
    )]
    pub host_endpoint_uri: String,

    #[param(
        name = "address-template",
        importance = "high",
        required,
        description = "Address pattern of the target actor with one placeholder, e.g. /user/:id"
    )]
    pub address_template: String,

    #[param(
        name = "destination-uri",
        importance = "high",
        required,
        description = "Destination on the target actor that receives each payload"
    )]
    pub destination_uri: String,

    #[param(
        name = "use-value-for-identification",
        importance = "high",
        description = "Extract the identifier from the record value instead of its key"
    )]
    pub use_value_for_identification: bool,

    #[param(
        name = "identifier-selector",
        importance = "medium",
        description = "Selector extracting the identifier, e.g. $id.key; empty selects the whole key or value"
    )]
    pub identifier_selector: String,
}

/// Validated sink configuration. Built once at task start and shared
/// read-only for the task's lifetime.
#[derive(Debug, Clone)]
pub struct SinkConfig {
    pub host_endpoint: Url,
    pub address_template: UriTemplate,
    pub destination: String,
    pub use_value_for_identification: bool,
    pub identifier_selector: Selector,
}

impl SinkConfig {
    /// Type, validate and build the configuration from the host's property bag.
    pub fn from_properties(props: &HashMap<String, String>) -> Result<Self, EngineError> {
        let params = SinkProps::config_params();
        let parsed = parse_properties(props, &params);
        let values = validate_and_build(&parsed, &params)?;
        let raw = SinkProps::from_config(&values)
            .map_err(|e| EngineError::config("properties", None, e.message))?;
        Self::validate(raw)
    }

    pub fn validate(raw: SinkProps) -> Result<Self, EngineError> {
        let config = Self {
            host_endpoint: host_endpoint(&raw.host_endpoint_uri)?,
            address_template: address_template(&raw.address_template)?,
            destination: destination(&raw.destination_uri)?,
            use_value_for_identification: raw.use_value_for_identification,
            identifier_selector: identifier_selector(&raw.identifier_selector)?,
        };
        tracing::debug!(
            host = %config.host_endpoint,
            template = %config.address_template,
            destination = %config.destination,
            use_value = config.use_value_for_identification,
            selector = %config.identifier_selector,
            "sink config validated"
        );
        Ok(config)
    }
}

fn host_endpoint(text: &str) -> Result<Url, EngineError> {
    if !HOST_SCHEMES.iter().any(|scheme| text.starts_with(*scheme)) {
        return Err(EngineError::config(
            HOST_ENDPOINT_URI,
            Some(text),
            "must start with warp:// or warps://",
        ));
    }
    let url = Url::parse(text).map_err(|e| {
        EngineError::config(HOST_ENDPOINT_URI, Some(text), format!("not a valid URL: {e}"))
    })?;
    if url.host_str().is_none_or(str::is_empty) {
        return Err(EngineError::config(HOST_ENDPOINT_URI, Some(text), "host is missing"));
    }
    Ok(url)
}

fn address_template(text: &str) -> Result<UriTemplate, EngineError> {
    UriTemplate::parse(text)
        .map_err(|e| EngineError::config(ADDRESS_TEMPLATE, Some(text), e.to_string()))
}

fn destination(text: &str) -> Result<String, EngineError> {
    if text.is_empty() {
        return Err(EngineError::config(DESTINATION_URI, None, "must not be empty"));
    }
    if text.chars().any(char::is_whitespace) {
        return Err(EngineError::config(
            DESTINATION_URI,
            Some(text),
            "must not contain whitespace",
        ));
    }
    Ok(text.to_string())
}

fn identifier_selector(text: &str) -> Result<Selector, EngineError> {
    Selector::parse(text)
        .map_err(|e| EngineError::config(IDENTIFIER_SELECTOR, Some(text), e.to_string()))
}

// ---------------------------------------------------------------------------
// Property bag typing
// ---------------------------------------------------------------------------

/// Type the host's string properties against the declared params.
///
/// Keys that are not declared are ignored; the host passes its own
/// properties in the same bag. Returns only the declared keys present.
pub fn parse_properties(
    props: &HashMap<String, String>,
    params: &[ConfigParam],
) -> HashMap<String, ParamValue> {
    let mut result = HashMap::new();
    for param in params {
        if let Some(text) = props.get(&param.name) {
            result.insert(param.name.clone(), text_to_param_value(text, param));
        }
    }
    for key in props.keys() {
        if !params.iter().any(|p| &p.name == key) {
            tracing::trace!(property = %key, "ignoring undeclared property");
        }
    }
    result
}

/// Build `ConfigValues` from parsed properties.
///
/// For each declared param:
/// - If present in `parsed`: use the value.
/// - If absent with default: use default value.
/// - If absent and required: return error.
pub fn validate_and_build(
    parsed: &HashMap<String, ParamValue>,
    params: &[ConfigParam],
) -> Result<ConfigValues, EngineError> {
    let mut values = ConfigValues::new();

    for param in params {
        match parsed.get(&param.name) {
            Some(v) => values.set(&param.name, v.clone()),
            None => {
                if let Some(ref default) = param.default {
                    values.set(&param.name, default.clone());
                } else if param.required {
                    return Err(EngineError::config(&param.name, None, "not defined"));
                }
            }
        }
    }

    Ok(values)
}

/// Booleans are lenient: `true` in any case is true, anything else false.
fn text_to_param_value(text: &str, param: &ConfigParam) -> ParamValue {
    match param.param_type {
        ParamType::Bool => ParamValue::Bool(text.trim().eq_ignore_ascii_case("true")),
        ParamType::Str => ParamValue::Str(text.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Property files
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct PropertiesFile {
    #[serde(default)]
    properties: BTreeMap<String, toml::Value>,
}

/// Load a property bag from a TOML file with a `[properties]` table.
pub fn load_properties(path: &Path) -> Result<HashMap<String, String>, EngineError> {
    let content = std::fs::read_to_string(path)?;
    parse_properties_toml(&content)
}

/// Parse a property bag from TOML text. Scalars are flattened to strings.
pub fn parse_properties_toml(toml_str: &str) -> Result<HashMap<String, String>, EngineError> {
    let file: PropertiesFile = toml::from_str(toml_str)
        .map_err(|e| EngineError::config("properties", None, e.to_string()))?;
    Ok(file
        .properties
        .iter()
        .map(|(k, v)| (k.clone(), flatten_value(v)))
        .collect())
}

/// Flatten a value into a string for the flat property bag.
///
/// Scalars are converted directly (no quoting).
/// Arrays and tables are serialized as JSON strings.
fn flatten_value(val: &toml::Value) -> String {
    match val {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Datetime(d) => d.to_string(),
        toml::Value::Array(_) | toml::Value::Table(_) => {
            serde_json::to_string(val).unwrap_or_default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> HashMap<String, String> {
        HashMap::from([
            (HOST_ENDPOINT_URI.to_string(), "warp://localhost:9001".to_string()),
            (ADDRESS_TEMPLATE.to_string(), "/user/:id".to_string()),
            (DESTINATION_URI.to_string(), "lane1".to_string()),
        ])
    }

    fn with(key: &str, value: &str) -> HashMap<String, String> {
        let mut props = base();
        props.insert(key.to_string(), value.to_string());
        props
    }

    fn without(key: &str) -> HashMap<String, String> {
        let mut props = base();
        props.remove(key);
        props
    }

    fn error_property(props: HashMap<String, String>) -> String {
        let err = SinkConfig::from_properties(&props).unwrap_err();
        err.property().unwrap_or_default().to_string()
    }

    #[test]
    fn defaults_apply_to_optional_properties() {
        let config = SinkConfig::from_properties(&base()).unwrap();
        assert!(!config.use_value_for_identification);
        assert!(config.identifier_selector.is_identity());
        assert_eq!(config.destination, "lane1");
    }

    #[test]
    fn host_endpoint_requires_warp_scheme() {
        for ok in ["warp://localhost:9001", "warps://localhost:9001"] {
            let config = SinkConfig::from_properties(&with(HOST_ENDPOINT_URI, ok)).unwrap();
            assert_eq!(config.host_endpoint.as_str(), ok);
        }
        for bad in ["localhost:9001", "bad", "", "http://localhost:9001"] {
            assert_eq!(error_property(with(HOST_ENDPOINT_URI, bad)), HOST_ENDPOINT_URI);
        }
        assert_eq!(error_property(without(HOST_ENDPOINT_URI)), HOST_ENDPOINT_URI);
    }

    #[test]
    fn address_template_needs_one_placeholder() {
        for ok in ["/myagent/:id", "/country/US/state/:id"] {
            let config = SinkConfig::from_properties(&with(ADDRESS_TEMPLATE, ok)).unwrap();
            assert_eq!(config.address_template.to_string(), ok);
        }
        for bad in ["", "/myagent", "/a/:x/b/:y"] {
            assert_eq!(error_property(with(ADDRESS_TEMPLATE, bad)), ADDRESS_TEMPLATE);
        }
        assert_eq!(error_property(without(ADDRESS_TEMPLATE)), ADDRESS_TEMPLATE);
    }

    #[test]
    fn destination_must_be_present() {
        let config = SinkConfig::from_properties(&with(DESTINATION_URI, "lane2")).unwrap();
        assert_eq!(config.destination, "lane2");
        assert_eq!(error_property(with(DESTINATION_URI, "")), DESTINATION_URI);
        assert_eq!(error_property(without(DESTINATION_URI)), DESTINATION_URI);
    }

    #[test]
    fn identification_flag_is_lenient() {
        for (text, expected) in [
            ("true", true),
            ("TRUE", true),
            ("false", false),
            ("key", false),
            ("value", false),
            ("", false),
        ] {
            let config =
                SinkConfig::from_properties(&with(USE_VALUE_FOR_IDENTIFICATION, text)).unwrap();
            assert_eq!(config.use_value_for_identification, expected, "{text}");
        }
    }

    #[test]
    fn identifier_selector_is_parsed() {
        let config = SinkConfig::from_properties(&with(IDENTIFIER_SELECTOR, "$id")).unwrap();
        assert_eq!(config.identifier_selector, Selector::identity().get("id"));
        let config = SinkConfig::from_properties(&with(IDENTIFIER_SELECTOR, "$id.key")).unwrap();
        assert_eq!(config.identifier_selector, Selector::identity().get("id").get("key"));
        let config = SinkConfig::from_properties(&with(IDENTIFIER_SELECTOR, "")).unwrap();
        assert!(config.identifier_selector.is_identity());

        for bad in ["id", "id.key"] {
            assert_eq!(error_property(with(IDENTIFIER_SELECTOR, bad)), IDENTIFIER_SELECTOR);
        }
    }

    #[test]
    fn undeclared_properties_are_ignored() {
        let config = SinkConfig::from_properties(&with("connector.class", "x.y.Z")).unwrap();
        assert_eq!(config.destination, "lane1");
    }

    #[test]
    fn declared_params_cover_every_property() {
        let names: Vec<String> = SinkProps::config_params().into_iter().map(|p| p.name).collect();
        assert_eq!(
            names,
            [
                HOST_ENDPOINT_URI,
                ADDRESS_TEMPLATE,
                DESTINATION_URI,
                USE_VALUE_FOR_IDENTIFICATION,
                IDENTIFIER_SELECTOR
            ]
        );
    }

    #[test]
    fn declared_params_are_flags_or_text() {
        for param in SinkProps::config_params() {
            let expected = if param.name == USE_VALUE_FOR_IDENTIFICATION {
                ParamType::Bool
            } else {
                ParamType::Str
            };
            assert_eq!(param.param_type, expected, "{}", param.name);
        }
        let props = with(USE_VALUE_FOR_IDENTIFICATION, " TRUE ");
        let parsed = parse_properties(&props, &SinkProps::config_params());
        assert_eq!(parsed.get(USE_VALUE_FOR_IDENTIFICATION), Some(&ParamValue::Bool(true)));
        assert_eq!(parsed.get(DESTINATION_URI), Some(&ParamValue::Str("lane1".into())));
    }

    #[test]
    fn properties_from_toml() {
        let props = parse_properties_toml(
            r#"
            [properties]
            host-endpoint-uri = "warp://localhost:9001"
            address-template = "/user/:id"
            destination-uri = "lane1"
            use-value-for-identification = true
            "#,
        )
        .unwrap();
        assert_eq!(props.get(USE_VALUE_FOR_IDENTIFICATION).map(String::as_str), Some("true"));
        let config = SinkConfig::from_properties(&props).unwrap();
        assert!(config.use_value_for_identification);
    }

    #[test]
    fn malformed_toml_is_config_error() {
        let err = parse_properties_toml("[properties\n").unwrap_err();
        assert!(matches!(err, EngineError::Config { .. }));
    }
}
