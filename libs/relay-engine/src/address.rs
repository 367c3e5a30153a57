use std::fmt;

use relay_api::value::Value;

use crate::config::SinkConfig;
use crate::selector::Selector;
use crate::uri_template::UriTemplate;

/// Concrete target address produced by the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address(String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Derives the target address of a record from its converted key or value.
///
/// Built once per task from the validated config. `resolve` returns `None`
/// when no identifier can be extracted; this is an expected outcome and the
/// caller decides what it means for the batch.
#[derive(Debug, Clone)]
pub struct AddressResolver {
    selector: Selector,
    template: UriTemplate,
    use_value: bool,
}

impl AddressResolver {
    pub fn new(selector: Selector, template: UriTemplate, use_value_for_identification: bool) -> Self {
        Self {
            selector,
            template,
            use_value: use_value_for_identification,
        }
    }

    pub fn from_config(config: &SinkConfig) -> Self {
        Self::new(
            config.identifier_selector.clone(),
            config.address_template.clone(),
            config.use_value_for_identification,
        )
    }

    pub fn resolve(&self, key: &Value, value: &Value) -> Option<Address> {
        let (source, root) = if self.use_value {
            ("value", value)
        } else {
            ("key", key)
        };

        let Some(selected) = self.selector.evaluate(root) else {
            tracing::debug!(source, selector = %self.selector, "selector found no identifier");
            return None;
        };
        let Some(id) = selected.render_text() else {
            tracing::debug!(source, selector = %self.selector, "identifier has no text form");
            return None;
        };
        if id.is_empty() {
            tracing::debug!(source, selector = %self.selector, "identifier is empty");
            return None;
        }

        Some(Address(self.template.apply(&id)))
    }
}
