use std::collections::HashMap;

use relay_api::dispatch::Dispatcher;
use relay_api::record::SinkRecord;

use crate::address::AddressResolver;
use crate::config::SinkConfig;
use crate::convert::MessageConverter;
use crate::error::EngineError;

/// One running sink task.
///
/// Created by `start` from the host's properties; the converter, resolver
/// and dispatcher are owned by the task and live until `stop`.
pub struct SinkTask<D: Dispatcher> {
    config: SinkConfig,
    converter: MessageConverter,
    resolver: AddressResolver,
    dispatcher: D,
}

impl<D: Dispatcher> SinkTask<D> {
    /// Validate the properties and set up the task.
    ///
    /// Configuration errors are returned before any record is processed.
    pub fn start(props: &HashMap<String, String>, dispatcher: D) -> Result<Self, EngineError> {
        let config = SinkConfig::from_properties(props)?;
        Ok(Self::with_config(config, MessageConverter::new(), dispatcher))
    }

    pub fn with_config(config: SinkConfig, converter: MessageConverter, dispatcher: D) -> Self {
        let resolver = AddressResolver::from_config(&config);
        tracing::info!(
            host = %config.host_endpoint,
            template = %config.address_template,
            destination = %config.destination,
            "sink task started"
        );
        Self {
            config,
            converter,
            resolver,
            dispatcher,
        }
    }

    pub fn config(&self) -> &SinkConfig {
        &self.config
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Relay a batch, in order.
    ///
    /// The first record that fails to convert, resolves to no address, or
    /// is refused by the dispatcher aborts the batch; records before it have
    /// already been sent. Returns the number of records sent.
    pub fn put(&self, records: &[SinkRecord]) -> Result<usize, EngineError> {
        for (index, record) in records.iter().enumerate() {
            let key = self
                .converter
                .convert_key(record)
                .map_err(|e| EngineError::Conversion(e).with_context(format!("record {index}")))?;
            let value = self
                .converter
                .convert_value(record)
                .map_err(|e| EngineError::Conversion(e).with_context(format!("record {index}")))?;

            let Some(address) = self.resolver.resolve(&key, &value) else {
                tracing::warn!(index, batch = records.len(), "no address for record, aborting batch");
                return Err(EngineError::UnresolvedAddress { index });
            };

            tracing::trace!(index, address = %address, "dispatching record");
            self.dispatcher
                .send(
                    self.config.host_endpoint.as_str(),
                    address.as_str(),
                    &self.config.destination,
                    &value,
                )
                .map_err(|e| EngineError::Dispatch(e).with_context(format!("record {index}")))?;
        }
        tracing::debug!(records = records.len(), "batch relayed");
        Ok(records.len())
    }

    /// Release the task and hand back its dispatcher.
    pub fn stop(self) -> D {
        tracing::info!(host = %self.config.host_endpoint, "sink task stopped");
        self.dispatcher
    }

    pub fn version(&self) -> &'static str {
        crate::VERSION
    }
}
