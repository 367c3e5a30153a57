pub mod address;
pub mod config;
pub mod connector;
pub mod convert;
pub mod document;
pub mod envelope;
pub mod error;
pub mod selector;
pub mod task;
pub mod uri_template;

/// Version reported by connectors and tasks.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
