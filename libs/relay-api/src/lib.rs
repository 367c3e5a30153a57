pub mod config;
pub mod dispatch;

pub use relay_api_derive::ConfigParams;
pub mod error;
pub mod record;
pub mod schema;
pub mod value;
