//! Pipeline configuration
//!
//! JSON file with one section per component. Every field has a default,
//! so a file only needs to name what it changes.

mod loader;
mod types;

pub use loader::{ConfigError, load_config, load_config_from_str, load_default_config};
pub use types::{ArgusConfig, ChannelColumn, HttpConfig, ModelConfig, SourceConfig};
