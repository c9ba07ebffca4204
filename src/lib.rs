pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{BridgeDriver, DryRunDriver};
pub use config::{cli::LocalStorage, toml_config::NodeConfig};
pub use core::{engine::ConnectorEngine, node::IbmiNode, pipeline::ConnectorPipeline};
pub use utils::error::{IbmiError, Result};
