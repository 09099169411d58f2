pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::cli::LocalStorage;

pub use adapters::{GoogleMapsClient, VendorClient};
pub use config::toml_config::PipelineConfig;
pub use core::etl::{EtlEngine, StageReport};
pub use utils::error::{EtlError, Result};
