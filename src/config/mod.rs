pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use toml_config::PipelineConfig;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "rental-etl")]
#[command(about = "Fetch rental listings, check nearby amenities and build the final URL list")]
pub struct CliConfig {
    /// Path to a TOML configuration file (defaults are used when omitted)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Directory holding the JSON files passed between stages
    #[arg(short, long, default_value = ".", global = true)]
    pub work_dir: String,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log process stats after each stage")]
    pub monitor: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Page through the vendor API and save the raw listings
    Fetch {
        /// Maximum pages to fetch (0 keeps paging until an empty page)
        #[arg(long)]
        max_pages: Option<u32>,
        #[arg(long)]
        delay_ms: Option<u64>,
    },
    /// Merge, filter and deduplicate the fetched listing files
    Preprocess,
    /// Look up walking distance to nearby amenities
    Analyze,
    /// Keep only rentals with every amenity nearby
    Filter,
    /// Turn the final rentals into listing URLs
    Urls,
    /// Run every stage in order
    Run {
        /// Maximum pages to fetch (0 keeps paging until an empty page)
        #[arg(long)]
        max_pages: Option<u32>,
        #[arg(long)]
        delay_ms: Option<u64>,
    },
    /// Print the effective configuration
    ShowConfig,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// 載入設定檔並套用命令列覆蓋
    pub fn load_pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)?,
            None => PipelineConfig::default(),
        };

        if let Command::Fetch {
            max_pages,
            delay_ms,
        }
        | Command::Run {
            max_pages,
            delay_ms,
        } = &self.command
        {
            if let Some(max_pages) = max_pages {
                config.vendor.max_pages = (*max_pages > 0).then_some(*max_pages);
            }
            if let Some(delay_ms) = delay_ms {
                config.vendor.page_delay_ms = *delay_ms;
            }
        }

        if self.monitor {
            config.monitoring.enabled = true;
        }

        Ok(config)
    }
}
