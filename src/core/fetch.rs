use crate::adapters::vendor::{StopReason, VendorClient};
use crate::config::toml_config::PipelineConfig;
use crate::core::{stage_io, Pipeline, RawListing, Storage};
use crate::utils::error::Result;
use std::sync::OnceLock;
use std::time::Duration;

/// 從供應商 API 分頁抓取物件，原樣存檔
pub struct FetchPipeline<S: Storage> {
    pub(crate) storage: S,
    pub(crate) config: PipelineConfig,
    pub(crate) client: VendorClient,
    stopped: OnceLock<String>,
}

impl<S: Storage> FetchPipeline<S> {
    pub fn new(storage: S, config: PipelineConfig) -> Self {
        let client = VendorClient::new(config.vendor.clone());
        Self {
            storage,
            config,
            client,
            stopped: OnceLock::new(),
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for FetchPipeline<S> {
    type Input = RawListing;
    type Output = RawListing;

    fn name(&self) -> &'static str {
        "fetch"
    }

    async fn extract(&self) -> Result<Vec<RawListing>> {
        let vendor = &self.config.vendor;
        tracing::info!("🚀 Fetching listings from: {}", vendor.api_url);

        let outcome = self
            .client
            .fetch_all_listings(vendor.page_limit(), Duration::from_millis(vendor.page_delay_ms))
            .await;

        match &outcome.stop_reason {
            StopReason::Failed { page, message } => {
                tracing::warn!(
                    "⚠️ Kept {} listings from {} pages; page {} failed: {}",
                    outcome.listings.len(),
                    outcome.pages_fetched,
                    page,
                    message
                );
                let _ = self
                    .stopped
                    .set(format!("vendor page {} failed: {}", page, message));
            }
            reason => tracing::info!(
                "📊 Fetched {} pages ({:?})",
                outcome.pages_fetched,
                reason
            ),
        }

        Ok(outcome.listings)
    }

    async fn transform(&self, data: Vec<RawListing>) -> Result<Vec<RawListing>> {
        Ok(data)
    }

    async fn load(&self, data: Vec<RawListing>) -> Result<String> {
        let name = &self.config.files.raw_listings;
        stage_io::write_json_array(&self.storage, name, &data).await?;
        tracing::info!("Saved {} listings to {}", data.len(), name);
        Ok(name.clone())
    }

    fn partial_reason(&self) -> Option<String> {
        self.stopped.get().cloned()
    }
}
