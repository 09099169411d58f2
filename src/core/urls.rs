use crate::config::toml_config::PipelineConfig;
use crate::core::{stage_io, AnalyzedRental, Pipeline, Storage};
use crate::utils::error::Result;

pub fn build_listing_url(base_url: &str, id: &str) -> String {
    format!("{}{}", base_url, id)
}

pub struct UrlPipeline<S: Storage> {
    pub(crate) storage: S,
    pub(crate) config: PipelineConfig,
}

impl<S: Storage> UrlPipeline<S> {
    pub fn new(storage: S, config: PipelineConfig) -> Self {
        Self { storage, config }
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for UrlPipeline<S> {
    type Input = AnalyzedRental;
    type Output = String;

    fn name(&self) -> &'static str {
        "urls"
    }

    async fn extract(&self) -> Result<Vec<AnalyzedRental>> {
        stage_io::read_json_array(&self.storage, &self.config.files.final_listings).await
    }

    async fn transform(&self, data: Vec<AnalyzedRental>) -> Result<Vec<String>> {
        let base_url = &self.config.urls.base_url;
        Ok(data
            .iter()
            .map(|item| build_listing_url(base_url, &item.rental.id))
            .collect())
    }

    async fn load(&self, data: Vec<String>) -> Result<String> {
        let name = &self.config.files.final_urls;
        stage_io::write_json_array(&self.storage, name, &data).await?;
        tracing::info!("Saved to {}", name);
        Ok(name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_listing_url() {
        assert_eq!(
            build_listing_url("https://www.sumyca.com/listings/", "abc-123"),
            "https://www.sumyca.com/listings/abc-123"
        );
    }
}
