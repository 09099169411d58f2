use crate::config::toml_config::PipelineConfig;
use crate::core::{stage_io, AnalyzedRental, Pipeline, Storage};
use crate::utils::error::Result;

/// 三個旗標都為 true 才保留
pub fn has_all_amenities(rental: &AnalyzedRental) -> bool {
    rental.amenities.all()
}

pub struct FilterPipeline<S: Storage> {
    pub(crate) storage: S,
    pub(crate) config: PipelineConfig,
}

impl<S: Storage> FilterPipeline<S> {
    pub fn new(storage: S, config: PipelineConfig) -> Self {
        Self { storage, config }
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for FilterPipeline<S> {
    type Input = AnalyzedRental;
    type Output = AnalyzedRental;

    fn name(&self) -> &'static str {
        "filter"
    }

    async fn extract(&self) -> Result<Vec<AnalyzedRental>> {
        stage_io::read_json_array(&self.storage, &self.config.files.analyzed).await
    }

    async fn transform(&self, data: Vec<AnalyzedRental>) -> Result<Vec<AnalyzedRental>> {
        let filtered: Vec<AnalyzedRental> = data.into_iter().filter(has_all_amenities).collect();
        tracing::info!("Total unique rentals: {}", filtered.len());
        Ok(filtered)
    }

    async fn load(&self, data: Vec<AnalyzedRental>) -> Result<String> {
        let name = &self.config.files.final_listings;
        stage_io::write_json_array(&self.storage, name, &data).await?;
        tracing::info!("Saved to {}", name);
        Ok(name.clone())
    }
}
