use crate::config::toml_config::PipelineConfig;
use crate::core::analyze::AnalyzePipeline;
use crate::core::etl::{EtlEngine, StageReport};
use crate::core::fetch::FetchPipeline;
use crate::core::postprocess::FilterPipeline;
use crate::core::preprocess::PreprocessPipeline;
use crate::core::urls::UrlPipeline;
use crate::core::{MapsClient, Storage};
use crate::utils::error::Result;

/// 依序執行全部階段，任何階段失敗即中止
pub async fn run_all<S, M>(storage: S, config: &PipelineConfig, maps: M) -> Result<Vec<StageReport>>
where
    S: Storage + Clone,
    M: MapsClient,
{
    let monitor = config.monitoring_enabled();
    let mut reports = Vec::with_capacity(5);

    let fetch = FetchPipeline::new(storage.clone(), config.clone());
    reports.push(EtlEngine::new_with_monitoring(fetch, monitor).run().await?);

    let preprocess = PreprocessPipeline::new(storage.clone(), config.clone());
    reports.push(EtlEngine::new_with_monitoring(preprocess, monitor).run().await?);

    let analyze = AnalyzePipeline::new(storage.clone(), config.clone(), maps);
    reports.push(EtlEngine::new_with_monitoring(analyze, monitor).run().await?);

    let filter = FilterPipeline::new(storage.clone(), config.clone());
    reports.push(EtlEngine::new_with_monitoring(filter, monitor).run().await?);

    let urls = UrlPipeline::new(storage, config.clone());
    reports.push(EtlEngine::new_with_monitoring(urls, monitor).run().await?);

    Ok(reports)
}
