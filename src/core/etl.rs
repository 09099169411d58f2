use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::StageMonitor;

/// 單一階段執行結果
#[derive(Debug, Clone, PartialEq)]
pub struct StageReport {
    pub stage: String,
    pub records_in: usize,
    pub records_out: usize,
    pub output_path: String,
    /// 提前中止時的原因
    pub partial: Option<String>,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: StageMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: StageMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<StageReport> {
        let stage = self.pipeline.name();
        tracing::info!("▶️ Starting stage '{}'", stage);

        let raw_data = self.pipeline.extract().await?;
        let records_in = raw_data.len();
        tracing::info!("📥 [{}] Extracted {} records", stage, records_in);
        self.monitor.log_stats(&format!("{} extract", stage));

        let transformed = self.pipeline.transform(raw_data).await?;
        let records_out = transformed.len();
        tracing::info!("🔧 [{}] Transformed into {} records", stage, records_out);
        self.monitor.log_stats(&format!("{} transform", stage));

        let output_path = self.pipeline.load(transformed).await?;
        tracing::info!("💾 [{}] Saved to {}", stage, output_path);
        self.monitor.log_final_stats();

        let partial = self.pipeline.partial_reason();
        if let Some(reason) = &partial {
            tracing::warn!("⚠️ [{}] Output is partial: {}", stage, reason);
        }

        Ok(StageReport {
            stage: stage.to_string(),
            records_in,
            records_out,
            output_path,
            partial,
        })
    }
}
