use clap::Parser;
use rental_etl::config::Command;
use rental_etl::core::analyze::AnalyzePipeline;
use rental_etl::core::fetch::FetchPipeline;
use rental_etl::core::postprocess::FilterPipeline;
use rental_etl::core::preprocess::PreprocessPipeline;
use rental_etl::core::runner;
use rental_etl::core::urls::UrlPipeline;
use rental_etl::core::Pipeline;
use rental_etl::utils::error::ErrorSeverity;
use rental_etl::utils::{logger, validation::Validate};
use rental_etl::{
    CliConfig, EtlEngine, EtlError, GoogleMapsClient, LocalStorage, PipelineConfig, StageReport,
};
use std::path::Path;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting rental-etl");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.load_pipeline_config() {
        Ok(config) => config,
        Err(e) => fail(e),
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        fail(e);
    }

    if config.monitoring_enabled() {
        tracing::info!("🔍 System monitoring enabled");
    }

    let storage = LocalStorage::new(cli.work_dir.clone());

    let result = match &cli.command {
        Command::ShowConfig => {
            match config.to_redacted_toml() {
                Ok(rendered) => println!("{}", rendered),
                Err(e) => fail(e),
            }
            return Ok(());
        }
        Command::Fetch { .. } => run_stage(FetchPipeline::new(storage, config.clone()), &config)
            .await
            .map(|report| vec![report]),
        Command::Preprocess => {
            run_stage(PreprocessPipeline::new(storage, config.clone()), &config)
                .await
                .map(|report| vec![report])
        }
        Command::Analyze => match GoogleMapsClient::from_config(&config.maps) {
            Ok(maps) => run_stage(AnalyzePipeline::new(storage, config.clone(), maps), &config)
                .await
                .map(|report| vec![report]),
            Err(e) => Err(e),
        },
        Command::Filter => run_stage(FilterPipeline::new(storage, config.clone()), &config)
            .await
            .map(|report| vec![report]),
        Command::Urls => run_stage(UrlPipeline::new(storage, config.clone()), &config)
            .await
            .map(|report| vec![report]),
        Command::Run { .. } => {
            // 先確認 API key，避免抓完資料才失敗
            match GoogleMapsClient::from_config(&config.maps) {
                Ok(maps) => runner::run_all(storage, &config, maps).await,
                Err(e) => Err(e),
            }
        }
    };

    match result {
        Ok(reports) => {
            let mut partial = false;
            for report in &reports {
                let path = Path::new(&cli.work_dir).join(&report.output_path);
                tracing::info!(
                    "✅ {}: {} in, {} out -> {}",
                    report.stage,
                    report.records_in,
                    report.records_out,
                    path.display()
                );
                println!(
                    "✅ {}: {} records saved to {}",
                    report.stage,
                    report.records_out,
                    path.display()
                );
                if let Some(reason) = &report.partial {
                    partial = true;
                    tracing::warn!("⚠️ {} stopped early: {}", report.stage, reason);
                    eprintln!("⚠️ {} output is incomplete: {}", report.stage, reason);
                }
            }
            // 階段提前中止時輸出不完整，以非零退出碼提醒
            if partial {
                std::process::exit(2);
            }
        }
        Err(e) => {
            tracing::error!(
                "❌ Pipeline failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            fail(e);
        }
    }

    Ok(())
}

async fn run_stage<P: Pipeline>(
    pipeline: P,
    config: &PipelineConfig,
) -> rental_etl::Result<StageReport> {
    EtlEngine::new_with_monitoring(pipeline, config.monitoring_enabled())
        .run()
        .await
}

/// 輸出錯誤與建議，依嚴重程度決定退出碼
fn fail(e: EtlError) -> ! {
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
