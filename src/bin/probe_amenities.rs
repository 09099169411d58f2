use anyhow::{bail, Context, Result};
use clap::Parser;
use rental_etl::core::analyze::probe_amenity;
use rental_etl::core::{GeoPoint, MapsClient};
use rental_etl::utils::logger;
use rental_etl::{GoogleMapsClient, PipelineConfig};

/// 對單一座標或地址手動檢查周邊設施，確認 API key 與門檻設定
#[derive(Parser)]
#[command(name = "probe-amenities")]
#[command(about = "Check the amenity probes for one location against the live Maps API")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    #[arg(long, requires = "lng", conflicts_with = "address")]
    lat: Option<f64>,

    #[arg(long, requires = "lat")]
    lng: Option<f64>,

    /// Address to geocode when no coordinates are given
    #[arg(long)]
    address: Option<String>,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    let config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("failed to load config file '{}'", path))?,
        None => PipelineConfig::default(),
    };
    let maps = GoogleMapsClient::from_config(&config.maps)?;

    let origin = match (args.lat, args.lng, args.address.as_deref()) {
        (Some(lat), Some(lng), _) => GeoPoint::new(lat, lng),
        (_, _, Some(address)) => maps
            .geocode(address)
            .await?
            .with_context(|| format!("no geocode results for '{}'", address))?,
        _ => bail!("pass either --lat/--lng or --address"),
    };

    println!("📍 Origin: {}", origin.as_query());
    let mut all = true;
    for probe in &config.maps.amenities {
        let found = probe_amenity(&maps, origin, probe).await?;
        all &= found;
        println!(
            "  {} {} (<= {} min)",
            if found { "✅" } else { "❌" },
            probe.kind.flag_name(),
            probe.max_walk_minutes
        );
    }
    println!("{}", if all { "Would be kept" } else { "Would be filtered out" });

    Ok(())
}
