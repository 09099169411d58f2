use crate::config::toml_config::{AmenityProbe, PipelineConfig};
use crate::core::{
    stage_io, AmenityFlags, AnalyzedRental, GeoPoint, MapsClient, Pipeline, Rental, Storage,
};
use crate::utils::error::Result;
use std::sync::OnceLock;

/// 依序嘗試搜尋組合，取第一個找到的地點，判斷步行時間是否在門檻內
pub async fn probe_amenity<M: MapsClient + ?Sized>(
    maps: &M,
    origin: GeoPoint,
    probe: &AmenityProbe,
) -> Result<bool> {
    let mut nearest = None;
    for (place_type, keyword) in probe.searches() {
        nearest = maps.nearest_place(origin, place_type, keyword).await?;
        if nearest.is_some() {
            break;
        }
    }

    let Some(place) = nearest else {
        tracing::debug!("No {} found near {}", probe.kind.flag_name(), origin.as_query());
        return Ok(false);
    };

    let walking = maps.walking_time_seconds(origin, place.location).await?;
    tracing::debug!(
        "{}: nearest {:?} is {:?}s away on foot",
        probe.kind.flag_name(),
        place.name,
        walking
    );

    Ok(matches!(walking, Some(seconds) if seconds <= probe.max_walk_seconds()))
}

/// 先用 location 的座標，沒有時改用地址做地理編碼
pub async fn resolve_origin<M: MapsClient + ?Sized>(
    maps: &M,
    rental: &Rental,
) -> Result<Option<GeoPoint>> {
    if let Some(point) = rental.coordinates() {
        return Ok(Some(point));
    }
    match rental.address.as_deref() {
        Some(address) if !address.trim().is_empty() => maps.geocode(address).await,
        _ => Ok(None),
    }
}

/// 無法定位的物件所有旗標皆為 false
pub async fn analyze_rental<M: MapsClient + ?Sized>(
    maps: &M,
    probes: &[AmenityProbe],
    rental: Rental,
) -> Result<AnalyzedRental> {
    let mut amenities = AmenityFlags::default();

    match resolve_origin(maps, &rental).await? {
        Some(origin) => {
            for probe in probes {
                let found = probe_amenity(maps, origin, probe).await?;
                amenities.set(probe.kind, found);
            }
        }
        None => tracing::warn!("Rental {} has no usable location, all flags false", rental.id),
    }

    Ok(AnalyzedRental::new(rental, amenities))
}

pub struct AnalyzePipeline<S: Storage, M: MapsClient> {
    pub(crate) storage: S,
    pub(crate) config: PipelineConfig,
    pub(crate) maps: M,
    stopped: OnceLock<String>,
}

impl<S: Storage, M: MapsClient> AnalyzePipeline<S, M> {
    pub fn new(storage: S, config: PipelineConfig, maps: M) -> Self {
        Self {
            storage,
            config,
            maps,
            stopped: OnceLock::new(),
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, M: MapsClient> Pipeline for AnalyzePipeline<S, M> {
    type Input = Rental;
    type Output = AnalyzedRental;

    fn name(&self) -> &'static str {
        "analyze"
    }

    async fn extract(&self) -> Result<Vec<Rental>> {
        stage_io::read_json_array(&self.storage, &self.config.files.preprocessed).await
    }

    async fn transform(&self, data: Vec<Rental>) -> Result<Vec<AnalyzedRental>> {
        let total = data.len();
        let probes = &self.config.maps.amenities;
        let mut analyzed = Vec::with_capacity(total);

        for (index, rental) in data.into_iter().enumerate() {
            let id = rental.id.clone();
            match analyze_rental(&self.maps, probes, rental).await {
                Ok(result) => {
                    tracing::debug!("[{}/{}] {} -> {:?}", index + 1, total, id, result.amenities);
                    analyzed.push(result);
                }
                Err(e) => {
                    // 地圖 API 出錯即停止，保留已分析的結果
                    tracing::error!("❌ Maps lookup failed for rental {}: {}", id, e);
                    tracing::warn!(
                        "❌ Stopping early. Keeping {} of {} rentals.",
                        analyzed.len(),
                        total
                    );
                    let _ = self.stopped.set(format!(
                        "maps lookup failed at rental {} ({}/{}): {}",
                        id,
                        index + 1,
                        total,
                        e
                    ));
                    break;
                }
            }
        }

        Ok(analyzed)
    }

    async fn load(&self, data: Vec<AnalyzedRental>) -> Result<String> {
        let name = &self.config.files.analyzed;
        stage_io::write_json_array(&self.storage, name, &data).await?;
        tracing::info!("Saved to {}", name);
        Ok(name.clone())
    }

    fn partial_reason(&self) -> Option<String> {
        self.stopped.get().cloned()
    }
}
