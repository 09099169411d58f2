use crate::config::toml_config::{PipelineConfig, PreprocessConfig};
use crate::core::{stage_io, Pipeline, RawListing, Rental, Storage};
use crate::utils::error::{EtlError, Result};
use regex::Regex;
use std::collections::HashMap;

/// 把 `listings_tokyo_*.json` 這類 glob 轉成完整比對的正規表達式
pub fn glob_to_regex(pattern: &str) -> Result<Regex> {
    let mut expr = String::from("^");
    for ch in pattern.chars() {
        match ch {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            other => expr.push_str(&regex::escape(&other.to_string())),
        }
    }
    expr.push('$');

    Regex::new(&expr).map_err(|e| EtlError::InvalidConfigValueError {
        field: "preprocess.input_glob".to_string(),
        value: pattern.to_string(),
        reason: e.to_string(),
    })
}

/// 只取後續階段需要的欄位；缺少必要欄位回傳 None
pub fn format_listing(raw: &RawListing) -> Option<Rental> {
    let id = match raw.get("id")? {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let layout_type = raw.get("layoutType")?.as_str()?.to_string();
    let total_daily_cost = match raw.get("totalDailyCost")? {
        serde_json::Value::Number(n) => n.clone(),
        _ => return None,
    };
    let location = raw
        .get("location")
        .cloned()
        .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));
    let address = raw
        .get("address")
        .and_then(|v| v.as_str())
        .map(str::to_string);

    Some(Rental {
        id,
        layout_type,
        total_daily_cost,
        location,
        address,
        extra: serde_json::Map::new(),
    })
}

/// 太貴或格局被排除的物件不保留
pub fn passes_filters(rental: &Rental, config: &PreprocessConfig) -> bool {
    match rental.daily_cost() {
        Some(cost) if cost < config.max_daily_cost => {}
        _ => return false,
    }
    !config
        .excluded_layouts
        .iter()
        .any(|layout| layout == &rental.layout_type)
}

/// 以 id 去重：後出現的值覆蓋先前的，順序維持第一次出現的位置
pub fn dedupe_by_id(rentals: impl IntoIterator<Item = Rental>) -> Vec<Rental> {
    let mut unique: Vec<Rental> = Vec::new();
    let mut index_by_id: HashMap<String, usize> = HashMap::new();

    for rental in rentals {
        match index_by_id.get(&rental.id) {
            Some(&index) => unique[index] = rental,
            None => {
                index_by_id.insert(rental.id.clone(), unique.len());
                unique.push(rental);
            }
        }
    }

    unique
}

pub struct PreprocessPipeline<S: Storage> {
    pub(crate) storage: S,
    pub(crate) config: PipelineConfig,
}

impl<S: Storage> PreprocessPipeline<S> {
    pub fn new(storage: S, config: PipelineConfig) -> Self {
        Self { storage, config }
    }

    /// 符合 glob 的輸入檔，依檔名排序；略過下游階段的輸出檔
    pub async fn input_files(&self) -> Result<Vec<String>> {
        let matcher = glob_to_regex(&self.config.preprocess.input_glob)?;
        let derived = self.config.files.derived_outputs();

        let mut names: Vec<String> = self
            .storage
            .list_files()
            .await?
            .into_iter()
            .filter(|name| matcher.is_match(name))
            .filter(|name| !derived.contains(&name.as_str()))
            .collect();
        names.sort();
        Ok(names)
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for PreprocessPipeline<S> {
    type Input = RawListing;
    type Output = Rental;

    fn name(&self) -> &'static str {
        "preprocess"
    }

    async fn extract(&self) -> Result<Vec<RawListing>> {
        let files = self.input_files().await?;
        if files.is_empty() {
            tracing::warn!(
                "No files matching '{}' in the working directory",
                self.config.preprocess.input_glob
            );
        }

        let mut listings = Vec::new();
        for name in files {
            tracing::info!("Loading {} ...", name);
            let items: Vec<RawListing> = stage_io::read_json_array(&self.storage, &name).await?;
            tracing::debug!("{} items in {}", items.len(), name);
            listings.extend(items);
        }
        Ok(listings)
    }

    async fn transform(&self, data: Vec<RawListing>) -> Result<Vec<Rental>> {
        let mut skipped = 0usize;
        let formatted = data.iter().filter_map(|raw| {
            let rental = format_listing(raw);
            if rental.is_none() {
                skipped += 1;
            }
            rental
        });

        let kept: Vec<Rental> = formatted
            .filter(|rental| passes_filters(rental, &self.config.preprocess))
            .collect();
        let unique = dedupe_by_id(kept);

        if skipped > 0 {
            tracing::warn!("Skipped {} listings missing id/layoutType/totalDailyCost", skipped);
        }
        tracing::info!("Total unique rentals: {}", unique.len());
        Ok(unique)
    }

    async fn load(&self, data: Vec<Rental>) -> Result<String> {
        let name = &self.config.files.preprocessed;
        stage_io::write_json_array(&self.storage, name, &data).await?;
        tracing::info!("Saved processed rentals to {}", name);
        Ok(name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rental(id: &str, layout: &str, cost: u32) -> Rental {
        Rental {
            id: id.to_string(),
            layout_type: layout.to_string(),
            total_daily_cost: serde_json::Number::from(cost),
            location: json!({}),
            address: None,
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_glob_to_regex() {
        let re = glob_to_regex("listings_tokyo_*.json").unwrap();
        assert!(re.is_match("listings_tokyo_taito.json"));
        assert!(re.is_match("listings_tokyo_.json"));
        assert!(!re.is_match("listings_osaka_kita.json"));
        assert!(!re.is_match("listings_tokyo_taito.json.bak"));
        assert!(!re.is_match("listings_tokyoXtaito.json"));
    }

    #[test]
    fn test_format_listing_projects_fields() {
        let raw = json!({
            "id": "L-1",
            "layoutType": "1LDK",
            "totalDailyCost": 8000,
            "location": {"lat": 35.7, "lng": 139.8},
            "title": "dropped"
        });

        let formatted = format_listing(&raw).unwrap();
        assert_eq!(formatted.id, "L-1");
        assert_eq!(formatted.total_daily_cost, serde_json::Number::from(8000u32));
        assert_eq!(formatted.location, json!({"lat": 35.7, "lng": 139.8}));

        let text = serde_json::to_string(&formatted).unwrap();
        assert!(!text.contains("title"));
        assert!(text.contains("\"totalDailyCost\":8000,"));
    }

    #[test]
    fn test_format_listing_defaults_location() {
        let raw = json!({"id": "L-2", "layoutType": "2K", "totalDailyCost": 1.5});
        assert_eq!(format_listing(&raw).unwrap().location, json!({}));
    }

    #[test]
    fn test_format_listing_requires_core_fields() {
        assert!(format_listing(&json!({"id": "L-3", "layoutType": "2K"})).is_none());
        assert!(
            format_listing(&json!({"id": "L-3", "layoutType": "2K", "totalDailyCost": "9000"}))
                .is_none()
        );
        assert!(format_listing(&json!({"layoutType": "2K", "totalDailyCost": 1})).is_none());
    }

    #[test]
    fn test_expensive_listing_is_excluded() {
        let config = PreprocessConfig::default();
        assert!(!passes_filters(&rental("a", "1LDK", 13333), &config));
        assert!(!passes_filters(&rental("a", "1LDK", 20000), &config));
        assert!(passes_filters(&rental("a", "1LDK", 13332), &config));

        let mut fractional = rental("a", "1LDK", 0);
        fractional.total_daily_cost = serde_json::Number::from_f64(13332.5).unwrap();
        assert!(passes_filters(&fractional, &config));
    }

    #[test]
    fn test_studio_layout_is_excluded() {
        let config = PreprocessConfig::default();
        assert!(!passes_filters(&rental("a", "1K", 5000), &config));
        assert!(passes_filters(&rental("a", "1DK", 5000), &config));
    }

    #[test]
    fn test_dedupe_last_write_wins_first_position_kept() {
        let unique = dedupe_by_id(vec![
            rental("a", "1LDK", 1000),
            rental("b", "2LDK", 2000),
            rental("a", "1LDK", 1500),
        ]);

        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].id, "a");
        assert_eq!(unique[0].daily_cost(), Some(1500.0));
        assert_eq!(unique[1].id, "b");
    }
}
