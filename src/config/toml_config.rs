use crate::domain::model::AmenityKind;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const MAPS_API_KEY_ENV: &str = "GOOGLE_MAPS_API_KEY";

/// 整條管線的設定，所有欄位都有預設值，空檔案也合法
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub vendor: VendorConfig,
    pub preprocess: PreprocessConfig,
    pub maps: MapsConfig,
    pub urls: UrlConfig,
    pub files: FilesConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VendorConfig {
    pub api_url: String,
    pub timeout_seconds: u64,
    /// 0 表示不限頁數，抓到空頁為止
    pub max_pages: Option<u32>,
    pub page_delay_ms: u64,
    pub params: BTreeMap<String, serde_json::Value>,
}

impl Default for VendorConfig {
    fn default() -> Self {
        let mut params = BTreeMap::new();
        params.insert("locationName".to_string(), "日本、東京都台東区".into());
        params.insert("radius".to_string(), 20.into());
        // 固定 Wi-Fi / 行動 Wi-Fi
        params.insert("keywordIds".to_string(), "49,47".into());
        params.insert("minSize".to_string(), 30.into());
        params.insert("minNumGuests".to_string(), 2.into());
        params.insert("itemsPerPage".to_string(), 50.into());
        params.insert("locale".to_string(), "ja".into());

        Self {
            api_url: "https://api-sumyca.m2msystems.cloud/search_listings_with_room_type/location_name_and_conditions".to_string(),
            timeout_seconds: 10,
            max_pages: Some(60),
            page_delay_ms: 1000,
            params,
        }
    }
}

impl VendorConfig {
    /// 實際的頁數上限；未設定或 0 為 None
    pub fn page_limit(&self) -> Option<u32> {
        self.max_pages.filter(|max| *max > 0)
    }

    /// 查詢參數轉成字串；字串值不加引號
    pub fn query_params(&self) -> Vec<(String, String)> {
        self.params
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (key.clone(), value)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub input_glob: String,
    /// 每日費用大於等於此值的物件會被排除
    pub max_daily_cost: f64,
    pub excluded_layouts: Vec<String>,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            input_glob: "listings_tokyo_*.json".to_string(),
            max_daily_cost: 13333.0,
            // 排除小套房
            excluded_layouts: vec!["1K".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmenityProbe {
    pub kind: AmenityKind,
    #[serde(default)]
    pub place_type: Option<String>,
    /// 依序嘗試，找到地點即停止
    #[serde(default)]
    pub keywords: Vec<String>,
    pub max_walk_minutes: u64,
}

impl AmenityProbe {
    /// 依序要送出的 (type, keyword) 搜尋組合
    pub fn searches(&self) -> Vec<(Option<&str>, Option<&str>)> {
        let place_type = self.place_type.as_deref();
        if self.keywords.is_empty() {
            vec![(place_type, None)]
        } else {
            self.keywords
                .iter()
                .map(|keyword| (place_type, Some(keyword.as_str())))
                .collect()
        }
    }

    pub fn max_walk_seconds(&self) -> u64 {
        self.max_walk_minutes.saturating_mul(60)
    }
}

pub fn default_amenity_probes() -> Vec<AmenityProbe> {
    vec![
        AmenityProbe {
            kind: AmenityKind::ConvenienceStore,
            place_type: Some("convenience_store".to_string()),
            keywords: Vec::new(),
            max_walk_minutes: 7,
        },
        AmenityProbe {
            kind: AmenityKind::Metro,
            place_type: Some("subway_station".to_string()),
            keywords: Vec::new(),
            max_walk_minutes: 10,
        },
        AmenityProbe {
            kind: AmenityKind::Coworking,
            place_type: None,
            keywords: vec![
                "coworking space".to_string(),
                "コワーキングスペース".to_string(),
            ],
            max_walk_minutes: 10,
        },
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapsConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout_seconds: u64,
    pub language: String,
    pub region: String,
    pub amenities: Vec<AmenityProbe>,
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://maps.googleapis.com/maps/api".to_string(),
            timeout_seconds: 10,
            language: "ja".to_string(),
            region: "jp".to_string(),
            amenities: default_amenity_probes(),
        }
    }
}

impl MapsConfig {
    /// 設定檔優先，其次環境變數；未替換的 `${...}` 視為未設定
    pub fn resolve_api_key(&self) -> Result<String> {
        let from_config = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && !key.starts_with("${"))
            .map(str::to_string);

        let from_env = std::env::var(MAPS_API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty());

        let key = from_config.or(from_env);
        validation::validate_required_field(MAPS_API_KEY_ENV, &key).cloned()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UrlConfig {
    pub base_url: String,
}

impl Default for UrlConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.sumyca.com/listings/".to_string(),
        }
    }
}

/// 各階段之間交接用的檔名
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    pub raw_listings: String,
    pub preprocessed: String,
    pub analyzed: String,
    pub final_listings: String,
    pub final_urls: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            raw_listings: "listings_tokyo_taito.json".to_string(),
            preprocessed: "preprocessed.json".to_string(),
            analyzed: "listings_tokyo_with_amenities.json".to_string(),
            final_listings: "final.json".to_string(),
            final_urls: "final_urls.json".to_string(),
        }
    }
}

impl FilesConfig {
    /// 下游階段的輸出檔，前處理掃描輸入時要略過
    pub fn derived_outputs(&self) -> [&str; 4] {
        [
            &self.preprocessed,
            &self.analyzed,
            &self.final_listings,
            &self.final_urls,
        ]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub enabled: bool,
}

impl PipelineConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GOOGLE_MAPS_API_KEY})，找不到時保留原字串
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.enabled
    }

    /// 顯示用，遮蔽 API key
    pub fn to_redacted_toml(&self) -> Result<String> {
        let mut redacted = self.clone();
        if redacted.maps.api_key.is_some() {
            redacted.maps.api_key = Some("********".to_string());
        }
        toml::to_string_pretty(&redacted).map_err(|e| EtlError::ConfigError {
            message: format!("Failed to render configuration: {}", e),
        })
    }
}

impl Validate for PipelineConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("vendor.api_url", &self.vendor.api_url)?;
        validation::validate_positive_number(
            "vendor.timeout_seconds",
            self.vendor.timeout_seconds,
            1,
        )?;

        validation::validate_non_empty_string("preprocess.input_glob", &self.preprocess.input_glob)?;
        let max_cost = self.preprocess.max_daily_cost;
        if max_cost.is_nan() || max_cost <= 0.0 {
            return Err(EtlError::InvalidConfigValueError {
                field: "preprocess.max_daily_cost".to_string(),
                value: self.preprocess.max_daily_cost.to_string(),
                reason: "Value must be greater than 0".to_string(),
            });
        }

        validation::validate_url("maps.base_url", &self.maps.base_url)?;
        validation::validate_positive_number("maps.timeout_seconds", self.maps.timeout_seconds, 1)?;
        for kind in AmenityKind::ALL {
            let count = self.maps.amenities.iter().filter(|p| p.kind == kind).count();
            if count != 1 {
                return Err(EtlError::ConfigValidationError {
                    field: "maps.amenities".to_string(),
                    message: format!(
                        "expected exactly one probe for '{}', found {}",
                        kind.flag_name(),
                        count
                    ),
                });
            }
        }
        for probe in &self.maps.amenities {
            if probe.place_type.is_none() && probe.keywords.is_empty() {
                return Err(EtlError::ConfigValidationError {
                    field: "maps.amenities".to_string(),
                    message: format!(
                        "probe '{}' needs a place_type or at least one keyword",
                        probe.kind.flag_name()
                    ),
                });
            }
            validation::validate_positive_number(
                "maps.amenities.max_walk_minutes",
                probe.max_walk_minutes,
                1,
            )?;
        }

        validation::validate_url("urls.base_url", &self.urls.base_url)?;

        validation::validate_file_name("files.raw_listings", &self.files.raw_listings)?;
        validation::validate_file_name("files.preprocessed", &self.files.preprocessed)?;
        validation::validate_file_name("files.analyzed", &self.files.analyzed)?;
        validation::validate_file_name("files.final_listings", &self.files.final_listings)?;
        validation::validate_file_name("files.final_urls", &self.files.final_urls)?;

        Ok(())
    }
}
