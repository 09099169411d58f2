use serde::{Deserialize, Serialize};

/// 供應商 API 回傳的原始物件，原封不動保存
pub type RawListing = serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Google Maps 查詢參數格式 `lat,lng`
    pub fn as_query(&self) -> String {
        format!("{},{}", self.lat, self.lng)
    }
}

fn empty_location() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// 前處理後的物件；未建模的欄位保留在 `extra`，寫回時原樣輸出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rental {
    pub id: String,
    #[serde(rename = "layoutType")]
    pub layout_type: String,
    /// 保留原始數值型別，整數寫回時不會變成浮點數
    #[serde(rename = "totalDailyCost")]
    pub total_daily_cost: serde_json::Number,
    #[serde(default = "empty_location")]
    pub location: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Rental {
    pub fn daily_cost(&self) -> Option<f64> {
        self.total_daily_cost.as_f64()
    }

    /// location 需同時帶有數值 lat/lng 才算有座標
    pub fn coordinates(&self) -> Option<GeoPoint> {
        let lat = self.location.get("lat")?.as_f64()?;
        let lng = self.location.get("lng")?.as_f64()?;
        Some(GeoPoint::new(lat, lng))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmenityKind {
    ConvenienceStore,
    Metro,
    Coworking,
}

impl AmenityKind {
    pub const ALL: [AmenityKind; 3] = [
        AmenityKind::ConvenienceStore,
        AmenityKind::Metro,
        AmenityKind::Coworking,
    ];

    pub fn flag_name(&self) -> &'static str {
        match self {
            AmenityKind::ConvenienceStore => "has_convenience_store_7min",
            AmenityKind::Metro => "has_metro_10min",
            AmenityKind::Coworking => "has_coworking_10min",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmenityFlags {
    #[serde(default)]
    pub has_convenience_store_7min: bool,
    #[serde(default)]
    pub has_metro_10min: bool,
    #[serde(default)]
    pub has_coworking_10min: bool,
}

impl AmenityFlags {
    pub fn set(&mut self, kind: AmenityKind, value: bool) {
        match kind {
            AmenityKind::ConvenienceStore => self.has_convenience_store_7min = value,
            AmenityKind::Metro => self.has_metro_10min = value,
            AmenityKind::Coworking => self.has_coworking_10min = value,
        }
    }

    pub fn get(&self, kind: AmenityKind) -> bool {
        match kind {
            AmenityKind::ConvenienceStore => self.has_convenience_store_7min,
            AmenityKind::Metro => self.has_metro_10min,
            AmenityKind::Coworking => self.has_coworking_10min,
        }
    }

    pub fn all(&self) -> bool {
        AmenityKind::ALL.iter().all(|kind| self.get(*kind))
    }
}

/// Rental 加上周邊設施旗標，序列化後為同一層的 JSON 物件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Rental")]
pub struct AnalyzedRental {
    #[serde(flatten)]
    pub rental: Rental,
    #[serde(flatten)]
    pub amenities: AmenityFlags,
}

impl AnalyzedRental {
    /// 旗標只存在 `amenities`，避免 `extra` 裡的同名欄位重複輸出
    pub fn new(mut rental: Rental, amenities: AmenityFlags) -> Self {
        for kind in AmenityKind::ALL {
            rental.extra.remove(kind.flag_name());
        }
        Self { rental, amenities }
    }
}

/// 讀檔時旗標會落在 `extra`，取出後移到 `amenities`；缺少或非布林值視為 false
impl From<Rental> for AnalyzedRental {
    fn from(mut rental: Rental) -> Self {
        let mut amenities = AmenityFlags::default();
        for kind in AmenityKind::ALL {
            let flag = rental
                .extra
                .remove(kind.flag_name())
                .and_then(|value| value.as_bool())
                .unwrap_or(false);
            amenities.set(kind, flag);
        }
        Self { rental, amenities }
    }
}

/// Places Nearby Search 的單筆結果
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub name: Option<String>,
    pub location: GeoPoint,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rental(location: serde_json::Value) -> Rental {
        Rental {
            id: "abc".to_string(),
            layout_type: "1LDK".to_string(),
            total_daily_cost: serde_json::Number::from(9000u32),
            location,
            address: None,
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_coordinates_require_lat_and_lng() {
        assert_eq!(
            rental(json!({"lat": 35.71, "lng": 139.79})).coordinates(),
            Some(GeoPoint::new(35.71, 139.79))
        );
        assert_eq!(rental(json!({})).coordinates(), None);
        assert_eq!(rental(json!({"lat": 35.71})).coordinates(), None);
        assert_eq!(rental(serde_json::Value::Null).coordinates(), None);
    }

    #[test]
    fn test_rental_defaults_location_to_empty_object() {
        let parsed: Rental = serde_json::from_value(json!({
            "id": "x1",
            "layoutType": "2DK",
            "totalDailyCost": 12000
        }))
        .unwrap();

        assert_eq!(parsed.location, json!({}));
        assert_eq!(parsed.daily_cost(), Some(12000.0));
        assert!(parsed.extra.is_empty());
    }

    #[test]
    fn test_rental_keeps_integer_cost_and_unknown_fields() {
        let input = json!({
            "id": "x1",
            "layoutType": "2DK",
            "totalDailyCost": 12000,
            "location": {},
            "note": "keep me"
        });
        let parsed: Rental = serde_json::from_value(input.clone()).unwrap();
        assert_eq!(parsed.extra.get("note"), Some(&json!("keep me")));

        let text = serde_json::to_string(&parsed).unwrap();
        assert!(text.contains("\"totalDailyCost\":12000"));
        assert!(!text.contains("12000.0"));
        assert_eq!(serde_json::to_value(&parsed).unwrap(), input);
    }

    #[test]
    fn test_analyzed_rental_is_flat_json() {
        let analyzed = AnalyzedRental {
            rental: rental(json!({"lat": 1.0, "lng": 2.0})),
            amenities: AmenityFlags {
                has_convenience_store_7min: true,
                has_metro_10min: false,
                has_coworking_10min: true,
            },
        };

        let value = serde_json::to_value(&analyzed).unwrap();
        assert_eq!(value["id"], "abc");
        assert_eq!(value["layoutType"], "1LDK");
        assert_eq!(value["has_convenience_store_7min"], true);
        assert_eq!(value["has_metro_10min"], false);
        assert!(value.get("address").is_none());

        let back: AnalyzedRental = serde_json::from_value(value).unwrap();
        assert_eq!(back, analyzed);
    }

    #[test]
    fn test_missing_flags_read_as_false() {
        let parsed: AnalyzedRental = serde_json::from_value(json!({
            "id": "x1",
            "layoutType": "2DK",
            "totalDailyCost": 12000,
            "location": {},
            "has_metro_10min": true
        }))
        .unwrap();

        assert!(parsed.amenities.has_metro_10min);
        assert!(!parsed.amenities.has_convenience_store_7min);
        assert!(!parsed.amenities.all());
        assert!(parsed.rental.extra.is_empty());
    }

    #[test]
    fn test_analyzed_rental_writes_each_flag_once() {
        let parsed: AnalyzedRental = serde_json::from_value(json!({
            "id": "x1",
            "layoutType": "2DK",
            "totalDailyCost": 12000,
            "location": {},
            "note": "keep me",
            "has_convenience_store_7min": true,
            "has_metro_10min": true,
            "has_coworking_10min": "yes"
        }))
        .unwrap();
        assert!(!parsed.amenities.has_coworking_10min);

        let text = serde_json::to_string(&parsed).unwrap();
        assert_eq!(text.matches("has_metro_10min").count(), 1);
        assert!(text.contains("\"note\":\"keep me\""));
        assert!(text.contains("\"has_coworking_10min\":false"));
    }

    #[test]
    fn test_new_drops_stale_flags_from_extra() {
        let mut stale = rental(json!({}));
        stale.extra.insert("has_metro_10min".to_string(), json!(true));

        let analyzed = AnalyzedRental::new(stale, AmenityFlags::default());
        let text = serde_json::to_string(&analyzed).unwrap();
        assert_eq!(text.matches("has_metro_10min").count(), 1);
        assert!(text.contains("\"has_metro_10min\":false"));
    }
}
