use crate::domain::model::{GeoPoint, Place};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
    /// 工作目錄下的檔名（不含子目錄）
    fn list_files(&self) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
}

/// 地圖服務：地理編碼、附近地點搜尋、步行時間
#[async_trait]
pub trait MapsClient: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Option<GeoPoint>>;

    async fn nearest_place(
        &self,
        origin: GeoPoint,
        place_type: Option<&str>,
        keyword: Option<&str>,
    ) -> Result<Option<Place>>;

    async fn walking_time_seconds(&self, origin: GeoPoint, dest: GeoPoint) -> Result<Option<u64>>;
}

/// 每個階段都是一次 extract → transform → load
#[async_trait]
pub trait Pipeline: Send + Sync {
    type Input: Send;
    type Output: Send;

    fn name(&self) -> &'static str;
    async fn extract(&self) -> Result<Vec<Self::Input>>;
    async fn transform(&self, data: Vec<Self::Input>) -> Result<Vec<Self::Output>>;
    async fn load(&self, data: Vec<Self::Output>) -> Result<String>;

    /// 階段提前中止時的原因；輸出只含部分結果
    fn partial_reason(&self) -> Option<String> {
        None
    }
}
