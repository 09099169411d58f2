use crate::config::toml_config::VendorConfig;
use crate::domain::model::RawListing;
use crate::utils::error::{EtlError, Result};
use reqwest::Client;
use std::time::Duration;

/// 分頁抓取結束的原因
#[derive(Debug, Clone, PartialEq)]
pub enum StopReason {
    /// 回傳空頁
    Exhausted,
    MaxPages(u32),
    /// 出錯時保留已抓到的結果
    Failed { page: u32, message: String },
}

#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub listings: Vec<RawListing>,
    pub pages_fetched: u32,
    pub stop_reason: StopReason,
}

pub struct VendorClient {
    client: Client,
    config: VendorConfig,
}

impl VendorClient {
    pub fn new(config: VendorConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// 抓取單一頁面
    pub async fn fetch_page(&self, page: u32) -> Result<Vec<RawListing>> {
        let mut query = self.config.query_params();
        query.push(("page".to_string(), page.to_string()));

        let response = self
            .client
            .get(&self.config.api_url)
            .query(&query)
            .timeout(Duration::from_secs(self.config.timeout_seconds))
            .send()
            .await?;

        tracing::debug!("Request URL: {}", response.url());
        tracing::debug!("API response status: {}", response.status());

        // 4xx/5xx 直接視為錯誤
        let response = response.error_for_status()?;
        let body: serde_json::Value = response.json().await?;

        parse_page(page, body)
    }

    /// 從第 0 頁開始依序抓取，遇到錯誤即停止並回傳目前結果
    pub async fn fetch_all_listings(
        &self,
        max_pages: Option<u32>,
        delay: Duration,
    ) -> FetchOutcome {
        let mut all_listings: Vec<RawListing> = Vec::new();
        let mut page: u32 = 0;

        let stop_reason = loop {
            tracing::info!("📡 Fetching page {} ...", page);

            let page_listings = match self.fetch_page(page).await {
                Ok(listings) => listings,
                Err(e) => {
                    tracing::error!("❌ ERROR fetching page {}: {}", page, e);
                    tracing::warn!("❌ Stopping early. Returning partial results.");
                    break StopReason::Failed {
                        page,
                        message: e.to_string(),
                    };
                }
            };

            if page_listings.is_empty() {
                tracing::info!("No more listings. Stopping.");
                break StopReason::Exhausted;
            }

            tracing::info!(
                "Got {} listings on this page, total so far = {}",
                page_listings.len(),
                all_listings.len() + page_listings.len()
            );
            all_listings.extend(page_listings);

            page += 1;
            if let Some(max) = max_pages {
                if page >= max {
                    tracing::info!("Reached max_pages={}, stopping early.", max);
                    break StopReason::MaxPages(max);
                }
            }

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        };

        // page 即已成功存入的頁數
        FetchOutcome {
            listings: all_listings,
            pages_fetched: page,
            stop_reason,
        }
    }
}

/// 取出 `listingsWithRoomType[*].listing`；缺少陣列視為空頁
pub fn parse_page(page: u32, body: serde_json::Value) -> Result<Vec<RawListing>> {
    let items = match body.get("listingsWithRoomType") {
        None | Some(serde_json::Value::Null) => return Ok(Vec::new()),
        Some(serde_json::Value::Array(items)) => items,
        Some(_) => {
            return Err(EtlError::VendorApiError {
                page,
                message: "'listingsWithRoomType' is not an array".to_string(),
            })
        }
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            item.get("listing")
                .cloned()
                .ok_or_else(|| EtlError::VendorApiError {
                    page,
                    message: format!("item {} has no 'listing' field", index),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_page_extracts_listings() {
        let body = json!({
            "listingsWithRoomType": [
                {"listing": {"id": "a"}, "roomType": {}},
                {"listing": {"id": "b"}}
            ]
        });

        let listings = parse_page(0, body).unwrap();
        assert_eq!(listings, vec![json!({"id": "a"}), json!({"id": "b"})]);
    }

    #[test]
    fn test_parse_page_without_array_is_empty() {
        assert!(parse_page(3, json!({"total": 0})).unwrap().is_empty());
    }

    #[test]
    fn test_parse_page_rejects_item_without_listing() {
        let body = json!({
            "listingsWithRoomType": [
                {"listing": {"id": "a"}},
                {"roomType": {}}
            ]
        });

        let err = parse_page(2, body).unwrap_err();
        assert!(matches!(err, EtlError::VendorApiError { page: 2, .. }));
    }
}
