use httpmock::prelude::*;
use rental_etl::adapters::vendor::{StopReason, VendorClient};
use rental_etl::config::toml_config::{PipelineConfig, VendorConfig};
use rental_etl::core::fetch::FetchPipeline;
use rental_etl::{EtlEngine, LocalStorage};
use serde_json::json;
use std::time::Duration;

fn vendor_config(server: &MockServer) -> VendorConfig {
    VendorConfig {
        api_url: server.url("/search_listings_with_room_type/location_name_and_conditions"),
        page_delay_ms: 0,
        ..VendorConfig::default()
    }
}

fn page_body(ids: &[&str]) -> serde_json::Value {
    let items: Vec<serde_json::Value> = ids
        .iter()
        .map(|id| json!({"listing": {"id": id, "layoutType": "1LDK", "totalDailyCost": 9000}}))
        .collect();
    json!({ "listingsWithRoomType": items })
}

#[tokio::test]
async fn test_fetch_until_empty_page() {
    let server = MockServer::start();
    let path = "/search_listings_with_room_type/location_name_and_conditions";

    let page0 = server.mock(|when, then| {
        when.method(GET)
            .path(path)
            .query_param("page", "0")
            .query_param("itemsPerPage", "50")
            .query_param("locale", "ja");
        then.status(200).json_body(page_body(&["a", "b"]));
    });
    let page1 = server.mock(|when, then| {
        when.method(GET).path(path).query_param("page", "1");
        then.status(200).json_body(page_body(&["c"]));
    });
    let page2 = server.mock(|when, then| {
        when.method(GET).path(path).query_param("page", "2");
        then.status(200).json_body(json!({"listingsWithRoomType": []}));
    });

    let client = VendorClient::new(vendor_config(&server));
    let outcome = client.fetch_all_listings(Some(60), Duration::ZERO).await;

    page0.assert();
    page1.assert();
    page2.assert();
    assert_eq!(outcome.stop_reason, StopReason::Exhausted);
    assert_eq!(outcome.pages_fetched, 2);

    let ids: Vec<&str> = outcome
        .listings
        .iter()
        .map(|l| l["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_server_error_returns_partial_results() {
    let server = MockServer::start();
    let path = "/search_listings_with_room_type/location_name_and_conditions";

    server.mock(|when, then| {
        when.method(GET).path(path).query_param("page", "0");
        then.status(200).json_body(page_body(&["a"]));
    });
    let failing = server.mock(|when, then| {
        when.method(GET).path(path).query_param("page", "1");
        then.status(500);
    });

    let client = VendorClient::new(vendor_config(&server));
    let outcome = client.fetch_all_listings(None, Duration::ZERO).await;

    failing.assert();
    assert_eq!(outcome.listings.len(), 1);
    assert!(matches!(outcome.stop_reason, StopReason::Failed { page: 1, .. }));
}

#[tokio::test]
async fn test_malformed_page_is_not_kept() {
    let server = MockServer::start();
    let path = "/search_listings_with_room_type/location_name_and_conditions";

    server.mock(|when, then| {
        when.method(GET).path(path).query_param("page", "0");
        then.status(200).json_body(page_body(&["a", "b"]));
    });
    server.mock(|when, then| {
        when.method(GET).path(path).query_param("page", "1");
        then.status(200)
            .json_body(json!({"listingsWithRoomType": [{"listing": {"id": "c"}}, {"roomType": {}}]}));
    });

    let client = VendorClient::new(vendor_config(&server));
    let outcome = client.fetch_all_listings(None, Duration::ZERO).await;

    // 第 1 頁解析失敗，整頁不保留
    assert_eq!(outcome.listings.len(), 2);
    assert!(matches!(outcome.stop_reason, StopReason::Failed { page: 1, .. }));
}

#[tokio::test]
async fn test_non_json_body_stops_fetching() {
    let server = MockServer::start();
    let path = "/search_listings_with_room_type/location_name_and_conditions";

    server.mock(|when, then| {
        when.method(GET).path(path).query_param("page", "0");
        then.status(200).body("<html>maintenance</html>");
    });

    let client = VendorClient::new(vendor_config(&server));
    let outcome = client.fetch_all_listings(Some(5), Duration::ZERO).await;

    assert!(outcome.listings.is_empty());
    assert_eq!(outcome.pages_fetched, 0);
    assert!(matches!(outcome.stop_reason, StopReason::Failed { page: 0, .. }));
}

#[tokio::test]
async fn test_max_pages_limits_requests() {
    let server = MockServer::start();
    let path = "/search_listings_with_room_type/location_name_and_conditions";

    let page0 = server.mock(|when, then| {
        when.method(GET).path(path).query_param("page", "0");
        then.status(200).json_body(page_body(&["a"]));
    });
    let page1 = server.mock(|when, then| {
        when.method(GET).path(path).query_param("page", "1");
        then.status(200).json_body(page_body(&["b"]));
    });

    let client = VendorClient::new(vendor_config(&server));
    let outcome = client.fetch_all_listings(Some(1), Duration::ZERO).await;

    page0.assert_hits(1);
    page1.assert_hits(0);
    assert_eq!(outcome.stop_reason, StopReason::MaxPages(1));
    assert_eq!(outcome.listings.len(), 1);
}

#[tokio::test]
async fn test_zero_max_pages_fetches_until_empty() {
    let server = MockServer::start();
    let path = "/search_listings_with_room_type/location_name_and_conditions";

    for (page, ids) in [("0", vec!["a"]), ("1", vec!["b"]), ("2", vec![])] {
        server.mock(|when, then| {
            when.method(GET).path(path).query_param("page", page);
            then.status(200).json_body(page_body(&ids));
        });
    }

    let temp_dir = tempfile::TempDir::new().unwrap();
    let mut config = PipelineConfig::default();
    config.vendor = vendor_config(&server);
    config.vendor.max_pages = Some(0);

    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());
    let report = EtlEngine::new(FetchPipeline::new(storage, config))
        .run()
        .await
        .unwrap();

    assert_eq!(report.records_out, 2);
    assert_eq!(report.partial, None);
}

#[tokio::test]
async fn test_fetch_stage_reports_partial_output() {
    let server = MockServer::start();
    let path = "/search_listings_with_room_type/location_name_and_conditions";

    server.mock(|when, then| {
        when.method(GET).path(path).query_param("page", "0");
        then.status(200).json_body(page_body(&["a"]));
    });
    server.mock(|when, then| {
        when.method(GET).path(path).query_param("page", "1");
        then.status(503);
    });

    let temp_dir = tempfile::TempDir::new().unwrap();
    let mut config = PipelineConfig::default();
    config.vendor = vendor_config(&server);

    let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());
    let report = EtlEngine::new(FetchPipeline::new(storage, config))
        .run()
        .await
        .unwrap();

    assert_eq!(report.records_out, 1);
    let reason = report.partial.unwrap();
    assert!(reason.contains("page 1"), "{}", reason);
    assert!(temp_dir.path().join("listings_tokyo_taito.json").exists());
}
