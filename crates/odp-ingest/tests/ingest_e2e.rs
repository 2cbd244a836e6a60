//! End-to-end tests for the ingest stage
//!
//! The portal and the staging store are both wiremock servers; the store is
//! addressed path-style the way a local S3 stand-in would be.

use odp_common::staging::{StagingConfig, StagingStore};
use odp_common::OdpError;
use odp_ingest::ckan::CkanClient;
use odp_ingest::ingestor::{Ingestor, ResourceFilter};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BUCKET: &str = "staging";
const DATASET: &str = "ds";

fn csv_filter() -> ResourceFilter {
    ResourceFilter {
        format: "csv".to_string(),
        name_prefix: None,
    }
}

fn package_response(resources: serde_json::Value) -> serde_json::Value {
    json!({ "success": true, "result": { "resources": resources } })
}

async fn mount_package(portal: &MockServer, resources: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/3/action/package_show"))
        .and(query_param("id", DATASET))
        .respond_with(ResponseTemplate::new(200).set_body_json(package_response(resources)))
        .mount(portal)
        .await;
}

fn ingestor(portal: &MockServer, s3: &MockServer, filter: ResourceFilter) -> Ingestor {
    let ckan = CkanClient::new(portal.uri()).unwrap();
    let store = StagingStore::new(StagingConfig::for_endpoint(s3.uri(), BUCKET));
    Ingestor::new(ckan, store, filter).unwrap()
}

#[tokio::test]
async fn test_stages_new_resource() {
    let portal = MockServer::start().await;
    let s3 = MockServer::start().await;

    mount_package(
        &portal,
        json!([{ "id": "r1", "name": "raw-data-2024", "format": "CSV",
                 "url": format!("{}/files/r1.csv", portal.uri()) }]),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/files/r1.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string("_id,v\n1,a\n"))
        .expect(1)
        .mount(&portal)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/staging/ds/r1.csv"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&s3)
        .await;

    Mock::given(method("PUT"))
        .and(path("/staging/ds/r1.csv"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&s3)
        .await;

    let summary = ingestor(&portal, &s3, csv_filter())
        .sync(DATASET)
        .await
        .unwrap();

    assert_eq!(summary.staged, vec!["ds/r1.csv".to_string()]);
    assert!(summary.skipped.is_empty());
    assert!(summary.failed.is_empty());
}

#[tokio::test]
async fn test_skips_existing_key_without_fetching() {
    let portal = MockServer::start().await;
    let s3 = MockServer::start().await;

    mount_package(
        &portal,
        json!([{ "id": "r1", "name": "raw-data-2024", "format": "CSV",
                 "url": format!("{}/files/r1.csv", portal.uri()) }]),
    )
    .await;

    // No fetch must happen when the key is already present.
    Mock::given(method("GET"))
        .and(path("/files/r1.csv"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&portal)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/staging/ds/r1.csv"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&s3)
        .await;

    let summary = ingestor(&portal, &s3, csv_filter())
        .sync(DATASET)
        .await
        .unwrap();

    assert!(summary.staged.is_empty());
    assert_eq!(summary.skipped, vec!["ds/r1.csv".to_string()]);
}

#[tokio::test]
async fn test_second_run_stages_nothing() {
    let portal = MockServer::start().await;
    let s3 = MockServer::start().await;

    mount_package(
        &portal,
        json!([{ "id": "r1", "name": "raw-data-2024", "format": "CSV",
                 "url": format!("{}/files/r1.csv", portal.uri()) }]),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/files/r1.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string("_id,v\n1,a\n"))
        .mount(&portal)
        .await;

    // First head misses, every later one hits: mounted first, expires after
    // one use.
    Mock::given(method("HEAD"))
        .and(path("/staging/ds/r1.csv"))
        .respond_with(ResponseTemplate::new(404))
        .up_to_n_times(1)
        .mount(&s3)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/staging/ds/r1.csv"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&s3)
        .await;

    Mock::given(method("PUT"))
        .and(path("/staging/ds/r1.csv"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&s3)
        .await;

    let ingestor = ingestor(&portal, &s3, csv_filter());

    let first = ingestor.sync(DATASET).await.unwrap();
    assert_eq!(first.staged.len(), 1);

    let second = ingestor.sync(DATASET).await.unwrap();
    assert!(second.staged.is_empty());
    assert_eq!(second.skipped, vec!["ds/r1.csv".to_string()]);
}

#[tokio::test]
async fn test_filter_rejects_non_matching_resources() {
    let portal = MockServer::start().await;
    let s3 = MockServer::start().await;

    mount_package(
        &portal,
        json!([
            { "id": "r1", "name": "raw-data-2024", "format": "XLSX",
              "url": format!("{}/files/r1.xlsx", portal.uri()) },
            { "id": "r2", "name": "summary-2024", "format": "CSV",
              "url": format!("{}/files/r2.csv", portal.uri()) }
        ]),
    )
    .await;

    let filter = ResourceFilter {
        format: "csv".to_string(),
        name_prefix: Some("raw-data".to_string()),
    };

    // Neither resource passes the filter, so the store is never touched.
    let summary = ingestor(&portal, &s3, filter).sync(DATASET).await.unwrap();

    assert!(summary.staged.is_empty());
    assert!(summary.skipped.is_empty());
    assert!(summary.failed.is_empty());
    assert!(s3.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_metadata_unavailable_aborts_run() {
    let portal = MockServer::start().await;
    let s3 = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/3/action/package_show"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&portal)
        .await;

    let err = ingestor(&portal, &s3, csv_filter())
        .sync(DATASET)
        .await
        .unwrap_err();

    assert!(matches!(err, OdpError::MetadataUnavailable(_)));
}

#[tokio::test]
async fn test_malformed_metadata_aborts_run() {
    let portal = MockServer::start().await;
    let s3 = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/3/action/package_show"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "success": true, "result": {} })),
        )
        .mount(&portal)
        .await;

    let err = ingestor(&portal, &s3, csv_filter())
        .sync(DATASET)
        .await
        .unwrap_err();

    assert!(matches!(err, OdpError::MalformedMetadata(_)));
}

#[tokio::test]
async fn test_unsuccessful_portal_response_is_malformed() {
    let portal = MockServer::start().await;
    let s3 = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/3/action/package_show"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "success": false, "error": {} })),
        )
        .mount(&portal)
        .await;

    let err = ingestor(&portal, &s3, csv_filter())
        .sync(DATASET)
        .await
        .unwrap_err();

    assert!(matches!(err, OdpError::MalformedMetadata(_)));
}

#[tokio::test]
async fn test_fetch_failure_does_not_abort_run() {
    let portal = MockServer::start().await;
    let s3 = MockServer::start().await;

    mount_package(
        &portal,
        json!([
            { "id": "r1", "name": "raw-data-a", "format": "CSV",
              "url": format!("{}/files/r1.csv", portal.uri()) },
            { "id": "r2", "name": "raw-data-b", "format": "CSV",
              "url": format!("{}/files/r2.csv", portal.uri()) }
        ]),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/files/r1.csv"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&portal)
        .await;

    Mock::given(method("GET"))
        .and(path("/files/r2.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string("_id,v\n1,a\n"))
        .mount(&portal)
        .await;

    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&s3)
        .await;

    Mock::given(method("PUT"))
        .and(path("/staging/ds/r2.csv"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&s3)
        .await;

    let summary = ingestor(&portal, &s3, csv_filter())
        .sync(DATASET)
        .await
        .unwrap();

    assert_eq!(summary.staged, vec!["ds/r2.csv".to_string()]);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].0, "r1");
}
