//! Integration tests using mock HTTP server
//!
//! Tests the full end-to-end flow: credentials → token → VM listing → combined CSV

use jsonwebtoken::{encode, EncodingKey, Header};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use vm_inventory_report::config::{parse_credentials, TenantCredential};
use vm_inventory_report::engine::{EngineConfig, ReportEngine, TenantStatus};
use vm_inventory_report::http::{HttpClientConfig, RetryPolicy};
use vm_inventory_report::inventory::{EmmaClient, ISSUE_TOKEN_PATH, VMS_PATH};
use vm_inventory_report::output::{merge_reports, MergeOptions};
use vm_inventory_report::{Error, FailurePolicy};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn access_token(company: u64, project: u64) -> String {
    encode(
        &Header::default(),
        &json!({
            "isExternalApplication": true,
            "companyId": company,
            "projectId": project,
            "exp": 4_102_444_800_u64
        }),
        &EncodingKey::from_secret(b"upstream-secret"),
    )
    .unwrap()
}

async fn mount_tenant(server: &MockServer, client_id: &str, token: &str, vms: Value) {
    Mock::given(method("POST"))
        .and(path(ISSUE_TOKEN_PATH))
        .and(body_json(json!({"clientId": client_id, "clientSecret": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessToken": token,
            "refreshToken": "unused",
            "expiredIn": 3600
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(VMS_PATH))
        .and(header("Authorization", format!("Bearer {token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(vms))
        .mount(server)
        .await;
}

fn engine(server: &MockServer, dir: &TempDir, policy: FailurePolicy) -> ReportEngine {
    let config = HttpClientConfig::new(server.uri())
        .timeout(Duration::from_secs(5))
        .retry(RetryPolicy::none());
    let client = EmmaClient::new(config).unwrap();
    ReportEngine::new(
        Arc::new(client),
        EngineConfig {
            temp_dir: dir.path().join("temp-reports"),
            reports_dir: dir.path().join("reports"),
            failure_policy: policy,
        },
    )
}

fn read_rows(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .unwrap();
    reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect()
}

// ============================================================================
// End-to-end report generation
// ============================================================================

#[tokio::test]
async fn test_generate_report_end_to_end() {
    let server = MockServer::start().await;
    mount_tenant(
        &server,
        "client-a",
        &access_token(100, 1),
        json!([
            {"id": 1, "name": "a1", "disks": [{"sizeGb": 20}, {"sizeGb": 40}], "running": true}
        ]),
    )
    .await;
    mount_tenant(
        &server,
        "client-b",
        &access_token(200, 2),
        json!([
            {"id": 7, "name": "b1", "provider": {"name": "AWS"}, "cost": null}
        ]),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let credentials = parse_credentials("Alpha:client-a:secret,Beta:client-b:secret");
    let summary = engine(&server, &dir, FailurePolicy::Abort)
        .generate(&credentials)
        .await
        .unwrap();

    let report = summary.report.clone().unwrap();
    assert_eq!(summary.rows, 2);
    assert_eq!(
        read_rows(&report),
        vec![
            vec![
                "id",
                "name",
                "disks.0.sizeGb",
                "disks.1.sizeGb",
                "running",
                "projectName",
                "provider.name",
                "cost"
            ],
            vec!["1", "a1", "20", "40", "true", "Alpha", "", ""],
            vec!["7", "b1", "", "", "", "Beta", "AWS", ""],
        ]
    );

    let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("temp-reports"))
        .unwrap()
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn test_generate_with_rejected_credentials() {
    let server = MockServer::start().await;
    mount_tenant(
        &server,
        "client-a",
        &access_token(100, 1),
        json!([{"id": 1}]),
    )
    .await;
    Mock::given(method("POST"))
        .and(path(ISSUE_TOKEN_PATH))
        .and(body_json(json!({"clientId": "client-x", "clientSecret": "secret"})))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid client"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let credentials = vec![
        TenantCredential::new("Alpha", "client-a", "secret"),
        TenantCredential::new("Revoked", "client-x", "secret"),
    ];

    // aborting run: no report
    let err = engine(&server, &dir, FailurePolicy::Abort)
        .generate(&credentials)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Tenant { ref tenant, .. } if tenant == "Revoked"));
    assert!(err.to_string().contains("invalid client"));

    // skipping run: report without the revoked tenant
    let summary = engine(&server, &dir, FailurePolicy::Skip)
        .generate(&credentials)
        .await
        .unwrap();
    assert_eq!(summary.failed_tenants(), 1);
    assert!(matches!(
        summary.tenants[0].status,
        TenantStatus::Written { rows: 1, .. }
    ));
    assert_eq!(
        read_rows(&summary.report.unwrap()),
        vec![vec!["id", "projectName"], vec!["1", "Alpha"]]
    );
}

#[tokio::test]
async fn test_generate_all_tenants_empty() {
    let server = MockServer::start().await;
    mount_tenant(&server, "client-a", &access_token(1, 1), json!([])).await;

    let dir = TempDir::new().unwrap();
    let summary = engine(&server, &dir, FailurePolicy::Abort)
        .generate(&[TenantCredential::new("Quiet", "client-a", "secret")])
        .await
        .unwrap();

    assert!(summary.report.is_none());
    assert_eq!(summary.tenants[0].status, TenantStatus::Empty);
}

// ============================================================================
// Standalone merge
// ============================================================================

#[test]
fn test_merge_existing_reports() {
    let dir = TempDir::new().unwrap();
    let first = dir.path().join("first.csv");
    let second = dir.path().join("second.csv");
    std::fs::write(&first, "id,zone\n1,eu\n").unwrap();
    std::fs::write(&second, "id,size\n2,large\n").unwrap();
    let output = dir.path().join("all.csv");

    let summary = merge_reports(
        &[&first, &second],
        &output,
        MergeOptions::default().keep_inputs(),
    )
    .unwrap();

    assert_eq!(summary.rows_written, 2);
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "id,zone,size\n1,eu,\n2,,large\n"
    );
    assert!(first.exists());
    assert!(second.exists());
}
