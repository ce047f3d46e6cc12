//! Tests for the report engine

use super::*;
use crate::error::Error;
use async_trait::async_trait;
use jsonwebtoken::{encode, EncodingKey, Header};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

fn token_for(company: u64, project: u64) -> String {
    encode(
        &Header::default(),
        &json!({
            "isExternalApplication": true,
            "companyId": company,
            "projectId": project
        }),
        &EncodingKey::from_secret(b"secret"),
    )
    .unwrap()
}

/// In-memory inventory keyed by client id
#[derive(Default)]
struct FakeInventory {
    tokens: HashMap<String, String>,
    vms: HashMap<String, Result<Vec<Value>>>,
    /// Directories emptied while a token lists its VMs
    clears_dir: HashMap<String, PathBuf>,
    calls: Mutex<Vec<String>>,
}

impl FakeInventory {
    fn tenant(mut self, client_id: &str, token: String, vms: Vec<Value>) -> Self {
        self.tokens.insert(client_id.to_string(), token.clone());
        self.vms.insert(token, Ok(vms));
        self
    }

    fn failing_listing(mut self, client_id: &str, token: String) -> Self {
        self.tokens.insert(client_id.to_string(), token.clone());
        self.vms
            .insert(token, Err(Error::http_status(500, "upstream down")));
        self
    }

    /// Like `tenant`, but listing empties `dir` first
    fn clearing(mut self, client_id: &str, token: String, vms: Vec<Value>, dir: PathBuf) -> Self {
        self.clears_dir.insert(token.clone(), dir);
        self.tenant(client_id, token, vms)
    }
}

#[async_trait]
impl InventorySource for FakeInventory {
    async fn issue_token(&self, credential: &TenantCredential) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("token:{}", credential.client_id));
        self.tokens
            .get(&credential.client_id)
            .cloned()
            .ok_or_else(|| Error::auth("bad client credentials"))
    }

    async fn list_vms(&self, token: &str) -> Result<Vec<Value>> {
        self.calls.lock().unwrap().push("vms".to_string());
        if let Some(dir) = self.clears_dir.get(token) {
            for entry in std::fs::read_dir(dir).unwrap() {
                std::fs::remove_file(entry.unwrap().path()).unwrap();
            }
        }
        match self.vms.get(token) {
            Some(Ok(vms)) => Ok(vms.clone()),
            Some(Err(e)) => Err(Error::Other(e.to_string())),
            None => Err(Error::http_status(401, "unknown token")),
        }
    }
}

fn engine(dir: &TempDir, source: FakeInventory, policy: FailurePolicy) -> ReportEngine {
    ReportEngine::new(
        Arc::new(source),
        EngineConfig {
            temp_dir: dir.path().join("temp"),
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

fn temp_files(dir: &TempDir) -> Vec<PathBuf> {
    std::fs::read_dir(dir.path().join("temp"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect()
}

#[tokio::test]
async fn test_generate_combines_tenants() {
    let dir = TempDir::new().unwrap();
    let source = FakeInventory::default()
        .tenant(
            "a",
            token_for(1, 10),
            vec![json!({"id": 1, "name": "vm-a", "cost": {"total": 5}})],
        )
        .tenant(
            "b",
            token_for(2, 20),
            vec![
                json!({"id": 2, "name": "vm-b", "region": "eu"}),
                json!({"id": 3, "name": "vm-c"}),
            ],
        );
    let engine = engine(&dir, source, FailurePolicy::Abort);

    let summary = engine
        .generate(&[
            TenantCredential::new("Alpha", "a", "s"),
            TenantCredential::new("Beta", "b", "s"),
        ])
        .await
        .unwrap();

    let report = summary.report.clone().unwrap();
    assert!(report.starts_with(dir.path().join("reports")));
    assert!(summary.report_name().unwrap().starts_with("vm-report_"));
    assert_eq!(summary.rows, 3);

    let rows = read_rows(&report);
    assert_eq!(
        rows,
        vec![
            vec!["id", "name", "cost.total", "projectName", "region"],
            vec!["1", "vm-a", "5", "Alpha", ""],
            vec!["2", "vm-b", "", "Beta", "eu"],
            vec!["3", "vm-c", "", "Beta", ""],
        ]
    );

    // intermediates are consumed by the merge
    assert!(temp_files(&dir).is_empty());
}

#[tokio::test]
async fn test_generate_processes_tenants_in_order() {
    let dir = TempDir::new().unwrap();
    let source = Arc::new(
        FakeInventory::default()
            .tenant("a", token_for(1, 1), vec![json!({"id": 1})])
            .tenant("b", token_for(2, 2), vec![json!({"id": 2})]),
    );
    let engine = ReportEngine::new(
        source.clone(),
        EngineConfig {
            temp_dir: dir.path().join("temp"),
            reports_dir: dir.path().join("reports"),
            failure_policy: FailurePolicy::Abort,
        },
    );

    engine
        .generate(&[
            TenantCredential::new("A", "a", "s"),
            TenantCredential::new("B", "b", "s"),
        ])
        .await
        .unwrap();

    let calls = source.calls.lock().unwrap().clone();
    assert_eq!(calls, vec!["token:a", "vms", "token:b", "vms"]);
}

#[tokio::test]
async fn test_generate_skips_empty_tenant() {
    let dir = TempDir::new().unwrap();
    let source = FakeInventory::default()
        .tenant("a", token_for(1, 1), vec![])
        .tenant("b", token_for(2, 2), vec![json!({"id": 7})]);
    let engine = engine(&dir, source, FailurePolicy::Abort);

    let summary = engine
        .generate(&[
            TenantCredential::new("Empty", "a", "s"),
            TenantCredential::new("Full", "b", "s"),
        ])
        .await
        .unwrap();

    assert_eq!(summary.tenants[0].status, TenantStatus::Empty);
    assert_eq!(
        summary.tenants[1].status,
        TenantStatus::Written {
            rows: 1,
            columns: 2
        }
    );
    let rows = read_rows(&summary.report.unwrap());
    assert_eq!(rows, vec![vec!["id", "projectName"], vec!["7", "Full"]]);
}

#[tokio::test]
async fn test_generate_all_empty_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let source = FakeInventory::default().tenant("a", token_for(1, 1), vec![]);
    let engine = engine(&dir, source, FailurePolicy::Abort);

    let summary = engine
        .generate(&[TenantCredential::new("Empty", "a", "s")])
        .await
        .unwrap();

    assert!(summary.report.is_none());
    assert_eq!(summary.rows, 0);
    let reports: Vec<_> = std::fs::read_dir(dir.path().join("reports"))
        .unwrap()
        .collect();
    assert!(reports.is_empty());
}

#[tokio::test]
async fn test_generate_requires_credentials() {
    let dir = TempDir::new().unwrap();
    let engine = engine(&dir, FakeInventory::default(), FailurePolicy::Abort);

    let err = engine.generate(&[]).await.unwrap_err();
    assert!(matches!(err, Error::Config { .. }));
}

#[tokio::test]
async fn test_generate_aborts_on_auth_failure() {
    let dir = TempDir::new().unwrap();
    let source = FakeInventory::default().tenant("a", token_for(1, 1), vec![json!({"id": 1})]);
    let engine = engine(&dir, source, FailurePolicy::Abort);

    let err = engine
        .generate(&[
            TenantCredential::new("Alpha", "a", "s"),
            TenantCredential::new("Rogue", "nobody", "s"),
        ])
        .await
        .unwrap_err();

    match &err {
        Error::Tenant { tenant, message } => {
            assert_eq!(tenant, "Rogue");
            assert_eq!(message, "unauthorized: bad client credentials");
        }
        other => panic!("unexpected error: {other}"),
    }
    // the first tenant's intermediate is discarded with the run
    assert!(temp_files(&dir).is_empty());
}

#[tokio::test]
async fn test_generate_rejects_non_application_token() {
    let dir = TempDir::new().unwrap();
    let user_token = encode(
        &Header::default(),
        &json!({"isExternalApplication": false, "companyId": 1, "projectId": 1}),
        &EncodingKey::from_secret(b"secret"),
    )
    .unwrap();
    let source = FakeInventory::default().tenant("a", user_token, vec![json!({"id": 1})]);
    let engine = engine(&dir, source, FailurePolicy::Abort);

    let err = engine
        .generate(&[TenantCredential::new("Alpha", "a", "s")])
        .await
        .unwrap_err();

    assert!(err.to_string().contains("not correct client credentials"));
}

#[tokio::test]
async fn test_generate_skip_policy_continues() {
    let dir = TempDir::new().unwrap();
    let source = FakeInventory::default()
        .failing_listing("a", token_for(1, 1))
        .tenant("b", token_for(2, 2), vec![json!({"id": 2})]);
    let engine = engine(&dir, source, FailurePolicy::Skip);

    let summary = engine
        .generate(&[
            TenantCredential::new("Broken", "a", "s"),
            TenantCredential::new("Fine", "b", "s"),
        ])
        .await
        .unwrap();

    assert_eq!(summary.failed_tenants(), 1);
    match &summary.tenants[0].status {
        TenantStatus::Failed { error } => assert!(error.contains("error fetching VMs data")),
        other => panic!("unexpected status: {other:?}"),
    }
    let rows = read_rows(&summary.report.unwrap());
    assert_eq!(rows, vec![vec!["id", "projectName"], vec!["2", "Fine"]]);
}

#[tokio::test]
async fn test_back_to_back_runs_keep_earlier_reports() {
    let dir = TempDir::new().unwrap();
    let source = FakeInventory::default().tenant("a", token_for(1, 1), vec![json!({"id": 1})]);
    let engine = engine(&dir, source, FailurePolicy::Abort);
    let credentials = [TenantCredential::new("Alpha", "a", "s")];

    let first = engine.generate(&credentials).await.unwrap().report.unwrap();
    let first_contents = std::fs::read_to_string(&first).unwrap();
    let second = engine.generate(&credentials).await.unwrap().report.unwrap();

    assert_ne!(first, second);
    assert_eq!(std::fs::read_to_string(&first).unwrap(), first_contents);
    assert_eq!(read_rows(&second), read_rows(&first));
    assert!(temp_files(&dir).is_empty());
}

#[tokio::test]
async fn test_concurrent_runs_get_distinct_reports() {
    let dir = TempDir::new().unwrap();
    let source = FakeInventory::default()
        .tenant("a", token_for(1, 1), vec![json!({"id": 1})])
        .tenant("b", token_for(2, 2), vec![json!({"id": 2})]);
    let engine = engine(&dir, source, FailurePolicy::Abort);
    let alpha = [TenantCredential::new("Alpha", "a", "s")];
    let beta = [TenantCredential::new("Beta", "b", "s")];

    let (first, second) = tokio::join!(engine.generate(&alpha), engine.generate(&beta));
    let first = first.unwrap().report.unwrap();
    let second = second.unwrap().report.unwrap();

    assert_ne!(first, second);
    assert_eq!(read_rows(&first)[1], vec!["1", "Alpha"]);
    assert_eq!(read_rows(&second)[1], vec!["2", "Beta"]);
}

#[tokio::test]
async fn test_merge_failure_discards_intermediates() {
    let dir = TempDir::new().unwrap();
    let source = FakeInventory::default()
        .tenant("a", token_for(1, 1), vec![json!({"id": 1})])
        .clearing(
            "b",
            token_for(2, 2),
            vec![json!({"id": 2})],
            dir.path().join("temp"),
        );
    let engine = engine(&dir, source, FailurePolicy::Abort);

    let err = engine
        .generate(&[
            TenantCredential::new("Alpha", "a", "s"),
            TenantCredential::new("Beta", "b", "s"),
        ])
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Merge { .. }), "unexpected error: {err}");
    assert!(temp_files(&dir).is_empty());
    let reports: Vec<_> = std::fs::read_dir(dir.path().join("reports"))
        .unwrap()
        .collect();
    assert!(reports.is_empty());
}

#[test]
fn test_engine_config_from_app_config() {
    let app = crate::config::AppConfig {
        temp_dir: PathBuf::from("/tmp/t"),
        reports_dir: PathBuf::from("/tmp/r"),
        failure_policy: FailurePolicy::Skip,
        ..Default::default()
    };

    let config = EngineConfig::from(&app);
    assert_eq!(config.temp_dir, PathBuf::from("/tmp/t"));
    assert_eq!(config.reports_dir, PathBuf::from("/tmp/r"));
    assert_eq!(config.failure_policy, FailurePolicy::Skip);
}
