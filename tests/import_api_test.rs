// ==========================================
// ImportApi 集成测试
// ==========================================
// 测试目标: 响应映射、错误分类、同类导入互斥
// ==========================================


use async_trait::async_trait;
use roster_import::api::{ApiError, ImportApi};
use roster_import::config::ImportConfig;
use roster_import::domain::{Candidate, EntityKind, ImportStatus};
use roster_import::importer::{RosterImporterImpl, SpreadsheetFormat};
use roster_import::logging;
use roster_import::repository::{RepositoryResult, RosterStore};
use std::collections::HashSet;
use std::sync::Arc;
use test_helpers::{create_test_db, write_csv, STAFF_HEADER, STUDENT_HEADER};
use tokio::sync::Notify;

const STUDENT_CSV: &[u8] = b"First Name,Surname,User ID,Year Level\nAlice,Smith,a.smith,9\n";

// 读取已有花名册时挂起，直到测试放行
#[derive(Default)]
struct GatedStore {
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl RosterStore for GatedStore {
    async fn list_identity_keys(&self, _kind: EntityKind) -> RepositoryResult<HashSet<String>> {
        self.entered.notify_one();
        self.release.notified().await;
        Ok(HashSet::new())
    }

    async fn batch_insert(&self, _kind: EntityKind, records: &[Candidate]) -> RepositoryResult<usize> {
        Ok(records.len())
    }
}

#[tokio::test]
async fn test_import_roster_response() {
    logging::init_test();

    let (_temp_db, db_path) = create_test_db().unwrap();
    let api = ImportApi::open(&db_path).unwrap();
    let csv = write_csv(&[STUDENT_HEADER, "Alice,Smith,a.smith,9", "Bob,Jones,b.jones,10"]);

    let response = api
        .import_roster(EntityKind::Student, csv.path().to_str().unwrap())
        .await
        .unwrap();

    assert_eq!(response.entity_kind, EntityKind::Student);
    assert_eq!(response.report.successful, 2);
    assert_eq!(response.report.status, ImportStatus::Committed { inserted: 2 });
    assert!(response.error.is_none());
    assert!(!response.batch_id.is_empty());

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["entity_kind"], "student");
    assert!(json.get("error").is_none());
}

#[tokio::test]
async fn test_no_valid_rows_surfaces_error_message() {
    let (_temp_db, db_path) = create_test_db().unwrap();
    let api = ImportApi::open(&db_path).unwrap();
    let csv = write_csv(&[STAFF_HEADER, "Alice,Smith,AliceSmith,Teaching Staff,"]);

    let response = api
        .import_roster(EntityKind::Staff, csv.path().to_str().unwrap())
        .await
        .unwrap();

    assert_eq!(response.report.successful, 0);
    assert_eq!(response.error.as_deref(), Some("No valid rows found to import"));
}

#[tokio::test]
async fn test_parse_and_input_errors() {
    let (_temp_db, db_path) = create_test_db().unwrap();
    let api = ImportApi::open(&db_path).unwrap();

    let err = api
        .import_roster(EntityKind::Student, "/nonexistent/students.csv")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::ParseError(_)));

    let err = api.import_roster(EntityKind::Student, "  ").await.unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    let unsupported = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
    let err = api
        .import_roster(EntityKind::Student, unsupported.path().to_str().unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::ParseError(_)));
}

#[tokio::test]
async fn test_expected_columns() {
    let (_temp_db, db_path) = create_test_db().unwrap();
    let api = ImportApi::open(&db_path).unwrap();

    assert_eq!(
        api.expected_columns(EntityKind::Student).unwrap(),
        vec!["First Name", "Surname", "User ID", "Year Level"]
    );
    assert_eq!(
        api.expected_columns(EntityKind::Staff).unwrap(),
        vec!["First Name", "Surname", "User ID", "Staff Role", "Email"]
    );
}

#[tokio::test]
async fn test_same_kind_import_rejected_while_in_flight() {
    let store = Arc::new(GatedStore::default());
    let api = Arc::new(ImportApi::new(RosterImporterImpl::with_default_components(
        store.clone(),
        ImportConfig::default(),
    )));

    let first = {
        let api = api.clone();
        tokio::spawn(async move {
            api.import_roster_bytes(EntityKind::Student, STUDENT_CSV, SpreadsheetFormat::Csv)
                .await
        })
    };
    store.entered.notified().await;

    let err = api
        .import_roster_bytes(EntityKind::Student, STUDENT_CSV, SpreadsheetFormat::Csv)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::ImportInProgress(EntityKind::Student)));

    store.release.notify_one();
    let response = first.await.unwrap().unwrap();
    assert_eq!(response.report.successful, 1);

    // 完成后占位已释放
    let again = tokio::spawn({
        let api = api.clone();
        async move {
            api.import_roster_bytes(EntityKind::Student, STUDENT_CSV, SpreadsheetFormat::Csv)
                .await
        }
    });
    store.entered.notified().await;
    store.release.notify_one();
    assert!(again.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_different_kinds_may_run_concurrently() {
    let (_temp_db, db_path) = create_test_db().unwrap();
    let api = ImportApi::open(&db_path).unwrap();
    let students = write_csv(&[STUDENT_HEADER, "Alice,Smith,a.smith,9"]);
    let staff = write_csv(&[STAFF_HEADER, "Bob,Jones,bob.jones,Support Staff,bob@school.edu"]);

    let (student_result, staff_result) = tokio::join!(
        api.import_roster(EntityKind::Student, students.path().to_str().unwrap()),
        api.import_roster(EntityKind::Staff, staff.path().to_str().unwrap()),
    );

    assert_eq!(student_result.unwrap().report.successful, 1);
    assert_eq!(staff_result.unwrap().report.successful, 1);
}
