// ==========================================
// 学校管理后台 - 花名册导入器实现
// ==========================================
// 职责: 整合导入流程，从文件到花名册存储
// 流程: 提取 → 逐行校验 → 去重 → 整批写入 → 汇总
// 红线: 存储在一次调用内最多写一次；行级问题不终止调用
// ==========================================

use crate::config::{ImportConfig, ImportConfigReader};
use crate::domain::roster::{ImportRun, RawRow, RowOutcome};
use crate::domain::schema::FieldSchema;
use crate::domain::types::{EntityKind, ImportStage};
use crate::importer::batch_deduplicator::BatchDeduplicatorImpl;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_schema::schema_for;
use crate::importer::file_parser::{SpreadsheetFormat, UniversalFileParser};
use crate::importer::import_committer::StoreCommitter;
use crate::importer::import_reporter::ImportReporterImpl;
use crate::importer::roster_importer_trait::{
    BatchDeduplicator, ImportCommitter, ImportReporter, RosterImporter, RowValidator, TableExtractor,
};
use crate::importer::row_validator::SchemaRowValidator;
use crate::repository::RosterStore;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// 单次调用的上下文
struct RunContext {
    batch_id: String,
    started_at: DateTime<Utc>,
    start_time: Instant,
}

impl RunContext {
    fn begin(kind: EntityKind) -> Self {
        let ctx = Self {
            batch_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            start_time: Instant::now(),
        };
        debug!(batch_id = %ctx.batch_id, entity_kind = %kind, stage = %ImportStage::Idle, "导入开始");
        ctx
    }
}

// ==========================================
// RosterImporterImpl - 花名册导入器实现
// ==========================================
pub struct RosterImporterImpl<S, C>
where
    S: RosterStore,
    C: ImportConfigReader,
{
    // 数据访问层（只读快照）
    store: Arc<S>,

    // 配置读取器
    config: C,

    // 导入组件
    extractor: Box<dyn TableExtractor>,
    validator: Box<dyn RowValidator>,
    deduplicator: Box<dyn BatchDeduplicator>,
    committer: Box<dyn ImportCommitter>,
    reporter: Box<dyn ImportReporter>,
}

impl<S, C> RosterImporterImpl<S, C>
where
    S: RosterStore + 'static,
    C: ImportConfigReader,
{
    /// 创建新的 RosterImporter 实例
    ///
    /// # 参数
    /// - store: 花名册存储（读取已有身份键）
    /// - config: 配置读取器
    /// - extractor / validator / deduplicator / committer / reporter: 各阶段组件
    pub fn new(
        store: Arc<S>,
        config: C,
        extractor: Box<dyn TableExtractor>,
        validator: Box<dyn RowValidator>,
        deduplicator: Box<dyn BatchDeduplicator>,
        committer: Box<dyn ImportCommitter>,
        reporter: Box<dyn ImportReporter>,
    ) -> Self {
        Self {
            store,
            config,
            extractor,
            validator,
            deduplicator,
            committer,
            reporter,
        }
    }

    /// 使用默认组件装配（写入同一个 store）
    pub fn with_default_components(store: Arc<S>, config: C) -> Self {
        let committer = StoreCommitter::new(store.clone());
        Self::new(
            store,
            config,
            Box::new(UniversalFileParser),
            Box::new(SchemaRowValidator),
            Box::new(BatchDeduplicatorImpl),
            Box::new(committer),
            Box::new(ImportReporterImpl),
        )
    }

    async fn load_existing_roster(&self, kind: EntityKind) -> ImportResult<HashSet<String>> {
        self.store.list_identity_keys(kind).await.map_err(|e| {
            error!(entity_kind = %kind, error = %e, "已有花名册读取失败");
            ImportError::RosterLookupError(e.to_string())
        })
    }

    async fn load_schema(&self, kind: EntityKind) -> ImportResult<FieldSchema> {
        let config = ImportConfig::load(&self.config).await?;
        schema_for(kind, &config)
    }

    /// 表头缺少必填列时只告警；缺失值由逐行校验报告
    fn warn_missing_columns(&self, rows: &[RawRow], schema: &FieldSchema) {
        let Some(first) = rows.first() else {
            return;
        };
        let headers: Vec<&str> = first.headers().collect();

        for def in schema.required_fields() {
            let present = def
                .header_candidates()
                .any(|candidate| headers.iter().any(|h| h.eq_ignore_ascii_case(candidate)));
            if !present {
                warn!(column = %def.column_name, "表头缺少必填列");
            }
        }
    }

    fn extract_file(&self, ctx: &RunContext, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        debug!(batch_id = %ctx.batch_id, stage = %ImportStage::Extracting, "解析文件");
        let rows = self.extractor.extract(file_path).map_err(|e| {
            error!(batch_id = %ctx.batch_id, error = %e, "文件解析失败");
            e
        })?;
        info!(batch_id = %ctx.batch_id, total_rows = rows.len(), "文件解析完成");
        Ok(rows)
    }

    fn extract_buffer(
        &self,
        ctx: &RunContext,
        bytes: &[u8],
        format: SpreadsheetFormat,
    ) -> ImportResult<Vec<RawRow>> {
        debug!(batch_id = %ctx.batch_id, stage = %ImportStage::Extracting, format = ?format, "解析内存缓冲区");
        let rows = self.extractor.extract_bytes(bytes, format).map_err(|e| {
            error!(batch_id = %ctx.batch_id, error = %e, "文件解析失败");
            e
        })?;
        info!(batch_id = %ctx.batch_id, total_rows = rows.len(), "文件解析完成");
        Ok(rows)
    }

    async fn run_pipeline(
        &self,
        ctx: RunContext,
        kind: EntityKind,
        rows: Vec<RawRow>,
        existing_roster: &HashSet<String>,
    ) -> ImportResult<ImportRun> {
        let schema = self.load_schema(kind).await?;
        self.warn_missing_columns(&rows, &schema);

        // === 阶段: 逐行校验 ===
        debug!(batch_id = %ctx.batch_id, stage = %ImportStage::Validating, rows = rows.len(), "逐行校验");
        let mut outcomes: Vec<RowOutcome> = Vec::with_capacity(rows.len());
        let mut candidates = Vec::new();
        for row in &rows {
            match self.validator.validate(row, &schema) {
                RowOutcome::Accepted(candidate) => candidates.push(candidate),
                rejected => {
                    if let RowOutcome::FormatError { row_number, message } = &rejected {
                        warn!(batch_id = %ctx.batch_id, row_number, reason = %message, "行校验未通过");
                    }
                    outcomes.push(rejected);
                }
            }
        }
        info!(
            batch_id = %ctx.batch_id,
            valid = candidates.len(),
            format_errors = outcomes.len(),
            "逐行校验完成"
        );

        // === 阶段: 去重（按文件顺序）===
        debug!(batch_id = %ctx.batch_id, stage = %ImportStage::Deduplicating, "身份键去重");
        candidates.sort_by_key(|c| c.row_number);
        let partition = self.deduplicator.dedup(candidates, existing_roster);
        info!(
            batch_id = %ctx.batch_id,
            accepted = partition.accepted.len(),
            duplicates = partition.duplicates.len(),
            "身份键去重完成"
        );
        outcomes.extend(partition.duplicates);

        // === 阶段: 整批写入 ===
        debug!(batch_id = %ctx.batch_id, stage = %ImportStage::Committing, "整批写入");
        let commit_result = self.committer.commit(kind, &partition.accepted).await;
        outcomes.extend(partition.accepted.into_iter().map(RowOutcome::Accepted));
        outcomes.sort_by_key(|o| o.row_number());

        // === 阶段: 汇总 ===
        let report = self.reporter.summarize(&outcomes, &commit_result);
        let elapsed_time = ctx.start_time.elapsed();
        info!(
            batch_id = %ctx.batch_id,
            stage = %ImportStage::Reported,
            total = report.total_processed,
            successful = report.successful,
            duplicates = report.duplicates.len(),
            format_errors = report.format_errors.len(),
            elapsed_ms = elapsed_time.as_millis() as u64,
            "花名册导入结束"
        );
        if let Some(fatal) = report.fatal_error() {
            warn!(batch_id = %ctx.batch_id, error = %fatal, "本次导入未写入任何记录");
        }

        Ok(ImportRun {
            batch_id: ctx.batch_id,
            entity_kind: kind,
            started_at: ctx.started_at,
            report,
            outcomes,
            elapsed_time,
        })
    }
}

#[async_trait::async_trait]
impl<S, C> RosterImporter for RosterImporterImpl<S, C>
where
    S: RosterStore + 'static,
    C: ImportConfigReader + Send + Sync,
{
    #[instrument(skip(self, file_path), fields(entity_kind = %kind))]
    async fn import_roster<P: AsRef<Path> + Send>(
        &self,
        kind: EntityKind,
        file_path: P,
    ) -> ImportResult<ImportRun> {
        let ctx = RunContext::begin(kind);
        info!(batch_id = %ctx.batch_id, file_path = %file_path.as_ref().display(), "开始导入花名册");

        let rows = self.extract_file(&ctx, file_path.as_ref())?;
        let existing_roster = self.load_existing_roster(kind).await?;
        self.run_pipeline(ctx, kind, rows, &existing_roster).await
    }

    #[instrument(skip(self, bytes), fields(entity_kind = %kind, size = bytes.len()))]
    async fn import_roster_bytes(
        &self,
        kind: EntityKind,
        bytes: &[u8],
        format: SpreadsheetFormat,
    ) -> ImportResult<ImportRun> {
        let ctx = RunContext::begin(kind);
        info!(batch_id = %ctx.batch_id, format = ?format, "开始导入花名册（内存缓冲区）");

        let rows = self.extract_buffer(&ctx, bytes, format)?;
        let existing_roster = self.load_existing_roster(kind).await?;
        self.run_pipeline(ctx, kind, rows, &existing_roster).await
    }

    #[instrument(skip(self, rows, existing_roster), fields(entity_kind = %kind))]
    async fn import_rows(
        &self,
        kind: EntityKind,
        rows: Vec<RawRow>,
        existing_roster: &HashSet<String>,
    ) -> ImportResult<ImportRun> {
        self.run_pipeline(RunContext::begin(kind), kind, rows, existing_roster).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::roster::{Candidate, ImportStatus};
    use crate::repository::error::{RepositoryError, RepositoryResult};
    use std::io::Write;
    use std::sync::Mutex;
    use tracing_subscriber::fmt::MakeWriter;

    // 收集日志输出
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
        }
    }

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLogs {
        type Writer = CapturedLogs;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        keys: Mutex<HashSet<String>>,
        insert_calls: Mutex<usize>,
        fail_lookup: bool,
    }

    #[async_trait::async_trait]
    impl RosterStore for MemoryStore {
        async fn list_identity_keys(&self, _kind: EntityKind) -> RepositoryResult<HashSet<String>> {
            if self.fail_lookup {
                return Err(RepositoryError::DatabaseConnectionError("offline".to_string()));
            }
            Ok(self.keys.lock().unwrap().clone())
        }

        async fn batch_insert(&self, _kind: EntityKind, records: &[Candidate]) -> RepositoryResult<usize> {
            *self.insert_calls.lock().unwrap() += 1;
            let mut keys = self.keys.lock().unwrap();
            for record in records {
                keys.insert(record.identity_key.clone());
            }
            Ok(records.len())
        }
    }

    fn importer(store: Arc<MemoryStore>) -> RosterImporterImpl<MemoryStore, ImportConfig> {
        RosterImporterImpl::with_default_components(store, ImportConfig::default())
    }

    fn student_row(row_number: usize, first: &str, user_id: &str, year: &str) -> RawRow {
        RawRow::new(
            row_number,
            vec![
                ("First Name".to_string(), first.to_string()),
                ("Surname".to_string(), "Smith".to_string()),
                ("User ID".to_string(), user_id.to_string()),
                ("Year Level".to_string(), year.to_string()),
            ],
        )
    }

    #[tokio::test]
    async fn test_outcomes_sorted_and_counted() {
        let store = Arc::new(MemoryStore::default());
        let rows = vec![
            student_row(2, "Alice", "a.smith", "9"),
            student_row(3, "Ann", "a.smith", "8"),
            student_row(4, "Bea", "b.smith", "15"),
        ];

        let run = importer(store.clone())
            .import_rows(EntityKind::Student, rows, &HashSet::new())
            .await
            .unwrap();

        let row_numbers: Vec<usize> = run.outcomes.iter().map(|o| o.row_number()).collect();
        assert_eq!(row_numbers, vec![2, 3, 4]);
        assert_eq!(run.report.successful, 1);
        assert_eq!(run.report.duplicates, vec!["Ann Smith (a.smith)"]);
        assert_eq!(run.report.format_errors.len(), 1);
        assert!(run.report.is_consistent());
        assert_eq!(*store.insert_calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_no_valid_rows_skips_store() {
        let store = Arc::new(MemoryStore::default());

        let run = importer(store.clone())
            .import_rows(EntityKind::Student, vec![student_row(2, "", "x", "9")], &HashSet::new())
            .await
            .unwrap();

        assert_eq!(run.report.status, ImportStatus::NoValidRows);
        assert_eq!(*store.insert_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_roster_lookup_failure_aborts() {
        let store = Arc::new(MemoryStore {
            fail_lookup: true,
            ..Default::default()
        });

        let err = importer(store)
            .import_roster_bytes(
                EntityKind::Student,
                b"First Name,Surname,User ID,Year Level\nAlice,Smith,a.smith,9\n",
                SpreadsheetFormat::Csv,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ImportError::RosterLookupError(_)));
    }

    #[tokio::test]
    async fn test_buffer_import_logs_every_stage() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        importer(Arc::new(MemoryStore::default()))
            .import_roster_bytes(
                EntityKind::Student,
                b"First Name,Surname,User ID,Year Level\nAlice,Smith,a.smith,9\n",
                SpreadsheetFormat::Csv,
            )
            .await
            .unwrap();

        let output = logs.contents();
        for stage in ["IDLE", "EXTRACTING", "VALIDATING", "DEDUPLICATING", "COMMITTING", "REPORTED"] {
            assert!(output.contains(&format!("stage={}", stage)), "missing stage {}", stage);
        }
    }
}
