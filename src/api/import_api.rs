// ==========================================
// 学校管理后台 - 花名册导入API
// ==========================================
// 职责: 封装花名册导入入口，供命令行/上层服务调用
// 并发: 同一实体类型同一时刻只允许一个导入在途
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ImportConfig, ImportConfigReader};
use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::roster::{ImportReport, ImportRun};
use crate::domain::types::EntityKind;
use crate::importer::{schema_for, RosterImporter, RosterImporterImpl, SpreadsheetFormat};
use crate::repository::{RosterStore, SqliteRosterStore};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// 导入API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportApiResponse {
    /// 批次ID
    pub batch_id: String,
    pub entity_kind: EntityKind,
    /// 汇总报告
    pub report: ImportReport,
    /// 顶层错误（NoValidRows / CommitFailed），成功时为空
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// 导入耗时（毫秒）
    pub elapsed_ms: i64,
}

impl From<ImportRun> for ImportApiResponse {
    fn from(run: ImportRun) -> Self {
        Self {
            error: run.report.fatal_error(),
            batch_id: run.batch_id,
            entity_kind: run.entity_kind,
            report: run.report,
            elapsed_ms: run.elapsed_time.as_millis() as i64,
        }
    }
}

// 在途导入占位；drop 时释放
struct InFlightGuard<'a> {
    slots: &'a Mutex<HashSet<EntityKind>>,
    kind: EntityKind,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(slots: &'a Mutex<HashSet<EntityKind>>, kind: EntityKind) -> ApiResult<Self> {
        let mut in_flight = slots
            .lock()
            .map_err(|e| ApiError::InternalError(format!("in-flight lock poisoned: {}", e)))?;
        if !in_flight.insert(kind) {
            warn!(entity_kind = %kind, "导入请求被拒绝：同类导入进行中");
            return Err(ApiError::ImportInProgress(kind));
        }
        Ok(Self { slots, kind })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut in_flight = match self.slots.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        in_flight.remove(&self.kind);
    }
}

/// 导入API
pub struct ImportApi<S, C>
where
    S: RosterStore,
    C: ImportConfigReader,
{
    importer: RosterImporterImpl<S, C>,
    in_flight: Mutex<HashSet<EntityKind>>,
}

impl ImportApi<SqliteRosterStore, ConfigManager> {
    /// 打开（必要时初始化）SQLite 数据库并装配默认组件
    ///
    /// 花名册存储与配置管理器共享同一连接
    pub fn open(db_path: &str) -> ApiResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| ApiError::DatabaseError(format!("cannot open {}: {}", db_path, e)))?;
        init_schema(&conn).map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        let conn = Arc::new(Mutex::new(conn));

        let store = Arc::new(SqliteRosterStore::from_connection(conn.clone())?);
        let config = ConfigManager::from_connection(conn)?;
        info!(db_path = %db_path, "ImportApi 初始化完成");

        Ok(Self::new(RosterImporterImpl::with_default_components(store, config)))
    }
}

impl<S, C> ImportApi<S, C>
where
    S: RosterStore + 'static,
    C: ImportConfigReader,
{
    /// 创建新的ImportApi实例
    pub fn new(importer: RosterImporterImpl<S, C>) -> Self {
        Self {
            importer,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// 导入花名册文件
    ///
    /// # 返回
    /// - Ok(ImportApiResponse): 含 NoValidRows / CommitFailed 终态，见 `error`
    /// - Err(ApiError::ParseError): 文件不可读
    /// - Err(ApiError::ImportInProgress): 同类导入进行中
    pub async fn import_roster(&self, kind: EntityKind, file_path: &str) -> ApiResult<ImportApiResponse> {
        if file_path.trim().is_empty() {
            return Err(ApiError::InvalidInput("file path must not be empty".to_string()));
        }

        let _guard = InFlightGuard::acquire(&self.in_flight, kind)?;
        let run = self.importer.import_roster(kind, Path::new(file_path)).await?;
        Ok(run.into())
    }

    /// 导入上传的文件内容
    pub async fn import_roster_bytes(
        &self,
        kind: EntityKind,
        bytes: &[u8],
        format: SpreadsheetFormat,
    ) -> ApiResult<ImportApiResponse> {
        let _guard = InFlightGuard::acquire(&self.in_flight, kind)?;
        let run = self.importer.import_roster_bytes(kind, bytes, format).await?;
        Ok(run.into())
    }

    /// 模板应包含的列（按契约顺序）
    pub fn expected_columns(&self, kind: EntityKind) -> ApiResult<Vec<String>> {
        let schema = schema_for(kind, &ImportConfig::default())?;
        Ok(schema.column_names().into_iter().map(str::to_string).collect())
    }
}
