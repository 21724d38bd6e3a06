// ==========================================
// 学校管理后台 - 花名册存储 SQLite 实现
// ==========================================
// 职责: student / staff 表读写（使用 rusqlite）
// 红线: 普通 INSERT，不覆盖已有记录；整批单事务
// ==========================================

use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use crate::domain::roster::Candidate;
use crate::domain::schema::TargetField;
use crate::domain::types::EntityKind;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::roster_store::RosterStore;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, Transaction};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

// ==========================================
// SqliteRosterStore
// ==========================================
pub struct SqliteRosterStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRosterStore {
    /// 创建新的存储实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（需已执行 init_schema）
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（与 ConfigManager 共享连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    fn insert_students_tx(tx: &Transaction, records: &[Candidate], created_at: &str) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO student (user_id, first_name, surname, name, year_level, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )?;

        let mut count = 0;
        for record in records {
            let year_level = record.year_level().ok_or_else(|| RepositoryError::FieldValueError {
                field: TargetField::YearLevel.column().to_string(),
                message: format!("row {} has no numeric year level", record.row_number),
            })?;

            stmt.execute(params![
                record.identity_key,
                record.first_name(),
                record.surname(),
                record.name,
                year_level,
                created_at,
            ])?;
            count += 1;
        }

        Ok(count)
    }

    fn insert_staff_tx(tx: &Transaction, records: &[Candidate], created_at: &str) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO staff (user_id, first_name, surname, name, role, email, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )?;

        let mut count = 0;
        for record in records {
            stmt.execute(params![
                record.identity_key,
                record.first_name(),
                record.surname(),
                record.name,
                record.field(TargetField::StaffRole).unwrap_or_default(),
                record.field(TargetField::Email),
                created_at,
            ])?;
            count += 1;
        }

        Ok(count)
    }
}

#[async_trait]
impl RosterStore for SqliteRosterStore {
    async fn list_identity_keys(&self, kind: EntityKind) -> RepositoryResult<HashSet<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let sql = format!("SELECT user_id FROM {}", kind.table_name());
        let mut stmt = conn.prepare(&sql)?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;

        Ok(keys)
    }

    async fn batch_insert(&self, kind: EntityKind, records: &[Candidate]) -> RepositoryResult<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        let tx = conn.unchecked_transaction()?;
        let created_at = Utc::now().to_rfc3339();

        // 出错时 tx 被 drop，整批回滚
        let count = match kind {
            EntityKind::Student => Self::insert_students_tx(&tx, records, &created_at)?,
            EntityKind::Staff => Self::insert_staff_tx(&tx, records, &created_at)?,
        };

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(count)
    }
}
