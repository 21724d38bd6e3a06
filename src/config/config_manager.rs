// ==========================================
// 学校管理后台 - 配置管理器
// ==========================================
// 职责: 导入配置加载、查询、覆写
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config::{
    DEFAULT_STAFF_ROLES, DEFAULT_STAFF_USER_ID_PATTERN, DEFAULT_YEAR_LEVEL_MAX,
    DEFAULT_YEAR_LEVEL_MIN,
};
use crate::config::import_config_trait::ImportConfigReader;
use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use crate::importer::error::{ImportError, ImportResult};
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ImportResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ImportResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;
            configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> ImportResult<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> ImportResult<String> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 读取整数配置；格式错误时回退默认值
    fn get_i64_or_default(&self, key: &str, default: i64) -> ImportResult<i64> {
        let value = self.get_config_or_default(key, &default.to_string())?;
        Ok(value.trim().parse::<i64>().unwrap_or_else(|_| {
            tracing::warn!(config_key = key, raw_value = %value, "整数配置格式错误，使用默认值");
            default
        }))
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> ImportResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有 global 配置
    pub fn list_configs(&self) -> ImportResult<HashMap<String, String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }
        Ok(config_map)
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_year_level_range(&self) -> ImportResult<(i64, i64)> {
        let min = self.get_i64_or_default(config_keys::STUDENT_YEAR_LEVEL_MIN, DEFAULT_YEAR_LEVEL_MIN)?;
        let max = self.get_i64_or_default(config_keys::STUDENT_YEAR_LEVEL_MAX, DEFAULT_YEAR_LEVEL_MAX)?;
        Ok((min, max))
    }

    async fn get_staff_user_id_pattern(&self) -> ImportResult<String> {
        let value = self.get_config_or_default(
            config_keys::STAFF_USER_ID_PATTERN,
            DEFAULT_STAFF_USER_ID_PATTERN,
        )?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Ok(DEFAULT_STAFF_USER_ID_PATTERN.to_string())
        } else {
            Ok(trimmed.to_string())
        }
    }

    async fn get_staff_roles(&self) -> ImportResult<Vec<String>> {
        let value = self.get_config_or_default(config_keys::STAFF_ROLES, &DEFAULT_STAFF_ROLES.join(","))?;
        let roles: Vec<String> = value
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if roles.is_empty() {
            Ok(DEFAULT_STAFF_ROLES.iter().map(|r| r.to_string()).collect())
        } else {
            Ok(roles)
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 学生年级
    pub const STUDENT_YEAR_LEVEL_MIN: &str = "student_year_level_min";
    pub const STUDENT_YEAR_LEVEL_MAX: &str = "student_year_level_max";

    // 教职工
    pub const STAFF_USER_ID_PATTERN: &str = "staff_user_id_pattern";
    pub const STAFF_ROLES: &str = "staff_roles";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImportConfig;
    use tempfile::NamedTempFile;

    fn create_manager() -> (NamedTempFile, ConfigManager) {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap().to_string();
        let conn = open_sqlite_connection(&db_path).unwrap();
        crate::db::init_schema(&conn).unwrap();
        drop(conn);
        let manager = ConfigManager::new(&db_path).unwrap();
        (temp_file, manager)
    }

    #[tokio::test]
    async fn test_defaults_when_unset() {
        let (_temp, manager) = create_manager();

        assert_eq!(manager.get_year_level_range().await.unwrap(), (7, 12));
        assert_eq!(
            manager.get_staff_user_id_pattern().await.unwrap(),
            DEFAULT_STAFF_USER_ID_PATTERN
        );
        assert_eq!(
            manager.get_staff_roles().await.unwrap(),
            vec!["Teaching Staff", "Support Staff", "Maintenance Staff"]
        );
    }

    #[tokio::test]
    async fn test_overrides_from_config_kv() {
        let (_temp, manager) = create_manager();
        manager.set_config_value(config_keys::STUDENT_YEAR_LEVEL_MIN, "1").unwrap();
        manager
            .set_config_value(config_keys::STAFF_ROLES, "Teaching Staff, Admin Staff ,")
            .unwrap();

        assert_eq!(manager.get_year_level_range().await.unwrap(), (1, 12));
        assert_eq!(
            manager.get_staff_roles().await.unwrap(),
            vec!["Teaching Staff", "Admin Staff"]
        );

        let snapshot = ImportConfig::load(&manager).await.unwrap();
        assert_eq!(snapshot.year_level_min, 1);
        assert_eq!(manager.list_configs().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_number_falls_back() {
        let (_temp, manager) = create_manager();
        manager.set_config_value(config_keys::STUDENT_YEAR_LEVEL_MAX, "twelve").unwrap();

        assert_eq!(manager.get_year_level_range().await.unwrap(), (7, 12));
    }
}
