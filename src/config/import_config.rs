// ==========================================
// 学校管理后台 - 导入配置快照
// ==========================================
// 职责: 单次导入调用开始时读取一次配置，之后只读
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::importer::error::{ImportError, ImportResult};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_YEAR_LEVEL_MIN: i64 = 7;
pub const DEFAULT_YEAR_LEVEL_MAX: i64 = 12;
pub const DEFAULT_STAFF_USER_ID_PATTERN: &str = r"^[a-z]+\.[a-z]+$";
pub const DEFAULT_STAFF_ROLES: [&str; 3] = ["Teaching Staff", "Support Staff", "Maintenance Staff"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConfig {
    pub year_level_min: i64,
    pub year_level_max: i64,
    pub staff_user_id_pattern: String,
    pub staff_roles: Vec<String>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            year_level_min: DEFAULT_YEAR_LEVEL_MIN,
            year_level_max: DEFAULT_YEAR_LEVEL_MAX,
            staff_user_id_pattern: DEFAULT_STAFF_USER_ID_PATTERN.to_string(),
            staff_roles: DEFAULT_STAFF_ROLES.iter().map(|r| r.to_string()).collect(),
        }
    }
}

impl ImportConfig {
    /// 从配置读取器加载快照并校验
    pub async fn load<C: ImportConfigReader + ?Sized>(reader: &C) -> ImportResult<Self> {
        let (year_level_min, year_level_max) = reader.get_year_level_range().await?;
        let config = Self {
            year_level_min,
            year_level_max,
            staff_user_id_pattern: reader.get_staff_user_id_pattern().await?,
            staff_roles: reader.get_staff_roles().await?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ImportResult<()> {
        if self.year_level_min > self.year_level_max {
            return Err(ImportError::ConfigValueError {
                key: "student_year_level_min/max".to_string(),
                value: format!("{}..{}", self.year_level_min, self.year_level_max),
                message: "min must not exceed max".to_string(),
            });
        }
        if self.staff_roles.is_empty() {
            return Err(ImportError::ConfigValueError {
                key: "staff_roles".to_string(),
                value: String::new(),
                message: "at least one staff role is required".to_string(),
            });
        }
        self.compile_staff_user_id_pattern()?;
        Ok(())
    }

    pub fn compile_staff_user_id_pattern(&self) -> ImportResult<Regex> {
        Regex::new(&self.staff_user_id_pattern).map_err(|e| ImportError::ConfigValueError {
            key: "staff_user_id_pattern".to_string(),
            value: self.staff_user_id_pattern.clone(),
            message: e.to_string(),
        })
    }
}

// 静态快照本身也可作为配置源（测试 / 无数据库场景）
#[async_trait]
impl ImportConfigReader for ImportConfig {
    async fn get_year_level_range(&self) -> ImportResult<(i64, i64)> {
        Ok((self.year_level_min, self.year_level_max))
    }

    async fn get_staff_user_id_pattern(&self) -> ImportResult<String> {
        Ok(self.staff_user_id_pattern.clone())
    }

    async fn get_staff_roles(&self) -> ImportResult<Vec<String>> {
        Ok(self.staff_roles.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_default_snapshot() {
        let config = ImportConfig::load(&ImportConfig::default()).await.unwrap();
        assert_eq!(config.year_level_min, 7);
        assert_eq!(config.year_level_max, 12);
        assert_eq!(config.staff_roles.len(), 3);
    }

    #[tokio::test]
    async fn test_invalid_pattern_is_config_error() {
        let source = ImportConfig {
            staff_user_id_pattern: "^[a-z+$".to_string(),
            ..ImportConfig::default()
        };
        let err = ImportConfig::load(&source).await.unwrap_err();
        assert!(matches!(err, ImportError::ConfigValueError { .. }));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let config = ImportConfig {
            year_level_min: 12,
            year_level_max: 7,
            ..ImportConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
