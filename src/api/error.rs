// ==========================================
// 学校管理后台 - API层错误类型
// ==========================================
// 职责: 将导入层/仓储层错误转换为面向调用方的错误消息
// ==========================================

use crate::domain::types::EntityKind;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 调用方错误
    // ==========================================
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// 同一实体类型的导入正在进行
    #[error("A {0} import is already in progress")]
    ImportInProgress(EntityKind),

    // ==========================================
    // 导入错误
    // ==========================================
    /// 文件不可读/格式不支持/内容损坏
    #[error("Could not read the uploaded file: {0}")]
    ParseError(String),

    #[error("Import failed: {0}")]
    ImportError(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("Internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        if err.is_parse_error() {
            return ApiError::ParseError(err.to_string());
        }

        match err {
            ImportError::RosterLookupError(msg) | ImportError::DatabaseQueryError(msg) => {
                ApiError::DatabaseError(msg)
            }
            ImportError::InternalError(msg) => ApiError::InternalError(msg),
            ImportError::Other(err) => ApiError::Other(err),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("{}: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_errors_map_to_parse_error() {
        let err: ApiError = ImportError::UnsupportedFormat("pdf".to_string()).into();
        assert!(matches!(err, ApiError::ParseError(_)));

        let err: ApiError = ImportError::EmptyFile.into();
        assert!(matches!(err, ApiError::ParseError(_)));
    }

    #[test]
    fn test_config_error_maps_to_import_error() {
        let err: ApiError = ImportError::ConfigValueError {
            key: "staff_roles".to_string(),
            value: String::new(),
            message: "at least one staff role is required".to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::ImportError(_)));
    }

    #[test]
    fn test_in_progress_message() {
        assert_eq!(
            ApiError::ImportInProgress(EntityKind::Staff).to_string(),
            "A Staff import is already in progress"
        );
    }
}
