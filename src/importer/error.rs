// ==========================================
// 学校管理后台 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 行级问题（格式错误/重复）是 RowOutcome，不是错误；
//       这里只放终止整次调用的错误
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误（ParseError 族）=====
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported file format: {0} (expected .csv, .xlsx, .xlsm, .xls or .ods)")]
    UnsupportedFormat(String),

    #[error("Could not read file: {0}")]
    FileReadError(String),

    #[error("Could not parse spreadsheet: {0}")]
    ExcelParseError(String),

    #[error("Could not parse CSV: {0}")]
    CsvParseError(String),

    #[error("File has no header row")]
    EmptyFile,

    // ===== 配置错误 =====
    #[error("Invalid import configuration (key: {key}, value: {value}): {message}")]
    ConfigValueError {
        key: String,
        value: String,
        message: String,
    },

    // ===== 数据库错误 =====
    #[error("Could not load existing roster: {0}")]
    RosterLookupError(String),

    #[error("Database query failed: {0}")]
    DatabaseQueryError(String),

    // ===== 通用错误 =====
    #[error("Internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 是否属于文件级 ParseError（导入前即终止）
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            ImportError::FileNotFound(_)
                | ImportError::UnsupportedFormat(_)
                | ImportError::FileReadError(_)
                | ImportError::ExcelParseError(_)
                | ImportError::CsvParseError(_)
                | ImportError::EmptyFile
        )
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::DatabaseQueryError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_classification() {
        assert!(ImportError::EmptyFile.is_parse_error());
        assert!(ImportError::UnsupportedFormat("pdf".to_string()).is_parse_error());
        assert!(!ImportError::RosterLookupError("db".to_string()).is_parse_error());
    }

    #[test]
    fn test_io_error_maps_to_read_error() {
        let err: ImportError = std::io::Error::new(std::io::ErrorKind::Other, "boom").into();
        assert!(matches!(err, ImportError::FileReadError(_)));
        assert!(err.is_parse_error());
    }
}
