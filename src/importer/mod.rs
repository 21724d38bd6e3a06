// ==========================================
// 学校管理后台 - 导入层
// ==========================================
// 职责: 花名册表格导入（学生/教职工）
// 支持: CSV, Excel (.xlsx/.xlsm/.xls), ODS
// ==========================================

// 模块声明
pub mod batch_deduplicator;
pub mod error;
pub mod field_schema;
pub mod file_parser;
pub mod import_committer;
pub mod import_reporter;
pub mod roster_importer_impl;
pub mod roster_importer_trait;
pub mod row_validator;

// 重导出核心类型
pub use batch_deduplicator::BatchDeduplicatorImpl;
pub use error::{ImportError, ImportResult};
pub use field_schema::{schema_for, staff_schema, student_schema};
pub use file_parser::{CsvParser, ExcelParser, SpreadsheetFormat, UniversalFileParser};
pub use import_committer::StoreCommitter;
pub use import_reporter::ImportReporterImpl;
pub use roster_importer_impl::RosterImporterImpl;
pub use row_validator::{SchemaRowValidator, MISSING_REQUIRED_MESSAGE};

// 重导出 Trait 接口
pub use roster_importer_trait::{
    BatchDeduplicator, DedupPartition, ImportCommitter, ImportReporter, RosterImporter,
    RowValidator, TableExtractor,
};
