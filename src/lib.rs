// ==========================================
// 学校管理后台 - 花名册导入核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 学生/教职工花名册批量导入（提取 → 校验 → 去重 → 写入 → 汇总）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 花名册存储
pub mod repository;

// 导入层 - 导入管道
pub mod importer;

// 配置层 - 导入配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 调用入口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ConflictSource, EntityKind, ImportStage};

// 领域实体
pub use domain::{
    Candidate, CommitResult, FieldDef, FieldSchema, FormatRule, ImportReport, ImportRun,
    ImportStatus, RawRow, RowOutcome, TargetField,
};

// 导入管道
pub use importer::{ImportError, ImportResult, RosterImporter, RosterImporterImpl};

// API
pub use api::{ApiError, ImportApi, ImportApiResponse};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "roster-import";
