// ==========================================
// 学校管理后台 - 领域模型层
// ==========================================
// 职责: 定义花名册导入的实体、类型、字段契约
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod roster;
pub mod schema;
pub mod types;

// 重导出核心类型
pub use roster::{
    fold_identity_key, Candidate, CommitResult, ImportReport, ImportRun, ImportStatus, RawRow,
    RowOutcome, NO_VALID_ROWS_MESSAGE,
};
pub use schema::{FieldDef, FieldSchema, FormatRule, TargetField};
pub use types::{ConflictSource, EntityKind, ImportStage};
