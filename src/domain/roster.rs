// ==========================================
// 学校管理后台 - 花名册导入领域模型
// ==========================================
// 职责: 原始行 / 候选记录 / 行结果 / 导入报告
// 红线: 不含数据访问逻辑
// ==========================================

use crate::domain::schema::TargetField;
use crate::domain::types::{ConflictSource, EntityKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 无可导入行时的顶层提示
pub const NO_VALID_ROWS_MESSAGE: &str = "No valid rows found to import";

// ==========================================
// RawRow - 原始行记录
// ==========================================
// 表头 → 单元格值（已 trim），保留表头顺序
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    pub row_number: usize,            // 表格物理行号（表头为第 1 行）
    pub cells: Vec<(String, String)>, // (列名, 值)
}

impl RawRow {
    pub fn new(row_number: usize, cells: Vec<(String, String)>) -> Self {
        Self { row_number, cells }
    }

    /// 按表头精确查找
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(header, _)| header == column)
            .map(|(_, value)| value.as_str())
    }

    /// 按表头查找（忽略大小写）
    pub fn get_ignore_case(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(column))
            .map(|(_, value)| value.as_str())
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(header, _)| header.as_str())
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, value)| value.trim().is_empty())
    }
}

// ==========================================
// Candidate - 通过字段校验的候选记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub row_number: usize,                      // 源文件行号
    pub name: String,                           // 派生: first_name + " " + surname
    pub identity_key: String,                   // 派生: user_id（保留大小写）
    pub fields: BTreeMap<TargetField, String>,  // 目标字段值
}

impl Candidate {
    pub fn field(&self, target: TargetField) -> Option<&str> {
        self.fields.get(&target).map(|v| v.as_str())
    }

    pub fn first_name(&self) -> &str {
        self.field(TargetField::FirstName).unwrap_or_default()
    }

    pub fn surname(&self) -> &str {
        self.field(TargetField::Surname).unwrap_or_default()
    }

    pub fn year_level(&self) -> Option<i64> {
        self.field(TargetField::YearLevel)
            .and_then(|v| v.parse::<i64>().ok())
    }

    /// 身份键比较口径（忽略大小写）
    pub fn folded_key(&self) -> String {
        fold_identity_key(&self.identity_key)
    }

    /// 报告展示: "Name (userID)"
    pub fn display_label(&self) -> String {
        format!("{} ({})", self.name, self.identity_key)
    }
}

/// 身份键统一折叠为小写后比较
pub fn fold_identity_key(key: &str) -> String {
    key.trim().to_lowercase()
}

// ==========================================
// RowOutcome - 单行处理结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RowOutcome {
    Accepted(Candidate),
    FormatError {
        row_number: usize,
        message: String,
    },
    DuplicateError {
        row_number: usize,
        identity_key: String,
        name: String,
        conflicts_with: ConflictSource,
    },
}

impl RowOutcome {
    pub fn row_number(&self) -> usize {
        match self {
            RowOutcome::Accepted(candidate) => candidate.row_number,
            RowOutcome::FormatError { row_number, .. } => *row_number,
            RowOutcome::DuplicateError { row_number, .. } => *row_number,
        }
    }

    pub fn duplicate_of(candidate: &Candidate, conflicts_with: ConflictSource) -> Self {
        RowOutcome::DuplicateError {
            row_number: candidate.row_number,
            identity_key: candidate.identity_key.clone(),
            name: candidate.name.clone(),
            conflicts_with,
        }
    }
}

// ==========================================
// CommitResult - 批量写入结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CommitResult {
    NoOp,                          // 无可写入记录，未调用存储
    Committed { inserted: usize }, // 整批写入成功
    Failed { reason: String },     // 整批写入失败
}

// ==========================================
// ImportStatus - 导入终态
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImportStatus {
    Committed { inserted: usize },
    NoValidRows,
    CommitFailed { reason: String },
}

// ==========================================
// ImportReport - 导入汇总
// ==========================================
// 恒等式: total_processed == successful + uncommitted + duplicates.len() + format_errors.len()
// 非 CommitFailed 时 uncommitted == 0
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub total_processed: usize,
    pub successful: usize,
    pub uncommitted: usize,          // 校验通过但因写入失败未落库的行
    pub duplicates: Vec<String>,     // "Name (userID)"
    pub format_errors: Vec<String>,  // "Row N: message"
    pub status: ImportStatus,
}

impl ImportReport {
    pub fn is_consistent(&self) -> bool {
        self.total_processed
            == self.successful + self.uncommitted + self.duplicates.len() + self.format_errors.len()
    }

    /// 顶层错误提示（NoValidRows / CommitFailed）
    pub fn fatal_error(&self) -> Option<String> {
        match &self.status {
            ImportStatus::Committed { .. } => None,
            ImportStatus::NoValidRows => Some(NO_VALID_ROWS_MESSAGE.to_string()),
            ImportStatus::CommitFailed { reason } => Some(format!("Import failed: {}", reason)),
        }
    }

    pub fn is_committed(&self) -> bool {
        matches!(self.status, ImportStatus::Committed { .. })
    }
}

// ==========================================
// ImportRun - 单次导入调用的完整结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRun {
    pub batch_id: String,                  // 批次 ID（UUID）
    pub entity_kind: EntityKind,
    pub started_at: DateTime<Utc>,
    pub report: ImportReport,
    pub outcomes: Vec<RowOutcome>,         // 逐行结果（诊断用）
    pub elapsed_time: std::time::Duration,
}
