// ==========================================
// 学校管理后台 - 领域类型定义
// ==========================================
// 职责: 花名册实体类型、冲突来源、导入阶段
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 实体类型 (Entity Kind)
// ==========================================
// 每种实体各自拥有一份花名册和一份导入字段契约
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Student, // 学生
    Staff,   // 教职工
}

impl EntityKind {
    /// 花名册存储表名
    pub fn table_name(&self) -> &'static str {
        match self {
            EntityKind::Student => "student",
            EntityKind::Staff => "staff",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Student => write!(f, "Student"),
            EntityKind::Staff => write!(f, "Staff"),
        }
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "student" | "students" => Ok(EntityKind::Student),
            "staff" => Ok(EntityKind::Staff),
            other => Err(format!("unknown entity kind: {}", other)),
        }
    }
}

// ==========================================
// 冲突来源 (Conflict Source)
// ==========================================
// existing: 与已有花名册冲突; batch: 与同一文件中更早的行冲突
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictSource {
    Existing,
    Batch,
}

impl fmt::Display for ConflictSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictSource::Existing => write!(f, "existing"),
            ConflictSource::Batch => write!(f, "batch"),
        }
    }
}

// ==========================================
// 导入阶段 (Import Stage)
// ==========================================
// Idle -> Extracting -> Validating -> Deduplicating -> Committing -> Reported
// Extracting 失败 (ParseError) 与 Committing 空集 (NoValidRows) 直接进入 Reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportStage {
    Idle,
    Extracting,
    Validating,
    Deduplicating,
    Committing,
    Reported,
}

impl fmt::Display for ImportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportStage::Idle => write!(f, "IDLE"),
            ImportStage::Extracting => write!(f, "EXTRACTING"),
            ImportStage::Validating => write!(f, "VALIDATING"),
            ImportStage::Deduplicating => write!(f, "DEDUPLICATING"),
            ImportStage::Committing => write!(f, "COMMITTING"),
            ImportStage::Reported => write!(f, "REPORTED"),
        }
    }
}
