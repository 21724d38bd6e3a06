// ==========================================
// 学校管理后台 - 花名册导入 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// 流程: 提取 → 逐行校验 → 去重 → 批量写入 → 汇总
// ==========================================

use crate::domain::roster::{Candidate, CommitResult, ImportReport, ImportRun, RawRow, RowOutcome};
use crate::domain::schema::FieldSchema;
use crate::domain::types::EntityKind;
use crate::importer::error::ImportResult;
use crate::importer::file_parser::SpreadsheetFormat;
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;

// ==========================================
// RosterImporter Trait
// ==========================================
// 用途: 花名册导入主接口（学生/教职工共用）
// 实现者: RosterImporterImpl
#[async_trait]
pub trait RosterImporter: Send + Sync {
    /// 从文件导入花名册
    ///
    /// # 参数
    /// - kind: 实体类型
    /// - file_path: 文件路径（.csv/.xlsx/.xlsm/.xls/.ods）
    ///
    /// # 返回
    /// - Ok(ImportRun): 导入结果（含 NoValidRows / CommitFailed 终态）
    /// - Err: ParseError（文件不可读/损坏）、配置或花名册快照读取失败
    async fn import_roster<P: AsRef<Path> + Send>(
        &self,
        kind: EntityKind,
        file_path: P,
    ) -> ImportResult<ImportRun>;

    /// 从内存缓冲区导入花名册（上传文件）
    async fn import_roster_bytes(
        &self,
        kind: EntityKind,
        bytes: &[u8],
        format: SpreadsheetFormat,
    ) -> ImportResult<ImportRun>;

    /// 对已提取的原始行执行校验 → 去重 → 写入 → 汇总
    ///
    /// # 参数
    /// - existing_roster: 调用开始时的花名册身份键快照（只读）
    async fn import_rows(
        &self,
        kind: EntityKind,
        rows: Vec<RawRow>,
        existing_roster: &HashSet<String>,
    ) -> ImportResult<ImportRun>;
}

// ==========================================
// TableExtractor Trait
// ==========================================
// 用途: 文件 → 有序原始行（不含业务规则）
// 实现者: CsvParser, ExcelParser, UniversalFileParser
pub trait TableExtractor: Send + Sync {
    /// 解析文件为原始行记录
    ///
    /// # 返回
    /// - Ok(Vec<RawRow>): 按文件顺序排列，空白行已剔除
    /// - Err: ParseError
    fn extract(&self, file_path: &Path) -> ImportResult<Vec<RawRow>>;

    /// 解析内存缓冲区
    fn extract_bytes(&self, bytes: &[u8], format: SpreadsheetFormat) -> ImportResult<Vec<RawRow>>;
}

// ==========================================
// RowValidator Trait
// ==========================================
// 用途: 单行字段校验 + 派生字段（纯函数）
// 实现者: SchemaRowValidator
pub trait RowValidator: Send + Sync {
    /// 校验单行
    ///
    /// # 返回
    /// - RowOutcome::Accepted: 通过校验的候选记录
    /// - RowOutcome::FormatError: 每行只报告第一条违规
    fn validate(&self, row: &RawRow, schema: &FieldSchema) -> RowOutcome;
}

// ==========================================
// BatchDeduplicator Trait
// ==========================================
// 用途: 身份键去重（已有花名册 + 同批次）
// 实现者: BatchDeduplicatorImpl
pub trait BatchDeduplicator: Send + Sync {
    /// 按文件顺序去重，先出现者保留
    ///
    /// # 参数
    /// - candidates: 按行号排列的候选记录
    /// - existing_roster: 已有花名册身份键
    fn dedup(&self, candidates: Vec<Candidate>, existing_roster: &HashSet<String>)
        -> DedupPartition;
}

/// 去重结果
#[derive(Debug, Clone, Default)]
pub struct DedupPartition {
    pub accepted: Vec<Candidate>,
    pub duplicates: Vec<RowOutcome>, // 仅 RowOutcome::DuplicateError
}

// ==========================================
// ImportCommitter Trait
// ==========================================
// 用途: 整批写入（管道中唯一有副作用的阶段）
// 实现者: StoreCommitter
#[async_trait]
pub trait ImportCommitter: Send + Sync {
    /// 整批写入；空集直接返回 NoOp 且不调用存储
    async fn commit(&self, kind: EntityKind, accepted: &[Candidate]) -> CommitResult;
}

// ==========================================
// ImportReporter Trait
// ==========================================
// 用途: 逐行结果 → 汇总报告
// 实现者: ImportReporterImpl
pub trait ImportReporter: Send + Sync {
    fn summarize(&self, outcomes: &[RowOutcome], commit_result: &CommitResult) -> ImportReport;
}
