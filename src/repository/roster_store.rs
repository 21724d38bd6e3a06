// ==========================================
// 学校管理后台 - 花名册存储 Trait
// ==========================================
// 职责: 定义花名册数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::roster::Candidate;
use crate::domain::types::EntityKind;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use std::collections::HashSet;

// ==========================================
// RosterStore Trait
// ==========================================
// 用途: 学生/教职工花名册读写
// 实现者: SqliteRosterStore（使用 rusqlite）
#[async_trait]
pub trait RosterStore: Send + Sync {
    /// 读取已有花名册的全部身份键（原样大小写）
    async fn list_identity_keys(&self, kind: EntityKind) -> RepositoryResult<HashSet<String>>;

    /// 整批插入（单事务）
    ///
    /// # 返回
    /// - Ok(usize): 插入条数
    /// - Err: 任一行失败则整批回滚
    async fn batch_insert(&self, kind: EntityKind, records: &[Candidate]) -> RepositoryResult<usize>;
}
