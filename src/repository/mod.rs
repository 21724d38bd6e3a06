// ==========================================
// 学校管理后台 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化
// ==========================================

pub mod error;
pub mod roster_store;
pub mod roster_store_impl;

pub use error::{RepositoryError, RepositoryResult};
pub use roster_store::RosterStore;
pub use roster_store_impl::SqliteRosterStore;
