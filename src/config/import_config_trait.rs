// ==========================================
// 学校管理后台 - 导入配置读取 Trait
// ==========================================
// 职责: 定义花名册导入所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::importer::error::ImportResult;
use async_trait::async_trait;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 构造字段契约所需的可调参数
// 实现者: ConfigManager（从 config_kv 表读取）, ImportConfig（静态快照）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    // ===== 学生字段 =====

    /// 获取年级范围（闭区间）
    ///
    /// # 默认值
    /// - (7, 12)
    async fn get_year_level_range(&self) -> ImportResult<(i64, i64)>;

    // ===== 教职工字段 =====

    /// 获取教职工 User ID 格式（正则）
    ///
    /// # 默认值
    /// - `^[a-z]+\.[a-z]+$`（小写 firstname.lastname）
    async fn get_staff_user_id_pattern(&self) -> ImportResult<String>;

    /// 获取允许的教职工角色
    ///
    /// # 默认值
    /// - ["Teaching Staff", "Support Staff", "Maintenance Staff"]
    async fn get_staff_roles(&self) -> ImportResult<Vec<String>>;
}
