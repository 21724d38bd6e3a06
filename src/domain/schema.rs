// ==========================================
// 学校管理后台 - 导入字段契约
// ==========================================
// 职责: 描述一种实体的导入字段（列名/必填/格式规则/目标字段）
// 红线: 字段契约是数据而不是代码，学生/教职工共用同一个校验器
// ==========================================

use crate::domain::types::EntityKind;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 目标字段 (Target Field)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetField {
    FirstName,
    Surname,
    UserId,
    YearLevel,
    StaffRole,
    Email,
}

impl TargetField {
    /// 存储列名
    pub fn column(&self) -> &'static str {
        match self {
            TargetField::FirstName => "first_name",
            TargetField::Surname => "surname",
            TargetField::UserId => "user_id",
            TargetField::YearLevel => "year_level",
            TargetField::StaffRole => "role",
            TargetField::Email => "email",
        }
    }
}

impl fmt::Display for TargetField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

// ==========================================
// 格式规则 (Format Rule)
// ==========================================
// message 为行级错误文案（"Row N: " 前缀由报告器添加）
#[derive(Debug, Clone)]
pub enum FormatRule {
    None,
    Pattern { regex: Regex, message: String },
    Range { min: i64, max: i64, message: String },
    OneOf { allowed: Vec<String>, message: String },
}

impl FormatRule {
    /// 校验单个（已 trim、非空）值
    ///
    /// # 返回
    /// - Ok(()): 通过
    /// - Err(message): 违反规则时的行级错误文案
    pub fn check(&self, value: &str) -> Result<(), String> {
        match self {
            FormatRule::None => Ok(()),
            FormatRule::Pattern { regex, message } => {
                if regex.is_match(value) {
                    Ok(())
                } else {
                    Err(message.clone())
                }
            }
            // 只接受规范写法（无符号、无前导零）
            FormatRule::Range { min, max, message } => match value.parse::<i64>() {
                Ok(n) if n.to_string() == value && n >= *min && n <= *max => Ok(()),
                _ => Err(message.clone()),
            },
            FormatRule::OneOf { allowed, message } => {
                if allowed.iter().any(|a| a == value) {
                    Ok(())
                } else {
                    Err(message.clone())
                }
            }
        }
    }
}

// ==========================================
// 字段定义 (Field Definition)
// ==========================================
#[derive(Debug, Clone)]
pub struct FieldDef {
    pub column_name: String,   // 模板列名（表头）
    pub aliases: Vec<String>,  // 可接受的别名列
    pub required: bool,        // 是否必填
    pub format_rule: FormatRule,
    pub target_field: TargetField,
}

impl FieldDef {
    pub fn new(column_name: &str, target_field: TargetField) -> Self {
        Self {
            column_name: column_name.to_string(),
            aliases: Vec::new(),
            required: false,
            format_rule: FormatRule::None,
            target_field,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_rule(mut self, rule: FormatRule) -> Self {
        self.format_rule = rule;
        self
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }

    /// 该字段可匹配的所有表头（列名在前）
    pub fn header_candidates(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.column_name.as_str()).chain(self.aliases.iter().map(|a| a.as_str()))
    }
}

// ==========================================
// 字段契约 (Field Schema)
// ==========================================
#[derive(Debug, Clone)]
pub struct FieldSchema {
    entity_kind: EntityKind,
    fields: Vec<FieldDef>,
}

impl FieldSchema {
    pub fn new(entity_kind: EntityKind, fields: Vec<FieldDef>) -> Self {
        Self {
            entity_kind,
            fields,
        }
    }

    pub fn entity_kind(&self) -> EntityKind {
        self.entity_kind
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn field(&self, target: TargetField) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.target_field == target)
    }

    /// 模板列名（按定义顺序）
    pub fn column_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.column_name.as_str()).collect()
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.required)
    }
}
