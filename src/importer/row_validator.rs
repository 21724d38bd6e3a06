// ==========================================
// 学校管理后台 - 行校验器实现
// ==========================================
// 职责: 必填校验 + 格式规则校验 + 派生字段（name / identity_key）
// 红线: 纯函数；除 trim 外不做任何值转换，大小写原样保留
// ==========================================

use crate::domain::roster::{Candidate, RawRow, RowOutcome};
use crate::domain::schema::{FieldDef, FieldSchema, TargetField};
use crate::importer::roster_importer_trait::RowValidator;
use std::collections::BTreeMap;

/// 必填字段缺失时的行级文案
pub const MISSING_REQUIRED_MESSAGE: &str = "Missing required field(s).";

pub struct SchemaRowValidator;

impl SchemaRowValidator {
    /// 按 列名 → 别名 → 忽略大小写 的顺序取第一个非空值
    fn lookup<'a>(&self, row: &'a RawRow, def: &FieldDef) -> Option<&'a str> {
        let exact = def
            .header_candidates()
            .filter_map(|header| row.get(header))
            .map(str::trim)
            .find(|v| !v.is_empty());

        exact.or_else(|| {
            def.header_candidates()
                .filter_map(|header| row.get_ignore_case(header))
                .map(str::trim)
                .find(|v| !v.is_empty())
        })
    }
}

impl RowValidator for SchemaRowValidator {
    fn validate(&self, row: &RawRow, schema: &FieldSchema) -> RowOutcome {
        let values: Vec<(&FieldDef, Option<&str>)> = schema
            .fields()
            .iter()
            .map(|def| (def, self.lookup(row, def)))
            .collect();

        // 规则 1: 必填字段非空
        if values.iter().any(|(def, value)| def.required && value.is_none()) {
            return RowOutcome::FormatError {
                row_number: row.row_number,
                message: MISSING_REQUIRED_MESSAGE.to_string(),
            };
        }

        // 规则 2: 格式规则（只报告第一条违规）
        for (def, value) in &values {
            if let Some(value) = value {
                if let Err(message) = def.format_rule.check(value) {
                    return RowOutcome::FormatError {
                        row_number: row.row_number,
                        message,
                    };
                }
            }
        }

        let fields: BTreeMap<TargetField, String> = values
            .into_iter()
            .filter_map(|(def, value)| value.map(|v| (def.target_field, v.to_string())))
            .collect();

        let first_name = fields.get(&TargetField::FirstName).cloned().unwrap_or_default();
        let surname = fields.get(&TargetField::Surname).cloned().unwrap_or_default();
        let identity_key = fields.get(&TargetField::UserId).cloned().unwrap_or_default();

        RowOutcome::Accepted(Candidate {
            row_number: row.row_number,
            name: format!("{} {}", first_name, surname),
            identity_key,
            fields,
        })
    }
}
