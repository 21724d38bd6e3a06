// ==========================================
// 学校管理后台 - 标准字段映射表
// ==========================================
// 职责: 模板列名 → 目标字段 + 必填 + 格式规则
// 说明: 学生/教职工各一份契约；别名用于兼容旧模板
// ==========================================

use crate::config::ImportConfig;
use crate::domain::schema::{FieldDef, FieldSchema, FormatRule, TargetField};
use crate::domain::types::EntityKind;
use crate::importer::error::ImportResult;

// 模板列名
pub const COL_FIRST_NAME: &str = "First Name";
pub const COL_SURNAME: &str = "Surname";
pub const COL_USER_ID: &str = "User ID";
pub const COL_YEAR_LEVEL: &str = "Year Level";
pub const COL_STAFF_ROLE: &str = "Staff Role";
pub const COL_EMAIL: &str = "Email";

/// 按实体类型构造字段契约
pub fn schema_for(kind: EntityKind, config: &ImportConfig) -> ImportResult<FieldSchema> {
    match kind {
        EntityKind::Student => Ok(student_schema(config)),
        EntityKind::Staff => staff_schema(config),
    }
}

fn name_fields() -> Vec<FieldDef> {
    vec![
        FieldDef::new(COL_FIRST_NAME, TargetField::FirstName)
            .required()
            .with_aliases(&["FirstName", "Given Name"]),
        FieldDef::new(COL_SURNAME, TargetField::Surname)
            .required()
            .with_aliases(&["Last Name", "LastName", "Family Name"]),
    ]
}

/// 学生: First Name, Surname, User ID, Year Level (7–12)
pub fn student_schema(config: &ImportConfig) -> FieldSchema {
    let mut fields = name_fields();
    fields.push(
        FieldDef::new(COL_USER_ID, TargetField::UserId)
            .required()
            .with_aliases(&["UserID", "User Id", "Student ID"]),
    );
    fields.push(
        FieldDef::new(COL_YEAR_LEVEL, TargetField::YearLevel)
            .required()
            .with_aliases(&["Year", "YearLevel"])
            .with_rule(FormatRule::Range {
                min: config.year_level_min,
                max: config.year_level_max,
                message: format!(
                    "Year Level must be a whole number between {} and {}.",
                    config.year_level_min, config.year_level_max
                ),
            }),
    );

    FieldSchema::new(EntityKind::Student, fields)
}

/// 教职工: First Name, Surname, User ID (firstname.lastname), Staff Role, Email (可选)
pub fn staff_schema(config: &ImportConfig) -> ImportResult<FieldSchema> {
    let regex = config.compile_staff_user_id_pattern()?;

    let mut fields = name_fields();
    fields.push(
        FieldDef::new(COL_USER_ID, TargetField::UserId)
            .required()
            .with_aliases(&["UserID", "User Id", "Staff ID"])
            .with_rule(FormatRule::Pattern {
                regex,
                message: "User ID must be in the format firstname.lastname (lowercase).".to_string(),
            }),
    );
    fields.push(
        FieldDef::new(COL_STAFF_ROLE, TargetField::StaffRole)
            .required()
            .with_aliases(&["Role"])
            .with_rule(FormatRule::OneOf {
                allowed: config.staff_roles.clone(),
                message: format!("Staff Role must be one of: {}.", config.staff_roles.join(", ")),
            }),
    );
    fields.push(FieldDef::new(COL_EMAIL, TargetField::Email).with_aliases(&["Email Address", "E-mail"]));

    Ok(FieldSchema::new(EntityKind::Staff, fields))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_student_columns() {
        let schema = student_schema(&ImportConfig::default());
        assert_eq!(
            schema.column_names(),
            vec!["First Name", "Surname", "User ID", "Year Level"]
        );
        assert_eq!(schema.required_fields().count(), 4);
    }

    #[test]
    fn test_staff_email_optional() {
        let schema = staff_schema(&ImportConfig::default()).unwrap();
        assert_eq!(
            schema.column_names(),
            vec!["First Name", "Surname", "User ID", "Staff Role", "Email"]
        );
        let email = schema.field(TargetField::Email).unwrap();
        assert!(!email.required);
        assert!(matches!(email.format_rule, FormatRule::None));
    }

    #[test]
    fn test_staff_user_id_rule() {
        let schema = staff_schema(&ImportConfig::default()).unwrap();
        let rule = &schema.field(TargetField::UserId).unwrap().format_rule;
        assert!(rule.check("alice.smith").is_ok());
        assert!(rule.check("AliceSmith").is_err());
        assert!(rule.check("Alice.Smith").is_err());
        assert!(rule.check("alice.smith2").is_err());
    }
}
