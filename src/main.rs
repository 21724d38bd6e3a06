// ==========================================
// 学校管理后台 - 花名册导入命令行入口
// ==========================================
// 用法:
//   roster-import <students|staff> <file> [--db <path>]
//   roster-import columns <students|staff> [--db <path>]
// 输出: stdout 为 JSON 结果，日志写 stderr
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use roster_import::api::ImportApi;
use roster_import::domain::EntityKind;
use roster_import::logging;
use std::path::PathBuf;

const USAGE: &str = "usage:\n  roster-import <students|staff> <file> [--db <path>]\n  roster-import columns <students|staff> [--db <path>]";

/// 默认数据库路径
///
/// 优先级: ROSTER_IMPORT_DB_PATH → 用户数据目录 → ./roster.db
fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var("ROSTER_IMPORT_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./roster.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("roster-import");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("roster.db");
        }
    }

    path.to_string_lossy().to_string()
}

fn parse_kind(raw: &str) -> Result<EntityKind> {
    raw.parse::<EntityKind>().map_err(|e| anyhow!("{}\n{}", e, USAGE))
}

/// 拆出 `--db <path>`，其余为位置参数
fn split_db_flag(args: Vec<String>) -> Result<(Vec<String>, Option<String>)> {
    let mut positional = Vec::with_capacity(args.len());
    let mut db_path = None;
    let mut iter = args.into_iter();

    while let Some(arg) = iter.next() {
        if arg == "--db" {
            let path = iter
                .next()
                .ok_or_else(|| anyhow!("--db requires a path\n{}", USAGE))?;
            db_path = Some(path);
        } else {
            positional.push(arg);
        }
    }

    Ok((positional, db_path))
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let (args, db_flag) = split_db_flag(std::env::args().skip(1).collect())?;
    let Some(command) = args.first() else {
        bail!(USAGE);
    };
    let db_path = db_flag.unwrap_or_else(get_default_db_path);

    if command == "columns" {
        let kind = parse_kind(args.get(1).ok_or_else(|| anyhow!(USAGE))?)?;
        let api = ImportApi::open(&db_path).context("无法初始化导入API")?;
        let columns = api.expected_columns(kind)?;
        println!("{}", serde_json::to_string_pretty(&columns)?);
        return Ok(());
    }

    let kind = parse_kind(command)?;
    let file_path = args.get(1).ok_or_else(|| anyhow!(USAGE))?;

    tracing::info!("==================================================");
    tracing::info!("{} v{}", roster_import::APP_NAME, roster_import::VERSION);
    tracing::info!("使用数据库: {}", db_path);
    tracing::info!("==================================================");

    let api = ImportApi::open(&db_path).context("无法初始化导入API")?;
    let response = api.import_roster(kind, file_path).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    if response.error.is_some() {
        std::process::exit(2);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn test_db_flag_before_file_path() {
        let (positional, db_path) = split_db_flag(args(&["students", "--db", "x.db", "roster.csv"])).unwrap();

        assert_eq!(positional, args(&["students", "roster.csv"]));
        assert_eq!(db_path.as_deref(), Some("x.db"));
    }

    #[test]
    fn test_db_flag_optional_and_requires_value() {
        let (positional, db_path) = split_db_flag(args(&["columns", "staff"])).unwrap();
        assert_eq!(positional, args(&["columns", "staff"]));
        assert!(db_path.is_none());

        assert!(split_db_flag(args(&["staff", "roster.csv", "--db"])).is_err());
    }
}
