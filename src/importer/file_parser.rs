// ==========================================
// 学校管理后台 - 文件解析器实现 (TableExtractor)
// ==========================================
// 阶段 0: 文件读取与解析
// 支持: CSV (.csv) / Excel (.xlsx/.xlsm/.xls) / OpenDocument (.ods)
// 约定: 第一行为表头；行号为表格物理行号（首个数据行 = 第 2 行）
// ==========================================

use crate::domain::roster::RawRow;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::roster_importer_trait::TableExtractor;
use calamine::{open_workbook_auto, Data, Ods, Range, Reader, Xls, Xlsx};
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

// ==========================================
// SpreadsheetFormat - 文件格式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpreadsheetFormat {
    Csv,
    Xlsx,
    Xls,
    Ods,
}

impl SpreadsheetFormat {
    /// 按扩展名识别（忽略大小写）
    pub fn from_extension(ext: &str) -> ImportResult<Self> {
        match ext.trim().trim_start_matches('.').to_lowercase().as_str() {
            "csv" => Ok(SpreadsheetFormat::Csv),
            "xlsx" | "xlsm" => Ok(SpreadsheetFormat::Xlsx),
            "xls" => Ok(SpreadsheetFormat::Xls),
            "ods" => Ok(SpreadsheetFormat::Ods),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn from_path(path: &Path) -> ImportResult<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(ext)
    }

    pub fn is_csv(&self) -> bool {
        matches!(self, SpreadsheetFormat::Csv)
    }
}

// ==========================================
// 公共: 表头与行构造
// ==========================================

/// 表头 trim，去掉首列可能存在的 UTF-8 BOM
fn normalize_headers<I: Iterator<Item = String>>(raw: I) -> Vec<String> {
    raw.enumerate()
        .map(|(idx, h)| {
            let h = if idx == 0 { h.trim_start_matches('\u{feff}').to_string() } else { h };
            h.trim().to_string()
        })
        .collect()
}

/// 按表头组装一行；完全空白的行返回 None
fn build_row<I: Iterator<Item = String>>(
    headers: &[String],
    values: I,
    row_number: usize,
) -> Option<RawRow> {
    let mut cells = Vec::with_capacity(headers.len());

    for (col_idx, value) in values.enumerate() {
        if let Some(header) = headers.get(col_idx) {
            // 无表头的列不属于任何字段
            if header.is_empty() {
                continue;
            }
            cells.push((header.clone(), value.trim().to_string()));
        }
    }

    let row = RawRow::new(row_number, cells);
    // 跳过完全空白的行
    if row.is_blank() {
        None
    } else {
        Some(row)
    }
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

/// 记录内引号单元格中的换行数
fn embedded_line_breaks(record: &StringRecord) -> u64 {
    record.iter().map(|field| field.matches('\n').count() as u64).sum()
}

impl CsvParser {
    fn parse_reader<R: Read>(&self, source: R) -> ImportResult<Vec<RawRow>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(source);

        // 读取表头（非 UTF-8 编码在此处报错）
        let header_record = reader.headers()?.clone();
        let headers = normalize_headers(header_record.iter().map(|h| h.to_string()));
        if headers.iter().all(|h| h.is_empty()) {
            return Err(ImportError::EmptyFile);
        }

        // 行号按表格行计：引号内换行不占新行，被 csv 跳过的空行仍占行
        let header_line = header_record.position().map(|p| p.line()).unwrap_or(1);
        let mut row_number = header_line as usize;
        let mut next_line = header_line + 1 + embedded_line_breaks(&header_record);

        let mut records = Vec::new();
        for result in reader.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or(next_line);
            row_number += 1 + line.saturating_sub(next_line) as usize;
            next_line = line + 1 + embedded_line_breaks(&record);

            if let Some(row) = build_row(&headers, record.iter().map(|v| v.to_string()), row_number) {
                records.push(row);
            }
        }

        Ok(records)
    }
}

impl TableExtractor for CsvParser {
    fn extract(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        ensure_exists(file_path)?;

        let format = SpreadsheetFormat::from_path(file_path)?;
        if !format.is_csv() {
            return Err(ImportError::UnsupportedFormat(format!("{:?}", format)));
        }

        let file = File::open(file_path)?;
        self.parse_reader(file)
    }

    fn extract_bytes(&self, bytes: &[u8], format: SpreadsheetFormat) -> ImportResult<Vec<RawRow>> {
        if !format.is_csv() {
            return Err(ImportError::UnsupportedFormat(format!("{:?}", format)));
        }
        self.parse_reader(bytes)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl ExcelParser {
    /// 读取第一个工作表
    fn first_sheet_rows<RS, W>(&self, workbook: &mut W) -> ImportResult<Vec<RawRow>>
    where
        RS: Read + Seek,
        W: Reader<RS>,
        W::Error: std::fmt::Display,
    {
        let sheet_names = workbook.sheet_names();
        let sheet_name = sheet_names
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("workbook has no worksheets".to_string()))?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

        self.range_to_rows(&range)
    }

    fn range_to_rows(&self, range: &Range<Data>) -> ImportResult<Vec<RawRow>> {
        // 工作表可能不是从 A1 开始
        let header_row_index = range.start().map(|(row, _)| row as usize).unwrap_or(0);

        let mut rows = range.rows();
        let header_row = rows.next().ok_or(ImportError::EmptyFile)?;
        let headers = normalize_headers(header_row.iter().map(|cell| cell.to_string()));
        if headers.iter().all(|h| h.is_empty()) {
            return Err(ImportError::EmptyFile);
        }

        let mut records = Vec::new();
        for (idx, data_row) in rows.enumerate() {
            // 0-based 表头行 + 1 转为 1-based，再 + 1 跳过表头
            let row_number = header_row_index + idx + 2;
            if let Some(row) = build_row(&headers, data_row.iter().map(|c| c.to_string()), row_number) {
                records.push(row);
            }
        }

        Ok(records)
    }
}

impl TableExtractor for ExcelParser {
    fn extract(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        ensure_exists(file_path)?;

        let format = SpreadsheetFormat::from_path(file_path)?;
        if format.is_csv() {
            return Err(ImportError::UnsupportedFormat("csv".to_string()));
        }

        let mut workbook = open_workbook_auto(file_path)?;
        self.first_sheet_rows::<BufReader<File>, _>(&mut workbook)
    }

    fn extract_bytes(&self, bytes: &[u8], format: SpreadsheetFormat) -> ImportResult<Vec<RawRow>> {
        let cursor = Cursor::new(bytes.to_vec());
        match format {
            SpreadsheetFormat::Xlsx => {
                let mut workbook: Xlsx<_> = Xlsx::new(cursor)
                    .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;
                self.first_sheet_rows::<Cursor<Vec<u8>>, _>(&mut workbook)
            }
            SpreadsheetFormat::Xls => {
                let mut workbook: Xls<_> = Xls::new(cursor)
                    .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;
                self.first_sheet_rows::<Cursor<Vec<u8>>, _>(&mut workbook)
            }
            SpreadsheetFormat::Ods => {
                let mut workbook: Ods<_> = Ods::new(cursor)
                    .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;
                self.first_sheet_rows::<Cursor<Vec<u8>>, _>(&mut workbook)
            }
            SpreadsheetFormat::Csv => Err(ImportError::UnsupportedFormat("csv".to_string())),
        }
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl TableExtractor for UniversalFileParser {
    fn extract(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        match SpreadsheetFormat::from_path(file_path)? {
            SpreadsheetFormat::Csv => CsvParser.extract(file_path),
            _ => ExcelParser.extract(file_path),
        }
    }

    fn extract_bytes(&self, bytes: &[u8], format: SpreadsheetFormat) -> ImportResult<Vec<RawRow>> {
        match format {
            SpreadsheetFormat::Csv => CsvParser.extract_bytes(bytes, format),
            _ => ExcelParser.extract_bytes(bytes, format),
        }
    }
}
