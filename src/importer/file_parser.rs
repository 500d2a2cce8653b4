// ==========================================
// 台账同步系统 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx/.xls/.xlsm/.ods) / CSV (.csv)
// 规则:
// - 仅解析第一个工作表
// - 第一行为表头，后续行按表头拼装为行记录
// - 完全空白的行被丢弃
// - 解析失败以错误信息返回，不向上抛出
// ==========================================

use crate::domain::sheet::{CellValue, ParsedSheet, RowRecord};
use crate::importer::cell_normalizer::{is_empty_row, normalize_cell};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::register_sync_trait::FileParser;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use csv::ReaderBuilder;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, warn};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// 解析 Excel 文件内容（第一个工作表）
pub fn parse_sheet(bytes: &[u8]) -> ParsedSheet {
    ExcelParser.parse_bytes(bytes)
}

/// 解析 CSV 文件内容
pub fn parse_csv(bytes: &[u8]) -> ParsedSheet {
    CsvParser.parse_bytes(bytes)
}

/// 按文件扩展名选择解析器
pub fn parse_file(file_name: &str, bytes: &[u8]) -> ParsedSheet {
    UniversalFileParser.parse(file_name, bytes)
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_bytes(&self, bytes: &[u8]) -> ParsedSheet {
        match parse_excel_grid(bytes) {
            Ok(sheet) => sheet,
            Err(e) => {
                warn!(error = %e, "Excel 解析失败");
                ParsedSheet::failed(e.to_string())
            }
        }
    }
}

fn parse_excel_grid(bytes: &[u8]) -> ImportResult<ParsedSheet> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    // 读取第一个 sheet
    let sheet_names = workbook.sheet_names();
    let sheet_name = sheet_names.first().cloned().ok_or(ImportError::NoSheets)?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

    // 已用区域从第一个非空单元格开始；首行为空时不把后续行当作表头
    if let Some((first_row, _col)) = range.start() {
        if first_row > 0 {
            return Err(ImportError::MissingHeaderRow(sheet_name));
        }
    }

    let grid: Vec<Vec<CellValue>> = range
        .rows()
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect();

    debug!(sheet = %sheet_name, rows = grid.len(), "工作表读取完成");
    build_parsed_sheet(&sheet_name, grid)
}

/// calamine 单元格 → CellValue
fn cell_from_data(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Number(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) if dt.is_datetime() => CellValue::DateTime(value),
            _ => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::String(s.clone()),
        // 公式错误单元格视为空
        Data::Error(_) => CellValue::Empty,
    }
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_bytes(&self, bytes: &[u8]) -> ParsedSheet {
        match parse_csv_grid(bytes) {
            Ok(sheet) => sheet,
            Err(e) => {
                warn!(error = %e, "CSV 解析失败");
                ParsedSheet::failed(e.to_string())
            }
        }
    }
}

fn parse_csv_grid(bytes: &[u8]) -> ImportResult<ParsedSheet> {
    let content = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true) // 允许行长度不一致
        .from_reader(content);

    let mut grid = Vec::new();
    for result in reader.records() {
        let record = result?;
        grid.push(record.iter().map(CellValue::from).collect());
    }

    build_parsed_sheet("csv", grid)
}

// ==========================================
// 公共: 网格 → 表头 + 行记录
// ==========================================
/// 第一行为表头，数据行号从 2 开始（与表格软件显示一致）
fn build_parsed_sheet(sheet_name: &str, grid: Vec<Vec<CellValue>>) -> ImportResult<ParsedSheet> {
    let mut rows_iter = grid.into_iter();

    let header_row = rows_iter
        .next()
        .ok_or_else(|| ImportError::MissingHeaderRow(sheet_name.to_string()))?;

    // 表头不去重: 同名列在行记录中后者覆盖前者
    let headers: Vec<String> = header_row.iter().map(normalize_cell).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(ImportError::MissingHeaderRow(sheet_name.to_string()));
    }

    let mut rows = Vec::new();
    let mut row_numbers = Vec::new();
    for (offset, data_row) in rows_iter.enumerate() {
        let mut record = RowRecord::with_capacity(headers.len());
        for (col_idx, header) in headers.iter().enumerate() {
            let value = data_row.get(col_idx).map(normalize_cell).unwrap_or_default();
            record.insert(header.clone(), value);
        }

        // 跳过完全空白的行
        if is_empty_row(&record) {
            continue;
        }

        rows.push(record);
        row_numbers.push(offset + 2);
    }

    Ok(ParsedSheet {
        headers,
        rows,
        row_numbers,
        errors: Vec::new(),
    })
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse(&self, file_name: &str, bytes: &[u8]) -> ParsedSheet {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => CsvParser.parse_bytes(bytes),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => ExcelParser.parse_bytes(bytes),
            _ => ParsedSheet::failed(ImportError::UnsupportedFormat(ext).to_string()),
        }
    }
}
