// ==========================================
// 台账同步系统 - 表格生成器
// ==========================================
// 职责: 表头 + 行 → xlsx 文件内容 → 交给保存接口
// 说明:
// - 空行集合即空白模板（仅表头）
// - 文件名: <前缀>_<YYYY-MM-DD>.xlsx（本地日期），不处理重名
// ==========================================

use crate::domain::sheet::{CellValue, SheetPayload, SheetRows};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::register_sync_trait::FileSaveSurface;
use chrono::NaiveDate;
use rust_xlsxwriter::Workbook;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// 导出文件扩展名
pub const EXPORT_EXTENSION: &str = "xlsx";

/// 导出结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedFile {
    pub file_name: String,
    pub path: PathBuf,
    pub row_count: usize,
}

/// 构造表格载荷
///
/// # 参数
/// - sheet_name: 工作表名
/// - headers: 列名（决定列顺序）
/// - rows: 位置行或行记录；行记录按表头投影，缺失列为空
pub fn build_sheet_payload<S: AsRef<str>>(
    sheet_name: &str,
    headers: &[S],
    rows: SheetRows,
) -> SheetPayload {
    let headers: Vec<String> = headers.iter().map(|h| h.as_ref().to_string()).collect();

    let rows = match rows {
        SheetRows::Positional(rows) => rows,
        SheetRows::Records(records) => records
            .iter()
            .map(|record| {
                headers
                    .iter()
                    .map(|h| CellValue::String(record.get(h).cloned().unwrap_or_default()))
                    .collect()
            })
            .collect(),
    };

    SheetPayload {
        sheet_name: sheet_name.to_string(),
        headers,
        rows,
    }
}

/// 渲染 xlsx 文件内容
pub fn render_xlsx(payload: &SheetPayload) -> ImportResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(payload.sheet_name.as_str())?;

    for (col, header) in payload.headers.iter().enumerate() {
        worksheet.write_string(0, col as u16, header.as_str())?;
    }

    for (row_idx, row) in payload.rows.iter().enumerate() {
        let row_num = (row_idx + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            match cell {
                CellValue::Empty => {}
                CellValue::String(s) => {
                    if !s.is_empty() {
                        worksheet.write_string(row_num, col, s.as_str())?;
                    }
                }
                CellValue::Int(i) => {
                    worksheet.write_number(row_num, col, *i as f64)?;
                }
                CellValue::Number(f) => {
                    worksheet.write_number(row_num, col, *f)?;
                }
                CellValue::Bool(b) => {
                    worksheet.write_boolean(row_num, col, *b)?;
                }
                CellValue::DateTime(dt) => {
                    worksheet.write_string(row_num, col, dt.format("%Y-%m-%d %H:%M:%S").to_string())?;
                }
            }
        }
    }

    let bytes = workbook.save_to_buffer()?;
    debug!(
        sheet = %payload.sheet_name,
        rows = payload.rows.len(),
        bytes = bytes.len(),
        "xlsx 生成完成"
    );
    Ok(bytes)
}

/// 导出文件名: <前缀>_<YYYY-MM-DD>.xlsx
pub fn export_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{}_{}.{}", prefix, date.format("%Y-%m-%d"), EXPORT_EXTENSION)
}

/// 生成表格并交给保存接口
///
/// # 参数
/// - surface: 文件保存接口
/// - sheet_name: 工作表名
/// - headers: 列名
/// - rows: 数据行（为空时导出空白模板）
/// - file_prefix: 文件名前缀
pub fn build_and_download<S: AsRef<str>>(
    surface: &dyn FileSaveSurface,
    sheet_name: &str,
    headers: &[S],
    rows: SheetRows,
    file_prefix: &str,
) -> ImportResult<ExportedFile> {
    let payload = build_sheet_payload(sheet_name, headers, rows);
    let bytes = render_xlsx(&payload)?;

    let file_name = export_file_name(file_prefix, chrono::Local::now().date_naive());
    let path = surface.save(&file_name, &bytes)?;

    info!(file = %path.display(), rows = payload.rows.len(), "表格导出完成");

    Ok(ExportedFile {
        file_name,
        path,
        row_count: payload.rows.len(),
    })
}

// ==========================================
// DirectorySaveSurface - 写入指定目录
// ==========================================
pub struct DirectorySaveSurface {
    dir: PathBuf,
}

impl DirectorySaveSurface {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 系统下载目录；不可用时退回当前目录
    pub fn default_download_dir() -> PathBuf {
        dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

impl FileSaveSurface for DirectorySaveSurface {
    fn save(&self, file_name: &str, bytes: &[u8]) -> ImportResult<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| ImportError::FileWriteError(e.to_string()))?;

        // 同名文件直接覆盖
        let path = self.dir.join(file_name);
        std::fs::write(&path, bytes)
            .map_err(|e| ImportError::FileWriteError(e.to_string()))?;
        Ok(path)
    }
}
