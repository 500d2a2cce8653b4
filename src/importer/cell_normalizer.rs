// ==========================================
// 台账同步系统 - 单元格标准化
// ==========================================
// 职责: 异构单元格值 → 去空白的规范字符串；空行判定
// 约束: 全函数，无错误分支；对已标准化字符串幂等
// ==========================================

use crate::domain::sheet::{CellValue, RowRecord};
use chrono::{NaiveDateTime, Timelike};

/// 标准化文本（TRIM）
pub fn normalize_str(value: &str) -> String {
    value.trim().to_string()
}

/// 标准化单元格值
///
/// # 规则
/// - 空 → ""
/// - 数字 → 默认十进制表示（45.0 → "45"，无本地化格式）
/// - 布尔 → "1" / "0"
/// - 日期时间 → YYYY-MM-DD（含时间部分时追加 HH:MM:SS）
/// - 其他 → TRIM 后的文本
pub fn normalize_cell(value: &CellValue) -> String {
    match value {
        CellValue::Empty => String::new(),
        CellValue::String(s) => normalize_str(s),
        CellValue::Int(i) => i.to_string(),
        CellValue::Number(f) => format_number(*f),
        CellValue::Bool(b) => {
            if *b {
                "1".to_string()
            } else {
                "0".to_string()
            }
        }
        CellValue::DateTime(dt) => format_datetime(dt),
    }
}

fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    // -0 与 0 同样输出 "0"
    if value == 0.0 {
        return "0".to_string();
    }
    // f64 Display 不使用科学计数法: 1e21 输出 22 位整数，1e-7 输出 0.0000001
    value.to_string()
}

fn format_datetime(value: &NaiveDateTime) -> String {
    if value.hour() == 0 && value.minute() == 0 && value.second() == 0 {
        value.format("%Y-%m-%d").to_string()
    } else {
        value.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// 行记录是否为空（所有值标准化后均为 ""）
pub fn is_empty_row(row: &RowRecord) -> bool {
    row.values().all(|v| v.trim().is_empty())
}

/// 位置行是否为空
pub fn is_empty_cells(cells: &[CellValue]) -> bool {
    cells.iter().all(|c| normalize_cell(c).is_empty())
}
