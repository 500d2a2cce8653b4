// ==========================================
// 台账同步系统 - 表格数据结构
// ==========================================
// 职责: 单元格值 / 行记录 / 解析结果 / 导出载荷
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 行记录: 列名 → 标准化后的单元格文本
///
/// 由解析器按非空行创建，创建后不再修改
pub type RowRecord = HashMap<String, String>;

// ==========================================
// CellValue - 原始单元格值
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Empty,
    String(String),
    Int(i64),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::String(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::String(value)
    }
}

impl From<Option<String>> for CellValue {
    fn from(value: Option<String>) -> Self {
        value.map(CellValue::String).unwrap_or(CellValue::Empty)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

// ==========================================
// ParsedSheet - 解析结果
// ==========================================
// errors 非空时 headers/rows 均为空
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedSheet {
    pub headers: Vec<String>,
    pub rows: Vec<RowRecord>,
    /// 与 rows 一一对应的表格行号（从 1 开始，表头所在行为第 1 行）
    pub row_numbers: Vec<usize>,
    pub errors: Vec<String>,
}

impl ParsedSheet {
    /// 构造失败结果
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
            ..Default::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

// ==========================================
// HeaderValidation - 表头校验结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderValidation {
    pub valid: bool,
    /// 缺失列（按编解码器声明顺序）
    pub missing: Vec<String>,
}

// ==========================================
// 导出数据
// ==========================================

/// 导出行来源
#[derive(Debug, Clone, PartialEq)]
pub enum SheetRows {
    /// 按表头顺序排列的位置行
    Positional(Vec<Vec<CellValue>>),
    /// 行记录（按表头投影，缺失列为空）
    Records(Vec<RowRecord>),
}

impl SheetRows {
    /// 空行集合（导出空白模板）
    pub fn empty() -> Self {
        SheetRows::Positional(Vec::new())
    }
}

/// 待写入文件的表格载荷（与下载动作解耦，便于校验）
#[derive(Debug, Clone, PartialEq)]
pub struct SheetPayload {
    pub sheet_name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}
