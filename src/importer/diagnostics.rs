// ==========================================
// 台账同步系统 - 导入诊断
// ==========================================
// 职责: 列出无键行与重复键、标记无数据行的文件，供确认界面提示
// 红线: 只读检查，不改变对账计划
// ==========================================

use crate::domain::sheet::RowRecord;
use crate::importer::register_codec::RegisterCodec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 重复键及其出现的表格行号
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateKey {
    pub key: String,
    pub rows: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDiagnostics {
    /// 文件仅有表头（执行后将删除全部有键条目）
    pub no_data_rows: bool,
    /// 键为空而被对账忽略的行号
    pub keyless_rows: Vec<usize>,
    /// 出现多次的键（按首次出现顺序）
    pub duplicate_keys: Vec<DuplicateKey>,
}

impl ImportDiagnostics {
    pub fn is_clean(&self) -> bool {
        !self.no_data_rows && self.keyless_rows.is_empty() && self.duplicate_keys.is_empty()
    }
}

/// 检查行记录
///
/// # 参数
/// - rows: 解析后的行记录
/// - row_numbers: 与 rows 等长的原始行号；不足时按 (下标 + 2) 推算
/// - codec: 台账编解码器
pub fn inspect_rows(rows: &[RowRecord], row_numbers: &[usize], codec: &RegisterCodec) -> ImportDiagnostics {
    let mut diagnostics = ImportDiagnostics {
        no_data_rows: rows.is_empty(),
        ..Default::default()
    };
    let mut first_seen: Vec<String> = Vec::new();
    let mut occurrences: HashMap<String, Vec<usize>> = HashMap::new();

    for (idx, row) in rows.iter().enumerate() {
        let row_number = row_numbers.get(idx).copied().unwrap_or(idx + 2);
        let key = (codec.key_from_row)(row);

        if key.is_empty() {
            diagnostics.keyless_rows.push(row_number);
            continue;
        }

        let entry = occurrences.entry(key.clone()).or_default();
        if entry.is_empty() {
            first_seen.push(key);
        }
        entry.push(row_number);
    }

    for key in first_seen {
        if let Some(rows) = occurrences.remove(&key) {
            if rows.len() > 1 {
                diagnostics.duplicate_keys.push(DuplicateKey { key, rows });
            }
        }
    }

    diagnostics
}
