// ==========================================
// 台账同步系统 - 表头校验器
// ==========================================
// 职责: 校验导入文件表头是否覆盖编解码器要求的列
// 规则: 超集校验（允许多余列、不要求列顺序）
// ==========================================

use crate::domain::sheet::HeaderValidation;
use crate::importer::cell_normalizer::normalize_str;
use std::collections::HashSet;

/// 校验表头
///
/// # 参数
/// - actual_headers: 文件中的表头
/// - required_headers: 编解码器声明的必需列
///
/// # 返回
/// - missing: 缺失的必需列（按声明顺序）
/// - valid: missing 为空
pub fn validate_headers<A, R>(actual_headers: &[A], required_headers: &[R]) -> HeaderValidation
where
    A: AsRef<str>,
    R: AsRef<str>,
{
    let present: HashSet<String> = actual_headers
        .iter()
        .map(|h| normalize_str(h.as_ref()))
        .collect();

    let missing: Vec<String> = required_headers
        .iter()
        .map(|h| normalize_str(h.as_ref()))
        .filter(|h| !present.contains(h))
        .collect();

    HeaderValidation {
        valid: missing.is_empty(),
        missing,
    }
}
