// ==========================================
// 台账同步系统 - 导入/导出 Trait
// ==========================================
// 职责: 定义文件解析与文件保存接口（不包含实现）
// ==========================================

use crate::domain::sheet::ParsedSheet;
use crate::importer::error::ImportResult;
use std::path::PathBuf;

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口
// 实现者: ExcelParser, CsvParser
pub trait FileParser: Send + Sync {
    /// 解析文件内容为表头 + 行记录
    ///
    /// # 参数
    /// - bytes: 文件原始字节
    ///
    /// # 返回
    /// - ParsedSheet: 解析结果；失败时 errors 非空
    ///
    /// # 说明
    /// - 不返回 Err，损坏文件以可读错误信息形式体现在 errors 中
    fn parse_bytes(&self, bytes: &[u8]) -> ParsedSheet;
}

// ==========================================
// FileSaveSurface Trait
// ==========================================
// 用途: 导出文件落地（下载目录/对话框等）
// 实现者: DirectorySaveSurface
pub trait FileSaveSurface: Send + Sync {
    /// 保存导出文件
    ///
    /// # 参数
    /// - file_name: 文件名（含日期戳与扩展名）
    /// - bytes: 文件内容
    ///
    /// # 返回
    /// - Ok(PathBuf): 实际保存位置
    /// - Err: 写入失败
    fn save(&self, file_name: &str, bytes: &[u8]) -> ImportResult<PathBuf>;
}
