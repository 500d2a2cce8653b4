// ==========================================
// 台账同步系统 - 导入/导出层
// ==========================================
// 职责: 表格解析、表头校验、台账编解码、表格生成
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod cell_normalizer;
pub mod diagnostics;
pub mod error;
pub mod file_parser;
pub mod header_validator;
pub mod register_codec;
pub mod register_sync_trait;
pub mod sheet_builder;

// 重导出核心类型
pub use cell_normalizer::{is_empty_cells, is_empty_row, normalize_cell, normalize_str};
pub use diagnostics::{inspect_rows, DuplicateKey, ImportDiagnostics};
pub use error::{ImportError, ImportResult};
pub use file_parser::{parse_csv, parse_file, parse_sheet, CsvParser, ExcelParser, UniversalFileParser};
pub use header_validator::validate_headers;
pub use register_codec::RegisterCodec;
pub use sheet_builder::{
    build_and_download, build_sheet_payload, export_file_name, render_xlsx, DirectorySaveSurface,
    ExportedFile,
};

// 重导出 Trait 接口
pub use register_sync_trait::{FileParser, FileSaveSurface};
