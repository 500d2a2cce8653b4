// ==========================================
// 台账同步系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换下层错误为用户可读的错误消息
// 说明: 阻断性错误（文件损坏、缺列）在执行前返回，不产生任何写入
// ==========================================

use crate::config::error::ConfigError;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 导入阻断错误
    // ==========================================
    /// 文件无法解析
    #[error("文件无法读取: {0}")]
    MalformedFile(String),

    /// 缺少必需列
    #[error("表头不匹配，缺少列: {}", .missing.join(", "))]
    SchemaMismatch { missing: Vec<String> },

    /// 导入执行已被配置关闭
    #[error("导入执行已关闭（仅允许预览）")]
    ApplyDisabled,

    // ==========================================
    // 导出错误
    // ==========================================
    #[error("导出失败: {0}")]
    ExportError(String),

    // ==========================================
    // 基础设施错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Other(err) => ApiError::Other(err),
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::MissingColumns(missing) => ApiError::SchemaMismatch { missing },
            ImportError::FileWriteError(msg) | ImportError::ExcelWriteError(msg) => ApiError::ExportError(msg),
            ImportError::Other(err) => ApiError::Other(err),
            other => ApiError::MalformedFile(other.to_string()),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
