// ==========================================
// 台账同步系统 - API 层
// ==========================================
// 职责: 提供台账导出/导入业务 API,供管理界面与命令行调用
// ==========================================

pub mod error;
pub mod register_sync_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use register_sync_api::{ApplyResponse, ImportPreview, RegisterSyncApi};
