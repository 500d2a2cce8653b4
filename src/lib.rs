// ==========================================
// 台账同步系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + calamine/rust_xlsxwriter
// 系统定位: 台账（科目/分类/成本代码/供应商）表格往返同步
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 对账计划与执行
pub mod engine;

// 导入/导出层 - 表格解析与生成
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 共享状态
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::RegisterType;

// 领域实体
pub use domain::{
    Account, ApplySummary, Category, CostCode, RegisterItem, RegisterRecord, RowRecord, Supplier,
    SyncPlan,
};

// 引擎
pub use engine::{apply_plan, compute_sync_plan, ApplyOptions, CancelFlag};

// 导入/导出
pub use importer::RegisterCodec;

// API
pub use api::{ApiError, RegisterSyncApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "台账同步系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
