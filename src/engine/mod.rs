// ==========================================
// 台账同步系统 - 引擎层
// ==========================================
// 职责: 对账计划生成与执行
// 红线: Engine 不拼 SQL, 计划生成不做 I/O
// ==========================================

pub mod plan_executor;
pub mod sync_planner;

// 重导出核心引擎
pub use plan_executor::{apply_plan, ApplyOptions, CancelFlag};
pub use sync_planner::compute_sync_plan;
