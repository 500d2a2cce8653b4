// ==========================================
// 台账同步系统 - 领域模型层
// ==========================================
// 职责: 定义台账实体、表格数据结构、对账计划
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod register;
pub mod sheet;
pub mod sync;
pub mod types;

// 重导出核心类型
pub use register::{Account, Category, CostCode, RegisterItem, RegisterRecord, Supplier};
pub use sheet::{CellValue, HeaderValidation, ParsedSheet, RowRecord, SheetPayload, SheetRows};
pub use sync::{ApplySummary, PlanSummary, PlannedUpdate, SyncPlan};
pub use types::RegisterType;
