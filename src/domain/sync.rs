// ==========================================
// 台账同步系统 - 对账计划与执行结果
// ==========================================
// 职责: 定义新建/更新/删除计划及执行汇总
// ==========================================

use crate::domain::register::RegisterItem;
use crate::domain::sheet::RowRecord;
use serde::{Deserialize, Serialize};

// ==========================================
// PlannedUpdate - 计划更新条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedUpdate {
    pub id: String,
    pub item: RegisterItem,
    pub row: RowRecord,
}

// ==========================================
// SyncPlan - 对账计划
// ==========================================
// 三个序列互斥；无键行不进入任何序列
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncPlan {
    pub to_create: Vec<RowRecord>,
    pub to_update: Vec<PlannedUpdate>,
    pub to_delete: Vec<RegisterItem>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }

    /// 确认界面展示用的计数
    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            to_create: self.to_create.len(),
            to_update: self.to_update.len(),
            to_delete: self.to_delete.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub to_create: usize,
    pub to_update: usize,
    pub to_delete: usize,
}

// ==========================================
// ApplySummary - 执行汇总
// ==========================================
// 非事务: 已成功写入的记录不会回滚
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplySummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    /// 主字段为空而跳过的新建行（不计为失败）
    pub skipped: usize,
    /// "<动作> <标识>: <错误信息>"
    pub failures: Vec<String>,
    /// 是否被中途取消
    pub cancelled: bool,
}

impl ApplySummary {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// 前 N 条失败信息（用于界面摘要）
    pub fn failure_preview(&self, limit: usize) -> Vec<String> {
        self.failures.iter().take(limit).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_preview_is_bounded() {
        let summary = ApplySummary {
            failures: (1..=5).map(|i| format!("创建 {}: 失败", i)).collect(),
            ..Default::default()
        };

        assert!(summary.has_failures());
        assert_eq!(summary.failure_preview(3).len(), 3);
        assert_eq!(summary.failure_preview(10).len(), 5);
    }
}
