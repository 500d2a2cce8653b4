// ==========================================
// 台账同步系统 - 对账计划执行引擎
// ==========================================
// 职责: 按 新建 → 更新 → 删除 顺序调用仓储
// 规则:
// - 单条失败只记录，不中断其余操作
// - 主字段为空的新建行跳过，不计为失败
// - 非事务: 已成功的写入不回滚
// - 默认串行；可配置有界并发（阶段内保序）
// - 取消为协作式: 已发出的操作完成，不再发出新操作
// ==========================================

use crate::domain::sync::{ApplySummary, SyncPlan};
use crate::importer::register_codec::RegisterCodec;
use crate::repository::register_repo::RegisterRepository;
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 失败信息中的动作名
pub const ACTION_CREATE: &str = "创建";
pub const ACTION_UPDATE: &str = "更新";
pub const ACTION_DELETE: &str = "删除";

// ==========================================
// CancelFlag - 协作式取消标志
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ==========================================
// ApplyOptions - 执行选项
// ==========================================
#[derive(Debug, Clone)]
pub struct ApplyOptions {
    /// 阶段内最大并发数（1 = 严格串行）
    pub concurrency: usize,
    pub cancel: CancelFlag,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            cancel: CancelFlag::new(),
        }
    }
}

impl ApplyOptions {
    pub fn with_concurrency(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
            ..Default::default()
        }
    }
}

/// 单条操作结果
enum OpOutcome {
    Applied,
    Skipped,
    Failed(String),
    Cancelled,
}

fn failure_message(action: &str, label: &str, err: impl std::fmt::Display) -> String {
    format!("{} {}: {}", action, label, err)
}

/// 执行一个阶段（有界并发，结果保序）
async fn run_phase<'a, T, F, Fut>(items: &'a [T], concurrency: usize, op: F) -> Vec<OpOutcome>
where
    F: Fn(&'a T) -> Fut,
    Fut: Future<Output = OpOutcome>,
{
    stream::iter(items.iter())
        .map(op)
        .buffered(concurrency.max(1))
        .collect()
        .await
}

/// 汇总阶段结果
///
/// # 返回
/// - 成功条数
fn tally(outcomes: Vec<OpOutcome>, summary: &mut ApplySummary) -> usize {
    let mut applied = 0;
    for outcome in outcomes {
        match outcome {
            OpOutcome::Applied => applied += 1,
            OpOutcome::Skipped => summary.skipped += 1,
            OpOutcome::Failed(message) => summary.failures.push(message),
            OpOutcome::Cancelled => summary.cancelled = true,
        }
    }
    applied
}

/// 执行对账计划
///
/// # 参数
/// - plan: 对账计划
/// - codec: 台账编解码器
/// - repo: 台账仓储
/// - options: 并发与取消
///
/// # 返回
/// - ApplySummary: 各类成功数 + 跳过数 + 失败列表
pub async fn apply_plan<R>(
    plan: &SyncPlan,
    codec: &RegisterCodec,
    repo: &R,
    options: &ApplyOptions,
) -> ApplySummary
where
    R: RegisterRepository + ?Sized,
{
    let register_type = codec.register_type;
    let cancel = &options.cancel;
    let concurrency = options.concurrency.max(1);

    info!(
        register_type = %register_type,
        to_create = plan.to_create.len(),
        to_update = plan.to_update.len(),
        to_delete = plan.to_delete.len(),
        concurrency,
        "开始执行对账计划"
    );

    let mut summary = ApplySummary::default();

    // ===== 1. 新建 =====
    let outcomes = run_phase(plan.to_create.as_slice(), concurrency, |row| async move {
        if cancel.is_cancelled() {
            return OpOutcome::Cancelled;
        }

        let payload = (codec.row_to_payload)(row);
        let label = payload.primary_value().trim().to_string();
        if label.is_empty() {
            debug!(register_type = %register_type, "主字段为空，跳过新建");
            return OpOutcome::Skipped;
        }

        match repo.create_item(register_type, payload).await {
            Ok(id) => {
                debug!(register_type = %register_type, id = %id, label = %label, "新建成功");
                OpOutcome::Applied
            }
            Err(e) => {
                warn!(register_type = %register_type, label = %label, error = %e, "新建失败");
                OpOutcome::Failed(failure_message(ACTION_CREATE, &label, e))
            }
        }
    })
    .await;
    let created = tally(outcomes, &mut summary);
    summary.created = created;

    // ===== 2. 更新 =====
    if !summary.cancelled {
        let outcomes = run_phase(plan.to_update.as_slice(), concurrency, |update| async move {
            if cancel.is_cancelled() {
                return OpOutcome::Cancelled;
            }

            let label = (codec.item_to_key)(&update.item);
            let patch = (codec.row_to_payload)(&update.row);

            match repo.update_item(&update.id, patch).await {
                Ok(()) => {
                    debug!(register_type = %register_type, id = %update.id, label = %label, "更新成功");
                    OpOutcome::Applied
                }
                Err(e) => {
                    warn!(register_type = %register_type, id = %update.id, error = %e, "更新失败");
                    OpOutcome::Failed(failure_message(ACTION_UPDATE, &label, e))
                }
            }
        })
        .await;
        let updated = tally(outcomes, &mut summary);
        summary.updated = updated;
    }

    // ===== 3. 删除 =====
    if !summary.cancelled {
        let outcomes = run_phase(plan.to_delete.as_slice(), concurrency, |item| async move {
            if cancel.is_cancelled() {
                return OpOutcome::Cancelled;
            }

            let label = (codec.item_to_key)(item);

            match repo.delete_item(&item.id).await {
                Ok(()) => {
                    debug!(register_type = %register_type, id = %item.id, label = %label, "删除成功");
                    OpOutcome::Applied
                }
                Err(e) => {
                    warn!(register_type = %register_type, id = %item.id, error = %e, "删除失败");
                    OpOutcome::Failed(failure_message(ACTION_DELETE, &label, e))
                }
            }
        })
        .await;
        let deleted = tally(outcomes, &mut summary);
        summary.deleted = deleted;
    }

    if summary.cancelled {
        warn!(register_type = %register_type, "对账计划执行已取消");
    }

    info!(
        register_type = %register_type,
        created = summary.created,
        updated = summary.updated,
        deleted = summary.deleted,
        skipped = summary.skipped,
        failures = summary.failures.len(),
        "对账计划执行完成"
    );

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::register::{Category, RegisterItem, RegisterRecord};
    use crate::domain::sheet::RowRecord;
    use crate::domain::sync::PlannedUpdate;
    use crate::domain::types::RegisterType;
    use crate::importer::register_codec::CATEGORIES_CODEC;
    use crate::repository::error::{RepositoryError, RepositoryResult};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    // ==========================================
    // 测试用仓储: 记录调用，按名称注入失败
    // ==========================================
    #[derive(Default)]
    struct MockRepo {
        calls: Mutex<Vec<String>>,
        reject: HashSet<String>,
        cancel_after_first: Option<CancelFlag>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl MockRepo {
        fn rejecting(names: &[&str]) -> Self {
            Self {
                reject: names.iter().map(|n| n.to_string()).collect(),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        async fn enter(&self, call: String, name: &str) -> RepositoryResult<()> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            self.calls.lock().unwrap().push(call);
            if let Some(flag) = &self.cancel_after_first {
                flag.cancel();
            }
            if self.reject.contains(name) {
                return Err(RepositoryError::PermissionDenied("skrivskyddad".to_string()));
            }
            Ok(())
        }
    }

    fn name_of(record: &RegisterRecord) -> String {
        record.primary_value().to_string()
    }

    #[async_trait]
    impl RegisterRepository for MockRepo {
        async fn fetch_register_items(&self, _register_type: RegisterType) -> RepositoryResult<Vec<RegisterItem>> {
            Ok(Vec::new())
        }

        async fn create_item(&self, _register_type: RegisterType, payload: RegisterRecord) -> RepositoryResult<String> {
            let name = name_of(&payload);
            self.enter(format!("create:{}", name), &name).await?;
            Ok(format!("id-{}", name))
        }

        async fn update_item(&self, id: &str, patch: RegisterRecord) -> RepositoryResult<()> {
            let name = name_of(&patch);
            self.enter(format!("update:{}", id), &name).await
        }

        async fn delete_item(&self, id: &str) -> RepositoryResult<()> {
            self.enter(format!("delete:{}", id), id).await
        }
    }

    fn category_row(name: &str) -> RowRecord {
        let mut row = RowRecord::new();
        row.insert("Category".to_string(), name.to_string());
        row.insert("Note".to_string(), String::new());
        row
    }

    fn category_item(id: &str, name: &str) -> RegisterItem {
        RegisterItem::new(
            id,
            RegisterRecord::Categories(Category {
                name: name.to_string(),
                note: String::new(),
            }),
        )
    }

    fn full_plan() -> SyncPlan {
        SyncPlan {
            to_create: vec![category_row("VVS")],
            to_update: vec![PlannedUpdate {
                id: "c1".to_string(),
                item: category_item("c1", "Golv"),
                row: category_row("Golv"),
            }],
            to_delete: vec![category_item("c2", "El")],
        }
    }

    #[tokio::test]
    async fn test_phases_run_in_order() {
        let repo = MockRepo::default();

        let summary = apply_plan(&full_plan(), &CATEGORIES_CODEC, &repo, &ApplyOptions::default()).await;

        assert_eq!(repo.calls(), vec!["create:VVS", "update:c1", "delete:c2"]);
        assert_eq!((summary.created, summary.updated, summary.deleted), (1, 1, 1));
        assert!(!summary.has_failures());
        assert!(!summary.cancelled);
    }

    #[tokio::test]
    async fn test_partial_failure_is_isolated() {
        let repo = MockRepo::rejecting(&["B"]);
        let plan = SyncPlan {
            to_create: vec![category_row("A"), category_row("B"), category_row("C")],
            ..Default::default()
        };

        let summary = apply_plan(&plan, &CATEGORIES_CODEC, &repo, &ApplyOptions::default()).await;

        assert_eq!(summary.created, 2);
        assert_eq!(summary.failures.len(), 1);
        assert!(summary.failures[0].starts_with("创建 B: "));
        assert_eq!(repo.calls(), vec!["create:A", "create:B", "create:C"]);
    }

    #[tokio::test]
    async fn test_failures_in_every_phase_are_labelled() {
        let repo = MockRepo::rejecting(&["VVS", "Golv", "c2"]);

        let summary = apply_plan(&full_plan(), &CATEGORIES_CODEC, &repo, &ApplyOptions::default()).await;

        assert_eq!((summary.created, summary.updated, summary.deleted), (0, 0, 0));
        assert_eq!(summary.failures.len(), 3);
        assert!(summary.failures[0].starts_with("创建 VVS"));
        assert!(summary.failures[1].starts_with("更新 Golv"));
        assert!(summary.failures[2].starts_with("删除 El"));
    }

    #[tokio::test]
    async fn test_create_without_primary_value_is_skipped() {
        let repo = MockRepo::default();
        let mut blank = category_row("");
        blank.insert("Note".to_string(), "bara anteckning".to_string());
        let plan = SyncPlan {
            to_create: vec![blank, category_row("A")],
            ..Default::default()
        };

        let summary = apply_plan(&plan, &CATEGORIES_CODEC, &repo, &ApplyOptions::default()).await;

        assert_eq!(summary.created, 1);
        assert_eq!(summary.skipped, 1);
        assert!(summary.failures.is_empty());
        assert_eq!(repo.calls(), vec!["create:A"]);
    }

    #[tokio::test]
    async fn test_cancel_stops_issuing_operations() {
        let options = ApplyOptions::default();
        let repo = MockRepo {
            cancel_after_first: Some(options.cancel.clone()),
            ..Default::default()
        };
        let plan = SyncPlan {
            to_create: vec![category_row("A"), category_row("B")],
            to_delete: vec![category_item("c2", "El")],
            ..Default::default()
        };

        let summary = apply_plan(&plan, &CATEGORIES_CODEC, &repo, &options).await;

        assert!(summary.cancelled);
        assert_eq!(summary.created, 1);
        assert_eq!(summary.deleted, 0);
        assert_eq!(repo.calls(), vec!["create:A"]);
    }

    #[tokio::test]
    async fn test_bounded_concurrency_keeps_counts() {
        let plan = SyncPlan {
            to_create: (0..6).map(|i| category_row(&format!("K{}", i))).collect(),
            ..Default::default()
        };

        let sequential = MockRepo::default();
        apply_plan(&plan, &CATEGORIES_CODEC, &sequential, &ApplyOptions::default()).await;
        assert_eq!(sequential.max_in_flight.load(Ordering::SeqCst), 1);

        let parallel = MockRepo::rejecting(&["K4"]);
        let summary = apply_plan(&plan, &CATEGORIES_CODEC, &parallel, &ApplyOptions::with_concurrency(3)).await;

        assert!(parallel.max_in_flight.load(Ordering::SeqCst) > 1);
        assert!(parallel.max_in_flight.load(Ordering::SeqCst) <= 3);
        assert_eq!(summary.created, 5);
        assert_eq!(summary.failures, vec!["创建 K4: 权限不足: skrivskyddad".to_string()]);
    }
}
