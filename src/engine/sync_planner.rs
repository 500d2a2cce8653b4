// ==========================================
// 台账同步系统 - 对账计划引擎
// ==========================================
// 职责: 表格行 × 当前台账快照 → 新建/更新/删除计划
// 红线: 纯函数，不做 I/O，不读取全局状态
// ==========================================
// 规则:
// 1. 键为空的已有条目不参与对账（既不更新也不删除）
// 2. 键为空的行整行跳过
// 3. 同键多行: 更新条目取最后一行（位置保持首次出现处）
// 4. 未匹配的行逐行进入新建序列（不去重）
// 5. 删除 = 有键但未在表格中出现的已有条目
// ==========================================

use crate::domain::register::RegisterItem;
use crate::domain::sheet::RowRecord;
use crate::domain::sync::{PlannedUpdate, SyncPlan};
use crate::importer::register_codec::RegisterCodec;
use std::collections::{HashMap, HashSet};
use tracing::{debug, instrument};

/// 计算对账计划
///
/// # 参数
/// - rows: 已解析的行记录（空行已剔除）
/// - existing: 当前台账快照
/// - codec: 台账编解码器
///
/// # 返回
/// - SyncPlan: 三个序列按键互斥
#[instrument(skip_all, fields(register_type = %codec.register_type, rows = rows.len(), existing = existing.len()))]
pub fn compute_sync_plan(rows: &[RowRecord], existing: &[RegisterItem], codec: &RegisterCodec) -> SyncPlan {
    // 1. 已有条目键索引（空键不可见）
    let mut existing_by_key: HashMap<String, &RegisterItem> = HashMap::with_capacity(existing.len());
    for item in existing {
        let key = (codec.item_to_key)(item);
        if !key.is_empty() {
            existing_by_key.insert(key, item);
        }
    }

    let mut plan = SyncPlan::default();
    let mut seen: HashSet<String> = HashSet::with_capacity(rows.len());
    // 键 → to_update 下标
    let mut update_index: HashMap<String, usize> = HashMap::new();
    let mut skipped_keyless = 0usize;

    // 2-4. 逐行归类
    for row in rows {
        let key = (codec.key_from_row)(row);
        if key.is_empty() {
            skipped_keyless += 1;
            continue;
        }

        match existing_by_key.get(&key) {
            Some(item) => {
                let planned = PlannedUpdate {
                    id: item.id.clone(),
                    item: (*item).clone(),
                    row: row.clone(),
                };
                match update_index.get(&key) {
                    Some(&idx) => plan.to_update[idx] = planned,
                    None => {
                        update_index.insert(key.clone(), plan.to_update.len());
                        plan.to_update.push(planned);
                    }
                }
            }
            None => plan.to_create.push(row.clone()),
        }

        seen.insert(key);
    }

    // 5. 未出现的已有条目（按快照顺序）
    plan.to_delete = existing
        .iter()
        .filter(|item| {
            let key = (codec.item_to_key)(item);
            !key.is_empty() && !seen.contains(&key)
        })
        .cloned()
        .collect();

    debug!(
        to_create = plan.to_create.len(),
        to_update = plan.to_update.len(),
        to_delete = plan.to_delete.len(),
        skipped_keyless,
        "对账计划生成完成"
    );

    plan
}
