// ==========================================
// 台账同步系统 - 台账 Repository Trait
// ==========================================
// 职责: 定义台账条目的数据访问接口（不包含业务逻辑）
// 红线: Repository 不含对账规则，只做数据 CRUD
// ==========================================

use crate::domain::register::{RegisterItem, RegisterRecord};
use crate::domain::types::RegisterType;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// RegisterRepository Trait
// ==========================================
// 用途: 台账条目的远端/本地存储
// 实现者: RegisterRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait RegisterRepository: Send + Sync {
    /// 查询某类台账的全部条目
    ///
    /// # 参数
    /// - register_type: 台账类型
    ///
    /// # 返回
    /// - Ok(Vec<RegisterItem>): 当前快照（按创建顺序）
    async fn fetch_register_items(&self, register_type: RegisterType) -> RepositoryResult<Vec<RegisterItem>>;

    /// 新建条目
    ///
    /// # 参数
    /// - register_type: 台账类型
    /// - payload: 条目内容
    ///
    /// # 返回
    /// - Ok(String): 存储层分配的 id
    async fn create_item(&self, register_type: RegisterType, payload: RegisterRecord) -> RepositoryResult<String>;

    /// 按补丁更新条目
    ///
    /// # 参数
    /// - id: 条目 id
    /// - patch: 补丁；补丁中缺省的字段保留原值
    async fn update_item(&self, id: &str, patch: RegisterRecord) -> RepositoryResult<()>;

    /// 删除条目
    async fn delete_item(&self, id: &str) -> RepositoryResult<()>;
}
