// ==========================================
// 台账同步系统 - 台账 Repository 实现
// ==========================================
// 职责: 以 JSON 文档形式在 SQLite 中存储台账条目
// 说明:
// - id 为 UUID v4，由本层分配
// - 更新按补丁合并（RegisterRecord::apply_patch）
// - 同步读写在持锁的辅助方法中完成，锁不跨 await
// ==========================================

use crate::db::open_and_init;
use crate::domain::register::{RegisterItem, RegisterRecord};
use crate::domain::types::RegisterType;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::register_repo::RegisterRepository;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

const ENTITY: &str = "RegisterItem";

// ==========================================
// RegisterRepositoryImpl
// ==========================================
pub struct RegisterRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl RegisterRepositoryImpl {
    /// 创建新的 Repository 实例（自动建表）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_and_init(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例（调用方负责建表）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 条目数量（按台账类型）
    pub fn count_items(&self, register_type: RegisterType) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM register_item WHERE register_type = ?1",
            params![register_type.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// 按 id 查询
    pub fn find_by_id(&self, id: &str) -> RepositoryResult<Option<RegisterItem>> {
        let conn = self.get_conn()?;
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload_json FROM register_item WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        match payload {
            Some(json) => Ok(Some(RegisterItem::new(id, serde_json::from_str(&json)?))),
            None => Ok(None),
        }
    }

    fn fetch_items_sync(&self, register_type: RegisterType) -> RepositoryResult<Vec<RegisterItem>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, payload_json
            FROM register_item
            WHERE register_type = ?1
            ORDER BY rowid
            "#,
        )?;

        let rows = stmt.query_map(params![register_type.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut items = Vec::new();
        for row in rows {
            let (id, json) = row?;
            let record: RegisterRecord = serde_json::from_str(&json)?;
            items.push(RegisterItem::new(id, record));
        }
        Ok(items)
    }

    fn insert_item_sync(&self, register_type: RegisterType, payload: &RegisterRecord) -> RepositoryResult<String> {
        if payload.register_type() != register_type {
            return Err(RepositoryError::ValidationError(format!(
                "载荷类型 {} 与台账类型 {} 不一致",
                payload.register_type(),
                register_type
            )));
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let json = serde_json::to_string(payload)?;

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO register_item (id, register_type, payload_json, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            "#,
            params![id, register_type.as_str(), json, now],
        )?;
        Ok(id)
    }

    fn update_item_sync(&self, id: &str, patch: RegisterRecord) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let current: Option<String> = conn
            .query_row(
                "SELECT payload_json FROM register_item WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        let json = current.ok_or_else(|| RepositoryError::NotFound {
            entity: ENTITY.to_string(),
            id: id.to_string(),
        })?;

        let mut record: RegisterRecord = serde_json::from_str(&json)?;
        if !record.apply_patch(patch) {
            return Err(RepositoryError::ValidationError(format!(
                "补丁类型与条目 {} 的台账类型不一致",
                id
            )));
        }

        conn.execute(
            "UPDATE register_item SET payload_json = ?1, updated_at = ?2 WHERE id = ?3",
            params![serde_json::to_string(&record)?, Utc::now().to_rfc3339(), id],
        )?;
        Ok(())
    }

    fn delete_item_sync(&self, id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM register_item WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: ENTITY.to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RegisterRepository for RegisterRepositoryImpl {
    async fn fetch_register_items(&self, register_type: RegisterType) -> RepositoryResult<Vec<RegisterItem>> {
        let items = self.fetch_items_sync(register_type)?;
        debug!(register_type = %register_type, count = items.len(), "读取台账条目");
        Ok(items)
    }

    async fn create_item(&self, register_type: RegisterType, payload: RegisterRecord) -> RepositoryResult<String> {
        let id = self.insert_item_sync(register_type, &payload)?;
        debug!(register_type = %register_type, id = %id, "新建台账条目");
        Ok(id)
    }

    async fn update_item(&self, id: &str, patch: RegisterRecord) -> RepositoryResult<()> {
        self.update_item_sync(id, patch)?;
        debug!(id = %id, "更新台账条目");
        Ok(())
    }

    async fn delete_item(&self, id: &str) -> RepositoryResult<()> {
        self.delete_item_sync(id)?;
        debug!(id = %id, "删除台账条目");
        Ok(())
    }
}
