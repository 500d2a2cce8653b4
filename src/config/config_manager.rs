// ==========================================
// 台账同步系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::sync_config_trait::SyncConfigReader;
use crate::db::open_and_init;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

/// 全局作用域
pub const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例（自动建表）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_and_init(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let guard = conn.lock().map_err(|e| ConfigError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&guard)?;
        }
        Ok(Self { conn })
    }

    fn get_conn(&self) -> ConfigResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入配置值（UPSERT）
    ///
    /// 数值型配置在写入前校验
    pub fn set_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        validate_value(key, value)?;

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')
            "#,
            params![GLOBAL_SCOPE, key, value],
        )
        .map_err(|e| ConfigError::WriteError(e.to_string()))?;
        Ok(())
    }

    /// 读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 读取正整数配置；格式错误时回退默认值
    fn get_positive_usize(&self, key: &str, default: usize) -> ConfigResult<usize> {
        let raw = self.get_config_or_default(key, &default.to_string())?;
        match raw.trim().parse::<usize>() {
            Ok(v) if v > 0 => Ok(v),
            _ => {
                warn!(config_key = key, raw_value = %raw, default, "配置格式错误，使用默认值");
                Ok(default)
            }
        }
    }

    /// 获取所有 global 配置的快照
    pub fn get_config_snapshot(&self) -> ConfigResult<HashMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;

        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut snapshot = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            snapshot.insert(key, value);
        }
        Ok(snapshot)
    }
}

/// 写入前校验
fn validate_value(key: &str, value: &str) -> ConfigResult<()> {
    let invalid = || ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    };

    match key {
        config_keys::FAILURE_PREVIEW_LIMIT | config_keys::APPLY_CONCURRENCY => {
            match value.trim().parse::<usize>() {
                Ok(v) if v > 0 => Ok(()),
                _ => Err(invalid()),
            }
        }
        config_keys::APPLY_ENABLED => match value.trim() {
            "0" | "1" => Ok(()),
            _ => Err(invalid()),
        },
        _ => Ok(()),
    }
}

#[async_trait]
impl SyncConfigReader for ConfigManager {
    async fn get_failure_preview_limit(&self) -> ConfigResult<usize> {
        self.get_positive_usize(
            config_keys::FAILURE_PREVIEW_LIMIT,
            defaults::FAILURE_PREVIEW_LIMIT,
        )
    }

    async fn get_apply_concurrency(&self) -> ConfigResult<usize> {
        self.get_positive_usize(config_keys::APPLY_CONCURRENCY, defaults::APPLY_CONCURRENCY)
    }

    async fn get_export_dir(&self) -> ConfigResult<Option<PathBuf>> {
        Ok(self
            .get_config_value(config_keys::EXPORT_DIR)?
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from))
    }

    async fn is_apply_enabled(&self) -> ConfigResult<bool> {
        let value = self.get_config_or_default(config_keys::APPLY_ENABLED, "1")?;
        Ok(value.trim() != "0")
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 失败摘要
    pub const FAILURE_PREVIEW_LIMIT: &str = "sync/failure_preview_limit";

    // 执行
    pub const APPLY_CONCURRENCY: &str = "sync/apply_concurrency";
    pub const APPLY_ENABLED: &str = "sync/apply_enabled";

    // 导出
    pub const EXPORT_DIR: &str = "sync/export_dir";
}

pub mod defaults {
    pub const FAILURE_PREVIEW_LIMIT: usize = 3;
    pub const APPLY_CONCURRENCY: usize = 1;
}
