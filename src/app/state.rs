// ==========================================
// 台账同步系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享连接和API实例
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::api::RegisterSyncApi;
use crate::config::ConfigManager;
use crate::db::open_and_init;
use crate::repository::RegisterRepositoryImpl;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "REGISTER_SYNC_DB_PATH";

/// 默认数据库文件名
const DB_FILE_NAME: &str = "register_sync.db";

pub type DefaultRegisterSyncApi = RegisterSyncApi<RegisterRepositoryImpl, ConfigManager>;

// ==========================================
// AppState - 应用状态
// ==========================================
pub struct AppState {
    pub db_path: String,
    pub config: Arc<ConfigManager>,
    pub register_sync_api: Arc<DefaultRegisterSyncApi>,
}

impl AppState {
    /// 创建应用状态（共享同一个连接）
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_and_init(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        let repo = Arc::new(RegisterRepositoryImpl::from_connection(conn.clone()));
        let config = Arc::new(
            ConfigManager::from_connection(conn).map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        let register_sync_api = Arc::new(RegisterSyncApi::new(repo, config.clone()));

        Ok(Self {
            db_path,
            config,
            register_sync_api,
        })
    }
}

/// 默认数据库路径
///
/// 优先级: 环境变量 → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from(".").join(DB_FILE_NAME);

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("register-sync");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join(DB_FILE_NAME);
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(path.ends_with(DB_FILE_NAME));
    }

    #[test]
    fn test_app_state_opens_database() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("state.db").to_string_lossy().to_string();

        let state = AppState::new(db_path.clone()).unwrap();

        assert_eq!(state.db_path, db_path);
        assert_eq!(
            state
                .register_sync_api
                .repository()
                .count_items(crate::domain::types::RegisterType::Categories)
                .unwrap(),
            0
        );
    }
}
