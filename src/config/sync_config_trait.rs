// ==========================================
// 台账同步系统 - 同步配置读取 Trait
// ==========================================
// 职责: 定义导入/导出流程所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::error::ConfigResult;
use async_trait::async_trait;
use std::path::PathBuf;

// ==========================================
// SyncConfigReader Trait
// ==========================================
// 用途: 台账同步流程的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait SyncConfigReader: Send + Sync {
    /// 获取失败摘要展示条数
    ///
    /// # 默认值
    /// - 3
    async fn get_failure_preview_limit(&self) -> ConfigResult<usize>;

    /// 获取执行并发数
    ///
    /// # 默认值
    /// - 1（严格串行）
    async fn get_apply_concurrency(&self) -> ConfigResult<usize>;

    /// 获取导出目录
    ///
    /// # 返回
    /// - None: 未配置，由调用方使用系统下载目录
    async fn get_export_dir(&self) -> ConfigResult<Option<PathBuf>>;

    /// 是否允许执行导入（关闭时仅预览）
    ///
    /// # 默认值
    /// - true
    async fn is_apply_enabled(&self) -> ConfigResult<bool>;
}
