// ==========================================
// 台账同步 API
// ==========================================
// 职责: 编排 导出 / 空白模板 / 导入预览 / 导入执行
// 流程:
// - 导出: 读取台账 → 编解码器转行 → 生成表格 → 保存
// - 导入: 解析 → 表头校验 → 对账计划（确认）→ 执行
// 红线: 解析/校验失败时不产生任何写入
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::SyncConfigReader;
use crate::domain::sheet::SheetRows;
use crate::domain::sync::{ApplySummary, PlanSummary, SyncPlan};
use crate::domain::types::RegisterType;
use crate::engine::{apply_plan, compute_sync_plan, ApplyOptions, CancelFlag};
use crate::importer::{
    build_and_download, inspect_rows, parse_file, validate_headers, DirectorySaveSurface,
    ExportedFile, FileSaveSurface, ImportDiagnostics, ImportError, RegisterCodec,
};
use crate::repository::RegisterRepository;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// 导入预览（确认界面数据）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportPreview {
    pub register_type: RegisterType,
    /// 有效数据行数（空行已剔除）
    pub row_count: usize,
    pub plan: SyncPlan,
    pub summary: PlanSummary,
    pub diagnostics: ImportDiagnostics,
}

/// 导入执行结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyResponse {
    pub register_type: RegisterType,
    pub summary: ApplySummary,
    /// 前 N 条失败信息
    pub failure_preview: Vec<String>,
    pub total_failures: usize,
    /// 面向用户的结果说明
    pub message: String,
}

// ==========================================
// RegisterSyncApi
// ==========================================
pub struct RegisterSyncApi<R: ?Sized, C>
where
    R: RegisterRepository,
    C: SyncConfigReader,
{
    repo: Arc<R>,
    config: Arc<C>,
    save_surface: Option<Arc<dyn FileSaveSurface>>,
}

impl<R: ?Sized, C> RegisterSyncApi<R, C>
where
    R: RegisterRepository,
    C: SyncConfigReader,
{
    /// 创建新的 RegisterSyncApi 实例
    ///
    /// # 参数
    /// - repo: 台账仓储
    /// - config: 配置读取器
    pub fn new(repo: Arc<R>, config: Arc<C>) -> Self {
        Self {
            repo,
            config,
            save_surface: None,
        }
    }

    /// 指定导出文件保存接口（未指定时按配置目录/系统下载目录保存）
    pub fn with_save_surface(mut self, surface: Arc<dyn FileSaveSurface>) -> Self {
        self.save_surface = Some(surface);
        self
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repo
    }

    async fn resolve_save_surface(&self) -> ApiResult<Arc<dyn FileSaveSurface>> {
        if let Some(surface) = &self.save_surface {
            return Ok(Arc::clone(surface));
        }

        let dir = self
            .config
            .get_export_dir()
            .await?
            .unwrap_or_else(DirectorySaveSurface::default_download_dir);
        Ok(Arc::new(DirectorySaveSurface::new(dir)))
    }

    // ==========================================
    // 导出
    // ==========================================

    /// 导出台账当前内容
    ///
    /// # 返回
    /// - Ok(ExportedFile): 保存位置与行数
    #[instrument(skip(self))]
    pub async fn export_register(&self, register_type: RegisterType) -> ApiResult<ExportedFile> {
        let codec = RegisterCodec::for_type(register_type);
        let items = self.repo.fetch_register_items(register_type).await?;
        let rows = codec.export_rows(&items);

        let surface = self.resolve_save_surface().await?;
        let exported = build_and_download(
            &*surface,
            codec.sheet_name,
            codec.headers,
            SheetRows::Positional(rows),
            codec.file_prefix,
        )?;

        info!(register_type = %register_type, rows = exported.row_count, path = %exported.path.display(), "台账导出完成");
        Ok(exported)
    }

    /// 导出空白模板（仅表头）
    #[instrument(skip(self))]
    pub async fn export_template(&self, register_type: RegisterType) -> ApiResult<ExportedFile> {
        let codec = RegisterCodec::for_type(register_type);
        let surface = self.resolve_save_surface().await?;

        let exported = build_and_download(
            &*surface,
            codec.sheet_name,
            codec.headers,
            SheetRows::empty(),
            codec.file_prefix,
        )?;

        info!(register_type = %register_type, path = %exported.path.display(), "空白模板导出完成");
        Ok(exported)
    }

    // ==========================================
    // 导入
    // ==========================================

    /// 导入预览: 解析 + 表头校验 + 对账计划
    ///
    /// # 参数
    /// - register_type: 台账类型
    /// - file_name: 原始文件名（用于选择解析器）
    /// - bytes: 文件内容
    ///
    /// # 返回
    /// - Ok(ImportPreview): 计划与诊断信息
    /// - Err(MalformedFile / SchemaMismatch): 阻断错误，无副作用
    ///
    /// # 说明
    /// - 仅有表头的文件是合法导入: 计划删除全部有键条目，由确认环节展示
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub async fn preview_import(
        &self,
        register_type: RegisterType,
        file_name: &str,
        bytes: &[u8],
    ) -> ApiResult<ImportPreview> {
        let codec = RegisterCodec::for_type(register_type);

        // 1. 解析
        let sheet = parse_file(file_name, bytes);
        if !sheet.is_ok() {
            warn!(register_type = %register_type, errors = ?sheet.errors, "导入文件解析失败");
            return Err(ApiError::MalformedFile(sheet.errors.join("; ")));
        }

        // 2. 表头校验
        let validation = validate_headers(&sheet.headers, codec.headers);
        if !validation.valid {
            warn!(register_type = %register_type, missing = ?validation.missing, "导入文件缺少必需列");
            return Err(ImportError::MissingColumns(validation.missing).into());
        }

        // 3. 对账
        let existing = self.repo.fetch_register_items(register_type).await?;
        let plan = compute_sync_plan(&sheet.rows, &existing, codec);
        let diagnostics = inspect_rows(&sheet.rows, &sheet.row_numbers, codec);

        if !diagnostics.is_clean() {
            warn!(
                register_type = %register_type,
                no_data_rows = diagnostics.no_data_rows,
                keyless_rows = ?diagnostics.keyless_rows,
                duplicate_keys = diagnostics.duplicate_keys.len(),
                "导入文件无数据行或存在无键行/重复键"
            );
        }

        let summary = plan.summary();
        info!(
            register_type = %register_type,
            rows = sheet.rows.len(),
            to_create = summary.to_create,
            to_update = summary.to_update,
            to_delete = summary.to_delete,
            "导入预览完成"
        );

        Ok(ImportPreview {
            register_type,
            row_count: sheet.rows.len(),
            plan,
            summary,
            diagnostics,
        })
    }

    /// 执行已确认的导入计划
    ///
    /// # 参数
    /// - preview: 预览结果（用户已确认）
    /// - cancel: 可选取消标志
    ///
    /// # 说明
    /// - 非事务: 部分失败时已成功的写入保留，失败列表返回给调用方
    #[instrument(skip(self, preview, cancel), fields(register_type = %preview.register_type))]
    pub async fn apply_import(&self, preview: &ImportPreview, cancel: Option<CancelFlag>) -> ApiResult<ApplyResponse> {
        if !self.config.is_apply_enabled().await? {
            return Err(ApiError::ApplyDisabled);
        }

        let register_type = preview.register_type;
        let codec = RegisterCodec::for_type(register_type);
        let options = ApplyOptions {
            concurrency: self.config.get_apply_concurrency().await?,
            cancel: cancel.unwrap_or_default(),
        };
        let preview_limit = self.config.get_failure_preview_limit().await?;

        let summary = apply_plan(&preview.plan, codec, self.repo.as_ref(), &options).await;

        Ok(build_apply_response(register_type, summary, preview_limit))
    }

    /// 预览并立即执行（无人工确认环节，供命令行使用）
    pub async fn import_register(
        &self,
        register_type: RegisterType,
        file_name: &str,
        bytes: &[u8],
    ) -> ApiResult<ApplyResponse> {
        let preview = self.preview_import(register_type, file_name, bytes).await?;
        self.apply_import(&preview, None).await
    }
}

/// 组装执行结果与用户提示
fn build_apply_response(register_type: RegisterType, summary: ApplySummary, preview_limit: usize) -> ApplyResponse {
    let total_failures = summary.failures.len();
    let counts = format!(
        "新建 {} 条，更新 {} 条，删除 {} 条",
        summary.created, summary.updated, summary.deleted
    );

    let message = if summary.cancelled {
        format!("导入已取消: {}（已完成的写入不会回滚）", counts)
    } else if total_failures == 0 {
        format!("导入完成: {}", counts)
    } else {
        format!(
            "导入部分完成: {}，失败 {} 条。请修正后重新导入以重试失败的记录",
            counts, total_failures
        )
    };

    ApplyResponse {
        register_type,
        failure_preview: summary.failure_preview(preview_limit),
        total_failures,
        summary,
        message,
    }
}
