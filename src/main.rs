// ==========================================
// 台账同步系统 - 命令行入口
// ==========================================
// 用法:
//   register-sync export   <register>        [--db path]
//   register-sync template <register>        [--db path]
//   register-sync preview  <register> <file> [--db path]
//   register-sync import   <register> <file> [--db path]
//
// register: accounts | categories | cost-codes | suppliers
// REGISTER_SYNC_LOG_FORMAT=json 输出 JSON 日志
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use register_sync::app::{get_default_db_path, AppState};
use register_sync::{logging, RegisterType};
use std::path::Path;

const LOG_FORMAT_ENV: &str = "REGISTER_SYNC_LOG_FORMAT";

const USAGE: &str = "用法: register-sync <export|template|preview|import> <register> [file] [--db path]";

struct CliArgs {
    command: String,
    register_type: RegisterType,
    file: Option<String>,
    db_path: String,
}

fn parse_args() -> Result<CliArgs> {
    let mut positional = Vec::new();
    let mut db_path = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--db" {
            db_path = Some(args.next().ok_or_else(|| anyhow!("--db 缺少路径参数"))?);
        } else {
            positional.push(arg);
        }
    }

    let mut positional = positional.into_iter();
    let command = positional.next().ok_or_else(|| anyhow!(USAGE))?;
    let register_type = positional
        .next()
        .ok_or_else(|| anyhow!(USAGE))?
        .parse::<RegisterType>()
        .map_err(|e| anyhow!(e))?;

    Ok(CliArgs {
        command,
        register_type,
        file: positional.next(),
        db_path: db_path.unwrap_or_else(get_default_db_path),
    })
}

fn read_input(file: Option<&str>) -> Result<(String, Vec<u8>)> {
    let path = file.ok_or_else(|| anyhow!("缺少导入文件参数\n{}", USAGE))?;
    let bytes = std::fs::read(path).with_context(|| format!("无法读取文件: {}", path))?;
    let file_name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string());
    Ok((file_name, bytes))
}

#[tokio::main]
async fn main() -> Result<()> {
    match std::env::var(LOG_FORMAT_ENV).as_deref() {
        Ok("json") => logging::init_json(),
        _ => logging::init(),
    }

    let args = parse_args()?;
    tracing::info!("{} v{}，数据库: {}", register_sync::APP_NAME, register_sync::VERSION, args.db_path);

    let state = AppState::new(args.db_path.clone()).map_err(|e| anyhow!(e))?;
    let api = &state.register_sync_api;

    match args.command.as_str() {
        "export" => {
            let exported = api.export_register(args.register_type).await?;
            println!("已导出 {} 行: {}", exported.row_count, exported.path.display());
        }
        "template" => {
            let exported = api.export_template(args.register_type).await?;
            println!("已导出空白模板: {}", exported.path.display());
        }
        "preview" => {
            let (file_name, bytes) = read_input(args.file.as_deref())?;
            let preview = api.preview_import(args.register_type, &file_name, &bytes).await?;
            println!(
                "新建 {} 条，更新 {} 条，删除 {} 条",
                preview.summary.to_create, preview.summary.to_update, preview.summary.to_delete
            );
            if preview.diagnostics.no_data_rows {
                println!("文件中没有数据行，执行导入将清空该台账");
            }
            if !preview.diagnostics.keyless_rows.is_empty() {
                println!("以下行缺少标识列，将被忽略: {:?}", preview.diagnostics.keyless_rows);
            }
            for duplicate in &preview.diagnostics.duplicate_keys {
                println!("重复键 {}（行 {:?}），以最后一行为准", duplicate.key, duplicate.rows);
            }
        }
        "import" => {
            let (file_name, bytes) = read_input(args.file.as_deref())?;
            let response = api.import_register(args.register_type, &file_name, &bytes).await?;
            println!("{}", response.message);
            for failure in &response.failure_preview {
                println!("  - {}", failure);
            }
            if response.total_failures > response.failure_preview.len() {
                println!("  ... 共 {} 条失败", response.total_failures);
            }
        }
        other => bail!("未知命令: {}\n{}", other, USAGE),
    }

    Ok(())
}
