// 标准库导入
use std::path::{Path, PathBuf};

// 第三方crate导入
use anyhow::Result;
use tracing::warn;

/// 西里尔字母输出的文件名后缀
pub const CYRILLIC_OUTPUT_SUFFIX: &str = "_sr_llm";

/// 拉丁字母输出的文件名后缀
pub const LATIN_OUTPUT_SUFFIX: &str = "_sr_latin";

/// 初始化日志系统
pub fn init_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// 验证输入文件
pub fn validate_input_file(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("输入文件不存在: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("输入路径不是文件: {}", path.display());
    }

    match path.extension().map(|ext| ext.to_string_lossy().to_lowercase()) {
        Some(ext) if ext == "fb2" || ext == "xml" => {}
        Some(ext) => warn!("⚠️  文件扩展名不是FB2: {}", ext),
        None => warn!("⚠️  输入文件没有扩展名: {}", path.display()),
    }

    Ok(())
}

/// 生成输出文件路径
///
/// 未指定输出时在输入文件旁生成 `<stem>_sr_llm.fb2`（拉丁字母为 `<stem>_sr_latin.fb2`）。
pub fn generate_output_path(input: &Path, output: Option<&Path>, latin: bool) -> PathBuf {
    if let Some(output_path) = output {
        return output_path.to_path_buf();
    }

    let stem = input.file_stem().unwrap_or_default();
    let suffix = if latin {
        LATIN_OUTPUT_SUFFIX
    } else {
        CYRILLIC_OUTPUT_SUFFIX
    };
    let output_name = format!("{}{}.fb2", stem.to_string_lossy(), suffix);

    match input.parent() {
        Some(parent) => parent.join(output_name),
        None => PathBuf::from(output_name),
    }
}
