// 标准库导入
use std::path::Path;
use std::time::Instant;

// 第三方crate导入
use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn};

// 本地模块导入
use fb2_translator::config::{Cli, TranslatorConfig};
use fb2_translator::fb2::{list_translation_units, translate_fb2_file, RunReport, TranslateOptions};
use fb2_translator::stats::{format_duration, print_performance_stats};
use fb2_translator::translator::build_translator;
use fb2_translator::utils::{generate_output_path, init_logging, validate_input_file};

/// dry-run 预览的最大字符数
const PREVIEW_CHARS: usize = 60;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志系统
    init_logging(cli.verbose, cli.quiet);

    // 生成配置模板
    if let Some(config_path) = &cli.create_config {
        TranslatorConfig::save_default(config_path)
            .with_context(|| format!("创建配置文件失败: {}", config_path.display()))?;
        info!("📝 默认配置已保存: {}", config_path.display());
        info!("   请编辑该文件填写API密钥和偏好设置");
        return Ok(());
    }

    let input = cli.input.as_deref().context("缺少输入文件")?;

    // 验证输入文件
    validate_input_file(input)?;

    if cli.dry_run {
        return print_translation_units(input);
    }

    // 生成输出文件路径
    let output_path = generate_output_path(input, cli.output.as_deref(), cli.latin);

    info!("🚀 启动FB2翻译: 俄语 → 塞尔维亚语");
    info!("📂 输入文件: {}", input.display());
    info!("📄 输出文件: {}", output_path.display());
    info!("🔤 输出字母: {}", if cli.latin { "拉丁字母" } else { "西里尔字母" });

    // 开始性能计时
    let total_start = Instant::now();

    match translate_file(&cli, input, &output_path).await {
        Ok(report) => {
            let total_duration = total_start.elapsed();
            let walk = &report.stats.walk;

            info!("✅ 翻译完成！总耗时: {}", format_duration(total_duration));
            info!("✓ 输出文件: {}", report.output_path.display());
            if walk.failed > 0 {
                warn!("⚠️  {} 个片段翻译失败，已保留原文", walk.failed);
            }

            // 显示性能统计
            if cli.stats || cli.verbose {
                print_performance_stats(&report.stats, total_duration);
            }
        }
        Err(e) => {
            error!("❌ 翻译失败: {:#}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

/// 翻译文件核心函数
async fn translate_file(cli: &Cli, input: &Path, output_path: &Path) -> Result<RunReport> {
    // 配置错误在处理文档之前暴露
    let config_start = Instant::now();
    let config = cli.translator_config().context("加载翻译配置失败")?;
    let config_duration = config_start.elapsed();

    // 创建翻译器
    let translator_start = Instant::now();
    let translator = build_translator(&config).context("创建翻译器失败")?;
    translator
        .check_connection()
        .await
        .context("翻译后端不可用")?;
    let translator_duration = translator_start.elapsed();
    info!("🤖 翻译后端就绪: {} → {}", config.provider(), config.model());

    let options = TranslateOptions {
        enable_cache: !cli.no_cache,
        latin: cli.latin,
        indent: cli.indent(),
    };

    let mut report = translate_fb2_file(input, output_path, translator.as_ref(), &options)
        .await
        .context("FB2翻译失败")?;

    report.stats.config_time = config_duration;
    report.stats.translator_init_time = translator_duration;
    Ok(report)
}

/// 列出待翻译片段（不调用翻译后端）
fn print_translation_units(input: &Path) -> Result<()> {
    let units = list_translation_units(input)
        .with_context(|| format!("解析文件失败: {}", input.display()))?;

    for (index, unit) in units.iter().enumerate() {
        let preview: String = unit.text.trim().chars().take(PREVIEW_CHARS).collect();
        println!("{:>5}  {:<48}  {}", index + 1, unit.context, preview.replace('\n', " "));
    }
    println!("\n共 {} 个待翻译片段", units.len());
    Ok(())
}
