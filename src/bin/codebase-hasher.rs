// 标准库导入
use std::path::PathBuf;

// 第三方crate导入
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;

// 本地模块导入
use fb2_translator::hasher::{calculate_codebase_hash, update_baseline, verify_codebase};

#[derive(Parser)]
#[command(name = "codebase-hasher")]
#[command(about = "计算代码库的确定性SHA-256哈希，用于完整性校验")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: HashCommand,

    /// 详细输出
    #[arg(short, long, global = true)]
    verbose: bool,

    /// 静默模式
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum HashCommand {
    /// 计算代码库哈希
    Calculate {
        #[arg(default_value = ".")]
        directory: PathBuf,
    },
    /// 与基线比较，不一致时退出码为1
    Verify {
        #[arg(default_value = ".")]
        directory: PathBuf,
    },
    /// 将当前哈希保存为基线
    Update {
        #[arg(default_value = ".")]
        directory: PathBuf,
    },
}

/// 日志写到stderr，stdout只输出哈希或JSON报告
fn init_stderr_logging(verbose: bool, quiet: bool) {
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
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_stderr_logging(cli.verbose, cli.quiet);

    match cli.command {
        HashCommand::Calculate { directory } => {
            let report = calculate_codebase_hash(&directory)?;
            println!("{}", report.total_hash);
        }
        HashCommand::Verify { directory } => {
            let report = verify_codebase(&directory)?;
            println!("{}", serde_json::to_string_pretty(&report)?);

            if report.hash_match == Some(false) {
                error!("❌ 代码库已变更!");
                if let Some(previous) = &report.previous_hash {
                    error!("   基线: {}...", previous.get(..16).unwrap_or(previous));
                }
                error!("   当前: {}...", &report.current_hash[..16]);
                std::process::exit(1);
            }
        }
        HashCommand::Update { directory } => {
            let hash = update_baseline(&directory)?;
            println!("✅ 基线已更新: {}...", &hash[..16]);
        }
    }

    Ok(())
}
