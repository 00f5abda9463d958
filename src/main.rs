//! qabot 主入口

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use qabot::ai::CompletionEngine;
use qabot::channels::{Channel, TerminalChannel};
use qabot::infra::config::ConfigLoader;
use qabot::infra::logging::{self, LoggingConfig, LogLevel};

// 命令行参数解析结构体
#[derive(Parser, Debug)]
#[command(name = "qabot")]
#[command(version = "0.1.0")]
#[command(about = "一个轻量级的 AI 问答代理机器人", long_about = None)]
struct Args {
    /// 配置文件路径
    #[arg(short, long, default_value = "qabot.toml")]
    config: String,

    /// 是否启用 verbose 模式（显示 DEBUG 日志）
    #[arg(short, long)]
    verbose: bool,

    /// 终端会话使用的用户标识
    #[arg(short, long, default_value = "terminal")]
    user: String,

    /// 子命令
    #[command(subcommand)]
    command: Option<Commands>,
}

// 子命令枚举
#[derive(Subcommand, Debug)]
enum Commands {
    /// 启动终端对话
    Start,
    /// 检查配置文件是否有效
    Check,
    /// 显示版本信息
    Version,
}

// 主函数
#[tokio::main]
async fn main() {
    // 加载 .env 文件
    dotenv::dotenv().ok();

    let args = Args::parse();

    match args.command {
        Some(Commands::Start) | None => {
            run_bot(&args).await;
        }
        Some(Commands::Check) => {
            check_config(&args.config).await;
        }
        Some(Commands::Version) => {
            println!("qabot v0.1.0");
        }
    }
}

// 启动终端对话
async fn run_bot(args: &Args) {
    let loader = ConfigLoader::new();
    let config = match loader.load(&args.config).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("配置加载失败: {}", e);
            return;
        }
    };

    // 日志级别：verbose 优先，其次取配置
    let level = if args.verbose {
        LogLevel::Debug
    } else {
        config
            .logging
            .level
            .as_deref()
            .and_then(LogLevel::parse)
            .unwrap_or(LogLevel::Info)
    };
    logging::init(&LoggingConfig { level });

    info!(version = "0.1.0", path = %args.config, "qabot 启动");

    let engine = Arc::new(CompletionEngine::new(&config));
    let channel = TerminalChannel::new(&args.user);

    if let Err(e) = channel.run(engine).await {
        error!(error = %e, "渠道运行出错");
    }

    info!("服务退出");
}

// 检查配置文件是否有效
async fn check_config(config_path: &str) {
    println!("验证配置文件: {}", config_path);

    let loader = ConfigLoader::new();

    match loader.load(config_path).await {
        Ok(config) => {
            println!("配置验证成功!");
            println!("- AI Providers: {}", config.ai.providers.len());
            println!(
                "- 会话预算: {} 字符",
                config.session.conversation_max_tokens.unwrap_or(1000)
            );
        }
        Err(e) => {
            println!("配置验证失败: {}", e);
        }
    }
}
