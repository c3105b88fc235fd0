//! termplex 终端面板驱动
//!
//! 从 stdin 读取 JSON 行格式的面板输入，向 stdout 写出面板事件，日志写入 stderr。

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tokio::io::BufReader;
use tracing::info;

use termplex_lib::config::{load_config, PanelConfig};
use termplex_lib::panel::{driver, DriverOptions, TerminalPanel};
use termplex_lib::ports::{DiffWorker, WorkerConfig};
use termplex_lib::utils::{app_error_with_context, init_logging, AppResult};

/// Headless terminal panel core driven by JSON lines on stdin/stdout.
#[derive(Debug, Parser)]
#[command(name = "termplex", version)]
struct Cli {
    /// 配置文件路径
    #[arg(long, short = 'c', value_name = "PATH")]
    config: Option<PathBuf>,

    /// 输出默认配置并退出
    #[arg(long)]
    print_default_config: bool,
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    if cli.print_default_config {
        let content =
            toml::to_string_pretty(&PanelConfig::default()).context("序列化默认配置失败")?;
        println!("{}", content);
        return Ok(());
    }

    if let Err(e) = init_logging() {
        eprintln!("{}", e);
    }

    let config = load_config(cli.config.as_deref())?;
    info!(
        "配置已加载: default_shell={}, refresh_interval_ms={}, queue_capacity={}",
        config.terminal.default_shell,
        config.ports.refresh_interval_ms,
        config.worker.queue_capacity
    );

    let (response_sender, response_receiver) = tokio::sync::mpsc::unbounded_channel();
    let worker = DiffWorker::with_sink(
        WorkerConfig {
            queue_capacity: config.worker.queue_capacity,
            ..WorkerConfig::default()
        },
        move |response| {
            // 驱动退出后接收端关闭，剩余响应直接丢弃
            let _ = response_sender.send(response);
        },
    )
    .map_err(app_error_with_context("启动后台工作线程失败"))?;

    let mut panel = TerminalPanel::new(&config, worker);
    let options = DriverOptions {
        refresh_interval: config.ports.refresh_interval(),
        ..DriverOptions::default()
    };

    driver::run(
        &mut panel,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        response_receiver,
        options,
    )
    .await
}
