//! JSON 行驱动
//!
//! 从输入流逐行读取 `PanelInput`，把后台工作线程响应合并进同一个事件循环，
//! 向输出流逐行写出 `PanelEvent`。

use anyhow::Context;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::{PanelEvent, PanelInput, TerminalPanel};
use crate::ports::WorkerResponse;
use crate::utils::AppResult;

#[derive(Debug, Clone)]
pub struct DriverOptions {
    /// 向宿主请求端口快照的间隔
    pub refresh_interval: Duration,
    /// 输入结束后等待未完成响应的时间
    pub drain_timeout: Duration,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_millis(3000),
            drain_timeout: Duration::from_millis(500),
        }
    }
}

/// 解析一行输入，空行返回 `None`
pub fn parse_input_line(line: &str) -> Option<Result<PanelInput, PanelEvent>> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    Some(
        serde_json::from_str::<PanelInput>(line).map_err(|e| PanelEvent::Error {
            message: format!("无法解析输入: {}", e),
        }),
    )
}

async fn write_events<W>(writer: &mut W, events: &[PanelEvent]) -> AppResult<()>
where
    W: AsyncWrite + Unpin,
{
    for event in events {
        let mut line = serde_json::to_string(event).context("序列化事件失败")?;
        line.push('\n');
        writer
            .write_all(line.as_bytes())
            .await
            .context("写出事件失败")?;
    }
    if !events.is_empty() {
        writer.flush().await.context("刷新输出失败")?;
    }
    Ok(())
}

/// 运行事件循环直到输入结束
pub async fn run<R, W>(
    panel: &mut TerminalPanel,
    reader: R,
    mut writer: W,
    mut responses: UnboundedReceiver<WorkerResponse>,
    options: DriverOptions,
) -> AppResult<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut refresh = interval_at(
        Instant::now() + options.refresh_interval,
        options.refresh_interval,
    );
    refresh.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("面板驱动启动");
    loop {
        let events = tokio::select! {
            line = lines.next_line() => {
                match line.context("读取输入失败")? {
                    Some(line) => match parse_input_line(&line) {
                        Some(Ok(input)) => panel.handle(input),
                        Some(Err(event)) => {
                            warn!("忽略无效输入");
                            vec![event]
                        }
                        None => Vec::new(),
                    },
                    None => break,
                }
            }
            Some(response) = responses.recv() => panel.on_worker_response(response),
            _ = refresh.tick() => vec![PanelEvent::RefreshRequested],
        };
        write_events(&mut writer, &events).await?;
    }

    debug!("输入结束，等待未完成的后台响应");
    while let Ok(Some(response)) = timeout(options.drain_timeout, responses.recv()).await {
        let events = panel.on_worker_response(response);
        write_events(&mut writer, &events).await?;
    }

    info!("面板驱动退出");
    Ok(())
}
