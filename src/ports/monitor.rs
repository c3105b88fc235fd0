//! 端口列表监控
//!
//! 周期性接收后端完整快照，通过后台工作线程计算差异并合并进显示列表，
//! 显示列表始终按当前排序字段有序，过滤结果同样由工作线程计算。

use crossbeam_channel::Receiver;
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

use super::engine;
use super::error::WorkerResult;
use super::types::{PortChanges, PortInfo, PortSortKey};
use super::worker::{DiffWorker, Operation, ResponsePayload, Ticket, WorkerRequest, WorkerResponse};

/// 合并工作线程响应后产生的界面更新
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorUpdate {
    /// 快照差异已合并
    ///
    /// 没有过滤条件时 `visible` 为合并后的列表；有过滤条件时为 `None`，
    /// 新的过滤结果随后以 `Visible` 送达。
    Changed {
        changes: PortChanges,
        visible: Option<Vec<PortInfo>>,
    },
    /// 新的可见列表（过滤或排序结果）
    Visible(Vec<PortInfo>),
    Failed {
        operation: Option<Operation>,
        message: String,
    },
}

/// 端口监控器
#[derive(Debug)]
pub struct PortMonitor {
    worker: DiffWorker,
    /// 完整的已合并列表，按 `sort_key` 有序
    displayed: Vec<PortInfo>,
    visible: Vec<PortInfo>,
    filter: String,
    /// 最近一次投递的过滤请求所用的条件
    pending_filter: Option<String>,
    sort_key: PortSortKey,
    min_refresh_interval: Duration,
    last_refresh: Option<Instant>,
    /// 显示列表内容的修订号，每次合并差异后递增
    revision: u64,
    sort_revision: u64,
}

impl PortMonitor {
    pub fn new(worker: DiffWorker, sort_key: PortSortKey, min_refresh_interval: Duration) -> Self {
        Self {
            worker,
            displayed: Vec::new(),
            visible: Vec::new(),
            filter: String::new(),
            pending_filter: None,
            sort_key,
            min_refresh_interval,
            last_refresh: None,
            revision: 0,
            sort_revision: 0,
        }
    }

    pub fn displayed(&self) -> &[PortInfo] {
        &self.displayed
    }

    pub fn visible(&self) -> &[PortInfo] {
        &self.visible
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn sort_key(&self) -> PortSortKey {
        self.sort_key
    }

    pub fn worker(&self) -> &DiffWorker {
        &self.worker
    }

    /// 推送一次完整快照
    ///
    /// 距离上次刷新不足最小间隔且未强制时忽略，返回 `Ok(None)`。
    pub fn push_snapshot(
        &mut self,
        snapshot: Vec<PortInfo>,
        now: Instant,
        force: bool,
    ) -> WorkerResult<Option<Ticket>> {
        if !force {
            if let Some(last) = self.last_refresh {
                if now.saturating_duration_since(last) < self.min_refresh_interval {
                    trace!("快照刷新过于频繁，已忽略");
                    return Ok(None);
                }
            }
        }

        let ticket = self
            .worker
            .post(WorkerRequest::detect_changes(self.displayed.clone(), snapshot))?;
        self.last_refresh = Some(now);
        Ok(Some(ticket))
    }

    /// 更新过滤条件，空条件立即显示完整列表
    pub fn set_filter(&mut self, filter: impl Into<String>) -> WorkerResult<Option<Ticket>> {
        self.filter = filter.into();
        if self.filter.is_empty() {
            self.pending_filter = None;
            self.visible = self.displayed.clone();
            return Ok(None);
        }
        self.post_filter().map(Some)
    }

    /// 更改排序字段，排序在工作线程中完成
    pub fn set_sort(&mut self, sort_key: PortSortKey) -> WorkerResult<Ticket> {
        self.sort_key = sort_key;
        self.sort_revision = self.revision;
        self.worker
            .post(WorkerRequest::sort(self.displayed.clone(), sort_key.as_str()))
    }

    fn post_filter(&mut self) -> WorkerResult<Ticket> {
        let ticket = self
            .worker
            .post(WorkerRequest::filter(self.displayed.clone(), self.filter.clone()))?;
        self.pending_filter = Some(self.filter.clone());
        Ok(ticket)
    }

    /// 处理一个工作线程响应，过期响应被丢弃
    pub fn on_response(&mut self, response: WorkerResponse) -> Option<MonitorUpdate> {
        if response.external {
            trace!("外部请求帧的响应不参与合并");
            return None;
        }
        if !self.worker.is_current(&response) {
            debug!(
                "丢弃过期响应: operation={:?}, generation={}",
                response.operation, response.generation
            );
            return None;
        }

        match response.payload {
            ResponsePayload::PortChanges(changes) => self.merge_changes(changes),
            ResponsePayload::SortedPorts(sorted) => {
                if self.sort_revision != self.revision {
                    // 合并差异时已按新字段重新排序
                    trace!("排序结果基于旧列表，已忽略");
                    return None;
                }
                self.displayed = sorted;
                self.refresh_visible()
            }
            ResponsePayload::FilteredPorts(filtered) => {
                let query_matches = self.pending_filter.as_deref() == Some(self.filter.as_str());
                if self.filter.is_empty() || !query_matches {
                    trace!("过滤结果对应的条件已变更，已忽略");
                    return None;
                }
                self.visible = filtered;
                Some(MonitorUpdate::Visible(self.visible.clone()))
            }
            ResponsePayload::Error(fault) => {
                warn!("工作线程返回错误: {}", fault.message);
                Some(MonitorUpdate::Failed {
                    operation: response.operation,
                    message: fault.message,
                })
            }
        }
    }

    fn merge_changes(&mut self, changes: PortChanges) -> Option<MonitorUpdate> {
        if changes.is_empty() {
            return None;
        }

        debug!(
            "合并端口变化: added={}, removed={}, changed={}",
            changes.added.len(),
            changes.removed.len(),
            changes.changed.len()
        );
        let merged = engine::apply_changes(&self.displayed, &changes);
        self.displayed = engine::sort(&merged, &self.sort_key);
        self.revision += 1;

        let visible = if self.filter.is_empty() {
            self.visible = self.displayed.clone();
            Some(self.visible.clone())
        } else {
            if let Err(e) = self.post_filter() {
                e.log();
            }
            None
        };
        Some(MonitorUpdate::Changed { changes, visible })
    }

    fn refresh_visible(&mut self) -> Option<MonitorUpdate> {
        if self.filter.is_empty() {
            self.visible = self.displayed.clone();
            return Some(MonitorUpdate::Visible(self.visible.clone()));
        }
        if let Err(e) = self.post_filter() {
            e.log();
        }
        None
    }

    /// 处理通道中所有已到达的响应
    pub fn pump(&mut self, responses: &Receiver<WorkerResponse>) -> Vec<MonitorUpdate> {
        responses
            .try_iter()
            .filter_map(|response| self.on_response(response))
            .collect()
    }
}
