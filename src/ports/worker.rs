//! 后台列表差异工作线程
//!
//! 接收带类型标签的请求，在独立线程中执行过滤/排序/差异比较，
//! 每个请求恰好产生一个响应，通过回调或通道异步送回。
//! 每种操作维护单调递增的代号，调用方据此丢弃过期响应。

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, trace, warn};

use super::engine;
use super::error::{WorkerError, WorkerResult};
use super::types::{PortChanges, PortInfo, PortSortKey};

/// 工作线程操作类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    FilterPorts,
    SortPorts,
    DetectChanges,
}

impl Operation {
    pub const ALL: [Operation; 3] = [
        Operation::FilterPorts,
        Operation::SortPorts,
        Operation::DetectChanges,
    ];

    pub fn request_tag(&self) -> &'static str {
        match self {
            Operation::FilterPorts => "FILTER_PORTS",
            Operation::SortPorts => "SORT_PORTS",
            Operation::DetectChanges => "DETECT_CHANGES",
        }
    }

    pub fn response_tag(&self) -> &'static str {
        match self {
            Operation::FilterPorts => "FILTERED_PORTS",
            Operation::SortPorts => "SORTED_PORTS",
            Operation::DetectChanges => "PORT_CHANGES",
        }
    }

    pub fn from_request_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.request_tag() == tag)
    }

    pub fn from_response_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.response_tag() == tag)
    }

    fn index(&self) -> usize {
        match self {
            Operation::FilterPorts => 0,
            Operation::SortPorts => 1,
            Operation::DetectChanges => 2,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.request_tag())
    }
}

/// 错误响应的标签
pub const ERROR_TAG: &str = "ERROR";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterPayload {
    pub ports: Vec<PortInfo>,
    #[serde(default)]
    pub filter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortPayload {
    pub ports: Vec<PortInfo>,
    pub sort_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectChangesPayload {
    pub old_ports: Vec<PortInfo>,
    pub new_ports: Vec<PortInfo>,
}

/// 工作线程请求，数据按值传入
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerRequest {
    FilterPorts(FilterPayload),
    SortPorts(SortPayload),
    DetectChanges(DetectChangesPayload),
}

impl WorkerRequest {
    pub fn filter(ports: Vec<PortInfo>, filter: impl Into<String>) -> Self {
        Self::FilterPorts(FilterPayload {
            ports,
            filter: Some(filter.into()),
        })
    }

    pub fn sort(ports: Vec<PortInfo>, sort_by: impl Into<String>) -> Self {
        Self::SortPorts(SortPayload {
            ports,
            sort_by: sort_by.into(),
        })
    }

    pub fn detect_changes(old_ports: Vec<PortInfo>, new_ports: Vec<PortInfo>) -> Self {
        Self::DetectChanges(DetectChangesPayload {
            old_ports,
            new_ports,
        })
    }

    pub fn operation(&self) -> Operation {
        match self {
            Self::FilterPorts(_) => Operation::FilterPorts,
            Self::SortPorts(_) => Operation::SortPorts,
            Self::DetectChanges(_) => Operation::DetectChanges,
        }
    }

    /// 在当前线程执行请求
    pub fn execute(&self) -> ResponsePayload {
        match self {
            Self::FilterPorts(payload) => ResponsePayload::FilteredPorts(engine::filter(
                &payload.ports,
                payload.filter.as_deref().unwrap_or_default(),
            )),
            Self::SortPorts(payload) => {
                let sorted = match PortSortKey::from_str(&payload.sort_by) {
                    Ok(sort_key) => engine::sort(&payload.ports, &sort_key),
                    Err(_) => {
                        trace!("未知排序字段 {}，保持原顺序", payload.sort_by);
                        payload.ports.clone()
                    }
                };
                ResponsePayload::SortedPorts(sorted)
            }
            Self::DetectChanges(payload) => ResponsePayload::PortChanges(engine::diff(
                &payload.old_ports,
                &payload.new_ports,
            )),
        }
    }

    pub fn to_frame(&self, generation: u64) -> WorkerResult<WireFrame> {
        let data = match self {
            Self::FilterPorts(payload) => serde_json::to_value(payload)?,
            Self::SortPorts(payload) => serde_json::to_value(payload)?,
            Self::DetectChanges(payload) => serde_json::to_value(payload)?,
        };
        Ok(WireFrame {
            kind: self.operation().request_tag().to_string(),
            data,
            generation: Some(generation),
        })
    }
}

/// 错误响应内容
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerFault {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_type: Option<String>,
}

impl WorkerFault {
    pub fn new(message: impl Into<String>, request_type: Option<&str>) -> Self {
        Self {
            message: message.into(),
            request_type: request_type.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePayload {
    FilteredPorts(Vec<PortInfo>),
    SortedPorts(Vec<PortInfo>),
    PortChanges(PortChanges),
    Error(WorkerFault),
}

impl ResponsePayload {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::FilteredPorts(_) => Operation::FilterPorts.response_tag(),
            Self::SortedPorts(_) => Operation::SortPorts.response_tag(),
            Self::PortChanges(_) => Operation::DetectChanges.response_tag(),
            Self::Error(_) => ERROR_TAG,
        }
    }
}

/// 工作线程响应
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerResponse {
    /// 无法识别的请求没有对应操作
    pub operation: Option<Operation>,
    pub generation: u64,
    pub payload: ResponsePayload,
    /// 来自 `post_frame` 的请求，代号由调用方提供，不参与过期判断
    pub external: bool,
}

impl WorkerResponse {
    pub fn is_error(&self) -> bool {
        matches!(self.payload, ResponsePayload::Error(_))
    }

    pub fn to_frame(&self) -> WorkerResult<WireFrame> {
        let data = match &self.payload {
            ResponsePayload::FilteredPorts(ports) | ResponsePayload::SortedPorts(ports) => {
                serde_json::to_value(ports)?
            }
            ResponsePayload::PortChanges(changes) => serde_json::to_value(changes)?,
            ResponsePayload::Error(fault) => serde_json::to_value(fault)?,
        };
        Ok(WireFrame {
            kind: self.payload.tag().to_string(),
            data,
            generation: Some(self.generation),
        })
    }

    pub fn from_frame(frame: WireFrame) -> WorkerResult<Self> {
        let generation = frame.generation.unwrap_or_default();
        if frame.kind == ERROR_TAG {
            let fault: WorkerFault = serde_json::from_value(frame.data)?;
            let operation = fault
                .request_type
                .as_deref()
                .and_then(Operation::from_request_tag);
            return Ok(Self {
                operation,
                generation,
                payload: ResponsePayload::Error(fault),
                external: false,
            });
        }

        let operation = Operation::from_response_tag(&frame.kind).ok_or_else(|| {
            WorkerError::Decode {
                message: format!("未知的响应类型: {}", frame.kind),
            }
        })?;
        let payload = match operation {
            Operation::FilterPorts => ResponsePayload::FilteredPorts(serde_json::from_value(frame.data)?),
            Operation::SortPorts => ResponsePayload::SortedPorts(serde_json::from_value(frame.data)?),
            Operation::DetectChanges => {
                ResponsePayload::PortChanges(serde_json::from_value(frame.data)?)
            }
        };
        Ok(Self {
            operation: Some(operation),
            generation,
            payload,
            external: false,
        })
    }
}

/// 线格式帧 `{ "type": ..., "data": ..., "generation": n }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireFrame {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<u64>,
}

impl WireFrame {
    pub fn from_json(json: &str) -> WorkerResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> WorkerResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// 解析请求帧，未知标签或无效数据返回错误内容
    pub fn decode_request(&self) -> Result<WorkerRequest, WorkerFault> {
        let operation = Operation::from_request_tag(&self.kind).ok_or_else(|| {
            WorkerFault::new(format!("未知的请求类型: {}", self.kind), Some(&self.kind))
        })?;

        let decode_error = |e: serde_json::Error| {
            WorkerFault::new(
                format!("请求数据无效: {}", e),
                Some(operation.request_tag()),
            )
        };
        let data = self.data.clone();
        match operation {
            Operation::FilterPorts => serde_json::from_value(data)
                .map(WorkerRequest::FilterPorts)
                .map_err(decode_error),
            Operation::SortPorts => serde_json::from_value(data)
                .map(WorkerRequest::SortPorts)
                .map_err(decode_error),
            Operation::DetectChanges => serde_json::from_value(data)
                .map(WorkerRequest::DetectChanges)
                .map_err(decode_error),
        }
    }
}

/// 已投递请求的凭据
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub operation: Operation,
    pub generation: u64,
}

/// 响应接收回调，在工作线程中调用
pub type ResponseSink = Box<dyn Fn(WorkerResponse) + Send + 'static>;

/// 工作线程配置
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// 任务队列容量
    pub queue_capacity: usize,
    /// 线程名称
    pub thread_name: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            thread_name: "diff-worker".to_string(),
        }
    }
}

enum WorkerTask {
    Run {
        generation: u64,
        request: WorkerRequest,
        external: bool,
    },
    Reject {
        generation: u64,
        fault: WorkerFault,
    },
    Shutdown,
}

impl std::fmt::Debug for WorkerTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerTask::Run {
                generation,
                request,
                external,
            } => f
                .debug_struct("Run")
                .field("operation", &request.operation())
                .field("generation", generation)
                .field("external", external)
                .finish(),
            WorkerTask::Reject { generation, fault } => f
                .debug_struct("Reject")
                .field("generation", generation)
                .field("message", &fault.message)
                .finish(),
            WorkerTask::Shutdown => f.debug_struct("Shutdown").finish(),
        }
    }
}

/// 后台差异工作线程句柄
///
/// 丢弃句柄时关闭线程。
pub struct DiffWorker {
    config: WorkerConfig,
    task_sender: Sender<WorkerTask>,
    /// 每种操作最近一次投递的代号
    generations: Arc<Mutex<[u64; 3]>>,
    worker_handle: Option<JoinHandle<()>>,
}

impl DiffWorker {
    /// 启动工作线程，响应通过回调送出
    pub fn with_sink<F>(config: WorkerConfig, sink: F) -> WorkerResult<Self>
    where
        F: Fn(WorkerResponse) + Send + 'static,
    {
        let capacity = config.queue_capacity.max(1);
        let (task_sender, task_receiver) = bounded(capacity);
        let sink: ResponseSink = Box::new(sink);

        let worker_handle = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || Self::worker_loop(task_receiver, sink))
            .map_err(|e| WorkerError::Spawn {
                message: e.to_string(),
            })?;

        debug!(
            "差异工作线程已启动: name={}, queue_capacity={}",
            config.thread_name, capacity
        );
        Ok(Self {
            config,
            task_sender,
            generations: Arc::new(Mutex::new([0; 3])),
            worker_handle: Some(worker_handle),
        })
    }

    /// 启动工作线程，响应通过通道送出
    pub fn spawn(config: WorkerConfig) -> WorkerResult<(Self, Receiver<WorkerResponse>)> {
        let (response_sender, response_receiver) = unbounded();
        let worker = Self::with_sink(config, move |response| {
            if response_sender.send(response).is_err() {
                trace!("响应接收端已关闭，丢弃响应");
            }
        })?;
        Ok((worker, response_receiver))
    }

    fn worker_loop(task_receiver: Receiver<WorkerTask>, sink: ResponseSink) {
        while let Ok(task) = task_receiver.recv() {
            trace!("工作线程收到任务: {:?}", task);
            let response = match task {
                WorkerTask::Run {
                    generation,
                    request,
                    external,
                } => {
                    let operation = request.operation();
                    let payload = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                        request.execute()
                    }))
                    .unwrap_or_else(|panic_info| {
                        let panic_msg = if let Some(s) = panic_info.downcast_ref::<String>() {
                            s.clone()
                        } else if let Some(s) = panic_info.downcast_ref::<&str>() {
                            s.to_string()
                        } else {
                            "未知panic".to_string()
                        };
                        error!("工作线程执行 {} 时panic: {}", operation, panic_msg);
                        ResponsePayload::Error(WorkerFault::new(
                            format!("panic: {}", panic_msg),
                            Some(operation.request_tag()),
                        ))
                    });
                    WorkerResponse {
                        operation: Some(operation),
                        generation,
                        payload,
                        external,
                    }
                }
                WorkerTask::Reject { generation, fault } => WorkerResponse {
                    operation: fault
                        .request_type
                        .as_deref()
                        .and_then(Operation::from_request_tag),
                    generation,
                    payload: ResponsePayload::Error(fault),
                    external: true,
                },
                WorkerTask::Shutdown => break,
            };
            sink(response);
        }
        debug!("差异工作线程退出");
    }

    /// 投递请求，不阻塞调用方
    pub fn post(&self, request: WorkerRequest) -> WorkerResult<Ticket> {
        let operation = request.operation();
        let mut generations = self.generations.lock();
        let generation = generations[operation.index()] + 1;

        self.try_enqueue(
            WorkerTask::Run {
                generation,
                request,
                external: false,
            },
            operation.request_tag(),
        )?;

        generations[operation.index()] = generation;
        trace!("投递请求: operation={}, generation={}", operation, generation);
        Ok(Ticket {
            operation,
            generation,
        })
    }

    /// 投递线格式请求帧
    ///
    /// 响应原样回显帧中的代号并标记为 `external`，不影响 `post` 的代号序列。
    /// 无法识别的请求不会被静默丢弃，而是得到一个 `ERROR` 响应。
    pub fn post_frame(&self, frame: &WireFrame) -> WorkerResult<Option<Ticket>> {
        let generation = frame.generation.unwrap_or_default();
        match frame.decode_request() {
            Ok(request) => {
                let operation = request.operation();
                self.try_enqueue(
                    WorkerTask::Run {
                        generation,
                        request,
                        external: true,
                    },
                    operation.request_tag(),
                )?;
                trace!("投递外部请求帧: operation={}, generation={}", operation, generation);
                Ok(Some(Ticket {
                    operation,
                    generation,
                }))
            }
            Err(fault) => {
                warn!("拒绝无效请求: {}", fault.message);
                self.try_enqueue(WorkerTask::Reject { generation, fault }, &frame.kind)?;
                Ok(None)
            }
        }
    }

    fn try_enqueue(&self, task: WorkerTask, label: &str) -> WorkerResult<()> {
        self.task_sender.try_send(task).map_err(|e| match e {
            TrySendError::Full(_) => WorkerError::QueueFull {
                operation: label.to_string(),
                capacity: self.config.queue_capacity,
            },
            TrySendError::Disconnected(_) => WorkerError::Disconnected,
        })
    }

    /// 最近一次投递的代号，尚未投递时为 0
    pub fn latest_generation(&self, operation: Operation) -> u64 {
        self.generations.lock()[operation.index()]
    }

    /// 响应是否属于该操作最近一次通过 `post` 投递的请求
    pub fn is_current(&self, response: &WorkerResponse) -> bool {
        if response.external {
            return false;
        }
        match response.operation {
            Some(operation) => response.generation == self.latest_generation(operation),
            None => true,
        }
    }

    pub fn pending_tasks(&self) -> usize {
        self.task_sender.len()
    }

    /// 关闭工作线程并等待退出
    pub fn shutdown(&mut self) {
        let Some(handle) = self.worker_handle.take() else {
            return;
        };
        if self.task_sender.send(WorkerTask::Shutdown).is_err() {
            debug!("工作线程已提前退出");
        }
        if handle.join().is_err() {
            error!("等待差异工作线程退出失败");
        }
    }
}

impl Drop for DiffWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for DiffWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiffWorker")
            .field("queue_capacity", &self.config.queue_capacity)
            .field("pending_tasks", &self.pending_tasks())
            .field("generations", &*self.generations.lock())
            .finish()
    }
}
