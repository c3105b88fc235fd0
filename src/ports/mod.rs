//! 列表监控模块
//!
//! 纯函数差异引擎、后台工作线程通道和端口面板监控器。

pub mod engine;
pub mod error;
pub mod monitor;
pub mod types;
pub mod worker;

pub use error::{WorkerError, WorkerResult};
pub use monitor::{MonitorUpdate, PortMonitor};
pub use types::{ListChanges, ListRecord, PortChanges, PortInfo, PortKey, PortSortKey};
pub use worker::{
    DiffWorker, Operation, ResponsePayload, Ticket, WireFrame, WorkerConfig, WorkerFault,
    WorkerRequest, WorkerResponse,
};
