//! 后台差异工作线程错误类型

use thiserror::Error;
use tracing::{error, warn};

use crate::utils::ErrorSeverity;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkerError {
    /// 任务队列已满，请求未被接受
    #[error("工作线程队列已满: {operation} (容量: {capacity})")]
    QueueFull { operation: String, capacity: usize },

    /// 工作线程已退出
    #[error("工作线程已断开")]
    Disconnected,

    #[error("工作线程启动失败: {message}")]
    Spawn { message: String },

    /// 线格式帧无法解析
    #[error("消息解析失败: {message}")]
    Decode { message: String },
}

impl WorkerError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::QueueFull { .. } => ErrorSeverity::Low,
            Self::Decode { .. } => ErrorSeverity::Low,
            Self::Disconnected => ErrorSeverity::High,
            Self::Spawn { .. } => ErrorSeverity::Critical,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::QueueFull { .. } => "queue_full",
            Self::Disconnected => "disconnected",
            Self::Spawn { .. } => "spawn",
            Self::Decode { .. } => "decode",
        }
    }

    /// 队列满时可以稍后重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::QueueFull { .. })
    }

    /// 记录错误日志
    pub fn log(&self) {
        match self.severity() {
            ErrorSeverity::Critical | ErrorSeverity::High => {
                error!(category = self.category(), "{}: {}", self.severity().as_str(), self)
            }
            ErrorSeverity::Medium | ErrorSeverity::Low => {
                warn!(category = self.category(), "{}: {}", self.severity().as_str(), self)
            }
        }
    }
}

impl From<serde_json::Error> for WorkerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode {
            message: err.to_string(),
        }
    }
}

pub type WorkerResult<T> = Result<T, WorkerError>;
