/*!
 * 错误处理模块
 *
 * 基于 anyhow 的应用级错误处理，组件内部的错误枚举（如 `WorkerError`、
 * `BindingError`）在边界处统一转换为 `AppError`，通过 context 提供错误信息。
 */

use anyhow::anyhow;

/// 统一的应用程序结果类型
pub type AppResult<T> = anyhow::Result<T>;

/// 统一的应用程序错误类型
pub type AppError = anyhow::Error;

/// 创建简单的应用程序错误
pub fn app_error(msg: impl Into<String>) -> AppError {
    anyhow!(msg.into())
}

/// 创建带上下文的错误转换函数
///
/// 返回一个闭包，可以将任何实现了 Display + Debug + Send + Sync 的错误
/// 转换为带有指定上下文信息的 AppError。
pub fn app_error_with_context<T>(msg: &str) -> impl FnOnce(T) -> AppError + '_
where
    T: std::fmt::Display + std::fmt::Debug + Send + Sync + 'static,
{
    move |err| anyhow!("{}: {}", msg, err)
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}
