// 工具模块

pub mod error;

pub mod logging;

pub use error::{app_error, app_error_with_context, AppError, AppResult, ErrorSeverity};
pub use logging::init_logging;
