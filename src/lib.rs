//! termplex 终端面板核心
//!
//! 提供无界面的终端面板逻辑。
//! 主要功能包括：
//! - 多终端会话管理（会话存储与活动会话切换）
//! - 全局快捷键路由
//! - 后台线程中的端口列表过滤、排序与差异比较

// 模块声明
pub mod config; // 面板配置模块
pub mod keyboard; // 快捷键路由模块
pub mod mux; // 终端会话存储模块
pub mod panel; // 面板输入输出模块
pub mod ports; // 列表差异引擎与后台工作线程
pub mod utils; // 工具和错误处理模块

pub use config::PanelConfig;
pub use keyboard::TerminalKeyboardRouter;
pub use mux::TerminalSessionStore;
pub use panel::TerminalPanel;
pub use ports::{DiffWorker, PortMonitor};
