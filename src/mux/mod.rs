//! Terminal Mux - 终端会话多路复用核心
//!
//! 管理终端会话列表、活动会话指针和变更通知

pub mod store;
pub mod types;

pub use store::*;
pub use types::*;
