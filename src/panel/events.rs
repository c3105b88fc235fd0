//! 面板输入与输出事件
//!
//! 两者都以 JSON 行的形式在 stdin/stdout 上传输，`type` 字段区分事件种类。

use serde::{Deserialize, Serialize};

use crate::keyboard::{KeyEvent, TerminalAction, TerminalIntent};
use crate::mux::{Session, SessionId, ShellKind};
use crate::ports::{Operation, PortInfo, WireFrame};

/// 面板输入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PanelInput {
    /// 键盘按下
    Key(KeyEvent),
    #[serde(rename_all = "camelCase")]
    Click {
        #[serde(default)]
        inside_action_menu: bool,
    },
    #[serde(rename_all = "camelCase")]
    Select { session_id: Option<SessionId> },
    ToggleActionMenu,
    Focus { focused: bool },
    AddSession {
        #[serde(default)]
        shell: Option<ShellKind>,
    },
    #[serde(rename_all = "camelCase")]
    RemoveSession { session_id: SessionId },
    #[serde(rename_all = "camelCase")]
    Activate { session_id: SessionId },
    #[serde(rename_all = "camelCase")]
    Rename { session_id: SessionId, name: String },
    /// 后端报告进程已启动
    #[serde(rename_all = "camelCase")]
    ProcessSpawned {
        session_id: SessionId,
        pid: u32,
        process_name: String,
    },
    PortsSnapshot {
        ports: Vec<PortInfo>,
        #[serde(default)]
        force: bool,
    },
    SetFilter { filter: String },
    #[serde(rename_all = "camelCase")]
    SetSort { sort_by: String },
    /// 直接投递线格式请求
    WorkerFrame { frame: WireFrame },
    /// 请求当前会话列表
    ListSessions,
}

/// 会话列表中的一行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRow {
    pub id: SessionId,
    #[serde(rename = "type")]
    pub kind: ShellKind,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<String>,
    pub active: bool,
}

impl SessionRow {
    pub fn from_session(session: &Session, active_id: Option<SessionId>) -> Self {
        Self {
            id: session.id,
            kind: session.kind,
            label: session.display_label().to_string(),
            tooltip: session.process_tooltip(),
            active: active_id == Some(session.id),
        }
    }
}

/// 面板输出
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PanelEvent {
    #[serde(rename_all = "camelCase")]
    Sessions {
        sessions: Vec<SessionRow>,
        active_id: Option<SessionId>,
    },
    #[serde(rename_all = "camelCase")]
    KeyHandled {
        action: TerminalAction,
        applied: bool,
        default_prevented: bool,
    },
    KeyUnhandled { code: String },
    Intent { intent: TerminalIntent },
    ActionMenu { open: bool },
    #[serde(rename_all = "camelCase")]
    Selection { session_id: Option<SessionId> },
    PortsChanged {
        added: Vec<PortInfo>,
        removed: Vec<PortInfo>,
        changed: Vec<PortInfo>,
        #[serde(skip_serializing_if = "Option::is_none")]
        visible: Option<Vec<PortInfo>>,
    },
    PortsVisible { ports: Vec<PortInfo> },
    WorkerError {
        #[serde(skip_serializing_if = "Option::is_none")]
        operation: Option<Operation>,
        message: String,
        /// 请求未被接受，宿主可稍后重发
        #[serde(default)]
        retryable: bool,
    },
    /// 直接投递的线格式请求的响应，原样转发
    WorkerReply { frame: WireFrame },
    /// 到达轮询间隔，请宿主推送新的端口快照
    RefreshRequested,
    /// 输入无法处理
    Error { message: String },
}
