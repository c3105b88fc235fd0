//! 终端会话核心数据类型定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// 生成新的随机会话ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for SessionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Shell 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShellKind {
    #[default]
    PowerShell,
    Cmd,
    Bash,
    /// 通用终端
    #[serde(alias = "generic")]
    Terminal,
}

impl ShellKind {
    /// 类型对应的显示名称
    pub fn label(&self) -> &'static str {
        match self {
            ShellKind::PowerShell => "PowerShell",
            ShellKind::Cmd => "Command Prompt",
            ShellKind::Bash => "Bash",
            ShellKind::Terminal => "Terminal",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShellKind::PowerShell => "powershell",
            ShellKind::Cmd => "cmd",
            ShellKind::Bash => "bash",
            ShellKind::Terminal => "terminal",
        }
    }
}

impl std::fmt::Display for ShellKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ShellKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "powershell" | "pwsh" => Ok(ShellKind::PowerShell),
            "cmd" => Ok(ShellKind::Cmd),
            "bash" => Ok(ShellKind::Bash),
            "terminal" | "generic" => Ok(ShellKind::Terminal),
            _ => Err(format!("未知的Shell类型: {}", s)),
        }
    }
}

/// 终端会话
///
/// `pid` 和 `process_name` 在后端报告进程启动之前为空。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    #[serde(rename = "type")]
    pub kind: ShellKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(kind: ShellKind) -> Self {
        Self {
            id: SessionId::new(),
            kind,
            name: None,
            pid: None,
            process_name: None,
            created_at: Utc::now(),
        }
    }

    /// 显示名称：优先使用用户命名，否则使用类型名称
    pub fn display_label(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => self.kind.label(),
        }
    }

    /// 标签页悬停提示，仅在进程信息完整时提供
    pub fn process_tooltip(&self) -> Option<String> {
        match (self.pid, self.process_name.as_deref()) {
            (Some(pid), Some(process)) => Some(format!("PID: {}, Process: {}", pid, process)),
            _ => None,
        }
    }
}

/// 会话局部更新，字段为 `None` 时保持原值
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub pid: Option<u32>,
    #[serde(default)]
    pub process_name: Option<String>,
}

impl SessionPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.pid.is_none() && self.process_name.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleDirection {
    Forward,
    Backward,
}

/// 会话存储通知事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SessionNotification {
    /// 会话已添加
    #[serde(rename_all = "camelCase")]
    SessionAdded { session_id: SessionId },
    /// 会话已移除
    #[serde(rename_all = "camelCase")]
    SessionRemoved { session_id: SessionId },
    /// 会话字段已更新（名称、进程信息）
    #[serde(rename_all = "camelCase")]
    SessionUpdated { session_id: SessionId },
    /// 活动会话已变化
    #[serde(rename_all = "camelCase")]
    ActiveChanged {
        previous: Option<SessionId>,
        current: Option<SessionId>,
    },
}

/// 某一时刻已提交的存储状态
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionsSnapshot {
    pub sessions: Vec<Session>,
    pub active_id: Option<SessionId>,
}

impl SessionsSnapshot {
    pub fn active_session(&self) -> Option<&Session> {
        let active_id = self.active_id?;
        self.sessions.iter().find(|s| s.id == active_id)
    }
}
