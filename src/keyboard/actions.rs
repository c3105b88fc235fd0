//! 终端面板快捷键动作

use serde::{Deserialize, Serialize};

use super::error::BindingError;

/// 可绑定到快捷键的终端动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalAction {
    /// 删除侧边栏中选中的会话
    DeleteSelected,
    NewTerminal,
    SplitTerminal,
    NewWindow,
    NextTerminal,
    PreviousTerminal,
    /// 关闭活动会话
    CloseActive,
    CloseActionMenu,
}

impl TerminalAction {
    pub const ALL: [TerminalAction; 8] = [
        TerminalAction::DeleteSelected,
        TerminalAction::NewTerminal,
        TerminalAction::SplitTerminal,
        TerminalAction::NewWindow,
        TerminalAction::NextTerminal,
        TerminalAction::PreviousTerminal,
        TerminalAction::CloseActive,
        TerminalAction::CloseActionMenu,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TerminalAction::DeleteSelected => "delete_selected",
            TerminalAction::NewTerminal => "new_terminal",
            TerminalAction::SplitTerminal => "split_terminal",
            TerminalAction::NewWindow => "new_window",
            TerminalAction::NextTerminal => "next_terminal",
            TerminalAction::PreviousTerminal => "previous_terminal",
            TerminalAction::CloseActive => "close_active",
            TerminalAction::CloseActionMenu => "close_action_menu",
        }
    }

    /// 匹配后是否阻止按键默认行为
    ///
    /// 关闭菜单的 Escape 保留默认行为，其余动作一律阻止。
    pub fn prevents_default(&self) -> bool {
        !matches!(self, TerminalAction::CloseActionMenu)
    }
}

impl std::fmt::Display for TerminalAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for TerminalAction {
    type Err = BindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == normalized)
            .ok_or_else(|| BindingError::UnknownAction {
                action: s.to_string(),
            })
    }
}
