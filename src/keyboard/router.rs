//! TerminalKeyboardRouter - 终端面板键盘路由
//!
//! 把全局快捷键映射到会话存储操作，并维护面板的瞬时界面状态：
//! 侧边栏中选中的会话和操作菜单的开关。只有面板获得焦点时才处理按键。

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument, trace};

use super::actions::TerminalAction;
use super::bindings::KeyBindings;
use super::types::KeyEvent;
use crate::mux::{CycleDirection, SessionId, ShellKind, TerminalSessionStore};

/// 只发出信号、由外部处理的意图
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminalIntent {
    SplitTerminal,
    NewWindow,
}

/// 按键路由结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// 没有匹配的快捷键，按键保留默认行为
    Unhandled,
    /// 匹配但前置条件不满足
    NoOp(TerminalAction),
    Applied(TerminalAction),
    Intent(TerminalIntent),
}

impl RouteOutcome {
    pub fn is_handled(&self) -> bool {
        !matches!(self, RouteOutcome::Unhandled)
    }
}

pub struct TerminalKeyboardRouter {
    store: Arc<TerminalSessionStore>,
    bindings: KeyBindings,
    default_shell: ShellKind,
    selected_session_id: Option<SessionId>,
    action_menu_open: bool,
    focused: bool,
}

impl TerminalKeyboardRouter {
    pub fn new(store: Arc<TerminalSessionStore>) -> Self {
        Self::with_bindings(store, KeyBindings::defaults(), ShellKind::default())
    }

    pub fn with_bindings(
        store: Arc<TerminalSessionStore>,
        bindings: KeyBindings,
        default_shell: ShellKind,
    ) -> Self {
        Self {
            store,
            bindings,
            default_shell,
            selected_session_id: None,
            action_menu_open: false,
            focused: true,
        }
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    /// 选中的会话，已被移除的会话视为未选中
    pub fn selected_session_id(&self) -> Option<SessionId> {
        self.selected_session_id
            .filter(|id| self.store.contains(*id))
    }

    pub fn is_action_menu_open(&self) -> bool {
        self.action_menu_open
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn set_focused(&mut self, focused: bool) {
        trace!("终端面板焦点: {}", focused);
        self.focused = focused;
    }

    /// 选中会话，未知会话被忽略
    pub fn select_session(&mut self, session_id: Option<SessionId>) -> bool {
        match session_id {
            Some(id) if !self.store.contains(id) => {
                debug!("选中的会话不存在: {}", id);
                false
            }
            _ => {
                self.selected_session_id = session_id;
                true
            }
        }
    }

    /// 切换操作菜单，返回新的状态
    pub fn toggle_action_menu(&mut self) -> bool {
        self.action_menu_open = !self.action_menu_open;
        self.action_menu_open
    }

    /// 处理点击，菜单外的点击关闭菜单，返回菜单状态是否改变
    pub fn handle_click(&mut self, inside_action_menu: bool) -> bool {
        if inside_action_menu || !self.action_menu_open {
            return false;
        }
        self.action_menu_open = false;
        true
    }

    /// 处理按键
    ///
    /// 匹配到的快捷键会调用 `prevent_default`（关闭菜单的 Escape 除外）。
    /// 没有选中会话时的 Delete 和菜单关闭时的 Escape 不算匹配。
    #[instrument(skip(self, event), fields(code = %event.code))]
    pub fn handle_key(&mut self, event: &mut KeyEvent) -> RouteOutcome {
        if !self.focused {
            return RouteOutcome::Unhandled;
        }
        let Some(action) = self.bindings.lookup(event) else {
            return RouteOutcome::Unhandled;
        };

        let selected = self.selected_session_id();
        match action {
            TerminalAction::DeleteSelected if selected.is_none() => {
                self.selected_session_id = None;
                return RouteOutcome::Unhandled;
            }
            TerminalAction::CloseActionMenu if !self.action_menu_open => {
                return RouteOutcome::Unhandled;
            }
            _ => {}
        }

        if action.prevents_default() {
            event.prevent_default();
        }
        debug!("执行快捷键动作: {}", action);
        self.execute(action, selected)
    }

    fn execute(&mut self, action: TerminalAction, selected: Option<SessionId>) -> RouteOutcome {
        let applied = match action {
            TerminalAction::DeleteSelected => {
                self.selected_session_id = None;
                selected.is_some_and(|id| self.store.remove_session(id))
            }
            TerminalAction::NewTerminal => {
                self.store.add_session(self.default_shell);
                true
            }
            TerminalAction::SplitTerminal => {
                return RouteOutcome::Intent(TerminalIntent::SplitTerminal)
            }
            TerminalAction::NewWindow => return RouteOutcome::Intent(TerminalIntent::NewWindow),
            TerminalAction::NextTerminal => self
                .store
                .cycle_active(CycleDirection::Forward)
                .is_some(),
            TerminalAction::PreviousTerminal => self
                .store
                .cycle_active(CycleDirection::Backward)
                .is_some(),
            TerminalAction::CloseActive => match self.store.active_id() {
                Some(active_id) => {
                    if self.selected_session_id == Some(active_id) {
                        self.selected_session_id = None;
                    }
                    self.store.remove_session(active_id)
                }
                None => false,
            },
            TerminalAction::CloseActionMenu => {
                self.action_menu_open = false;
                true
            }
        };

        if applied {
            RouteOutcome::Applied(action)
        } else {
            RouteOutcome::NoOp(action)
        }
    }
}

impl std::fmt::Debug for TerminalKeyboardRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalKeyboardRouter")
            .field("selected_session_id", &self.selected_session_id)
            .field("action_menu_open", &self.action_menu_open)
            .field("focused", &self.focused)
            .field("default_shell", &self.default_shell)
            .finish()
    }
}
