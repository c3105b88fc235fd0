/*!
 * 终端面板
 *
 * 无界面的面板层：把输入事件分发给会话存储、键盘路由和端口监控器，
 * 并生成供渲染层使用的输出事件。会话列表变化通过存储订阅感知，
 * 每次输入处理完成后最多输出一次 `Sessions` 事件。
 */

pub mod driver;
pub mod events;

pub use driver::DriverOptions;
pub use events::{PanelEvent, PanelInput, SessionRow};

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::config::PanelConfig;
use crate::keyboard::{RouteOutcome, TerminalKeyboardRouter};
use crate::mux::{SessionId, ShellKind, TerminalSessionStore};
use crate::ports::{
    DiffWorker, MonitorUpdate, PortMonitor, PortSortKey, ResponsePayload, WorkerError,
    WorkerResponse,
};

pub struct TerminalPanel {
    store: Arc<TerminalSessionStore>,
    router: TerminalKeyboardRouter,
    monitor: PortMonitor,
    default_shell: ShellKind,
    sessions_dirty: Arc<AtomicBool>,
    subscriber_id: usize,
}

impl TerminalPanel {
    pub fn new(config: &PanelConfig, worker: DiffWorker) -> Self {
        Self::with_store(config, worker, TerminalSessionStore::new_shared())
    }

    /// 使用已有的会话存储创建面板
    pub fn with_store(
        config: &PanelConfig,
        worker: DiffWorker,
        store: Arc<TerminalSessionStore>,
    ) -> Self {
        let sessions_dirty = Arc::new(AtomicBool::new(false));
        let dirty = sessions_dirty.clone();
        let subscriber_id = store.subscribe(move |_, _| {
            dirty.store(true, Ordering::Release);
            true
        });

        let router = TerminalKeyboardRouter::with_bindings(
            store.clone(),
            config.key_bindings(),
            config.terminal.default_shell,
        );
        let monitor = PortMonitor::new(
            worker,
            config.ports.default_sort,
            config.ports.min_refresh_interval(),
        );

        Self {
            store,
            router,
            monitor,
            default_shell: config.terminal.default_shell,
            sessions_dirty,
            subscriber_id,
        }
    }

    pub fn store(&self) -> &Arc<TerminalSessionStore> {
        &self.store
    }

    pub fn router(&self) -> &TerminalKeyboardRouter {
        &self.router
    }

    pub fn monitor(&self) -> &PortMonitor {
        &self.monitor
    }

    pub fn handle(&mut self, input: PanelInput) -> Vec<PanelEvent> {
        self.handle_at(input, Instant::now())
    }

    /// 处理一个输入事件，`now` 用于端口刷新的节流
    pub fn handle_at(&mut self, input: PanelInput, now: Instant) -> Vec<PanelEvent> {
        let selection_before = self.router.selected_session_id();
        let menu_before = self.router.is_action_menu_open();

        let mut events = self.dispatch(input, now);

        let selection_after = self.router.selected_session_id();
        if selection_after != selection_before {
            events.push(PanelEvent::Selection {
                session_id: selection_after,
            });
        }
        let menu_after = self.router.is_action_menu_open();
        if menu_after != menu_before {
            events.push(PanelEvent::ActionMenu { open: menu_after });
        }
        if self.sessions_dirty.swap(false, Ordering::AcqRel) {
            events.push(self.sessions_event());
        }
        events
    }

    fn dispatch(&mut self, input: PanelInput, now: Instant) -> Vec<PanelEvent> {
        match input {
            PanelInput::Key(mut event) => {
                let code = event.code.dom_code();
                match self.router.handle_key(&mut event) {
                    RouteOutcome::Unhandled => vec![PanelEvent::KeyUnhandled { code }],
                    RouteOutcome::NoOp(action) => vec![PanelEvent::KeyHandled {
                        action,
                        applied: false,
                        default_prevented: event.default_prevented(),
                    }],
                    RouteOutcome::Applied(action) => vec![PanelEvent::KeyHandled {
                        action,
                        applied: true,
                        default_prevented: event.default_prevented(),
                    }],
                    RouteOutcome::Intent(intent) => vec![PanelEvent::Intent { intent }],
                }
            }
            PanelInput::Click { inside_action_menu } => {
                self.router.handle_click(inside_action_menu);
                Vec::new()
            }
            PanelInput::Select { session_id } => {
                if !self.router.select_session(session_id) {
                    return vec![unknown_session(session_id)];
                }
                Vec::new()
            }
            PanelInput::ToggleActionMenu => {
                self.router.toggle_action_menu();
                Vec::new()
            }
            PanelInput::Focus { focused } => {
                self.router.set_focused(focused);
                Vec::new()
            }
            PanelInput::AddSession { shell } => {
                self.store.add_session(shell.unwrap_or(self.default_shell));
                Vec::new()
            }
            PanelInput::RemoveSession { session_id } => {
                self.store.remove_session(session_id);
                Vec::new()
            }
            PanelInput::Activate { session_id } => {
                if !self.store.set_active(session_id) {
                    return vec![unknown_session(Some(session_id))];
                }
                Vec::new()
            }
            PanelInput::Rename { session_id, name } => {
                if !self.store.rename_session(session_id, name) {
                    return vec![unknown_session(Some(session_id))];
                }
                Vec::new()
            }
            PanelInput::ProcessSpawned {
                session_id,
                pid,
                process_name,
            } => {
                if !self.store.attach_process(session_id, pid, process_name) {
                    debug!("进程启动事件对应的会话已不存在: {}", session_id);
                }
                Vec::new()
            }
            PanelInput::PortsSnapshot { ports, force } => {
                worker_result(self.monitor.push_snapshot(ports, now, force))
            }
            PanelInput::SetFilter { filter } => worker_result(self.monitor.set_filter(filter)),
            PanelInput::SetSort { sort_by } => match PortSortKey::from_str(&sort_by) {
                Ok(sort_key) => worker_result(self.monitor.set_sort(sort_key)),
                Err(message) => vec![PanelEvent::Error { message }],
            },
            PanelInput::WorkerFrame { frame } => {
                worker_result(self.monitor.worker().post_frame(&frame))
            }
            PanelInput::ListSessions => vec![self.sessions_event()],
        }
    }

    /// 处理后台工作线程的响应
    ///
    /// 通过 `workerFrame` 投递的请求不经过端口监控器，响应直接转发。
    pub fn on_worker_response(&mut self, response: WorkerResponse) -> Vec<PanelEvent> {
        if response.external {
            return vec![external_reply(response)];
        }
        match self.monitor.on_response(response) {
            Some(MonitorUpdate::Changed { changes, visible }) => vec![PanelEvent::PortsChanged {
                added: changes.added,
                removed: changes.removed,
                changed: changes.changed,
                visible,
            }],
            Some(MonitorUpdate::Visible(ports)) => vec![PanelEvent::PortsVisible { ports }],
            Some(MonitorUpdate::Failed { operation, message }) => vec![PanelEvent::WorkerError {
                operation,
                message,
                retryable: false,
            }],
            None => Vec::new(),
        }
    }

    pub fn sessions_event(&self) -> PanelEvent {
        let snapshot = self.store.snapshot();
        PanelEvent::Sessions {
            sessions: snapshot
                .sessions
                .iter()
                .map(|session| SessionRow::from_session(session, snapshot.active_id))
                .collect(),
            active_id: snapshot.active_id,
        }
    }
}

impl Drop for TerminalPanel {
    fn drop(&mut self) {
        self.store.unsubscribe(self.subscriber_id);
    }
}

impl std::fmt::Debug for TerminalPanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalPanel")
            .field("sessions", &self.store.len())
            .field("router", &self.router)
            .field("monitor", &self.monitor)
            .finish()
    }
}

fn unknown_session(session_id: Option<SessionId>) -> PanelEvent {
    let message = match session_id {
        Some(id) => format!("会话不存在: {}", id),
        None => "会话不存在".to_string(),
    };
    PanelEvent::Error { message }
}

fn external_reply(response: WorkerResponse) -> PanelEvent {
    if let ResponsePayload::Error(fault) = response.payload {
        return PanelEvent::WorkerError {
            operation: response.operation,
            message: fault.message,
            retryable: false,
        };
    }
    match response.to_frame() {
        Ok(frame) => PanelEvent::WorkerReply { frame },
        Err(e) => {
            e.log();
            PanelEvent::WorkerError {
                operation: response.operation,
                message: e.to_string(),
                retryable: false,
            }
        }
    }
}

/// 投递结果只在失败时产生事件
fn worker_result<T>(result: Result<T, WorkerError>) -> Vec<PanelEvent> {
    match result {
        Ok(_) => Vec::new(),
        Err(e) => {
            e.log();
            vec![PanelEvent::WorkerError {
                operation: None,
                message: e.to_string(),
                retryable: e.is_retryable(),
            }]
        }
    }
}
