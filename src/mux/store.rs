//! TerminalSessionStore - 终端会话状态存储
//!
//! 会话列表与活动会话指针的唯一数据源，标签栏、侧边栏和操作菜单都从这里读取。
//! 所有变更在提交之后同步通知订阅者，订阅者看到的总是完整提交后的快照。

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, error, instrument, trace};

use crate::mux::{
    CycleDirection, Session, SessionId, SessionNotification, SessionPatch, SessionsSnapshot,
    ShellKind,
};

/// 订阅者回调函数类型，返回 `false` 表示取消订阅
pub type SessionSubscriber =
    Arc<dyn Fn(&SessionNotification, &SessionsSnapshot) -> bool + Send + Sync>;

#[derive(Debug, Default)]
struct StoreState {
    sessions: Vec<Session>,
    active_id: Option<SessionId>,
}

impl StoreState {
    fn index_of(&self, id: SessionId) -> Option<usize> {
        self.sessions.iter().position(|s| s.id == id)
    }

    fn snapshot(&self) -> SessionsSnapshot {
        SessionsSnapshot {
            sessions: self.sessions.clone(),
            active_id: self.active_id,
        }
    }
}

/// 终端会话存储
pub struct TerminalSessionStore {
    state: RwLock<StoreState>,
    subscribers: RwLock<HashMap<usize, SessionSubscriber>>,
    next_subscriber_id: AtomicUsize,
}

impl TerminalSessionStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            subscribers: RwLock::new(HashMap::new()),
            next_subscriber_id: AtomicUsize::new(1),
        }
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    // === 会话变更 ===

    /// 追加新会话
    ///
    /// 只有在此前没有任何会话时，新会话才成为活动会话。
    #[instrument(skip(self))]
    pub fn add_session(&self, kind: ShellKind) -> SessionId {
        let session = Session::new(kind);
        let session_id = session.id;

        let (notifications, snapshot) = {
            let mut state = self.state.write();
            let was_empty = state.sessions.is_empty();
            state.sessions.push(session);

            let mut notifications = vec![SessionNotification::SessionAdded { session_id }];
            if was_empty {
                let previous = state.active_id.replace(session_id);
                notifications.push(SessionNotification::ActiveChanged {
                    previous,
                    current: Some(session_id),
                });
            }

            debug!(
                "添加会话: session_id={}, total_sessions={}",
                session_id,
                state.sessions.len()
            );
            (notifications, state.snapshot())
        };

        self.notify_all(&notifications, &snapshot);
        session_id
    }

    /// 移除会话
    ///
    /// 移除活动会话时，新的活动会话为占据原位置的会话，原会话在末尾时取新的末尾；
    /// 列表为空时活动指针清空。
    #[instrument(skip(self))]
    pub fn remove_session(&self, session_id: SessionId) -> bool {
        let (notifications, snapshot) = {
            let mut state = self.state.write();
            let Some(index) = state.index_of(session_id) else {
                debug!("会话不存在，忽略移除: session_id={}", session_id);
                return false;
            };

            state.sessions.remove(index);
            let mut notifications = vec![SessionNotification::SessionRemoved { session_id }];

            if state.active_id == Some(session_id) {
                let next_active = if state.sessions.is_empty() {
                    None
                } else {
                    let next_index = index.min(state.sessions.len() - 1);
                    Some(state.sessions[next_index].id)
                };
                state.active_id = next_active;
                notifications.push(SessionNotification::ActiveChanged {
                    previous: Some(session_id),
                    current: next_active,
                });
                debug!("活动会话被移除，重新选择: next_active={:?}", next_active);
            }

            debug!(
                "移除会话成功: session_id={}, remaining_sessions={}",
                session_id,
                state.sessions.len()
            );
            (notifications, state.snapshot())
        };

        self.notify_all(&notifications, &snapshot);
        true
    }

    /// 设置活动会话，未知ID被忽略
    pub fn set_active(&self, session_id: SessionId) -> bool {
        let (notifications, snapshot) = {
            let mut state = self.state.write();
            if state.index_of(session_id).is_none() {
                debug!("会话不存在，忽略激活: session_id={}", session_id);
                return false;
            }
            if state.active_id == Some(session_id) {
                return true;
            }

            let previous = state.active_id.replace(session_id);
            (
                vec![SessionNotification::ActiveChanged {
                    previous,
                    current: Some(session_id),
                }],
                state.snapshot(),
            )
        };

        self.notify_all(&notifications, &snapshot);
        true
    }

    /// 按列表顺序循环切换活动会话
    ///
    /// 少于两个会话或没有活动会话时不做任何事。
    pub fn cycle_active(&self, direction: CycleDirection) -> Option<SessionId> {
        let (next_id, notifications, snapshot) = {
            let mut state = self.state.write();
            let len = state.sessions.len();
            if len < 2 {
                return None;
            }
            let current_index = state.index_of(state.active_id?)?;

            let next_index = match direction {
                CycleDirection::Forward => (current_index + 1) % len,
                CycleDirection::Backward => (current_index + len - 1) % len,
            };
            let next_id = state.sessions[next_index].id;
            let previous = state.active_id.replace(next_id);

            trace!("切换活动会话: {} -> {}", current_index, next_index);
            (
                next_id,
                vec![SessionNotification::ActiveChanged {
                    previous,
                    current: Some(next_id),
                }],
                state.snapshot(),
            )
        };

        self.notify_all(&notifications, &snapshot);
        Some(next_id)
    }

    /// 重命名会话，空名称表示恢复默认显示名称
    pub fn rename_session(&self, session_id: SessionId, name: impl Into<String>) -> bool {
        let name = name.into();
        self.mutate_session(session_id, |session| {
            session.name = if name.trim().is_empty() {
                None
            } else {
                Some(name)
            };
        })
    }

    /// 局部更新会话字段
    pub fn update_session(&self, session_id: SessionId, patch: SessionPatch) -> bool {
        if patch.is_empty() {
            return self.contains(session_id);
        }
        self.mutate_session(session_id, |session| {
            if let Some(name) = patch.name {
                session.name = Some(name);
            }
            if let Some(pid) = patch.pid {
                session.pid = Some(pid);
            }
            if let Some(process_name) = patch.process_name {
                session.process_name = Some(process_name);
            }
        })
    }

    /// 合并后端报告的进程信息，不改变列表顺序和活动会话
    #[instrument(skip(self, process_name))]
    pub fn attach_process(
        &self,
        session_id: SessionId,
        pid: u32,
        process_name: impl Into<String>,
    ) -> bool {
        let process_name = process_name.into();
        self.mutate_session(session_id, |session| {
            session.pid = Some(pid);
            session.process_name = Some(process_name);
        })
    }

    fn mutate_session<F>(&self, session_id: SessionId, mutate: F) -> bool
    where
        F: FnOnce(&mut Session),
    {
        let snapshot = {
            let mut state = self.state.write();
            let Some(index) = state.index_of(session_id) else {
                debug!("会话不存在，忽略更新: session_id={}", session_id);
                return false;
            };
            mutate(&mut state.sessions[index]);
            state.snapshot()
        };

        self.notify_all(
            &[SessionNotification::SessionUpdated { session_id }],
            &snapshot,
        );
        true
    }

    // === 查询 ===

    pub fn sessions(&self) -> Vec<Session> {
        self.state.read().sessions.clone()
    }

    pub fn snapshot(&self) -> SessionsSnapshot {
        self.state.read().snapshot()
    }

    pub fn get(&self, session_id: SessionId) -> Option<Session> {
        let state = self.state.read();
        state.sessions.iter().find(|s| s.id == session_id).cloned()
    }

    pub fn contains(&self, session_id: SessionId) -> bool {
        self.state.read().index_of(session_id).is_some()
    }

    pub fn active_id(&self) -> Option<SessionId> {
        self.state.read().active_id
    }

    pub fn active_session(&self) -> Option<Session> {
        let state = self.state.read();
        let active_id = state.active_id?;
        state.sessions.iter().find(|s| s.id == active_id).cloned()
    }

    /// 按用户命名查找会话（如专用的 "Python" 终端）
    pub fn find_by_name(&self, name: &str) -> Option<Session> {
        let state = self.state.read();
        state
            .sessions
            .iter()
            .find(|s| s.name.as_deref() == Some(name))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.state.read().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().sessions.is_empty()
    }

    /// 会话显示名称
    pub fn display_label(&self, session: &Session) -> String {
        session.display_label().to_string()
    }

    // === 通知系统 ===

    /// 订阅会话变更通知
    pub fn subscribe<F>(&self, subscriber: F) -> usize
    where
        F: Fn(&SessionNotification, &SessionsSnapshot) -> bool + Send + Sync + 'static,
    {
        let subscriber_id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers
            .write()
            .insert(subscriber_id, Arc::new(subscriber));
        debug!("添加订阅者: {}", subscriber_id);
        subscriber_id
    }

    /// 取消订阅
    pub fn unsubscribe(&self, subscriber_id: usize) -> bool {
        let removed = self.subscribers.write().remove(&subscriber_id).is_some();
        if removed {
            debug!("移除订阅者: {}", subscriber_id);
        }
        removed
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    fn notify_all(&self, notifications: &[SessionNotification], snapshot: &SessionsSnapshot) {
        // 先复制订阅者列表再回调，回调中可以安全地读取存储或(取消)订阅
        let subscribers: Vec<(usize, SessionSubscriber)> = self
            .subscribers
            .read()
            .iter()
            .map(|(id, callback)| (*id, Arc::clone(callback)))
            .collect();

        let mut dead_subscribers = Vec::new();
        for (subscriber_id, callback) in subscribers {
            for notification in notifications {
                match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    callback(notification, snapshot)
                })) {
                    Ok(true) => {
                        trace!("订阅者 {} 处理通知成功", subscriber_id);
                    }
                    Ok(false) => {
                        debug!("订阅者 {} 请求取消订阅", subscriber_id);
                        dead_subscribers.push(subscriber_id);
                        break;
                    }
                    Err(_) => {
                        error!("订阅者 {} 回调panic", subscriber_id);
                        dead_subscribers.push(subscriber_id);
                        break;
                    }
                }
            }
        }

        if !dead_subscribers.is_empty() {
            let mut subscribers = self.subscribers.write();
            for subscriber_id in dead_subscribers {
                subscribers.remove(&subscriber_id);
                debug!("清理无效订阅者: {}", subscriber_id);
            }
        }
    }
}

impl Default for TerminalSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TerminalSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("TerminalSessionStore")
            .field("session_count", &state.sessions.len())
            .field("active_id", &state.active_id)
            .field("subscriber_count", &self.subscribers.read().len())
            .finish()
    }
}
