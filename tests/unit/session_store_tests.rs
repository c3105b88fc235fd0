//! 会话存储测试
//!
//! 覆盖活动会话规则、移除后的重新选择、循环切换和订阅通知。

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use termplex_lib::mux::{
        CycleDirection, SessionId, SessionNotification, SessionPatch, ShellKind,
        TerminalSessionStore,
    };

    fn store_with(kinds: &[ShellKind]) -> (TerminalSessionStore, Vec<SessionId>) {
        let store = TerminalSessionStore::new();
        let ids = kinds.iter().map(|kind| store.add_session(*kind)).collect();
        (store, ids)
    }

    #[test]
    fn test_first_session_becomes_active() {
        let store = TerminalSessionStore::new();
        assert_eq!(store.active_id(), None);

        let first = store.add_session(ShellKind::PowerShell);
        assert_eq!(store.active_id(), Some(first));

        for kind in [ShellKind::Cmd, ShellKind::Bash, ShellKind::Terminal] {
            store.add_session(kind);
            assert_eq!(store.active_id(), Some(first));
        }
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_sessions_are_appended_in_order() {
        let (store, ids) = store_with(&[ShellKind::Bash, ShellKind::Cmd, ShellKind::Bash]);
        let listed: Vec<SessionId> = store.sessions().iter().map(|s| s.id).collect();
        assert_eq!(listed, ids);
    }

    #[test]
    fn test_cycle_scenario_wraps() {
        let (store, ids) = store_with(&[ShellKind::PowerShell, ShellKind::Cmd]);
        let (a, b) = (ids[0], ids[1]);
        assert_eq!(store.active_id(), Some(a));

        assert_eq!(store.cycle_active(CycleDirection::Forward), Some(b));
        assert_eq!(store.active_id(), Some(b));
        assert_eq!(store.cycle_active(CycleDirection::Forward), Some(a));
        assert_eq!(store.active_id(), Some(a));

        assert_eq!(store.cycle_active(CycleDirection::Backward), Some(b));
    }

    #[test]
    fn test_cycle_n_times_returns_to_start() {
        let kinds = [
            ShellKind::PowerShell,
            ShellKind::Cmd,
            ShellKind::Bash,
            ShellKind::Terminal,
            ShellKind::Bash,
        ];
        let (store, ids) = store_with(&kinds);
        store.set_active(ids[2]);

        for direction in [CycleDirection::Forward, CycleDirection::Backward] {
            for _ in 0..ids.len() {
                store.cycle_active(direction);
            }
            assert_eq!(store.active_id(), Some(ids[2]));
        }
    }

    #[test]
    fn test_cycle_single_session_is_noop() {
        let (store, ids) = store_with(&[ShellKind::Bash]);
        assert_eq!(store.cycle_active(CycleDirection::Forward), None);
        assert_eq!(store.active_id(), Some(ids[0]));
    }

    #[test]
    fn test_remove_active_selects_same_index() {
        let (store, ids) = store_with(&[ShellKind::Bash, ShellKind::Cmd, ShellKind::Terminal]);
        store.set_active(ids[1]);

        assert!(store.remove_session(ids[1]));
        assert_eq!(store.active_id(), Some(ids[2]));

        assert!(store.remove_session(ids[2]));
        assert_eq!(store.active_id(), Some(ids[0]));

        assert!(store.remove_session(ids[0]));
        assert_eq!(store.active_id(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn test_remove_never_leaves_dangling_active() {
        for victim in 0..4 {
            for active in 0..4 {
                let (store, ids) = store_with(&[
                    ShellKind::Bash,
                    ShellKind::Cmd,
                    ShellKind::PowerShell,
                    ShellKind::Terminal,
                ]);
                store.set_active(ids[active]);
                store.remove_session(ids[victim]);

                let active_id = store.active_id().expect("sessions remain");
                assert!(store.contains(active_id));
                if victim != active {
                    assert_eq!(active_id, ids[active]);
                }
            }
        }
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let (store, ids) = store_with(&[ShellKind::Bash]);
        let stranger = SessionId::new();

        assert!(!store.remove_session(stranger));
        assert!(!store.set_active(stranger));
        assert!(!store.rename_session(stranger, "x"));
        assert!(!store.attach_process(stranger, 1, "bash"));
        assert_eq!(store.active_id(), Some(ids[0]));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_attach_process_preserves_order_and_active() {
        let (store, ids) = store_with(&[ShellKind::PowerShell, ShellKind::Cmd]);
        store.set_active(ids[1]);

        assert!(store.attach_process(ids[0], 4242, "pwsh.exe"));

        let sessions = store.sessions();
        assert_eq!(sessions[0].id, ids[0]);
        assert_eq!(sessions[0].pid, Some(4242));
        assert_eq!(sessions[0].process_name.as_deref(), Some("pwsh.exe"));
        assert_eq!(
            sessions[0].process_tooltip().as_deref(),
            Some("PID: 4242, Process: pwsh.exe")
        );
        assert_eq!(store.active_id(), Some(ids[1]));
    }

    #[test]
    fn test_display_labels() {
        let (store, ids) = store_with(&[
            ShellKind::PowerShell,
            ShellKind::Cmd,
            ShellKind::Bash,
            ShellKind::Terminal,
        ]);
        let labels: Vec<String> = store
            .sessions()
            .iter()
            .map(|s| store.display_label(s))
            .collect();
        assert_eq!(labels, vec!["PowerShell", "Command Prompt", "Bash", "Terminal"]);

        store.rename_session(ids[2], "Python");
        let renamed = store.find_by_name("Python").expect("renamed session");
        assert_eq!(renamed.id, ids[2]);
        assert_eq!(store.display_label(&renamed), "Python");
    }

    #[test]
    fn test_update_session_patch() {
        let (store, ids) = store_with(&[ShellKind::Bash]);
        let patch = SessionPatch {
            name: Some("build".to_string()),
            pid: Some(7),
            process_name: None,
        };
        assert!(store.update_session(ids[0], patch));

        let session = store.get(ids[0]).unwrap();
        assert_eq!(session.name.as_deref(), Some("build"));
        assert_eq!(session.pid, Some(7));
        assert_eq!(session.process_name, None);
    }

    #[test]
    fn test_subscribers_see_committed_state() {
        let store = TerminalSessionStore::new_shared();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        store.subscribe(move |notification, snapshot| {
            if let SessionNotification::ActiveChanged { current, .. } = notification {
                // 通知发出时快照已包含新的活动会话
                assert_eq!(snapshot.active_id, *current);
            }
            seen_clone.lock().unwrap().push(notification.clone());
            true
        });

        let first = store.add_session(ShellKind::Bash);
        store.remove_session(first);

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                SessionNotification::SessionAdded { session_id: first },
                SessionNotification::ActiveChanged {
                    previous: None,
                    current: Some(first)
                },
                SessionNotification::SessionRemoved { session_id: first },
                SessionNotification::ActiveChanged {
                    previous: Some(first),
                    current: None
                },
            ]
        );
    }

    #[test]
    fn test_failing_subscribers_are_removed() {
        let store = TerminalSessionStore::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let calls_clone = calls.clone();
        store.subscribe(move |_, _| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            false
        });
        store.subscribe(|_, _| panic!("subscriber failure"));
        let keeper = store.subscribe(|_, _| true);
        assert_eq!(store.subscriber_count(), 3);

        store.add_session(ShellKind::Cmd);
        assert_eq!(store.subscriber_count(), 1);

        store.add_session(ShellKind::Cmd);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(store.unsubscribe(keeper));
        assert_eq!(store.subscriber_count(), 0);
    }
}
