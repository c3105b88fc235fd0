//! 快捷键路由测试

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use termplex_lib::config::ShortcutBinding;
    use termplex_lib::keyboard::{
        KeyBindings, KeyCode, KeyEvent, Modifiers, RouteOutcome, TerminalAction, TerminalIntent,
        TerminalKeyboardRouter,
    };
    use termplex_lib::mux::{SessionId, ShellKind, TerminalSessionStore};

    fn setup(count: usize) -> (Arc<TerminalSessionStore>, TerminalKeyboardRouter, Vec<SessionId>) {
        let store = TerminalSessionStore::new_shared();
        let ids = (0..count)
            .map(|_| store.add_session(ShellKind::Bash))
            .collect();
        let router = TerminalKeyboardRouter::new(store.clone());
        (store, router, ids)
    }

    fn press(router: &mut TerminalKeyboardRouter, code: KeyCode, modifiers: Modifiers) -> (RouteOutcome, bool) {
        let mut event = KeyEvent::new(code, modifiers);
        let outcome = router.handle_key(&mut event);
        (outcome, event.default_prevented())
    }

    #[test]
    fn test_delete_without_selection_does_nothing() {
        let (store, mut router, _) = setup(2);
        let before = store.snapshot();

        let (outcome, prevented) = press(&mut router, KeyCode::Delete, Modifiers::NONE);
        assert_eq!(outcome, RouteOutcome::Unhandled);
        assert!(!prevented);
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_delete_removes_selected_and_clears_selection() {
        let (store, mut router, ids) = setup(3);
        assert!(router.select_session(Some(ids[1])));

        let (outcome, prevented) = press(&mut router, KeyCode::Delete, Modifiers::NONE);
        assert_eq!(outcome, RouteOutcome::Applied(TerminalAction::DeleteSelected));
        assert!(prevented);
        assert!(!store.contains(ids[1]));
        assert_eq!(router.selected_session_id(), None);

        // 选中已清除，再次按下 Delete 不再匹配
        let (outcome, _) = press(&mut router, KeyCode::Delete, Modifiers::NONE);
        assert_eq!(outcome, RouteOutcome::Unhandled);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_selection_of_removed_session_is_dropped() {
        let (store, mut router, ids) = setup(2);
        router.select_session(Some(ids[0]));
        store.remove_session(ids[0]);

        assert_eq!(router.selected_session_id(), None);
        let (outcome, _) = press(&mut router, KeyCode::Delete, Modifiers::NONE);
        assert_eq!(outcome, RouteOutcome::Unhandled);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_new_terminal_chord() {
        let (store, mut router, ids) = setup(1);
        let (outcome, prevented) = press(&mut router, KeyCode::Backquote, Modifiers::ctrl_shift());
        assert_eq!(outcome, RouteOutcome::Applied(TerminalAction::NewTerminal));
        assert!(prevented);
        assert_eq!(store.len(), 2);
        assert_eq!(store.sessions()[1].kind, ShellKind::PowerShell);
        assert_eq!(store.active_id(), Some(ids[0]));
    }

    #[test]
    fn test_new_window_does_not_add_session() {
        let (store, mut router, _) = setup(1);
        let (outcome, prevented) =
            press(&mut router, KeyCode::Backquote, Modifiers::ctrl_alt_shift());
        assert_eq!(outcome, RouteOutcome::Intent(TerminalIntent::NewWindow));
        assert!(prevented);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_split_terminal_intent() {
        let (store, mut router, _) = setup(1);
        let (outcome, prevented) = press(&mut router, KeyCode::Digit(5), Modifiers::ctrl_shift());
        assert_eq!(outcome, RouteOutcome::Intent(TerminalIntent::SplitTerminal));
        assert!(prevented);
        assert_eq!(store.len(), 1);

        // 额外按下 Alt 时不匹配
        let (outcome, _) = press(&mut router, KeyCode::Digit(5), Modifiers::ctrl_alt_shift());
        assert_eq!(outcome, RouteOutcome::Unhandled);
    }

    #[test]
    fn test_page_keys_cycle_active() {
        let (store, mut router, ids) = setup(3);

        let (outcome, _) = press(&mut router, KeyCode::PageDown, Modifiers::ctrl());
        assert_eq!(outcome, RouteOutcome::Applied(TerminalAction::NextTerminal));
        assert_eq!(store.active_id(), Some(ids[1]));

        press(&mut router, KeyCode::PageUp, Modifiers::ctrl());
        press(&mut router, KeyCode::PageUp, Modifiers::ctrl());
        assert_eq!(store.active_id(), Some(ids[2]));

        // Ctrl+Shift+PageDown 不是绑定的组合
        let (outcome, _) = press(&mut router, KeyCode::PageDown, Modifiers::ctrl_shift());
        assert_eq!(outcome, RouteOutcome::Unhandled);
    }

    #[test]
    fn test_cycle_with_single_session_is_prevented_noop() {
        let (store, mut router, ids) = setup(1);
        let (outcome, prevented) = press(&mut router, KeyCode::PageDown, Modifiers::ctrl());
        assert_eq!(outcome, RouteOutcome::NoOp(TerminalAction::NextTerminal));
        assert!(prevented);
        assert_eq!(store.active_id(), Some(ids[0]));
    }

    #[test]
    fn test_close_active() {
        let (store, mut router, ids) = setup(2);
        let (outcome, _) = press(&mut router, KeyCode::Letter('W'), Modifiers::ctrl_shift());
        assert_eq!(outcome, RouteOutcome::Applied(TerminalAction::CloseActive));
        assert_eq!(store.active_id(), Some(ids[1]));

        press(&mut router, KeyCode::Letter('W'), Modifiers::ctrl_shift());
        assert!(store.is_empty());

        let (outcome, prevented) = press(&mut router, KeyCode::Letter('W'), Modifiers::ctrl_shift());
        assert_eq!(outcome, RouteOutcome::NoOp(TerminalAction::CloseActive));
        assert!(prevented);
    }

    #[test]
    fn test_escape_closes_open_menu_only() {
        let (_store, mut router, _) = setup(0);
        let (outcome, prevented) = press(&mut router, KeyCode::Escape, Modifiers::NONE);
        assert_eq!(outcome, RouteOutcome::Unhandled);
        assert!(!prevented);

        router.toggle_action_menu();
        let (outcome, prevented) = press(&mut router, KeyCode::Escape, Modifiers::NONE);
        assert_eq!(outcome, RouteOutcome::Applied(TerminalAction::CloseActionMenu));
        assert!(!prevented);
        assert!(!router.is_action_menu_open());
    }

    #[test]
    fn test_unfocused_panel_ignores_chords() {
        let (store, mut router, _) = setup(2);
        router.set_focused(false);
        let (outcome, prevented) = press(&mut router, KeyCode::Letter('W'), Modifiers::ctrl_shift());
        assert_eq!(outcome, RouteOutcome::Unhandled);
        assert!(!prevented);
        assert_eq!(store.len(), 2);

        router.set_focused(true);
        press(&mut router, KeyCode::Letter('W'), Modifiers::ctrl_shift());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_rebound_chord_from_config() {
        let store = TerminalSessionStore::new_shared();
        let bindings = KeyBindings::from_config(&[ShortcutBinding {
            key: "t".to_string(),
            modifiers: vec!["ctrl".to_string(), "alt".to_string()],
            action: "new_terminal".to_string(),
        }])
        .unwrap();
        let mut router = TerminalKeyboardRouter::with_bindings(store.clone(), bindings, ShellKind::Cmd);

        let (outcome, _) = press(&mut router, KeyCode::Backquote, Modifiers::ctrl_shift());
        assert_eq!(outcome, RouteOutcome::Unhandled);

        let ctrl_alt = Modifiers {
            ctrl: true,
            alt: true,
            ..Modifiers::NONE
        };
        let (outcome, _) = press(&mut router, KeyCode::Letter('T'), ctrl_alt);
        assert_eq!(outcome, RouteOutcome::Applied(TerminalAction::NewTerminal));
        assert_eq!(store.sessions()[0].kind, ShellKind::Cmd);
    }
}
