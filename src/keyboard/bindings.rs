/*!
 * 快捷键绑定表
 *
 * 内置默认绑定，配置文件中的 `[[keybindings]]` 可以为动作重新指定组合。
 * 某个动作一旦在配置中出现，它的默认组合即被替换；同一动作可以绑定多个组合。
 * 无效或冲突的配置被整体拒绝，默认绑定继续生效。
 */

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

use super::actions::TerminalAction;
use super::chord::KeyChord;
use super::error::{BindingError, BindingResult};
use super::types::{KeyCode, KeyEvent, Modifiers};
use crate::config::ShortcutBinding;

/// 快捷键冲突
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingConflict {
    /// 冲突的组合
    pub chord: String,
    /// 绑定到该组合的动作
    pub actions: Vec<TerminalAction>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindings {
    bindings: Vec<(KeyChord, TerminalAction)>,
}

impl KeyBindings {
    /// 内置默认绑定
    pub fn defaults() -> Self {
        use TerminalAction::*;
        let bindings = vec![
            (KeyChord::new(KeyCode::Delete, Modifiers::NONE), DeleteSelected),
            (
                KeyChord::new(KeyCode::Backquote, Modifiers::ctrl_shift()),
                NewTerminal,
            ),
            (
                KeyChord::new(KeyCode::Digit(5), Modifiers::ctrl_shift()),
                SplitTerminal,
            ),
            (
                KeyChord::new(KeyCode::Backquote, Modifiers::ctrl_alt_shift()),
                NewWindow,
            ),
            (KeyChord::new(KeyCode::PageDown, Modifiers::ctrl()), NextTerminal),
            (KeyChord::new(KeyCode::PageUp, Modifiers::ctrl()), PreviousTerminal),
            (
                KeyChord::new(KeyCode::Letter('W'), Modifiers::ctrl_shift()),
                CloseActive,
            ),
            (KeyChord::new(KeyCode::Escape, Modifiers::NONE), CloseActionMenu),
        ];
        Self { bindings }
    }

    /// 在默认绑定上应用配置
    pub fn from_config(overrides: &[ShortcutBinding]) -> BindingResult<Self> {
        let mut rebound: HashMap<TerminalAction, Vec<KeyChord>> = HashMap::new();
        for binding in overrides {
            let action: TerminalAction = binding.action.parse()?;
            let chord = KeyChord::from_parts(&binding.key, &binding.modifiers)?;
            rebound.entry(action).or_default().push(chord);
        }

        let mut bindings: Vec<(KeyChord, TerminalAction)> = Self::defaults()
            .bindings
            .into_iter()
            .filter(|(_, action)| !rebound.contains_key(action))
            .collect();
        for action in TerminalAction::ALL {
            if let Some(chords) = rebound.remove(&action) {
                bindings.extend(chords.into_iter().map(|chord| (chord, action)));
            }
        }

        let resolved = Self { bindings };
        if let Some(conflict) = resolved.detect_conflicts().into_iter().next() {
            return Err(BindingError::Conflict {
                chord: conflict.chord,
                actions: conflict
                    .actions
                    .iter()
                    .map(|a| a.as_str().to_string())
                    .collect(),
            });
        }

        debug!("已应用 {} 条快捷键配置", overrides.len());
        Ok(resolved)
    }

    /// 应用配置，失败时记录警告并使用默认绑定
    pub fn resolve(overrides: &[ShortcutBinding]) -> Self {
        match Self::from_config(overrides) {
            Ok(bindings) => bindings,
            Err(e) => {
                warn!("快捷键配置无效，使用默认绑定: {}", e);
                Self::defaults()
            }
        }
    }

    /// 检测绑定到同一组合的不同动作
    pub fn detect_conflicts(&self) -> Vec<BindingConflict> {
        let mut chord_map: HashMap<&KeyChord, BTreeSet<TerminalAction>> = HashMap::new();
        for (chord, action) in &self.bindings {
            chord_map.entry(chord).or_default().insert(*action);
        }

        let mut conflicts: Vec<BindingConflict> = chord_map
            .into_iter()
            .filter(|(_, actions)| actions.len() > 1)
            .map(|(chord, actions)| BindingConflict {
                chord: chord.to_string(),
                actions: actions.into_iter().collect(),
            })
            .collect();
        conflicts.sort_by(|a, b| a.chord.cmp(&b.chord));
        conflicts
    }

    pub fn lookup(&self, event: &KeyEvent) -> Option<TerminalAction> {
        self.bindings
            .iter()
            .find(|(chord, _)| chord.matches(event))
            .map(|(_, action)| *action)
    }

    pub fn chords_for(&self, action: TerminalAction) -> Vec<&KeyChord> {
        self.bindings
            .iter()
            .filter(|(_, a)| *a == action)
            .map(|(chord, _)| chord)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(KeyChord, TerminalAction)> {
        self.bindings.iter()
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::defaults()
    }
}
