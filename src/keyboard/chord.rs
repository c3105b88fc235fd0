//! 快捷键组合

use serde::{Deserialize, Serialize};

use super::error::{BindingError, BindingResult};
use super::types::{KeyCode, KeyEvent, Modifiers};

/// 按键加修饰键的组合，匹配时修饰键必须完全一致
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyChord {
    pub code: KeyCode,
    pub modifiers: Modifiers,
}

impl KeyChord {
    pub fn new(code: KeyCode, modifiers: Modifiers) -> Self {
        Self { code, modifiers }
    }

    /// 由配置中的按键与修饰键名构造
    pub fn from_parts(key: &str, modifiers: &[String]) -> BindingResult<Self> {
        let code = KeyCode::parse_token(key).ok_or_else(|| BindingError::InvalidKey {
            key: key.to_string(),
        })?;

        let mut parsed = Modifiers::default();
        for modifier in modifiers {
            if !parsed.set_token(modifier) {
                return Err(BindingError::InvalidModifier {
                    modifier: modifier.clone(),
                });
            }
        }
        Ok(Self::new(code, parsed))
    }

    /// 解析 "Ctrl+Shift+`" 形式的字符串
    pub fn parse(text: &str) -> BindingResult<Self> {
        let parts: Vec<&str> = text.split('+').map(str::trim).collect();
        let Some((key, modifiers)) = parts.split_last() else {
            return Err(BindingError::InvalidKey {
                key: text.to_string(),
            });
        };
        let modifiers: Vec<String> = modifiers.iter().map(|m| m.to_string()).collect();
        Self::from_parts(key, &modifiers)
    }

    pub fn matches(&self, event: &KeyEvent) -> bool {
        self.code == event.code && self.modifiers == event.modifiers()
    }
}

impl std::fmt::Display for KeyChord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts: Vec<String> = self
            .modifiers
            .labels()
            .into_iter()
            .map(str::to_string)
            .collect();
        parts.push(self.code.label());
        write!(f, "{}", parts.join("+"))
    }
}
