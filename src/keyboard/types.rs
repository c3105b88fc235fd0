/*!
 * 键盘事件类型
 *
 * `KeyCode` 使用与浏览器 `KeyboardEvent.code` 一致的物理按键名，
 * 配置文件中也可以使用更短的写法（如 "`"、"w"、"pagedown"）。
 */

use serde::{Deserialize, Serialize};

/// 物理按键
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum KeyCode {
    Delete,
    Escape,
    PageUp,
    PageDown,
    Backquote,
    /// 数字键 0-9
    Digit(u8),
    /// 字母键，大写存储
    Letter(char),
    Other(String),
}

impl KeyCode {
    /// 从 `KeyboardEvent.code` 解析，未识别的按键保留原名
    pub fn from_dom_code(code: &str) -> Self {
        match code {
            "Delete" => KeyCode::Delete,
            "Escape" => KeyCode::Escape,
            "PageUp" => KeyCode::PageUp,
            "PageDown" => KeyCode::PageDown,
            "Backquote" => KeyCode::Backquote,
            _ => {
                if let Some(digit) = code.strip_prefix("Digit").and_then(single_digit) {
                    return KeyCode::Digit(digit);
                }
                if let Some(letter) = code.strip_prefix("Key").and_then(single_letter) {
                    return KeyCode::Letter(letter);
                }
                KeyCode::Other(code.to_string())
            }
        }
    }

    pub fn dom_code(&self) -> String {
        match self {
            KeyCode::Delete => "Delete".to_string(),
            KeyCode::Escape => "Escape".to_string(),
            KeyCode::PageUp => "PageUp".to_string(),
            KeyCode::PageDown => "PageDown".to_string(),
            KeyCode::Backquote => "Backquote".to_string(),
            KeyCode::Digit(d) => format!("Digit{}", d),
            KeyCode::Letter(c) => format!("Key{}", c),
            KeyCode::Other(code) => code.clone(),
        }
    }

    /// 解析配置文件中的按键写法，大小写不敏感
    pub fn parse_token(token: &str) -> Option<Self> {
        let token = token.trim();
        if token == "`" {
            return Some(KeyCode::Backquote);
        }
        if let Some(digit) = single_digit(token) {
            return Some(KeyCode::Digit(digit));
        }
        if let Some(letter) = single_letter(token) {
            return Some(KeyCode::Letter(letter));
        }

        match token.to_lowercase().as_str() {
            "delete" | "del" => Some(KeyCode::Delete),
            "escape" | "esc" => Some(KeyCode::Escape),
            "pageup" => Some(KeyCode::PageUp),
            "pagedown" => Some(KeyCode::PageDown),
            "backquote" => Some(KeyCode::Backquote),
            _ => match KeyCode::from_dom_code(token) {
                KeyCode::Other(_) => None,
                code => Some(code),
            },
        }
    }

    /// 快捷键显示名
    pub fn label(&self) -> String {
        match self {
            KeyCode::Backquote => "`".to_string(),
            KeyCode::Digit(d) => d.to_string(),
            KeyCode::Letter(c) => c.to_string(),
            other => other.dom_code(),
        }
    }
}

fn single_digit(s: &str) -> Option<u8> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => c.to_digit(10).map(|d| d as u8),
        _ => None,
    }
}

fn single_letter(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphabetic() => Some(c.to_ascii_uppercase()),
        _ => None,
    }
}

impl From<String> for KeyCode {
    fn from(code: String) -> Self {
        KeyCode::from_dom_code(&code)
    }
}

impl From<KeyCode> for String {
    fn from(code: KeyCode) -> Self {
        code.dom_code()
    }
}

impl std::fmt::Display for KeyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// 修饰键状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        shift: false,
        alt: false,
        meta: false,
    };

    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::NONE
        }
    }

    pub fn ctrl_shift() -> Self {
        Self {
            ctrl: true,
            shift: true,
            ..Self::NONE
        }
    }

    pub fn ctrl_alt_shift() -> Self {
        Self {
            ctrl: true,
            shift: true,
            alt: true,
            ..Self::NONE
        }
    }

    /// 设置配置文件中的修饰键名，未识别时返回 `false`
    pub fn set_token(&mut self, token: &str) -> bool {
        match token.trim().to_lowercase().as_str() {
            "ctrl" | "control" => self.ctrl = true,
            "shift" => self.shift = true,
            "alt" | "option" => self.alt = true,
            "meta" | "cmd" | "command" | "super" => self.meta = true,
            _ => return false,
        }
        true
    }

    /// 固定顺序的显示名列表
    pub fn labels(&self) -> Vec<&'static str> {
        let mut labels = Vec::new();
        if self.ctrl {
            labels.push("Ctrl");
        }
        if self.alt {
            labels.push("Alt");
        }
        if self.shift {
            labels.push("Shift");
        }
        if self.meta {
            labels.push("Meta");
        }
        labels
    }
}

/// 键盘按下事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyEvent {
    pub code: KeyCode,
    #[serde(default)]
    pub ctrl_key: bool,
    #[serde(default)]
    pub shift_key: bool,
    #[serde(default)]
    pub alt_key: bool,
    #[serde(default)]
    pub meta_key: bool,
    #[serde(skip)]
    default_prevented: bool,
}

impl KeyEvent {
    pub fn new(code: KeyCode, modifiers: Modifiers) -> Self {
        Self {
            code,
            ctrl_key: modifiers.ctrl,
            shift_key: modifiers.shift,
            alt_key: modifiers.alt,
            meta_key: modifiers.meta,
            default_prevented: false,
        }
    }

    pub fn plain(code: KeyCode) -> Self {
        Self::new(code, Modifiers::NONE)
    }

    pub fn modifiers(&self) -> Modifiers {
        Modifiers {
            ctrl: self.ctrl_key,
            shift: self.shift_key,
            alt: self.alt_key,
            meta: self.meta_key,
        }
    }

    /// 阻止按键的默认行为
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}
