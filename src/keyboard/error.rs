//! 快捷键绑定错误类型

use thiserror::Error;

use crate::utils::ErrorSeverity;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BindingError {
    #[error("未知的快捷键动作: {action}")]
    UnknownAction { action: String },

    #[error("无效的按键: {key}")]
    InvalidKey { key: String },

    #[error("无效的修饰键: {modifier}")]
    InvalidModifier { modifier: String },

    /// 同一组合绑定了多个动作
    #[error("快捷键冲突: {chord} 同时绑定到 {}", actions.join(", "))]
    Conflict { chord: String, actions: Vec<String> },
}

impl BindingError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Conflict { .. } => ErrorSeverity::Medium,
            _ => ErrorSeverity::Low,
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            Self::UnknownAction { .. } => "unknown_action",
            Self::InvalidKey { .. } | Self::InvalidModifier { .. } => "invalid_chord",
            Self::Conflict { .. } => "conflict",
        }
    }
}

pub type BindingResult<T> = Result<T, BindingError>;
