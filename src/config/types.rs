/*!
 * 终端面板配置类型定义
 *
 * 对应 TOML 配置文件的各个节，所有字段都有默认值，
 * 配置文件只需要写出需要修改的部分。
 */

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::mux::ShellKind;
use crate::ports::PortSortKey;

/// 面板配置根
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub terminal: TerminalConfig,
    pub ports: PortsConfig,
    pub worker: WorkerSection,
    /// 快捷键覆盖 (对应 TOML 中的 [[keybindings]])
    pub keybindings: Vec<ShortcutBinding>,
}

/// 终端配置 (对应 TOML 中的 [terminal] 节)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// 新建终端快捷键使用的 Shell 类型
    pub default_shell: ShellKind,
}

/// 端口面板配置 (对应 TOML 中的 [ports] 节)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortsConfig {
    /// 轮询间隔（毫秒）
    pub refresh_interval_ms: u64,
    /// 两次非强制刷新之间的最小间隔（毫秒）
    pub min_refresh_interval_ms: u64,
    pub default_sort: PortSortKey,
}

impl Default for PortsConfig {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 3000,
            min_refresh_interval_ms: 1000,
            default_sort: PortSortKey::Port,
        }
    }
}

impl PortsConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn min_refresh_interval(&self) -> Duration {
        Duration::from_millis(self.min_refresh_interval_ms)
    }
}

/// 后台工作线程配置 (对应 TOML 中的 [worker] 节)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerSection {
    /// 任务队列容量
    pub queue_capacity: usize,
}

impl Default for WorkerSection {
    fn default() -> Self {
        Self { queue_capacity: 64 }
    }
}

/// 快捷键绑定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortcutBinding {
    /// 按键
    pub key: String,

    /// 修饰键
    #[serde(default)]
    pub modifiers: Vec<String>,

    /// 动作名称
    pub action: String,
}
