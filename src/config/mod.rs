/*!
 * 配置系统模块
 *
 * 基于 TOML 的面板配置：终端默认 Shell、端口面板刷新参数、
 * 后台工作线程队列容量和快捷键覆盖。
 */

pub mod loader;
pub mod types;

pub use loader::{find_config_file, load_config};
pub use types::*;
