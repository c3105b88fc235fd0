/*!
 * 终端面板键盘模块
 *
 * 按键与修饰键类型、可配置的快捷键绑定表，以及把快捷键路由到
 * 会话存储的 `TerminalKeyboardRouter`。
 */

pub mod actions;
pub mod bindings;
pub mod chord;
pub mod error;
pub mod router;
pub mod types;

pub use actions::TerminalAction;
pub use bindings::{BindingConflict, KeyBindings};
pub use chord::KeyChord;
pub use error::{BindingError, BindingResult};
pub use router::{RouteOutcome, TerminalIntent, TerminalKeyboardRouter};
pub use types::{KeyCode, KeyEvent, Modifiers};
