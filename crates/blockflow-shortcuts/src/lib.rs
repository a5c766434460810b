//! Blockflow Shortcuts
//!
//! Keyboard bindings for a block editor. A [`Keymap`] turns a [`KeyEvent`]
//! into a [`ShortcutAction`]; [`dispatch`] performs the action against a
//! [`Runtime`](blockflow_runtime::Runtime) for the focused block.
//!
//! | Combination           | Action                |
//! |-----------------------|-----------------------|
//! | `Cmd+Enter`           | Execute current block |
//! | `Cmd+Shift+Enter`     | Execute flow          |
//! | `Cmd+Shift+Backspace` | Delete current block  |
//! | `Cmd+/`               | Open settings         |
//! | `Alt+ArrowUp`         | Collapse block        |
//! | `Alt+ArrowDown`       | Expand block          |
//! | `Cmd+Shift+G`         | Add Generate block    |
//! | `Cmd+Shift+I`         | Add Input block       |

mod dispatch;
mod error;
mod keymap;

pub use dispatch::{DispatchOutcome, dispatch};
pub use error::ShortcutError;
pub use keymap::{KeyCombo, KeyEvent, Keymap, Shortcut, ShortcutAction};
