//! Key combinations and the default shortcut table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ShortcutError;

/// A key plus the modifiers that must be held.
///
/// `cmd` is satisfied by either Meta or Control. Modifiers not required by a
/// combination are ignored when matching.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyCombo {
  pub key: String,
  #[serde(default)]
  pub cmd: bool,
  #[serde(default)]
  pub shift: bool,
  #[serde(default)]
  pub alt: bool,
}

/// A key press as reported by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyEvent {
  pub key: String,
  pub meta: bool,
  pub ctrl: bool,
  pub shift: bool,
  pub alt: bool,
}

/// What a shortcut does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortcutAction {
  ExecuteBlock,
  ExecuteFlow,
  DeleteBlock,
  OpenSettings,
  CollapseBlock,
  ExpandBlock,
  AddGenerateBlock,
  AddInputBlock,
}

/// One entry of the shortcut table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortcut {
  pub combo: KeyCombo,
  pub action: ShortcutAction,
}

/// An ordered set of shortcuts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
  shortcuts: Vec<Shortcut>,
}

impl KeyCombo {
  pub fn new(key: impl Into<String>) -> Self {
    Self {
      key: key.into(),
      cmd: false,
      shift: false,
      alt: false,
    }
  }

  pub fn cmd(mut self) -> Self {
    self.cmd = true;
    self
  }

  pub fn shift(mut self) -> Self {
    self.shift = true;
    self
  }

  pub fn alt(mut self) -> Self {
    self.alt = true;
    self
  }

  /// True if `event` presses this key with every required modifier held.
  pub fn matches(&self, event: &KeyEvent) -> bool {
    event.key.eq_ignore_ascii_case(&self.key)
      && (!self.cmd || event.meta || event.ctrl)
      && (!self.shift || event.shift)
      && (!self.alt || event.alt)
  }

  /// Number of required modifiers.
  pub fn specificity(&self) -> usize {
    [self.cmd, self.shift, self.alt]
      .iter()
      .filter(|held| **held)
      .count()
  }
}

impl KeyEvent {
  pub fn new(key: impl Into<String>) -> Self {
    Self {
      key: key.into(),
      ..Default::default()
    }
  }
}

impl From<&KeyCombo> for KeyEvent {
  /// The press that produces `combo`, using Meta for `cmd`.
  fn from(combo: &KeyCombo) -> Self {
    Self {
      key: combo.key.clone(),
      meta: combo.cmd,
      ctrl: false,
      shift: combo.shift,
      alt: combo.alt,
    }
  }
}

impl fmt::Display for KeyCombo {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.cmd {
      f.write_str("Cmd+")?;
    }
    if self.shift {
      f.write_str("Shift+")?;
    }
    if self.alt {
      f.write_str("Alt+")?;
    }
    f.write_str(&key_label(&self.key))
  }
}

impl FromStr for KeyCombo {
  type Err = ShortcutError;

  /// Parse labels like `Cmd+Shift+Enter` or `alt+arrowup`.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let mut parts: Vec<&str> = s.split('+').map(str::trim).collect();
    // A trailing "+" is the plus key itself
    if s.ends_with("++") || s == "+" {
      parts.retain(|p| !p.is_empty());
      parts.push("+");
    }
    let key = match parts.pop() {
      Some(key) if !key.is_empty() => key,
      _ => return Err(ShortcutError::Empty),
    };

    let mut combo = KeyCombo::new(key);
    for modifier in parts {
      match modifier.to_ascii_lowercase().as_str() {
        "cmd" | "ctrl" | "meta" => combo.cmd = true,
        "shift" => combo.shift = true,
        "alt" | "option" => combo.alt = true,
        _ => {
          return Err(ShortcutError::UnknownModifier {
            combo: s.to_string(),
            modifier: modifier.to_string(),
          });
        }
      }
    }
    Ok(combo)
  }
}

/// Single characters are shown upper-case, named keys as given.
fn key_label(key: &str) -> String {
  let mut chars = key.chars();
  match (chars.next(), chars.next()) {
    (Some(c), None) => c.to_uppercase().collect(),
    _ if key.eq_ignore_ascii_case("enter") => "Enter".to_string(),
    _ => key.to_string(),
  }
}

impl ShortcutAction {
  pub fn description(&self) -> &'static str {
    match self {
      ShortcutAction::ExecuteBlock => "Execute current block",
      ShortcutAction::ExecuteFlow => "Execute flow",
      ShortcutAction::DeleteBlock => "Delete current block",
      ShortcutAction::OpenSettings => "Open settings for current block",
      ShortcutAction::CollapseBlock => "Collapse block",
      ShortcutAction::ExpandBlock => "Expand block",
      ShortcutAction::AddGenerateBlock => "Add Generate block",
      ShortcutAction::AddInputBlock => "Add Input block",
    }
  }

  /// Whether the action operates on the focused block.
  pub fn needs_focus(&self) -> bool {
    !matches!(
      self,
      ShortcutAction::ExecuteFlow
        | ShortcutAction::AddGenerateBlock
        | ShortcutAction::AddInputBlock
    )
  }
}

impl fmt::Display for ShortcutAction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.description())
  }
}

impl Default for Keymap {
  fn default() -> Self {
    use ShortcutAction::*;

    Self::new(vec![
      Shortcut::new(KeyCombo::new("Enter").cmd(), ExecuteBlock),
      Shortcut::new(KeyCombo::new("Enter").cmd().shift(), ExecuteFlow),
      Shortcut::new(KeyCombo::new("Backspace").cmd().shift(), DeleteBlock),
      Shortcut::new(KeyCombo::new("/").cmd(), OpenSettings),
      Shortcut::new(KeyCombo::new("ArrowUp").alt(), CollapseBlock),
      Shortcut::new(KeyCombo::new("ArrowDown").alt(), ExpandBlock),
      Shortcut::new(KeyCombo::new("g").cmd().shift(), AddGenerateBlock),
      Shortcut::new(KeyCombo::new("i").cmd().shift(), AddInputBlock),
    ])
  }
}

impl Shortcut {
  pub fn new(combo: KeyCombo, action: ShortcutAction) -> Self {
    Self { combo, action }
  }
}

impl Keymap {
  pub fn new(shortcuts: Vec<Shortcut>) -> Self {
    Self { shortcuts }
  }

  pub fn shortcuts(&self) -> &[Shortcut] {
    &self.shortcuts
  }

  /// The action bound to `event`.
  ///
  /// When several combinations match, the one requiring the most modifiers
  /// wins; ties go to the earlier entry.
  pub fn resolve(&self, event: &KeyEvent) -> Option<ShortcutAction> {
    self
      .shortcuts
      .iter()
      .filter(|s| s.combo.matches(event))
      .fold(None, |best: Option<&Shortcut>, candidate| match best {
        Some(current) if current.combo.specificity() >= candidate.combo.specificity() => {
          Some(current)
        }
        _ => Some(candidate),
      })
      .map(|s| s.action)
  }

  /// The combination bound to `action`, if any.
  pub fn binding(&self, action: ShortcutAction) -> Option<&KeyCombo> {
    self
      .shortcuts
      .iter()
      .find(|s| s.action == action)
      .map(|s| &s.combo)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn press(key: &str) -> KeyEvent {
    KeyEvent::new(key)
  }

  #[test]
  fn test_cmd_accepts_meta_or_ctrl() {
    let combo = KeyCombo::new("Enter").cmd();

    assert!(combo.matches(&KeyEvent {
      meta: true,
      ..press("Enter")
    }));
    assert!(combo.matches(&KeyEvent {
      ctrl: true,
      ..press("Enter")
    }));
    assert!(!combo.matches(&press("Enter")));
  }

  #[test]
  fn test_key_is_case_insensitive() {
    let combo = KeyCombo::new("g").cmd().shift();

    assert!(combo.matches(&KeyEvent {
      meta: true,
      shift: true,
      ..press("G")
    }));
  }

  #[test]
  fn test_extra_modifiers_do_not_block_match() {
    let combo = KeyCombo::new("ArrowUp").alt();

    assert!(combo.matches(&KeyEvent {
      alt: true,
      shift: true,
      ..press("ArrowUp")
    }));
  }

  #[test]
  fn test_most_specific_binding_wins() {
    let keymap = Keymap::default();
    let event = KeyEvent {
      meta: true,
      shift: true,
      ..press("Enter")
    };

    assert_eq!(keymap.resolve(&event), Some(ShortcutAction::ExecuteFlow));
    assert_eq!(
      keymap.resolve(&KeyEvent {
        ctrl: true,
        ..press("Enter")
      }),
      Some(ShortcutAction::ExecuteBlock)
    );
  }

  #[test]
  fn test_default_table() {
    let keymap = Keymap::default();
    let cases = [
      ("Cmd+Enter", ShortcutAction::ExecuteBlock),
      ("Cmd+Shift+Enter", ShortcutAction::ExecuteFlow),
      ("Cmd+Shift+Backspace", ShortcutAction::DeleteBlock),
      ("Cmd+/", ShortcutAction::OpenSettings),
      ("Alt+ArrowUp", ShortcutAction::CollapseBlock),
      ("Alt+ArrowDown", ShortcutAction::ExpandBlock),
      ("Cmd+Shift+G", ShortcutAction::AddGenerateBlock),
      ("Cmd+Shift+I", ShortcutAction::AddInputBlock),
    ];

    assert_eq!(keymap.shortcuts().len(), cases.len());
    for (label, action) in cases {
      let combo: KeyCombo = label.parse().unwrap();
      assert_eq!(keymap.resolve(&KeyEvent::from(&combo)), Some(action), "{}", label);
      assert_eq!(keymap.binding(action).unwrap().to_string(), label);
    }
  }

  #[test]
  fn test_unbound_key() {
    let keymap = Keymap::default();

    assert_eq!(keymap.resolve(&press("Enter")), None);
    assert_eq!(keymap.resolve(&press("x")), None);
  }

  #[test]
  fn test_delete_requires_shift() {
    let keymap = Keymap::default();
    let cmd_backspace = KeyEvent {
      meta: true,
      ..press("Backspace")
    };

    assert_eq!(keymap.resolve(&cmd_backspace), None);
    assert_eq!(
      keymap.resolve(&KeyEvent {
        shift: true,
        ..cmd_backspace
      }),
      Some(ShortcutAction::DeleteBlock)
    );
  }

  #[test]
  fn test_parse_combo() {
    let combo: KeyCombo = "ctrl+shift+enter".parse().unwrap();
    assert_eq!(combo, KeyCombo::new("enter").cmd().shift());
    assert_eq!(combo.to_string(), "Cmd+Shift+Enter");

    let plus: KeyCombo = "Cmd++".parse().unwrap();
    assert_eq!(plus, KeyCombo::new("+").cmd());

    assert!(matches!("".parse::<KeyCombo>(), Err(ShortcutError::Empty)));
    assert!(matches!(
      "Hyper+K".parse::<KeyCombo>(),
      Err(ShortcutError::UnknownModifier { modifier, .. }) if modifier == "Hyper"
    ));
  }

  #[test]
  fn test_needs_focus() {
    assert!(ShortcutAction::DeleteBlock.needs_focus());
    assert!(!ShortcutAction::ExecuteFlow.needs_focus());
    assert!(!ShortcutAction::AddInputBlock.needs_focus());
  }
}
