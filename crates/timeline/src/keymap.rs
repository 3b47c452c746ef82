use serde::{Deserialize, Serialize};

use crate::Tool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Key {
    Space,
    Char(char),
}

impl From<char> for Key {
    fn from(c: char) -> Self {
        if c == ' ' { Key::Space } else { Key::Char(c.to_ascii_lowercase()) }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub command: bool,
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers { command: false, shift: false };
    pub const COMMAND: Modifiers = Modifiers { command: true, shift: false };
    pub const COMMAND_SHIFT: Modifiers = Modifiers { command: true, shift: true };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyAction {
    TogglePlay,
    AdjustSpeed(i32),
    Stop,
    MarkIn,
    MarkOut,
    SelectTool(Tool),
    Undo,
    Redo,
}

/// J-K-L transport, I/O marks, tool shortcuts and Cmd+Z / Cmd+Shift+Z.
pub fn action_for(key: Key, modifiers: Modifiers) -> Option<KeyAction> {
    let c = match key {
        Key::Space => return Some(KeyAction::TogglePlay),
        Key::Char(c) => c.to_ascii_lowercase(),
    };
    if modifiers.command {
        return match c {
            'z' if modifiers.shift => Some(KeyAction::Redo),
            'z' => Some(KeyAction::Undo),
            _ => None,
        };
    }
    match c {
        'j' => Some(KeyAction::AdjustSpeed(-1)),
        'l' => Some(KeyAction::AdjustSpeed(1)),
        'k' => Some(KeyAction::Stop),
        'i' => Some(KeyAction::MarkIn),
        'o' => Some(KeyAction::MarkOut),
        other => Tool::from_shortcut(other).map(KeyAction::SelectTool),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jkl_map_to_transport() {
        assert_eq!(action_for('j'.into(), Modifiers::NONE), Some(KeyAction::AdjustSpeed(-1)));
        assert_eq!(action_for('L'.into(), Modifiers::NONE), Some(KeyAction::AdjustSpeed(1)));
        assert_eq!(action_for('k'.into(), Modifiers::NONE), Some(KeyAction::Stop));
        assert_eq!(action_for(' '.into(), Modifiers::NONE), Some(KeyAction::TogglePlay));
    }

    #[test]
    fn tool_shortcuts() {
        assert_eq!(action_for('b'.into(), Modifiers::NONE), Some(KeyAction::SelectTool(Tool::Ripple)));
        assert_eq!(action_for('c'.into(), Modifiers::NONE), Some(KeyAction::SelectTool(Tool::Blade)));
        assert_eq!(action_for('q'.into(), Modifiers::NONE), None);
    }

    #[test]
    fn undo_needs_command() {
        assert_eq!(action_for('z'.into(), Modifiers::NONE), None);
        assert_eq!(action_for('z'.into(), Modifiers::COMMAND), Some(KeyAction::Undo));
        assert_eq!(action_for('z'.into(), Modifiers::COMMAND_SHIFT), Some(KeyAction::Redo));
        assert_eq!(action_for('v'.into(), Modifiers::COMMAND), None);
    }
}
