use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Tool {
    #[default]
    Select,
    Ripple,
    Roll,
    Slip,
    Slide,
    Blade,
}

impl Tool {
    pub const ALL: [Tool; 6] = [Tool::Select, Tool::Ripple, Tool::Roll, Tool::Slip, Tool::Slide, Tool::Blade];

    pub fn name(&self) -> &'static str {
        match self {
            Tool::Select => "Select",
            Tool::Ripple => "Ripple",
            Tool::Roll => "Roll",
            Tool::Slip => "Slip",
            Tool::Slide => "Slide",
            Tool::Blade => "Blade",
        }
    }

    pub fn shortcut(&self) -> char {
        match self {
            Tool::Select => 'V',
            Tool::Ripple => 'B',
            Tool::Roll => 'N',
            Tool::Slip => 'Y',
            Tool::Slide => 'U',
            Tool::Blade => 'C',
        }
    }

    pub fn from_shortcut(key: char) -> Option<Tool> {
        Tool::ALL.into_iter().find(|t| t.shortcut().eq_ignore_ascii_case(&key))
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

/// Holds exactly one active tool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToolMode {
    active: Tool,
}

impl ToolMode {
    pub fn active(&self) -> Tool { self.active }

    /// Replaces the active tool and returns the confirmation text.
    pub fn select(&mut self, tool: Tool) -> String {
        self.active = tool;
        tracing::debug!(tool = tool.name(), "tool selected");
        format!("{} ({}) activated", tool.name(), tool.shortcut())
    }
}
