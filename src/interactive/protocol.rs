//! Framing of stdin update lines and the events derived from them

use serde::{Deserialize, Serialize};

use crate::model::ProgressState;

/// Line that ends an interactive session, whatever the schema
pub const END_SENTINEL: &str = "end";

/// Which update stream an event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    Progress,
    WarningButton,
}

/// Visibility of the popup warning button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WarningButtonState {
    pub is_visible: bool,
    pub is_expanded: bool,
}

/// Event published by an update channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpdateEvent {
    /// A new progress bar state
    Progress { state: ProgressState },
    /// A new warning button visibility
    WarningButton {
        is_visible: bool,
        is_expanded: bool,
    },
    /// The update stream ended
    Finished { channel: ChannelKind },
}

impl From<WarningButtonState> for UpdateEvent {
    fn from(state: WarningButtonState) -> Self {
        UpdateEvent::WarningButton {
            is_visible: state.is_visible,
            is_expanded: state.is_expanded,
        }
    }
}

/// Decode one raw read as UTF-8 and strip trailing newline characters.
pub fn frame_line(raw: &[u8]) -> Option<&str> {
    std::str::from_utf8(raw)
        .ok()
        .map(|line| line.trim_end_matches(['\n', '\r']))
}
