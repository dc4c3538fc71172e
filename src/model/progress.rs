//! Progress bar state and its delta parser

use serde::{Deserialize, Serialize};

use crate::payload::{scan, DirectiveKey};

/// Percent value used for an indeterminate bar.
pub const INDETERMINATE_PERCENT: f64 = -1.0;

/// Directives understood by a progress bar payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressKey {
    Percent,
    TopMessage,
    BottomMessage,
    UserInteractionEnabled,
    UserInterruptionAllowed,
    ExitOnCompletion,
}

impl DirectiveKey for ProgressKey {
    fn name(self) -> &'static str {
        match self {
            ProgressKey::Percent => "percent",
            ProgressKey::TopMessage => "top_message",
            ProgressKey::BottomMessage => "bottom_message",
            ProgressKey::UserInteractionEnabled => "user_interaction_enabled",
            ProgressKey::UserInterruptionAllowed => "user_interruption_allowed",
            ProgressKey::ExitOnCompletion => "exit_on_completion",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "percent" => Some(ProgressKey::Percent),
            "top_message" => Some(ProgressKey::TopMessage),
            "bottom_message" => Some(ProgressKey::BottomMessage),
            "user_interaction_enabled" => Some(ProgressKey::UserInteractionEnabled),
            "user_interruption_allowed" => Some(ProgressKey::UserInterruptionAllowed),
            "exit_on_completion" => Some(ProgressKey::ExitOnCompletion),
            _ => None,
        }
    }
}

/// State of a progress bar accessory view
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProgressState {
    /// Completion percentage, `-1` when indeterminate
    pub percent: f64,
    pub top_message: String,
    pub bottom_message: String,
    pub is_indeterminate: bool,
    /// Whether the popup buttons stay usable while loading
    pub is_user_interaction_enabled: bool,
    /// Whether the user may interrupt the loading
    pub is_user_interruption_allowed: bool,
    /// Whether the popup closes itself when the bar completes
    pub exit_on_completion: bool,
}

impl ProgressState {
    /// Build a state from `payload` on top of `current`.
    ///
    /// Fields not mentioned in the payload keep the value of `current` (or the
    /// default). The payload `end` completes the bar.
    pub fn parse(payload: Option<&str>, current: Option<&ProgressState>) -> Self {
        let state = current.cloned().unwrap_or_default();
        match payload {
            Some(payload) => state.apply(payload),
            None => state,
        }
    }

    /// Apply a delta payload and return the resulting state.
    pub fn apply(&self, payload: &str) -> Self {
        let mut state = self.clone();

        if payload.trim().eq_ignore_ascii_case("end") {
            state.set_percent(100.0);
            return state;
        }

        // scan() yields the last directive first; apply in payload order.
        for directive in scan::<ProgressKey>(payload).into_iter().rev() {
            let value = directive.value.as_str();
            match directive.key {
                ProgressKey::Percent => {
                    if value.eq_ignore_ascii_case("indeterminate") {
                        state.set_percent(INDETERMINATE_PERCENT);
                    } else if let Some(percent) = value.parse::<f64>().ok().filter(|p| p.is_finite()) {
                        state.set_percent(percent);
                    }
                }
                ProgressKey::TopMessage => state.top_message = value.to_string(),
                ProgressKey::BottomMessage => state.bottom_message = value.to_string(),
                ProgressKey::UserInteractionEnabled => {
                    state.is_user_interaction_enabled = parse_switch(value)
                }
                ProgressKey::UserInterruptionAllowed => {
                    state.is_user_interruption_allowed = parse_switch(value)
                }
                ProgressKey::ExitOnCompletion => state.exit_on_completion = parse_switch(value),
            }
        }

        state
    }

    /// Anything at or past 100 counts, so an overshooting `/percent 150`
    /// still completes the bar.
    pub fn is_completed(&self) -> bool {
        self.percent >= 100.0
    }

    fn set_percent(&mut self, percent: f64) {
        self.percent = percent;
        self.is_indeterminate = percent < 0.0;
    }
}

/// Bare switch means `true`; otherwise only the literal `true` enables it.
fn parse_switch(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case("true")
}
