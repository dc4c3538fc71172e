//! Picker items decoded from multi-line `/list` values

use serde::{Deserialize, Serialize};

use super::decoder::DirectiveValue;

/// An entry of a checklist, radio group or dropdown.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PickerItem {
    /// Position in the deduplicated list
    pub id: usize,
    pub label: String,
    pub is_selected: bool,
}

/// Split a list value on newlines, dropping blank lines and repeated labels.
pub fn parse_list(value: &str) -> Vec<PickerItem> {
    let mut items: Vec<PickerItem> = Vec::new();
    for line in value.lines() {
        if line.trim().is_empty() || items.iter().any(|item| item.label == line) {
            continue;
        }
        items.push(PickerItem {
            id: items.len(),
            label: line.to_string(),
            is_selected: false,
        });
    }
    items
}

/// Parse space separated item indexes (e.g. `"0 2"`), ignoring anything out of range.
pub fn parse_selection(value: &str, item_count: usize) -> Vec<usize> {
    let mut selection: Vec<usize> = value
        .split_whitespace()
        .filter_map(|index| index.parse::<usize>().ok())
        .filter(|index| *index < item_count)
        .collect();
    selection.sort_unstable();
    selection.dedup();
    selection
}

/// First in-range index in the order written, for single-choice pickers.
pub fn first_selection(value: &str, item_count: usize) -> Option<usize> {
    value
        .split_whitespace()
        .filter_map(|index| index.parse::<usize>().ok())
        .find(|index| *index < item_count)
}

impl DirectiveValue for Vec<PickerItem> {
    fn from_directive(value: &str) -> Self {
        parse_list(value)
    }

    fn absent() -> Self {
        Vec::new()
    }
}
