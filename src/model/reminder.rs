//! Popup reminder parsed from `/timeinterval N [/repeat] [/silent]`

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::payload::{scan, DirectiveKey};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReminderError {
    #[error("Invalid reminder payload: missing /timeinterval")]
    MissingTimeInterval,

    #[error("Invalid reminder payload: '{0}' is not a valid time interval")]
    InvalidTimeInterval(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderKey {
    TimeInterval,
    Repeat,
    Silent,
}

impl DirectiveKey for ReminderKey {
    fn name(self) -> &'static str {
        match self {
            ReminderKey::TimeInterval => "timeinterval",
            ReminderKey::Repeat => "repeat",
            ReminderKey::Silent => "silent",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "timeinterval" => Some(ReminderKey::TimeInterval),
            "repeat" => Some(ReminderKey::Repeat),
            "silent" => Some(ReminderKey::Silent),
            _ => None,
        }
    }
}

/// Periodic reminder that brings the popup back to the front
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopupReminder {
    /// Seconds until the reminder fires
    pub time_interval: f64,
    /// Re-arm after each firing
    pub repeat_reminder: bool,
    /// Do not play a sound when firing
    pub silent: bool,
}

impl PopupReminder {
    pub fn parse(payload: &str) -> Result<Self, ReminderError> {
        let directives = scan::<ReminderKey>(payload);

        let raw_interval = directives
            .iter()
            .find(|d| d.key == ReminderKey::TimeInterval)
            .map(|d| d.value.as_str())
            .ok_or(ReminderError::MissingTimeInterval)?;
        let time_interval = raw_interval
            .parse::<f64>()
            .ok()
            .filter(|interval| *interval > 0.0 && Duration::try_from_secs_f64(*interval).is_ok())
            .ok_or_else(|| ReminderError::InvalidTimeInterval(raw_interval.to_string()))?;

        Ok(Self {
            time_interval,
            repeat_reminder: directives.iter().any(|d| d.key == ReminderKey::Repeat),
            silent: directives.iter().any(|d| d.key == ReminderKey::Silent),
        })
    }

    /// Saturates for intervals too large to represent.
    pub fn interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.time_interval).unwrap_or(Duration::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_reminder() {
        let reminder = PopupReminder::parse("/timeinterval 30 /repeat").unwrap();
        assert_eq!(reminder.time_interval, 30.0);
        assert!(reminder.repeat_reminder);
        assert!(!reminder.silent);
        assert_eq!(reminder.interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_fractional_interval() {
        let reminder = PopupReminder::parse("/silent /timeinterval 1.5").unwrap();
        assert_eq!(reminder.time_interval, 1.5);
        assert!(reminder.silent);
    }

    #[test]
    fn test_missing_time_interval() {
        assert_eq!(
            PopupReminder::parse("/repeat /silent"),
            Err(ReminderError::MissingTimeInterval)
        );
        assert_eq!(PopupReminder::parse(""), Err(ReminderError::MissingTimeInterval));
    }

    #[test]
    fn test_invalid_time_interval() {
        assert_eq!(
            PopupReminder::parse("/timeinterval soon"),
            Err(ReminderError::InvalidTimeInterval("soon".to_string()))
        );
        assert!(PopupReminder::parse("/timeinterval").is_err());
        assert!(PopupReminder::parse("/timeinterval -4").is_err());
        assert!(PopupReminder::parse("/timeinterval nan").is_err());
        assert!(PopupReminder::parse("/timeinterval inf").is_err());
    }

    #[test]
    fn test_huge_time_interval_is_rejected() {
        assert_eq!(
            PopupReminder::parse("/timeinterval 1e30"),
            Err(ReminderError::InvalidTimeInterval("1e30".to_string()))
        );

        let reminder = PopupReminder {
            time_interval: 1e30,
            repeat_reminder: false,
            silent: false,
        };
        assert_eq!(reminder.interval(), Duration::MAX);
    }
}
