//! Process exit reasons and their exit codes

use crate::model::ReminderError;
use crate::payload::DecodeError;

/// Why the agent is exiting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    UntrackedSuccess,
    MainButtonClicked,
    SecondaryButtonClicked,
    TertiaryButtonClicked,
    FinishedOnboarding,
    UserDismissedPopup,
    InvalidArgumentsSyntax,
    InvalidArgumentFormat,
    InternalError,
    Cancelled,
    ReceivedSigInt,
    UnableToLoadResources,
    Timeout,
}

impl ExitReason {
    pub fn code(self) -> i32 {
        match self {
            ExitReason::UntrackedSuccess => 200,
            ExitReason::MainButtonClicked | ExitReason::FinishedOnboarding => 0,
            ExitReason::SecondaryButtonClicked => 2,
            ExitReason::TertiaryButtonClicked => 3,
            ExitReason::UserDismissedPopup => 239,
            ExitReason::InvalidArgumentsSyntax => 250,
            ExitReason::InvalidArgumentFormat => 255,
            ExitReason::InternalError | ExitReason::Cancelled => 1,
            ExitReason::ReceivedSigInt => 201,
            ExitReason::UnableToLoadResources => 260,
            ExitReason::Timeout => 4,
        }
    }

    /// Exit points that print accessory outputs on stdout
    pub fn prints_outputs(self) -> bool {
        matches!(
            self,
            ExitReason::MainButtonClicked | ExitReason::SecondaryButtonClicked | ExitReason::Timeout
        )
    }
}

impl From<&DecodeError> for ExitReason {
    fn from(_: &DecodeError) -> Self {
        ExitReason::InvalidArgumentFormat
    }
}

impl From<&ReminderError> for ExitReason {
    fn from(_: &ReminderError) -> Self {
        ExitReason::InvalidArgumentFormat
    }
}
