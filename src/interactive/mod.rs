//! Interactive updates received on standard input
//!
//! The process that launched the agent can keep writing lines to its stdin
//! to drive a progress bar or the warning button while the popup is shown.

pub mod listener;
pub mod protocol;
pub mod updates;

pub use listener::{
    run_listener, spawn_listener, Channel, LineInterpreter, ListenerHandle, ListenerState,
    StopToken, UpdateChannel, UpdateObserver,
};
pub use protocol::{ChannelKind, UpdateEvent, WarningButtonState, END_SENTINEL};
pub use updates::{ProgressUpdates, WarningButtonUpdates};
