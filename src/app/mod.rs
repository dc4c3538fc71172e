pub mod config;
pub mod events;
pub mod exit;
pub mod session;
pub mod timers;

pub use config::{Config, MediaConfig, PopupSettings, SlideShowSettings};
pub use events::{EventForwarder, SessionEvent};
pub use exit::ExitReason;
pub use session::{forward_interrupts, Session, SessionOptions};
pub use timers::{TimerKind, Timers};
