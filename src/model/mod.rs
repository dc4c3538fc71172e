pub mod accessory;
pub mod media;
pub mod progress;
pub mod reminder;

pub use accessory::{AccessoryConfig, AccessoryView, AccessoryViewKind};
pub use media::{MediaDescriptor, MediaLoader, MediaSource, MediaType};
pub use progress::ProgressState;
pub use reminder::{PopupReminder, ReminderError};
