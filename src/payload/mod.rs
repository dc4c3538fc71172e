//! `/key value` payload micro-language
//!
//! Accessory views, reminders and progress updates are all configured with a
//! single string such as `/title Pick one /list A\nB /required`. This module
//! turns such strings into typed values.

pub mod decoder;
pub mod error;
pub mod picker;

pub use decoder::{scan, Directive, DirectiveKey, DirectiveValue, PayloadDecoder};
pub use error::DecodeError;
pub use picker::{first_selection, parse_list, parse_selection, PickerItem};
