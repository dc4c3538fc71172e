//! Accessory view kinds and their typed configurations

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::media::{MediaDescriptor, MediaLoader, MediaType};
use super::progress::ProgressState;
use crate::app::Config;
use crate::payload::{first_selection, parse_selection, DecodeError, DirectiveKey, PayloadDecoder, PickerItem};

/// Date format used for date picker preselection and output
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Accessory view type names accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessoryViewKind {
    Whitebox,
    Timer,
    Progressbar,
    Image,
    Video,
    Input,
    /// Deprecated spelling of `secureinput`
    Securedinput,
    Secureinput,
    Dropdown,
    Html,
    Htmlwhitebox,
    Checklist,
    Datepicker,
    Slideshow,
}

impl AccessoryViewKind {
    pub fn from_name(name: &str) -> Result<Self, DecodeError> {
        let kind = match name.to_lowercase().as_str() {
            "whitebox" => AccessoryViewKind::Whitebox,
            "timer" => AccessoryViewKind::Timer,
            "progressbar" => AccessoryViewKind::Progressbar,
            "image" => AccessoryViewKind::Image,
            "video" => AccessoryViewKind::Video,
            "input" => AccessoryViewKind::Input,
            "securedinput" => AccessoryViewKind::Securedinput,
            "secureinput" => AccessoryViewKind::Secureinput,
            "dropdown" => AccessoryViewKind::Dropdown,
            "html" => AccessoryViewKind::Html,
            "htmlwhitebox" => AccessoryViewKind::Htmlwhitebox,
            "checklist" => AccessoryViewKind::Checklist,
            "datepicker" => AccessoryViewKind::Datepicker,
            "slideshow" => AccessoryViewKind::Slideshow,
            _ => return Err(DecodeError::UnknownAccessoryType(name.to_string())),
        };
        Ok(kind)
    }
}

// === Schemas ===

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKey {
    Title,
    Placeholder,
    Value,
    Required,
}

impl DirectiveKey for InputKey {
    fn name(self) -> &'static str {
        match self {
            InputKey::Title => "title",
            InputKey::Placeholder => "placeholder",
            InputKey::Value => "value",
            InputKey::Required => "required",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "title" => Some(InputKey::Title),
            "placeholder" => Some(InputKey::Placeholder),
            "value" => Some(InputKey::Value),
            "required" => Some(InputKey::Required),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePickerKey {
    Title,
    Preselection,
    Components,
    Style,
}

impl DirectiveKey for DatePickerKey {
    fn name(self) -> &'static str {
        match self {
            DatePickerKey::Title => "title",
            DatePickerKey::Preselection => "preselection",
            DatePickerKey::Components => "components",
            DatePickerKey::Style => "style",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "title" => Some(DatePickerKey::Title),
            "preselection" => Some(DatePickerKey::Preselection),
            "components" => Some(DatePickerKey::Components),
            "style" => Some(DatePickerKey::Style),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckListKey {
    Title,
    List,
    Complete,
    Radio,
    Preselection,
    Required,
}

impl DirectiveKey for CheckListKey {
    fn name(self) -> &'static str {
        match self {
            CheckListKey::Title => "title",
            CheckListKey::List => "list",
            CheckListKey::Complete => "complete",
            CheckListKey::Radio => "radio",
            CheckListKey::Preselection => "preselection",
            CheckListKey::Required => "required",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "title" => Some(CheckListKey::Title),
            "list" => Some(CheckListKey::List),
            "complete" => Some(CheckListKey::Complete),
            "radio" => Some(CheckListKey::Radio),
            "preselection" => Some(CheckListKey::Preselection),
            "required" => Some(CheckListKey::Required),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropdownKey {
    Title,
    List,
    Placeholder,
    Selected,
}

impl DirectiveKey for DropdownKey {
    fn name(self) -> &'static str {
        match self {
            DropdownKey::Title => "title",
            DropdownKey::List => "list",
            DropdownKey::Placeholder => "placeholder",
            DropdownKey::Selected => "selected",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "title" => Some(DropdownKey::Title),
            "list" => Some(DropdownKey::List),
            "placeholder" => Some(DropdownKey::Placeholder),
            "selected" => Some(DropdownKey::Selected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideShowKey {
    Images,
    Autoplay,
    Delay,
}

impl DirectiveKey for SlideShowKey {
    fn name(self) -> &'static str {
        match self {
            SlideShowKey::Images => "images",
            SlideShowKey::Autoplay => "autoplay",
            SlideShowKey::Delay => "delay",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "images" => Some(SlideShowKey::Images),
            "autoplay" => Some(SlideShowKey::Autoplay),
            "delay" => Some(SlideShowKey::Delay),
            _ => None,
        }
    }
}

// === Typed configurations ===

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputConfig {
    pub title: String,
    pub placeholder: String,
    pub value: String,
    pub required: bool,
    pub secure: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePickerStyle {
    Graphical,
    Field,
    Compact,
    StepperField,
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateComponents {
    Date,
    Time,
    DateAndTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatePickerConfig {
    pub title: String,
    pub style: DatePickerStyle,
    pub components: DateComponents,
    pub preselection: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckListConfig {
    pub title: String,
    pub items: Vec<PickerItem>,
    pub required: bool,
    /// Every item must be checked before the main button is enabled
    pub need_completion: bool,
    pub use_radio_buttons: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DropdownConfig {
    pub title: String,
    pub placeholder: String,
    pub items: Vec<PickerItem>,
    pub selected: Option<usize>,
    pub required: bool,
}

/// Countdown text; `%@` is replaced with the remaining time
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimerTemplate {
    pub template: String,
}

impl TimerTemplate {
    pub fn render(&self, remaining_secs: u64) -> String {
        self.template.replace("%@", &format_countdown(remaining_secs))
    }
}

/// `HH:MM:SS`
pub fn format_countdown(secs: u64) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

#[derive(Debug, Clone, Serialize)]
pub struct SlideShowConfig {
    pub images: Vec<MediaDescriptor>,
    pub autoplay: bool,
    /// Seconds between slides
    pub delay: u64,
}

/// Parsed accessory view configuration
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "config", rename_all = "snake_case")]
pub enum AccessoryConfig {
    Text { body: String, html: bool, boxed: bool },
    Timer(TimerTemplate),
    ProgressBar(ProgressState),
    Media(MediaDescriptor),
    Input(InputConfig),
    DatePicker(DatePickerConfig),
    CheckList(CheckListConfig),
    Dropdown(DropdownConfig),
    SlideShow(SlideShowConfig),
}

/// An accessory view ready to be consumed by a presenter
#[derive(Debug, Clone, Serialize)]
pub struct AccessoryView {
    /// Distinguishes views sharing kind and payload
    pub id: Uuid,
    pub kind: AccessoryViewKind,
    pub payload: String,
    #[serde(flatten)]
    pub config: AccessoryConfig,
}

impl AccessoryView {
    /// Parse a view that needs no external resources.
    pub fn parse(kind: AccessoryViewKind, payload: &str, config: &Config) -> Result<Self, DecodeError> {
        let accessory = match kind {
            AccessoryViewKind::Whitebox | AccessoryViewKind::Html | AccessoryViewKind::Htmlwhitebox => {
                AccessoryConfig::Text {
                    body: payload.to_string(),
                    html: kind != AccessoryViewKind::Whitebox,
                    boxed: kind != AccessoryViewKind::Html,
                }
            }
            AccessoryViewKind::Timer => AccessoryConfig::Timer(TimerTemplate {
                template: payload.to_string(),
            }),
            AccessoryViewKind::Progressbar => {
                AccessoryConfig::ProgressBar(ProgressState::parse(Some(payload), None))
            }
            AccessoryViewKind::Input | AccessoryViewKind::Secureinput | AccessoryViewKind::Securedinput => {
                AccessoryConfig::Input(parse_input(kind, payload)?)
            }
            AccessoryViewKind::Datepicker => AccessoryConfig::DatePicker(parse_date_picker(payload)?),
            AccessoryViewKind::Checklist => AccessoryConfig::CheckList(parse_check_list(payload)?),
            AccessoryViewKind::Dropdown => AccessoryConfig::Dropdown(parse_dropdown(payload)?),
            AccessoryViewKind::Image | AccessoryViewKind::Video | AccessoryViewKind::Slideshow => {
                let loader = MediaLoader::new(&config.media)
                    .map_err(|e| DecodeError::Invalid(format!("{:#}", e)))?;
                return Self::parse_with_loader(kind, payload, config, &loader);
            }
        };

        Ok(Self::new(kind, payload, accessory))
    }

    /// Parse a view, resolving media through `loader`.
    pub fn parse_with_loader(
        kind: AccessoryViewKind,
        payload: &str,
        config: &Config,
        loader: &MediaLoader,
    ) -> Result<Self, DecodeError> {
        let accessory = match kind {
            AccessoryViewKind::Image | AccessoryViewKind::Video => {
                let media_type = if kind == AccessoryViewKind::Image {
                    MediaType::Image
                } else {
                    MediaType::Video
                };
                let media = loader
                    .load(media_type, payload)
                    .ok_or_else(|| DecodeError::Invalid(format!("unable to load media from '{}'", payload)))?;
                AccessoryConfig::Media(media)
            }
            AccessoryViewKind::Slideshow => {
                AccessoryConfig::SlideShow(parse_slide_show(payload, config, loader)?)
            }
            _ => return Self::parse(kind, payload, config),
        };

        Ok(Self::new(kind, payload, accessory))
    }

    fn new(kind: AccessoryViewKind, payload: &str, config: AccessoryConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            payload: payload.to_string(),
            config,
        }
    }

    /// Output the view starts with before any user interaction
    pub fn initial_output(&self) -> String {
        match &self.config {
            AccessoryConfig::Input(input) => input.value.clone(),
            AccessoryConfig::Dropdown(dropdown) => dropdown
                .selected
                .map(|index| index.to_string())
                .unwrap_or_default(),
            AccessoryConfig::CheckList(list) => list
                .items
                .iter()
                .filter(|item| item.is_selected)
                .map(|item| item.id.to_string())
                .collect::<Vec<_>>()
                .join(" "),
            AccessoryConfig::DatePicker(picker) => picker
                .preselection
                .map(|date| date.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
            _ => String::new(),
        }
    }

    /// Line to print on stdout when the popup exits through a button or timeout.
    pub fn exit_output<'a>(&self, output: &'a str) -> Option<&'a str> {
        match self.kind {
            AccessoryViewKind::Checklist => {
                let need_completion = matches!(
                    &self.config,
                    AccessoryConfig::CheckList(list) if list.need_completion
                );
                (!need_completion && !output.is_empty() && output != "-1").then_some(output)
            }
            // -1 is the dropdown's "nothing selected"
            AccessoryViewKind::Dropdown => (!output.is_empty() && output != "-1").then_some(output),
            AccessoryViewKind::Input
            | AccessoryViewKind::Secureinput
            | AccessoryViewKind::Securedinput
            | AccessoryViewKind::Datepicker => (!output.is_empty()).then_some(output),
            _ => None,
        }
    }
}

fn parse_input(kind: AccessoryViewKind, payload: &str) -> Result<InputConfig, DecodeError> {
    let decoder = PayloadDecoder::<InputKey>::new(payload)?;
    Ok(InputConfig {
        title: decoder.decode(InputKey::Title)?,
        placeholder: decoder.decode(InputKey::Placeholder)?,
        value: decoder.decode(InputKey::Value)?,
        required: decoder.decode(InputKey::Required)?,
        secure: kind != AccessoryViewKind::Input,
    })
}

fn parse_date_picker(payload: &str) -> Result<DatePickerConfig, DecodeError> {
    let decoder = PayloadDecoder::<DatePickerKey>::new(payload)?;

    let raw_style: String = decoder.decode(DatePickerKey::Style)?;
    let style = match raw_style.to_lowercase().as_str() {
        "graphical" => DatePickerStyle::Graphical,
        "field" => DatePickerStyle::Field,
        "compact" => DatePickerStyle::Compact,
        "stepperfield" => DatePickerStyle::StepperField,
        _ => DatePickerStyle::Default,
    };

    let raw_components: String = decoder.decode(DatePickerKey::Components)?;
    let components = match raw_components.to_lowercase().as_str() {
        "date" => DateComponents::Date,
        "time" => DateComponents::Time,
        _ => DateComponents::DateAndTime,
    };

    let raw_preselection: String = decoder.decode(DatePickerKey::Preselection)?;
    let preselection = NaiveDateTime::parse_from_str(&raw_preselection, DATE_FORMAT).ok();

    Ok(DatePickerConfig {
        title: decoder.decode(DatePickerKey::Title)?,
        style,
        components,
        preselection,
    })
}

fn parse_check_list(payload: &str) -> Result<CheckListConfig, DecodeError> {
    let decoder = PayloadDecoder::<CheckListKey>::new(payload)?;

    let mut items: Vec<PickerItem> = decoder.decode(CheckListKey::List)?;
    let use_radio_buttons: bool = decoder.decode(CheckListKey::Radio)?;
    let preselection: String = decoder.decode(CheckListKey::Preselection)?;
    // A radio group keeps the first index as written.
    let selection = if use_radio_buttons {
        first_selection(&preselection, items.len()).into_iter().collect()
    } else {
        parse_selection(&preselection, items.len())
    };
    for index in selection {
        items[index].is_selected = true;
    }

    Ok(CheckListConfig {
        title: decoder.decode(CheckListKey::Title)?,
        items,
        required: decoder.decode(CheckListKey::Required)?,
        need_completion: decoder.decode(CheckListKey::Complete)?,
        use_radio_buttons,
    })
}

fn parse_dropdown(payload: &str) -> Result<DropdownConfig, DecodeError> {
    let decoder = PayloadDecoder::<DropdownKey>::new(payload)?;

    let mut items: Vec<PickerItem> = decoder.decode(DropdownKey::List)?;
    let raw_selected: String = decoder.decode(DropdownKey::Selected)?;
    let selected = first_selection(&raw_selected, items.len());
    if let Some(index) = selected {
        items[index].is_selected = true;
    }

    Ok(DropdownConfig {
        title: decoder.decode(DropdownKey::Title)?,
        placeholder: decoder.decode(DropdownKey::Placeholder)?,
        items,
        selected,
        required: !raw_selected.is_empty(),
    })
}

fn parse_slide_show(
    payload: &str,
    config: &Config,
    loader: &MediaLoader,
) -> Result<SlideShowConfig, DecodeError> {
    let decoder = PayloadDecoder::<SlideShowKey>::new(payload)?;

    let raw_images: String = decoder.decode(SlideShowKey::Images)?;
    let images: Vec<MediaDescriptor> = raw_images
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| loader.load(MediaType::Image, line))
        .collect();
    if images.is_empty() {
        return Err(DecodeError::Invalid("slideshow has no loadable images".to_string()));
    }

    let delay: i64 = decoder.decode(SlideShowKey::Delay)?;
    Ok(SlideShowConfig {
        images,
        autoplay: decoder.decode(SlideShowKey::Autoplay)?,
        delay: (delay.max(0) as u64).max(config.slideshow.min_autoplay_delay_secs),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};
    use tempfile::tempdir;

    fn parse(kind: &str, payload: &str) -> Result<AccessoryView, DecodeError> {
        let kind = AccessoryViewKind::from_name(kind)?;
        AccessoryView::parse(kind, payload, &Config::default())
    }

    #[test]
    fn test_parse_input() {
        let view = parse("input", "/title Name /placeholder Jane/value a//b /required").unwrap();
        match &view.config {
            AccessoryConfig::Input(input) => {
                assert_eq!(input.title, "Name");
                assert_eq!(input.placeholder, "Jane");
                assert_eq!(input.value, "a/b");
                assert!(input.required);
                assert!(!input.secure);
            }
            other => panic!("unexpected config: {:?}", other),
        }
        assert_eq!(view.initial_output(), "a/b");
        assert_eq!(view.exit_output("a/b"), Some("a/b"));
        assert_eq!(view.exit_output(""), None);
    }

    #[test]
    fn test_parse_secure_input() {
        let view = parse("securedinput", "/placeholder Password").unwrap();
        assert!(matches!(&view.config, AccessoryConfig::Input(input) if input.secure));
    }

    #[test]
    fn test_input_missing_value_fails() {
        assert_eq!(
            parse("input", "/title /required").unwrap_err(),
            DecodeError::MissingValue("title")
        );
    }

    #[test]
    fn test_unknown_kind() {
        assert_eq!(
            parse("carousel", "/title x").unwrap_err(),
            DecodeError::UnknownAccessoryType("carousel".to_string())
        );
    }

    #[test]
    fn test_parse_date_picker() {
        let view = parse(
            "datepicker",
            "/title When? /style graphical /components date /preselection 2024-05-01 09:30:00",
        )
        .unwrap();
        match &view.config {
            AccessoryConfig::DatePicker(picker) => {
                assert_eq!(picker.title, "When?");
                assert_eq!(picker.style, DatePickerStyle::Graphical);
                assert_eq!(picker.components, DateComponents::Date);
                let date = picker.preselection.unwrap();
                assert_eq!((date.year(), date.month(), date.day()), (2024, 5, 1));
                assert_eq!(date.hour(), 9);
            }
            other => panic!("unexpected config: {:?}", other),
        }
        assert_eq!(view.initial_output(), "2024-05-01 09:30:00");
    }

    #[test]
    fn test_date_picker_defaults() {
        let view = parse("datepicker", "/title When?").unwrap();
        match &view.config {
            AccessoryConfig::DatePicker(picker) => {
                assert_eq!(picker.style, DatePickerStyle::Default);
                assert_eq!(picker.components, DateComponents::DateAndTime);
                assert!(picker.preselection.is_none());
            }
            other => panic!("unexpected config: {:?}", other),
        }
        assert_eq!(view.exit_output(&view.initial_output()), None);
    }

    #[test]
    fn test_parse_check_list() {
        let view = parse("checklist", "/title Steps /list A\nB\nA\nC /preselection 0 2 /required").unwrap();
        match &view.config {
            AccessoryConfig::CheckList(list) => {
                assert_eq!(list.items.len(), 3);
                assert!(list.items[0].is_selected);
                assert!(!list.items[1].is_selected);
                assert!(list.items[2].is_selected);
                assert!(list.required);
                assert!(!list.need_completion);
            }
            other => panic!("unexpected config: {:?}", other),
        }
        assert_eq!(view.initial_output(), "0 2");
        assert_eq!(view.exit_output("0 2"), Some("0 2"));
        assert_eq!(view.exit_output("-1"), None);
    }

    #[test]
    fn test_complete_check_list_never_prints() {
        let view = parse("checklist", "/list A\nB /complete").unwrap();
        assert_eq!(view.exit_output("0 1"), None);
    }

    #[test]
    fn test_radio_keeps_single_selection() {
        let view = parse("checklist", "/list A\nB\nC /radio /preselection 2 1").unwrap();
        assert_eq!(view.initial_output(), "2");

        let view = parse("checklist", "/list A\nB /radio /preselection 5 1").unwrap();
        assert_eq!(view.initial_output(), "1");
    }

    #[test]
    fn test_parse_dropdown() {
        let view = parse("dropdown", "/title Pick /list Red\nGreen /placeholder Colour /selected 1").unwrap();
        match &view.config {
            AccessoryConfig::Dropdown(dropdown) => {
                assert_eq!(dropdown.selected, Some(1));
                assert!(dropdown.required);
                assert_eq!(dropdown.placeholder, "Colour");
            }
            other => panic!("unexpected config: {:?}", other),
        }
        assert_eq!(view.initial_output(), "1");

        let view = parse("dropdown", "/list Red\nGreen").unwrap();
        assert_eq!(view.initial_output(), "");
        assert_eq!(view.exit_output(&view.initial_output()), None);
        assert_eq!(view.exit_output("-1"), None);
        assert_eq!(view.exit_output("0"), Some("0"));
    }

    #[test]
    fn test_timer_template() {
        let view = parse("timer", "Closing in %@").unwrap();
        match &view.config {
            AccessoryConfig::Timer(timer) => assert_eq!(timer.render(3725), "Closing in 01:02:05"),
            other => panic!("unexpected config: {:?}", other),
        }
        assert_eq!(view.exit_output("anything"), None);
    }

    #[test]
    fn test_progress_bar_view() {
        let view = parse("progressbar", "/percent 10 /top_message Installing").unwrap();
        match &view.config {
            AccessoryConfig::ProgressBar(state) => {
                assert_eq!(state.percent, 10.0);
                assert_eq!(state.top_message, "Installing");
            }
            other => panic!("unexpected config: {:?}", other),
        }
    }

    #[test]
    fn test_slide_show() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("a.gif");
        std::fs::write(&first, b"GIF89a").unwrap();
        // Path separators are unknown directives and fold back into the list.
        let payload = format!(
            "/images {}\n{}/missing.gif /autoplay /delay 1",
            first.display(),
            dir.path().display()
        );

        let view = parse("slideshow", &payload).unwrap();
        match &view.config {
            AccessoryConfig::SlideShow(show) => {
                assert_eq!(show.images.len(), 1);
                assert!(show.autoplay);
                assert_eq!(show.delay, 3);
            }
            other => panic!("unexpected config: {:?}", other),
        }
    }

    #[test]
    fn test_serialize_view() {
        let view = parse("input", "/title Name").unwrap();
        let json = serde_json::to_string(&view).unwrap();
        assert!(json.contains("\"type\":\"input\""));
        assert!(json.contains("\"kind\":\"input\""));
    }
}
