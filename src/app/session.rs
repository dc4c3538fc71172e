//! Headless popup session
//!
//! Holds the parsed accessory views and their current outputs, consumes
//! interactive updates and timer events, and decides when and how the popup
//! exits. Exit-point outputs are written once, when the session ends.

use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::events::{EventForwarder, SessionEvent};
use super::exit::ExitReason;
use super::timers::{TimerKind, Timers};
use crate::interactive::{
    spawn_listener, Channel, ChannelKind, ListenerHandle, ProgressUpdates, UpdateEvent,
    WarningButtonState, WarningButtonUpdates,
};
use crate::model::accessory::TimerTemplate;
use crate::model::{AccessoryConfig, AccessoryView, PopupReminder, ProgressState};

#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Seconds before the popup times out
    pub timeout_secs: Option<u64>,
    pub reminder: Option<PopupReminder>,
    /// Show the warning button and listen for its visibility updates
    pub warning_button: bool,
    /// Echo every update event as a JSON line on stderr
    pub echo_events: bool,
}

pub struct Session {
    views: Vec<AccessoryView>,
    outputs: Vec<String>,
    progress: Option<ProgressState>,
    warning_button: Option<WarningButtonState>,
    countdown: Option<(TimerTemplate, String)>,
    reminders_fired: u32,
    options: SessionOptions,
    timers: Timers,
    tx: UnboundedSender<SessionEvent>,
    rx: UnboundedReceiver<SessionEvent>,
}

impl Session {
    pub fn new(views: Vec<AccessoryView>, options: SessionOptions) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let outputs = views.iter().map(|view| view.initial_output()).collect();
        let progress = views.iter().find_map(|view| match &view.config {
            AccessoryConfig::ProgressBar(state) => Some(state.clone()),
            _ => None,
        });
        let countdown = views.iter().find_map(|view| match &view.config {
            AccessoryConfig::Timer(template) => Some((template.clone(), String::new())),
            _ => None,
        });
        let warning_button = options.warning_button.then(WarningButtonState::default);

        Self {
            views,
            outputs,
            progress,
            warning_button,
            countdown,
            reminders_fired: 0,
            options,
            timers: Timers::new(tx.clone()),
            tx,
            rx,
        }
    }

    pub fn sender(&self) -> UnboundedSender<SessionEvent> {
        self.tx.clone()
    }

    pub fn views(&self) -> &[AccessoryView] {
        &self.views
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    /// Replace the output of the view at `index`.
    pub fn set_output(&mut self, index: usize, value: impl Into<String>) {
        if let Some(output) = self.outputs.get_mut(index) {
            *output = value.into();
        }
    }

    pub fn progress(&self) -> Option<&ProgressState> {
        self.progress.as_ref()
    }

    pub fn warning_button(&self) -> Option<WarningButtonState> {
        self.warning_button
    }

    /// Current rendering of the timer accessory view, if any
    pub fn countdown_text(&self) -> Option<&str> {
        self.countdown.as_ref().map(|(_, text)| text.as_str())
    }

    pub fn reminders_fired(&self) -> u32 {
        self.reminders_fired
    }

    /// Start reading interactive updates from `reader` when the popup has a
    /// progress bar or a warning button.
    pub fn attach_updates<R>(&self, reader: R) -> Result<Option<ListenerHandle>>
    where
        R: BufRead + Send + 'static,
    {
        let mut channels = Vec::new();
        if let Some(state) = &self.progress {
            let forwarder = EventForwarder::new(ChannelKind::Progress, self.sender());
            channels.push(Channel::new(ProgressUpdates, state.clone(), forwarder).boxed());
        }
        if let Some(state) = self.warning_button {
            let forwarder = EventForwarder::new(ChannelKind::WarningButton, self.sender());
            channels.push(Channel::new(WarningButtonUpdates, state, forwarder).boxed());
        }
        if channels.is_empty() {
            return Ok(None);
        }

        debug!("Listening for interactive updates on {} channel(s)", channels.len());
        let handle = spawn_listener(reader, channels).context("Failed to start interactive updates")?;
        Ok(Some(handle))
    }

    /// Whether the popup can reach an exit point without Ctrl-C: a timeout,
    /// or a progress bar whose updates may complete it.
    pub fn can_exit_unattended(&self) -> bool {
        self.options.timeout_secs.is_some() || self.progress.is_some()
    }

    /// Run until an exit point is reached. Outputs are written to `out`.
    pub async fn run<W: Write>(&mut self, out: &mut W) -> Result<ExitReason> {
        if !self.can_exit_unattended() {
            warn!("Popup has no timeout or progress bar, waiting for Ctrl-C");
        }
        self.arm_timers();

        let reason = loop {
            let Some(event) = self.rx.recv().await else {
                break ExitReason::Cancelled;
            };
            if let Some(reason) = self.handle_event(event) {
                break reason;
            }
        };

        self.timers.cancel_all();
        info!("Popup session ended: {:?}", reason);
        if reason.prints_outputs() {
            self.write_outputs(out)?;
        }
        Ok(reason)
    }

    fn arm_timers(&mut self) {
        if let Some(timeout) = self.options.timeout_secs {
            if let Some((template, text)) = &mut self.countdown {
                *text = template.render(timeout);
                self.timers.arm_countdown(timeout.max(1));
            } else {
                self.timers.arm_timeout(Duration::from_secs(timeout));
            }
        }
        if let Some(reminder) = &self.options.reminder {
            self.timers.arm_reminder(reminder.interval());
        }
    }

    fn handle_event(&mut self, event: SessionEvent) -> Option<ExitReason> {
        match event {
            SessionEvent::Update(update) => self.handle_update(update),
            SessionEvent::TimeoutFired { generation } => {
                if !self.timers.is_current(TimerKind::Timeout, generation) {
                    debug!("Ignoring stale timeout (generation {})", generation);
                    return None;
                }
                Some(ExitReason::Timeout)
            }
            SessionEvent::CountdownTick {
                generation,
                remaining_secs,
            } => {
                if !self.timers.is_current(TimerKind::Countdown, generation) {
                    return None;
                }
                if remaining_secs == 0 {
                    return Some(ExitReason::Timeout);
                }
                if let Some((template, text)) = &mut self.countdown {
                    *text = template.render(remaining_secs);
                }
                None
            }
            SessionEvent::ReminderFired { generation } => {
                if !self.timers.is_current(TimerKind::Reminder, generation) {
                    return None;
                }
                self.reminders_fired += 1;
                if let Some(reminder) = &self.options.reminder {
                    info!("Reminding user (silent: {})", reminder.silent);
                    if reminder.repeat_reminder {
                        self.timers.arm_reminder(reminder.interval());
                    }
                }
                None
            }
            SessionEvent::Interrupt => Some(ExitReason::ReceivedSigInt),
        }
    }

    fn handle_update(&mut self, update: UpdateEvent) -> Option<ExitReason> {
        if self.options.echo_events {
            match serde_json::to_string(&update) {
                Ok(json) => eprintln!("{}", json),
                Err(e) => warn!("Failed to serialize update event: {}", e),
            }
        }

        match update {
            UpdateEvent::Progress { state } => {
                let completed = state.is_completed();
                self.progress = Some(state);
                if completed {
                    return self.complete_progress();
                }
                None
            }
            UpdateEvent::Finished {
                channel: ChannelKind::Progress,
            } => self.complete_progress(),
            UpdateEvent::Finished {
                channel: ChannelKind::WarningButton,
            } => None,
            UpdateEvent::WarningButton {
                is_visible,
                is_expanded,
            } => {
                self.warning_button = Some(WarningButtonState {
                    is_visible,
                    is_expanded,
                });
                None
            }
        }
    }

    fn complete_progress(&mut self) -> Option<ExitReason> {
        let state = self.progress.as_mut()?;
        state.percent = 100.0;
        state.is_indeterminate = false;
        if state.exit_on_completion {
            return Some(ExitReason::MainButtonClicked);
        }
        debug!("Progress completed, waiting for user");
        None
    }

    fn write_outputs<W: Write>(&self, out: &mut W) -> Result<()> {
        for (view, output) in self.views.iter().zip(&self.outputs) {
            if let Some(line) = view.exit_output(output) {
                writeln!(out, "{}", line).context("Failed to write output")?;
            }
        }
        out.flush()?;
        Ok(())
    }
}

/// Forward Ctrl-C to the session.
pub fn forward_interrupts(tx: UnboundedSender<SessionEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = tx.send(SessionEvent::Interrupt);
            }
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
    })
}
