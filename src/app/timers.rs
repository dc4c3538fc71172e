//! Cancellable timers posting into the session event queue
//!
//! Every armed timer carries a generation number. Re-arming or cancelling a
//! timer aborts its task and bumps the generation, so an event already queued
//! by a superseded timer can be recognised and ignored.

use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use super::events::SessionEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Timeout,
    Countdown,
    Reminder,
}

#[derive(Default)]
struct Slot {
    generation: u64,
    task: Option<JoinHandle<()>>,
}

impl Slot {
    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.generation += 1;
    }

    fn rearm(&mut self) -> u64 {
        self.cancel();
        self.generation
    }
}

pub struct Timers {
    tx: UnboundedSender<SessionEvent>,
    timeout: Slot,
    countdown: Slot,
    reminder: Slot,
}

impl Timers {
    pub fn new(tx: UnboundedSender<SessionEvent>) -> Self {
        Self {
            tx,
            timeout: Slot::default(),
            countdown: Slot::default(),
            reminder: Slot::default(),
        }
    }

    fn slot_mut(&mut self, kind: TimerKind) -> &mut Slot {
        match kind {
            TimerKind::Timeout => &mut self.timeout,
            TimerKind::Countdown => &mut self.countdown,
            TimerKind::Reminder => &mut self.reminder,
        }
    }

    /// One-shot timeout
    pub fn arm_timeout(&mut self, after: Duration) -> u64 {
        let generation = self.timeout.rearm();
        let tx = self.tx.clone();
        self.timeout.task = Some(tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = tx.send(SessionEvent::TimeoutFired { generation });
        }));
        tracing::debug!("Timeout armed for {:?} (generation {})", after, generation);
        generation
    }

    /// Ticks once per second with the seconds left until `total_secs` elapse.
    pub fn arm_countdown(&mut self, total_secs: u64) -> u64 {
        let generation = self.countdown.rearm();
        let tx = self.tx.clone();
        self.countdown.task = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // first tick completes immediately
            interval.tick().await;
            for remaining_secs in (0..total_secs).rev() {
                interval.tick().await;
                let event = SessionEvent::CountdownTick {
                    generation,
                    remaining_secs,
                };
                if tx.send(event).is_err() {
                    break;
                }
            }
        }));
        generation
    }

    /// One-shot reminder; the session re-arms it for repeating reminders.
    pub fn arm_reminder(&mut self, after: Duration) -> u64 {
        let generation = self.reminder.rearm();
        let tx = self.tx.clone();
        self.reminder.task = Some(tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = tx.send(SessionEvent::ReminderFired { generation });
        }));
        generation
    }

    pub fn cancel(&mut self, kind: TimerKind) {
        self.slot_mut(kind).cancel();
    }

    pub fn cancel_all(&mut self) {
        self.timeout.cancel();
        self.countdown.cancel();
        self.reminder.cancel();
    }

    /// Whether an event with `generation` comes from the live timer.
    pub fn is_current(&self, kind: TimerKind, generation: u64) -> bool {
        let slot = match kind {
            TimerKind::Timeout => &self.timeout,
            TimerKind::Countdown => &self.countdown,
            TimerKind::Reminder => &self.reminder,
        };
        slot.task.is_some() && slot.generation == generation
    }
}

impl Drop for Timers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timers = Timers::new(tx);
        let generation = timers.arm_timeout(Duration::from_secs(5));

        let event = rx.recv().await.unwrap();
        assert_eq!(event, SessionEvent::TimeoutFired { generation });
        assert!(timers.is_current(TimerKind::Timeout, generation));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_supersedes_previous_timer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timers = Timers::new(tx);
        let first = timers.arm_timeout(Duration::from_secs(5));
        let second = timers.arm_timeout(Duration::from_secs(10));
        assert_ne!(first, second);
        assert!(!timers.is_current(TimerKind::Timeout, first));

        let event = rx.recv().await.unwrap();
        assert_eq!(event, SessionEvent::TimeoutFired { generation: second });

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timers = Timers::new(tx);
        let generation = timers.arm_reminder(Duration::from_secs(2));
        timers.cancel(TimerKind::Reminder);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(rx.try_recv().is_err());
        assert!(!timers.is_current(TimerKind::Reminder, generation));
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_ticks() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timers = Timers::new(tx);
        let generation = timers.arm_countdown(3);

        let mut remaining = Vec::new();
        for _ in 0..3 {
            match rx.recv().await.unwrap() {
                SessionEvent::CountdownTick {
                    generation: g,
                    remaining_secs,
                } => {
                    assert_eq!(g, generation);
                    remaining.push(remaining_secs);
                }
                other => panic!("unexpected event {:?}", other),
            }
        }
        assert_eq!(remaining, vec![2, 1, 0]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut timers = Timers::new(tx);
        timers.arm_timeout(Duration::from_secs(1));
        timers.arm_countdown(10);
        timers.arm_reminder(Duration::from_secs(1));
        timers.cancel_all();

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(rx.try_recv().is_err());
    }
}
