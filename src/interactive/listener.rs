//! Background reader for interactive updates on standard input
//!
//! A single thread reads stdin line by line and hands every line to each
//! registered channel. A channel turns the line into a new state relative to
//! the last one it published and notifies its observer only when the state
//! actually changed. The `end` line, or EOF, finishes every channel once.

use anyhow::{Context, Result};
use std::io::{BufRead, ErrorKind};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

use super::protocol::{frame_line, END_SENTINEL};

const RUNNING: u8 = 0;
const STOP_REQUESTED: u8 = 1;
const STOPPED: u8 = 2;

/// Lifecycle of a listener thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerState {
    Running,
    StopRequested,
    Stopped,
}

/// Cancellation token shared between a listener thread and its owner.
///
/// A pending blocking read is not interrupted: the request is observed
/// as soon as the read returns.
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    state: Arc<AtomicU8>,
}

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the listener to stop. Returns false if it was not running.
    pub fn request_stop(&self) -> bool {
        self.state
            .compare_exchange(RUNNING, STOP_REQUESTED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn state(&self) -> ListenerState {
        match self.state.load(Ordering::Acquire) {
            RUNNING => ListenerState::Running,
            STOP_REQUESTED => ListenerState::StopRequested,
            _ => ListenerState::Stopped,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == ListenerState::Running
    }

    fn mark_stopped(&self) {
        self.state.store(STOPPED, Ordering::Release);
    }
}

/// Turns an update line into a new state.
pub trait LineInterpreter: Send + 'static {
    type State: Clone + PartialEq + Send + 'static;

    fn interpret(&self, line: &str, last: &Self::State) -> Self::State;
}

/// Receives the states published by a channel.
///
/// Called on the listener thread; implementations must not block.
pub trait UpdateObserver<S>: Send + 'static {
    fn did_receive_state(&mut self, state: S);

    fn did_finish_updates(&mut self);
}

/// Type-erased channel driven by the listener loop
pub trait UpdateChannel: Send {
    fn process_line(&mut self, line: &str);

    fn finish(&mut self);
}

/// A channel pairing an interpreter with its observer and last known state.
pub struct Channel<I: LineInterpreter, O> {
    interpreter: I,
    last: I::State,
    observer: O,
}

impl<I, O> Channel<I, O>
where
    I: LineInterpreter,
    O: UpdateObserver<I::State>,
{
    pub fn new(interpreter: I, initial: I::State, observer: O) -> Self {
        Self {
            interpreter,
            last: initial,
            observer,
        }
    }

    pub fn boxed(self) -> Box<dyn UpdateChannel> {
        Box::new(self)
    }
}

impl<I, O> UpdateChannel for Channel<I, O>
where
    I: LineInterpreter,
    O: UpdateObserver<I::State>,
{
    fn process_line(&mut self, line: &str) {
        let next = self.interpreter.interpret(line, &self.last);
        if next == self.last {
            return;
        }
        self.last = next.clone();
        self.observer.did_receive_state(next);
    }

    fn finish(&mut self) {
        self.observer.did_finish_updates();
    }
}

/// Run the read loop until `end`, EOF, a read error or a stop request.
pub fn run_listener<R: BufRead>(mut reader: R, mut channels: Vec<Box<dyn UpdateChannel>>, token: StopToken) {
    let mut buf = Vec::new();

    let finished = loop {
        if !token.is_running() {
            break false;
        }

        buf.clear();
        let read = reader.read_until(b'\n', &mut buf);
        if !token.is_running() {
            break false;
        }

        match read {
            Ok(0) => {
                debug!("Update stream closed");
                break true;
            }
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!("Failed to read update stream: {}", e);
                break true;
            }
        }

        let Some(line) = frame_line(&buf) else {
            warn!("Skipping update line that is not valid UTF-8");
            continue;
        };
        if line == END_SENTINEL {
            info!("Interactive updates ended");
            break true;
        }
        if line.trim().is_empty() {
            continue;
        }

        debug!("Update line: {}", line);
        for channel in channels.iter_mut() {
            channel.process_line(line);
        }
    };

    if finished {
        for channel in channels.iter_mut() {
            channel.finish();
        }
    }
    token.mark_stopped();
}

/// Handle to a listener running on its own thread
pub struct ListenerHandle {
    token: StopToken,
    handle: JoinHandle<()>,
}

impl ListenerHandle {
    pub fn token(&self) -> StopToken {
        self.token.clone()
    }

    pub fn stop(&self) -> bool {
        self.token.request_stop()
    }

    pub fn join(self) -> Result<()> {
        self.handle
            .join()
            .map_err(|_| anyhow::anyhow!("Update listener thread panicked"))
    }
}

/// Start a listener thread reading from `reader`.
pub fn spawn_listener<R>(reader: R, channels: Vec<Box<dyn UpdateChannel>>) -> Result<ListenerHandle>
where
    R: BufRead + Send + 'static,
{
    let token = StopToken::new();
    let thread_token = token.clone();
    let handle = std::thread::Builder::new()
        .name("interactive-updates".to_string())
        .spawn(move || run_listener(reader, channels, thread_token))
        .context("Failed to spawn update listener thread")?;

    Ok(ListenerHandle { token, handle })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Mutex;

    /// Publishes the raw line as the new state.
    struct Echo;

    impl LineInterpreter for Echo {
        type State = String;

        fn interpret(&self, line: &str, _last: &String) -> String {
            line.to_string()
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Seen {
        State(String),
        Finished,
    }

    #[derive(Clone, Default)]
    struct Recorder {
        seen: Arc<Mutex<Vec<Seen>>>,
        stop_after_first: Option<StopToken>,
    }

    impl UpdateObserver<String> for Recorder {
        fn did_receive_state(&mut self, state: String) {
            self.seen.lock().unwrap().push(Seen::State(state));
            if let Some(token) = &self.stop_after_first {
                token.request_stop();
            }
        }

        fn did_finish_updates(&mut self) {
            self.seen.lock().unwrap().push(Seen::Finished);
        }
    }

    fn run(input: &str, recorder: Recorder, token: StopToken) -> Vec<Seen> {
        let channel = Channel::new(Echo, String::new(), recorder.clone()).boxed();
        run_listener(Cursor::new(input.as_bytes().to_vec()), vec![channel], token);
        let seen = recorder.seen.lock().unwrap().clone();
        seen
    }

    #[test]
    fn test_dedup_identical_lines() {
        let seen = run("a\na\nb\n", Recorder::default(), StopToken::new());
        assert_eq!(
            seen,
            vec![
                Seen::State("a".into()),
                Seen::State("b".into()),
                Seen::Finished
            ]
        );
    }

    #[test]
    fn test_end_stops_processing() {
        let token = StopToken::new();
        let seen = run("a\nend\nb\n", Recorder::default(), token.clone());
        assert_eq!(seen, vec![Seen::State("a".into()), Seen::Finished]);
        assert_eq!(token.state(), ListenerState::Stopped);
    }

    #[test]
    fn test_end_is_case_sensitive() {
        let seen = run("END\n", Recorder::default(), StopToken::new());
        assert_eq!(seen, vec![Seen::State("END".into()), Seen::Finished]);
    }

    #[test]
    fn test_eof_finishes_once() {
        let seen = run("", Recorder::default(), StopToken::new());
        assert_eq!(seen, vec![Seen::Finished]);
    }

    #[test]
    fn test_skips_blank_and_invalid_lines() {
        let recorder = Recorder::default();
        let channel = Channel::new(Echo, String::new(), recorder.clone()).boxed();
        let mut input = b"\n".to_vec();
        input.extend_from_slice(&[0xC3, 0x28, b'\n']);
        input.extend_from_slice(b"x\n");
        run_listener(Cursor::new(input), vec![channel], StopToken::new());

        let seen = recorder.seen.lock().unwrap().clone();
        assert_eq!(seen, vec![Seen::State("x".into()), Seen::Finished]);
    }

    #[test]
    fn test_stop_before_start() {
        let token = StopToken::new();
        assert!(token.request_stop());
        assert!(!token.request_stop());
        let seen = run("a\n", Recorder::default(), token.clone());
        assert!(seen.is_empty());
        assert_eq!(token.state(), ListenerState::Stopped);
    }

    #[test]
    fn test_stop_observed_after_next_read() {
        let token = StopToken::new();
        let recorder = Recorder {
            stop_after_first: Some(token.clone()),
            ..Default::default()
        };
        let seen = run("a\nb\nc\n", recorder, token);
        assert_eq!(seen, vec![Seen::State("a".into())]);
    }

    #[test]
    fn test_fan_out_to_channels() {
        let first = Recorder::default();
        let second = Recorder::default();
        let channels = vec![
            Channel::new(Echo, String::new(), first.clone()).boxed(),
            Channel::new(Echo, "x".to_string(), second.clone()).boxed(),
        ];
        run_listener(Cursor::new(b"x\n".to_vec()), channels, StopToken::new());

        assert_eq!(
            first.seen.lock().unwrap().clone(),
            vec![Seen::State("x".into()), Seen::Finished]
        );
        assert_eq!(second.seen.lock().unwrap().clone(), vec![Seen::Finished]);
    }

    #[test]
    fn test_spawned_listener() {
        let recorder = Recorder::default();
        let channel = Channel::new(Echo, String::new(), recorder.clone()).boxed();
        let handle = spawn_listener(Cursor::new(b"hello\nend\n".to_vec()), vec![channel]).unwrap();
        let token = handle.token();
        handle.join().unwrap();

        assert_eq!(token.state(), ListenerState::Stopped);
        assert_eq!(
            recorder.seen.lock().unwrap().clone(),
            vec![Seen::State("hello".into()), Seen::Finished]
        );
    }
}
