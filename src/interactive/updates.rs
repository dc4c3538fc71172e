//! Line interpreters for the two interactive update streams

use crate::model::ProgressState;
use crate::payload::decoder::split_directive;

use super::listener::LineInterpreter;
use super::protocol::WarningButtonState;

/// Progress bar deltas such as `/percent 40 /bottom_message Copying`
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressUpdates;

impl LineInterpreter for ProgressUpdates {
    type State = ProgressState;

    fn interpret(&self, line: &str, last: &ProgressState) -> ProgressState {
        last.apply(line)
    }
}

/// `/warning_button_visibility hidden|visible|expand`
#[derive(Debug, Clone, Copy, Default)]
pub struct WarningButtonUpdates;

impl LineInterpreter for WarningButtonUpdates {
    type State = WarningButtonState;

    fn interpret(&self, line: &str, last: &WarningButtonState) -> WarningButtonState {
        let mut state = *last;
        for segment in line.split('/') {
            let (name, value) = split_directive(segment);
            if name != "warning_button_visibility" {
                continue;
            }
            match value {
                "hidden" => {
                    state.is_visible = false;
                    state.is_expanded = false;
                }
                "visible" => {
                    state.is_visible = true;
                    state.is_expanded = false;
                }
                "expand" => {
                    state.is_visible = true;
                    state.is_expanded = true;
                }
                _ => {}
            }
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interactive::listener::{run_listener, Channel, StopToken, UpdateObserver};
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Published(Arc<Mutex<Vec<ProgressState>>>);

    impl UpdateObserver<ProgressState> for Published {
        fn did_receive_state(&mut self, state: ProgressState) {
            self.0.lock().unwrap().push(state);
        }

        fn did_finish_updates(&mut self) {}
    }

    #[test]
    fn test_progress_delta() {
        let last = ProgressState::parse(Some("/percent 10 /top_message A"), None);
        let next = ProgressUpdates.interpret("/percent 20", &last);
        assert_eq!(next.percent, 20.0);
        assert_eq!(next.top_message, "A");
    }

    #[test]
    fn test_progress_unknown_line_is_noop() {
        let last = ProgressState::parse(Some("/percent 10"), None);
        assert_eq!(ProgressUpdates.interpret("hello there", &last), last);
    }

    #[test]
    fn test_warning_button_visibility() {
        let hidden = WarningButtonState::default();
        let visible = WarningButtonUpdates.interpret("/warning_button_visibility visible", &hidden);
        assert_eq!(
            visible,
            WarningButtonState {
                is_visible: true,
                is_expanded: false
            }
        );

        let expanded = WarningButtonUpdates.interpret("/warning_button_visibility expand\n", &visible);
        assert!(expanded.is_visible && expanded.is_expanded);

        let hidden_again = WarningButtonUpdates.interpret("/warning_button_visibility hidden", &expanded);
        assert_eq!(hidden_again, WarningButtonState::default());
    }

    #[test]
    fn test_warning_button_ignores_other_directives() {
        let last = WarningButtonState {
            is_visible: true,
            is_expanded: false,
        };
        assert_eq!(WarningButtonUpdates.interpret("/percent 20", &last), last);
        assert_eq!(
            WarningButtonUpdates.interpret("/warning_button_visibility sideways", &last),
            last
        );
    }

    #[test]
    fn test_non_finite_percent_does_not_defeat_dedup() {
        let published = Published::default();
        let initial = ProgressState::parse(Some("/percent 10"), None);
        let channel = Channel::new(ProgressUpdates, initial, published.clone()).boxed();
        let input = b"/percent nan\n/percent nan\n/percent 20\n/percent 20\n".to_vec();
        run_listener(Cursor::new(input), vec![channel], StopToken::new());

        let states = published.0.lock().unwrap().clone();
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].percent, 20.0);
    }
}
