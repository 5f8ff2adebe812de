use crate::session::SessionStatus;
use crate::trial::TrialState;

/// Render data for the response button and the surrounding text.
///
/// The sequencer never touches the UI; the presentation layer derives a cue
/// from the observable state and draws that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonCue {
    /// Session not started: button invites the first click.
    Ready,
    /// Random delay elapsing: button dark and disabled.
    Wait,
    /// Stimulus visible: click now.
    Go,
    /// Session over.
    Done,
}

impl ButtonCue {
    pub fn for_state(state: TrialState, status: SessionStatus) -> Self {
        if status == SessionStatus::Ended {
            return ButtonCue::Done;
        }
        match state {
            TrialState::Idle => ButtonCue::Ready,
            TrialState::Waiting => ButtonCue::Wait,
            TrialState::Armed => ButtonCue::Go,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ButtonCue::Ready => "Click when ready",
            ButtonCue::Wait => "Wait...",
            ButtonCue::Go => "Click NOW!",
            ButtonCue::Done => "Test Completed",
        }
    }

    pub fn instruction(&self) -> &'static str {
        match self {
            ButtonCue::Ready => "Wait for the signal then click as fast as you can!",
            ButtonCue::Wait => "Get ready...",
            ButtonCue::Go => "Now!",
            ButtonCue::Done => "Test is over, thank you for participating.",
        }
    }

    /// Button fill, RGBA.
    pub fn fill(&self) -> [u8; 4] {
        match self {
            ButtonCue::Ready => [128, 128, 128, 255],
            ButtonCue::Wait => [90, 90, 90, 255],
            ButtonCue::Go => [200, 0, 0, 255],
            ButtonCue::Done => [70, 70, 70, 255],
        }
    }

    /// Whether a click on the button means anything in this state.
    pub fn is_enabled(&self) -> bool {
        matches!(self, ButtonCue::Ready | ButtonCue::Go)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cue_follows_trial_state_while_running() {
        let running = SessionStatus::Running;
        assert_eq!(
            ButtonCue::for_state(TrialState::Idle, running),
            ButtonCue::Ready
        );
        assert_eq!(
            ButtonCue::for_state(TrialState::Waiting, running),
            ButtonCue::Wait
        );
        assert_eq!(
            ButtonCue::for_state(TrialState::Armed, running),
            ButtonCue::Go
        );
    }

    #[test]
    fn ended_session_wins_over_trial_state() {
        for state in [TrialState::Idle, TrialState::Waiting, TrialState::Armed] {
            assert_eq!(
                ButtonCue::for_state(state, SessionStatus::Ended),
                ButtonCue::Done
            );
        }
    }

    #[test]
    fn only_ready_and_go_accept_clicks() {
        assert!(ButtonCue::Ready.is_enabled());
        assert!(ButtonCue::Go.is_enabled());
        assert!(!ButtonCue::Wait.is_enabled());
        assert!(!ButtonCue::Done.is_enabled());
    }
}
