use super::config::SessionConfig;
use rand::Rng;
use rtq_core::{ButtonCue, Session, SessionStatus, TrialState};
use rtq_timing::{Deadline, Timer};

/// Transitions the host loop should know about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    StimulusShown,
    SessionEnded,
}

/// Drives the wait-then-respond trial cycle and the overall session clock.
///
/// All transitions happen on the caller's thread: the host loop polls
/// `update()` once per frame and forwards clicks to `on_click()`. The
/// sequencer never blocks; pending work is a `Deadline` it owns and can drop.
pub struct TrialSequencer<T, R>
where
    T: Timer,
    R: Rng,
{
    pub timer: T,
    rng: R,
    config: SessionConfig,
    session: Session,
    state: TrialState,
    reveal: Option<Deadline>,
    armed_at_ns: Option<u64>,
    session_end: Deadline,
    last_reaction_ms: Option<u64>,
}

impl<T, R> TrialSequencer<T, R>
where
    T: Timer<Timestamp = u64>,
    R: Rng,
{
    pub fn new(config: SessionConfig, timer: T, rng: R) -> Self {
        let now_ns = timer.now();
        let session_end = Deadline::after_ms(now_ns, config.session_duration_ms);
        Self {
            timer,
            rng,
            config,
            session: Session::new(now_ns),
            state: TrialState::Idle,
            reveal: None,
            armed_at_ns: None,
            session_end,
            last_reaction_ms: None,
        }
    }

    /// Starts the first trial. Only meaningful from `Idle` while the session
    /// runs; returns the sampled delay, or `None` if nothing happened.
    pub fn start_trial(&mut self) -> Option<u64> {
        if !self.session.is_running() || self.state != TrialState::Idle {
            return None;
        }
        Some(self.begin_wait())
    }

    /// Per-frame poll. Fires the session-duration expiry and the stimulus
    /// reveal, in that priority order. No-op once the session has ended.
    pub fn update(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if !self.session.is_running() {
            return events;
        }

        let now_ns = self.timer.now();
        if self.session_end.is_due(now_ns) {
            self.end_session();
            events.push(SessionEvent::SessionEnded);
            return events;
        }

        if self.state == TrialState::Waiting {
            if let Some(reveal) = self.reveal {
                if reveal.is_due(now_ns) {
                    self.reveal = None;
                    self.armed_at_ns = Some(now_ns);
                    self.state = TrialState::Armed;
                    events.push(SessionEvent::StimulusShown);
                }
            }
        }

        events
    }

    /// Handles a participant click. Records a reaction time only in `Armed`;
    /// clicks in any other state are ignored without touching the session.
    pub fn on_click(&mut self) -> Option<u64> {
        if !self.session.is_running() || self.state != TrialState::Armed {
            return None;
        }

        let now_ns = self.timer.now();
        let armed_at = self.armed_at_ns.unwrap_or(now_ns);
        let reaction_ms = self.timer.elapsed_since(armed_at).as_millis() as u64;

        self.session.record(reaction_ms);
        self.last_reaction_ms = Some(reaction_ms);
        self.begin_wait();

        Some(reaction_ms)
    }

    /// Ends the session: cancels the pending reveal and marks the session
    /// terminal. Idempotent; true only on the first call, which is the
    /// caller's signal to export.
    pub fn end_session(&mut self) -> bool {
        self.reveal = None;
        self.armed_at_ns = None;
        self.state = TrialState::Idle;
        self.session.end()
    }

    fn begin_wait(&mut self) -> u64 {
        let (min_ms, max_ms) = self.config.wait_range_ms;
        let delay_ms = self.rng.random_range(min_ms..=max_ms);
        self.reveal = Some(Deadline::after_ms(self.timer.now(), delay_ms));
        self.armed_at_ns = None;
        self.state = TrialState::Waiting;
        delay_ms
    }

    pub fn state(&self) -> TrialState {
        self.state
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }

    pub fn cue(&self) -> ButtonCue {
        ButtonCue::for_state(self.state, self.session.status())
    }

    pub fn reaction_times_ms(&self) -> &[u64] {
        self.session.reaction_times_ms()
    }

    pub fn last_reaction_ms(&self) -> Option<u64> {
        self.last_reaction_ms
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtq_timing::ManualTimer;

    fn sequencer(
        wait_range_ms: (u64, u64),
        session_duration_ms: u64,
    ) -> TrialSequencer<ManualTimer, rand::rngs::ThreadRng> {
        let config = SessionConfig {
            wait_range_ms,
            session_duration_ms,
        };
        TrialSequencer::new(config, ManualTimer::new(), rand::rng())
    }

    #[test]
    fn clicks_before_the_stimulus_never_record() {
        let mut seq = sequencer((1000, 1000), 120_000);

        assert_eq!(seq.on_click(), None);
        assert_eq!(seq.state(), TrialState::Idle);

        assert_eq!(seq.start_trial(), Some(1000));
        assert_eq!(seq.state(), TrialState::Waiting);
        assert_eq!(seq.on_click(), None);
        assert_eq!(seq.on_click(), None);

        assert!(seq.reaction_times_ms().is_empty());
        assert_eq!(seq.state(), TrialState::Waiting);
    }

    #[test]
    fn armed_click_records_one_value_and_rewaits() {
        let mut seq = sequencer((0, 0), 120_000);
        seq.start_trial();

        assert_eq!(seq.update(), vec![SessionEvent::StimulusShown]);
        assert_eq!(seq.state(), TrialState::Armed);

        seq.timer.advance_ms(250);
        assert_eq!(seq.on_click(), Some(250));
        assert_eq!(seq.reaction_times_ms(), &[250]);
        assert_eq!(seq.last_reaction_ms(), Some(250));
        assert_eq!(seq.state(), TrialState::Waiting);
    }

    #[test]
    fn three_cycles_keep_recorded_order() {
        let mut seq = sequencer((0, 0), 120_000);
        seq.start_trial();

        for rt in [300u64, 450, 220] {
            assert_eq!(seq.update(), vec![SessionEvent::StimulusShown]);
            seq.timer.advance_ms(rt);
            assert_eq!(seq.on_click(), Some(rt));
        }

        assert_eq!(seq.reaction_times_ms(), &[300, 450, 220]);
    }

    #[test]
    fn sampled_delay_stays_within_the_configured_bounds() {
        for _ in 0..200 {
            let mut seq = sequencer((3000, 6000), 120_000);
            let delay = seq.start_trial().unwrap();
            assert!((3000..=6000).contains(&delay), "delay {} out of range", delay);
        }
    }

    #[test]
    fn session_expires_with_no_clicks() {
        let mut seq = sequencer((3000, 6000), 1000);

        seq.timer.advance_ms(999);
        assert_eq!(seq.update(), vec![]);
        seq.timer.advance_ms(1);
        assert_eq!(seq.update(), vec![SessionEvent::SessionEnded]);

        assert_eq!(seq.status(), SessionStatus::Ended);
        assert!(seq.reaction_times_ms().is_empty());
        assert_eq!(seq.update(), vec![]);
    }

    #[test]
    fn session_expiry_wins_even_while_armed() {
        let mut seq = sequencer((0, 0), 1000);
        seq.start_trial();
        seq.update();
        assert_eq!(seq.state(), TrialState::Armed);

        seq.timer.advance_ms(1000);
        assert_eq!(seq.update(), vec![SessionEvent::SessionEnded]);
        assert_eq!(seq.on_click(), None);
        assert!(seq.reaction_times_ms().is_empty());
    }

    #[test]
    fn end_session_is_idempotent() {
        let mut seq = sequencer((0, 0), 120_000);
        seq.start_trial();
        seq.update();
        seq.timer.advance_ms(180);
        seq.on_click();

        assert!(seq.end_session());
        assert!(!seq.end_session());
        assert_eq!(seq.reaction_times_ms(), &[180]);
    }

    #[test]
    fn ending_cancels_the_pending_reveal() {
        let mut seq = sequencer((1000, 1000), 120_000);
        seq.start_trial();
        assert!(seq.end_session());

        seq.timer.advance_ms(2000);
        assert_eq!(seq.update(), vec![]);
        assert_eq!(seq.cue(), ButtonCue::Done);
        assert_eq!(seq.on_click(), None);
    }

    #[test]
    fn start_trial_refuses_outside_idle() {
        let mut seq = sequencer((0, 0), 120_000);
        assert!(seq.start_trial().is_some());
        assert_eq!(seq.start_trial(), None);

        seq.update();
        assert_eq!(seq.state(), TrialState::Armed);
        assert_eq!(seq.start_trial(), None);

        seq.end_session();
        assert_eq!(seq.start_trial(), None);
    }
}
