/// Trial state machine states
///
/// A trial is one wait-then-respond cycle. `Waiting` means the random delay
/// is elapsing and the button is dark; `Armed` means the stimulus is visible
/// and a click counts as a timed response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialState {
    Idle,
    Waiting,
    Armed,
}
