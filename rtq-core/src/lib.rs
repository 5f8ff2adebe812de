pub mod cue;
pub mod session;
pub mod trial;

pub use cue::ButtonCue;
pub use session::{Session, SessionStatus};
pub use trial::TrialState;
