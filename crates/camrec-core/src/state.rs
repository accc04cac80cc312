//! Recording state machine.
//!
//! Evaluated once per drawn frame against the "recording requested" flag:
//!
//! | Current   | requested | not requested |
//! |-----------|-----------|---------------|
//! | `Off`     | `Start` → `On`  | stay `Off` |
//! | `Resumed` | `Rebind` → `On` | `Stop` → `Off` |
//! | `On`      | stay `On`       | `Stop` → `Off` |

use crate::error::CoordinatorError;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RecordingState {
    Off,
    /// A session survived a GPU context re-creation and still points at the old context.
    Resumed,
    On,
}

/// Encoder command implied by a state transition.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Transition {
    Stay,
    Start,
    Rebind,
    Stop,
}

impl RecordingState {
    /// State picked when a new GPU context appears.
    pub fn initial(encoder_recording: bool) -> Self {
        if encoder_recording { Self::Resumed } else { Self::Off }
    }

    /// Returns the encoder command and the state that follows it.
    pub fn transition(self, requested: bool) -> (Transition, RecordingState) {
        match (self, requested) {
            (Self::Off, true) => (Transition::Start, Self::On),
            (Self::Off, false) => (Transition::Stay, Self::Off),
            (Self::Resumed, true) => (Transition::Rebind, Self::On),
            (Self::Resumed, false) => (Transition::Stop, Self::Off),
            (Self::On, true) => (Transition::Stay, Self::On),
            (Self::On, false) => (Transition::Stop, Self::Off),
        }
    }
}

/// Transition from an optional state; `None` means no surface was ever created.
pub fn step(
    state: Option<RecordingState>,
    requested: bool,
) -> Result<(Transition, RecordingState), CoordinatorError> {
    state
        .map(|s| s.transition(requested))
        .ok_or(CoordinatorError::UnknownRecordingState)
}
