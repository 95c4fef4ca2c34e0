//! Touch gesture interpretation for a feed item: tap to toggle playback,
//! double tap to like, long press to scrub or to ramp the playback rate.

mod machine;
mod types;

pub use machine::{GestureMachine, ramp_rate, scrub_target};
pub use types::{
    GestureEffect, GestureEvent, GestureOutput, GestureOverlay, GesturePhase, MediaPosition,
    TimerToken, TouchInput, TouchTarget,
};
