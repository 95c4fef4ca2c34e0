use std::time::{Duration, Instant};

/// Where a touch landed inside a feed item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchTarget {
    /// The video surface itself
    Surface,
    /// A control sub-region (description overlay, settings affordance, ...)
    Control,
}

/// Raw touch input as delivered by the UI layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TouchInput {
    Start { x: f64, y: f64, target: TouchTarget },
    Move { x: f64, y: f64 },
    End,
    Cancel,
}

/// Identifies one scheduled arming timer so a late firing can be recognized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(pub(crate) u64);

/// Playback position snapshot taken when a long press is promoted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaPosition {
    pub current: Duration,
    pub duration: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GestureEvent {
    TouchStart {
        x: f64,
        y: f64,
        at: Instant,
        target: TouchTarget,
    },
    TouchMove {
        x: f64,
        y: f64,
    },
    TouchEnd {
        at: Instant,
    },
    TouchCancel,
    ArmTimerFired {
        token: TimerToken,
        media: MediaPosition,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GesturePhase {
    #[default]
    Idle,
    ArmingLongPress,
    Scrubbing,
    FastForwarding,
}

/// Visual feedback shown while a long press is active
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureOverlay {
    Scrub { position: Duration, total: Duration },
    Speed { rate: f64 },
}

/// Work the host must carry out after a transition
#[derive(Debug, Clone, PartialEq)]
pub enum GestureEffect {
    ScheduleArmTimer { token: TimerToken, delay: Duration },
    CancelArmTimer { token: TimerToken },
    SeekTo(Duration),
    SetRate(f64),
    ResetRate,
    ShowOverlay(GestureOverlay),
    HideOverlay,
    TogglePlay,
    Like,
    ShowHeart { duration: Duration },
}

/// Result of feeding one event to the machine.
///
/// `consumed` events must not propagate to other listeners.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GestureOutput {
    pub consumed: bool,
    pub effects: Vec<GestureEffect>,
}

impl GestureOutput {
    pub(crate) fn ignored() -> Self {
        Self::default()
    }

    pub(crate) fn consumed(effects: Vec<GestureEffect>) -> Self {
        Self {
            consumed: true,
            effects,
        }
    }
}
