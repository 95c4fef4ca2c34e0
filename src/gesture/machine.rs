use std::time::{Duration, Instant};
use tracing::{debug, trace};

use super::types::{
    GestureEffect, GestureEvent, GestureOutput, GestureOverlay, GesturePhase, MediaPosition,
    TimerToken, TouchTarget,
};
use crate::config::{GestureConfig, LongPressMode};

/// Position and length captured when scrubbing starts
#[derive(Debug, Clone, Copy, PartialEq)]
struct ScrubAnchor {
    origin: Duration,
    total: Duration,
}

/// Touch gesture reducer for one feed item.
///
/// Pure state transitions: every call takes an event and returns the effects
/// the host has to apply (timers, seeks, rate changes, overlays). The host
/// owns the arming timer and reports its firing back with the token it was
/// scheduled with; a token that is no longer pending is ignored.
#[derive(Debug)]
pub struct GestureMachine {
    config: GestureConfig,
    phase: GesturePhase,
    start_x: f64,
    start_y: f64,
    start_time: Option<Instant>,
    moved: bool,
    pending_timer: Option<TimerToken>,
    next_token: u64,
    last_tap: Option<Instant>,
    scrub: Option<ScrubAnchor>,
}

impl GestureMachine {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            phase: GesturePhase::Idle,
            start_x: 0.0,
            start_y: 0.0,
            start_time: None,
            moved: false,
            pending_timer: None,
            next_token: 0,
            last_tap: None,
            scrub: None,
        }
    }

    pub fn phase(&self) -> GesturePhase {
        self.phase
    }

    pub fn mode(&self) -> LongPressMode {
        self.config.long_press_mode
    }

    pub fn last_tap(&self) -> Option<Instant> {
        self.last_tap
    }

    pub fn handle(&mut self, event: GestureEvent) -> GestureOutput {
        match event {
            GestureEvent::TouchStart { x, y, at, target } => self.on_touch_start(x, y, at, target),
            GestureEvent::TouchMove { x, y } => self.on_touch_move(x, y),
            GestureEvent::TouchEnd { at } => self.on_touch_end(Some(at)),
            GestureEvent::TouchCancel => self.on_touch_end(None),
            GestureEvent::ArmTimerFired { token, media } => self.on_timer_fired(token, media),
        }
    }

    fn on_touch_start(&mut self, x: f64, y: f64, at: Instant, target: TouchTarget) -> GestureOutput {
        if target == TouchTarget::Control {
            trace!("Touch landed on a control, leaving it to the control");
            return GestureOutput::ignored();
        }

        let mut effects = Vec::new();
        if self.phase != GesturePhase::Idle {
            // A new finger while a gesture is live ends the previous one without a tap
            self.finish(&mut effects);
        }

        let token = self.issue_token();
        self.phase = GesturePhase::ArmingLongPress;
        self.start_x = x;
        self.start_y = y;
        self.start_time = Some(at);
        self.moved = false;
        self.pending_timer = Some(token);

        effects.push(GestureEffect::ScheduleArmTimer {
            token,
            delay: self.config.long_press_delay(),
        });
        GestureOutput::consumed(effects)
    }

    fn on_touch_move(&mut self, x: f64, y: f64) -> GestureOutput {
        let delta_x = x - self.start_x;

        match self.phase {
            GesturePhase::Idle => GestureOutput::ignored(),
            GesturePhase::ArmingLongPress => {
                let mut effects = Vec::new();
                let distance = delta_x.hypot(y - self.start_y);
                if !self.moved && distance > self.config.tap_slop_px {
                    self.moved = true;
                    if let Some(token) = self.pending_timer.take() {
                        effects.push(GestureEffect::CancelArmTimer { token });
                    }
                }
                GestureOutput::consumed(effects)
            }
            GesturePhase::Scrubbing => {
                let Some(anchor) = self.scrub else {
                    return GestureOutput::consumed(Vec::new());
                };
                let position = scrub_target(
                    anchor.origin,
                    anchor.total,
                    delta_x,
                    self.config.scrub_px_per_second,
                );
                GestureOutput::consumed(vec![
                    GestureEffect::SeekTo(position),
                    GestureEffect::ShowOverlay(GestureOverlay::Scrub {
                        position,
                        total: anchor.total,
                    }),
                ])
            }
            GesturePhase::FastForwarding => {
                let rate = ramp_rate(delta_x, self.config.ramp_px_per_step, self.config.max_ramp_rate);
                GestureOutput::consumed(vec![
                    GestureEffect::SetRate(rate),
                    GestureEffect::ShowOverlay(GestureOverlay::Speed { rate }),
                ])
            }
        }
    }

    /// `at` is `None` for a cancelled touch, which never counts as a tap
    fn on_touch_end(&mut self, at: Option<Instant>) -> GestureOutput {
        if self.phase == GesturePhase::Idle {
            return GestureOutput::ignored();
        }

        let is_tap = self.phase == GesturePhase::ArmingLongPress && !self.moved;
        let mut effects = Vec::new();
        self.finish(&mut effects);

        if let (true, Some(at)) = (is_tap, at) {
            self.tap(at, &mut effects);
        }

        GestureOutput::consumed(effects)
    }

    fn on_timer_fired(&mut self, token: TimerToken, media: MediaPosition) -> GestureOutput {
        if self.phase != GesturePhase::ArmingLongPress || self.pending_timer != Some(token) {
            trace!("Ignoring stale arming timer {:?}", token);
            return GestureOutput::ignored();
        }
        self.pending_timer = None;

        let overlay = match self.config.long_press_mode {
            LongPressMode::JumpToTime => {
                self.phase = GesturePhase::Scrubbing;
                self.scrub = media
                    .duration
                    .filter(|total| !total.is_zero())
                    .map(|total| ScrubAnchor {
                        origin: media.current.min(total),
                        total,
                    });
                match self.scrub {
                    Some(anchor) => GestureOverlay::Scrub {
                        position: anchor.origin,
                        total: anchor.total,
                    },
                    None => {
                        debug!("Duration unknown, scrubbing will not seek");
                        GestureOverlay::Scrub {
                            position: media.current,
                            total: Duration::ZERO,
                        }
                    }
                }
            }
            LongPressMode::RateRamp => {
                self.phase = GesturePhase::FastForwarding;
                GestureOverlay::Speed { rate: 1.0 }
            }
        };

        debug!("Long press promoted to {:?}", self.phase);
        GestureOutput::consumed(vec![GestureEffect::ShowOverlay(overlay)])
    }

    /// Tear down whatever the current interaction left behind and return to Idle
    fn finish(&mut self, effects: &mut Vec<GestureEffect>) {
        if let Some(token) = self.pending_timer.take() {
            effects.push(GestureEffect::CancelArmTimer { token });
        }

        match self.phase {
            GesturePhase::Scrubbing => effects.push(GestureEffect::HideOverlay),
            GesturePhase::FastForwarding => {
                effects.push(GestureEffect::ResetRate);
                effects.push(GestureEffect::HideOverlay);
            }
            GesturePhase::Idle | GesturePhase::ArmingLongPress => {}
        }

        self.phase = GesturePhase::Idle;
        self.start_time = None;
        self.moved = false;
        self.scrub = None;
    }

    fn tap(&mut self, at: Instant, effects: &mut Vec<GestureEffect>) {
        let is_double = self
            .last_tap
            .map(|previous| at.saturating_duration_since(previous) <= self.config.double_tap_window())
            .unwrap_or(false);
        self.last_tap = Some(at);

        if is_double {
            debug!("Double tap");
            effects.push(GestureEffect::Like);
            effects.push(GestureEffect::ShowHeart {
                duration: self.config.heart_duration(),
            });
        } else {
            trace!("Single tap");
            effects.push(GestureEffect::TogglePlay);
        }
    }

    fn issue_token(&mut self) -> TimerToken {
        self.next_token = self.next_token.wrapping_add(1);
        TimerToken(self.next_token)
    }
}

/// New playback position for a horizontal drag of `delta_x` pixels, within `[0, total]`
pub fn scrub_target(origin: Duration, total: Duration, delta_x: f64, px_per_second: f64) -> Duration {
    if !px_per_second.is_finite() || px_per_second <= 0.0 || !delta_x.is_finite() {
        return origin.min(total);
    }
    let seconds = origin.as_secs_f64() + delta_x / px_per_second;
    Duration::from_secs_f64(seconds.clamp(0.0, total.as_secs_f64()))
}

/// Playback rate for a horizontal drag of `delta_x` pixels, within `[1, max_rate]`
pub fn ramp_rate(delta_x: f64, px_per_step: f64, max_rate: f64) -> f64 {
    if !px_per_step.is_finite() || px_per_step <= 0.0 || !delta_x.is_finite() {
        return 1.0;
    }
    (1.0 + delta_x / px_per_step).clamp(1.0, max_rate.max(1.0))
}
