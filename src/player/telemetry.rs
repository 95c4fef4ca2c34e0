use std::time::Duration;

use super::traits::MediaElement;

/// Values derived from the element on each time update, as read by the progress bar
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TelemetrySnapshot {
    /// Percentage of the media already played, 0 when the duration is unknown
    pub progress: f64,
    pub is_playing: bool,
    pub position: Duration,
    pub duration: Option<Duration>,
}

/// Derives progress and play state from the media element.
///
/// Sampling only reads the element; it never changes playback.
#[derive(Debug, Default)]
pub struct PlaybackTelemetry {
    latest: TelemetrySnapshot,
}

impl PlaybackTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample(&mut self, element: &dyn MediaElement) -> TelemetrySnapshot {
        let position = element.current_time();
        let duration = element.duration();

        self.latest = TelemetrySnapshot {
            progress: progress_percent(position, duration),
            is_playing: !element.is_paused(),
            position,
            duration,
        };
        self.latest
    }

    pub fn latest(&self) -> TelemetrySnapshot {
        self.latest
    }

    pub fn reset(&mut self) {
        self.latest = TelemetrySnapshot::default();
    }
}

pub fn progress_percent(position: Duration, duration: Option<Duration>) -> f64 {
    match duration {
        Some(total) if !total.is_zero() => {
            (position.as_secs_f64() / total.as_secs_f64() * 100.0).clamp(0.0, 100.0)
        }
        _ => 0.0,
    }
}
