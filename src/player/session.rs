use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::resolver::{EngineEventSink, EngineOutcome, StreamResolver};
use super::telemetry::{PlaybackTelemetry, TelemetrySnapshot};
use super::traits::{AdaptiveEngineFactory, MediaElement};
use super::types::{EngineEvent, LoadState, MediaEvent, TransportMode};
use crate::config::{Config, PlaybackConfig};
use crate::gesture::MediaPosition;
use crate::models::{AttachmentId, VideoRecord};
use crate::utils::MediaError;

/// Message shown for a record that cannot be played
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load video";

/// Returned when the element should be asked to play.
///
/// `play` settles asynchronously, so the session leaves issuing it to its host.
#[must_use = "a requested play has to be issued on the media element"]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayRequest;

/// Observable state of one session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub video_id: crate::models::VideoId,
    pub transport: TransportMode,
    pub load_state: LoadState,
    pub is_active: bool,
    pub is_playing: bool,
    pub is_muted: bool,
    pub is_liked: bool,
    /// 0-100
    pub progress: f64,
    pub playback_rate: f64,
    pub error: Option<String>,
}

/// Playback state of one mounted feed item.
///
/// Translates the feed's active flag into play/pause on the element, exposes
/// the imperative controls and owns the stream resolver. It has no notion of
/// which item in the feed is active; that is decided by the feed.
pub struct PlaybackSession {
    element: Arc<dyn MediaElement>,
    resolver: StreamResolver,
    telemetry: PlaybackTelemetry,
    playback: PlaybackConfig,
    record: VideoRecord,
    transport: TransportMode,
    load_state: LoadState,
    is_active: bool,
    is_muted: bool,
    is_liked: bool,
    playback_rate: f64,
    error: Option<String>,
}

impl PlaybackSession {
    pub fn new(
        record: VideoRecord,
        element: Arc<dyn MediaElement>,
        engines: Arc<dyn AdaptiveEngineFactory>,
        config: &Config,
        sink: EngineEventSink,
    ) -> Self {
        element.set_loop(config.playback.loop_playback);

        let resolver = StreamResolver::new(
            element.clone(),
            engines,
            config.streaming.clone(),
            sink,
        );

        let mut session = Self {
            element,
            resolver,
            telemetry: PlaybackTelemetry::new(),
            playback: config.playback.clone(),
            record: record.clone(),
            transport: TransportMode::Unavailable,
            load_state: LoadState::Loading,
            is_active: false,
            is_muted: config.playback.start_muted,
            is_liked: false,
            playback_rate: 1.0,
            error: None,
        };
        session.load_record(record);
        session
    }

    /// Attach `record`, tearing down whatever was attached before
    pub fn load_record(&mut self, record: VideoRecord) {
        debug!("Loading video {}", record.id);
        self.load_state = LoadState::Loading;
        self.error = None;
        self.is_liked = false;
        self.telemetry.reset();

        self.element.set_poster(&record.poster_url);
        self.element.set_muted(self.is_muted);

        self.transport = self.resolver.attach(&record);
        self.record = record;

        if self.transport == TransportMode::Unavailable {
            self.fail(LOAD_FAILED_MESSAGE.to_string());
        }
    }

    pub fn record(&self) -> &VideoRecord {
        &self.record
    }

    pub fn element(&self) -> Arc<dyn MediaElement> {
        self.element.clone()
    }

    pub fn transport(&self) -> TransportMode {
        self.transport
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn current_attachment(&self) -> Option<AttachmentId> {
        self.resolver.current_attachment()
    }

    /// React to the feed marking this item active or inactive
    pub fn set_active(&mut self, active: bool) -> Option<PlayRequest> {
        if active == self.is_active {
            return None;
        }
        self.is_active = active;

        if active {
            debug!("Video {} became active", self.record.id);
            if self.load_state.is_error() {
                return None;
            }
            Some(PlayRequest)
        } else {
            debug!("Video {} became inactive", self.record.id);
            self.element.pause();
            self.refresh();
            None
        }
    }

    /// Outcome of a play issued earlier on the element
    pub fn on_play_settled(&mut self, result: Result<(), MediaError>) {
        match result {
            Ok(()) if !self.is_active => {
                // Deactivated while the play was pending
                debug!("Play settled on inactive video {}, pausing", self.record.id);
                self.element.pause();
            }
            Ok(()) => {}
            Err(e) => warn!("Error playing video {}: {}", self.record.id, e),
        }
        self.refresh();
    }

    pub fn toggle_play(&mut self) -> Option<PlayRequest> {
        if !self.is_active {
            debug!("Ignoring play toggle on inactive video {}", self.record.id);
            return None;
        }
        if self.load_state.is_error() {
            return None;
        }

        if self.element.is_paused() {
            Some(PlayRequest)
        } else {
            self.element.pause();
            self.refresh();
            None
        }
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.is_muted = !self.is_muted;
        self.element.set_muted(self.is_muted);
        self.is_muted
    }

    pub fn toggle_like(&mut self) -> bool {
        self.is_liked = !self.is_liked;
        self.is_liked
    }

    pub fn like(&mut self) {
        self.is_liked = true;
    }

    /// Set the playback rate, clamped to the configured speed range
    pub fn set_speed(&mut self, rate: f64) -> f64 {
        let clamped = self.playback.clamp_speed(rate);
        match self.element.set_playback_rate(clamped) {
            Ok(()) => self.playback_rate = clamped,
            Err(e) => warn!("Failed to set playback rate: {}", e),
        }
        self.playback_rate
    }

    /// Move the playback position, clamped to the media's bounds
    pub fn seek_to(&mut self, position: Duration) {
        let target = match self.element.duration() {
            Some(total) => position.min(total),
            None => position,
        };
        if let Err(e) = self.element.set_current_time(target) {
            warn!("Failed to seek: {}", e);
        }
        self.refresh();
    }

    pub fn position(&self) -> MediaPosition {
        MediaPosition {
            current: self.element.current_time(),
            duration: self.element.duration(),
        }
    }

    pub fn handle_media_event(&mut self, event: MediaEvent) -> Option<PlayRequest> {
        match event {
            MediaEvent::LoadedMetadata | MediaEvent::LoadedData => {
                if self.load_state == LoadState::Loading && self.resolver.is_ready_signal(&event) {
                    return self.mark_ready();
                }
            }
            MediaEvent::Waiting => {
                if self.load_state == LoadState::Ready {
                    self.load_state = LoadState::Buffering;
                }
            }
            MediaEvent::Playing => {
                if self.load_state == LoadState::Buffering {
                    self.load_state = LoadState::Ready;
                }
                self.resolver.reset_recovery_budget();
                self.refresh();
            }
            MediaEvent::Pause | MediaEvent::TimeUpdate => {
                self.refresh();
            }
            MediaEvent::Error(message) => {
                if self.resolver.element_errors_are_terminal() {
                    self.fail(MediaError::Source(message).to_string());
                } else {
                    warn!("Media element error ignored: {}", message);
                }
            }
        }
        None
    }

    pub fn handle_engine_event(
        &mut self,
        attachment: AttachmentId,
        event: EngineEvent,
    ) -> Option<PlayRequest> {
        match self.resolver.handle_engine_event(attachment, event) {
            EngineOutcome::Ready if self.load_state == LoadState::Loading => self.mark_ready(),
            EngineOutcome::Failed(details) => {
                self.fail(details);
                None
            }
            EngineOutcome::Ready | EngineOutcome::Ignored | EngineOutcome::Recovering => None,
        }
    }

    /// Pause and release the transport; used when the item unmounts
    pub fn teardown(&mut self) {
        debug!("Tearing down session for video {}", self.record.id);
        self.is_active = false;
        self.element.pause();
        self.resolver.detach();
    }

    pub fn telemetry(&self) -> TelemetrySnapshot {
        self.telemetry.latest()
    }

    pub fn state(&self) -> SessionState {
        let telemetry = self.telemetry.latest();
        SessionState {
            video_id: self.record.id,
            transport: self.transport,
            load_state: self.load_state,
            is_active: self.is_active,
            is_playing: telemetry.is_playing,
            is_muted: self.is_muted,
            is_liked: self.is_liked,
            progress: telemetry.progress,
            playback_rate: self.playback_rate,
            error: self.error.clone(),
        }
    }

    fn mark_ready(&mut self) -> Option<PlayRequest> {
        info!("Video {} ready", self.record.id);
        self.load_state = LoadState::Ready;
        self.is_active.then_some(PlayRequest)
    }

    fn fail(&mut self, message: String) {
        error!("Video {} failed: {}", self.record.id, message);
        self.load_state = LoadState::Error;
        self.error = Some(message);
        self.element.pause();
        self.resolver.detach();
        self.refresh();
    }

    fn refresh(&mut self) {
        self.telemetry.sample(self.element.as_ref());
    }
}
