use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::types::EngineEvent;
use crate::config::StreamingConfig;
use crate::utils::MediaError;

/// MIME type a media element must accept to open an adaptive manifest natively
pub const ADAPTIVE_MANIFEST_MIME: &str = "application/vnd.apple.mpegurl";

/// The playback surface of one feed item.
///
/// Implementations wrap whatever the platform renders video with. All calls
/// happen from the owning item controller; `play` is the only operation that
/// may settle later (and may be rejected, e.g. by an autoplay policy).
#[async_trait]
pub trait MediaElement: Send + Sync {
    fn set_source(&self, url: &str);
    fn clear_source(&self);
    fn set_poster(&self, url: &str);
    fn set_loop(&self, looping: bool);
    fn can_play_type(&self, mime: &str) -> bool;

    async fn play(&self) -> Result<(), MediaError>;
    fn pause(&self);
    fn is_paused(&self) -> bool;

    fn set_muted(&self, muted: bool);
    fn is_muted(&self) -> bool;

    fn current_time(&self) -> Duration;
    /// `None` until the media's duration is known
    fn duration(&self) -> Option<Duration>;
    fn set_current_time(&self, position: Duration) -> Result<(), MediaError>;

    fn playback_rate(&self) -> f64;
    fn set_playback_rate(&self, rate: f64) -> Result<(), MediaError>;
}

/// An in-process adaptive bitrate engine bound to one media element
pub trait AdaptiveEngine: Send {
    fn load_source(&mut self, url: &str);
    fn attach_media(&mut self, element: Arc<dyn MediaElement>);
    /// Restart segment loading after a fatal network error
    fn start_load(&mut self);
    /// Try to recover from a fatal media/decode error
    fn recover_media_error(&mut self);
    /// Release network and decoder resources; the engine is unusable afterwards
    fn destroy(&mut self);
}

pub type EngineEventCallback = Box<dyn Fn(EngineEvent) + Send + Sync>;

pub trait AdaptiveEngineFactory: Send + Sync {
    /// Whether the engine can run in this process at all
    fn is_supported(&self) -> bool;

    fn create(
        &self,
        config: &StreamingConfig,
        on_event: EngineEventCallback,
    ) -> Box<dyn AdaptiveEngine>;
}
