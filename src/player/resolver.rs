use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

use super::traits::{ADAPTIVE_MANIFEST_MIME, AdaptiveEngine, AdaptiveEngineFactory, MediaElement};
use super::types::{EngineErrorKind, EngineEvent, MediaEvent, TransportMode};
use crate::config::StreamingConfig;
use crate::models::{AttachmentId, VideoRecord};

/// Receives engine events tagged with the attachment that produced them
pub type EngineEventSink = Arc<dyn Fn(AttachmentId, EngineEvent) + Send + Sync>;

/// Pick the transport for a record.
///
/// Precedence: in-process adaptive engine, native adaptive playback,
/// progressive file, nothing.
pub fn select_transport(
    record: &VideoRecord,
    engine_supported: bool,
    native_adaptive: bool,
) -> TransportMode {
    select(record, engine_supported, native_adaptive)
        .map(|(mode, _)| mode)
        .unwrap_or(TransportMode::Unavailable)
}

fn select(
    record: &VideoRecord,
    engine_supported: bool,
    native_adaptive: bool,
) -> Option<(TransportMode, &str)> {
    if let Some(url) = record.adaptive_stream_url.as_deref() {
        if engine_supported {
            return Some((TransportMode::AdaptiveWorker, url));
        }
        if native_adaptive {
            return Some((TransportMode::AdaptiveNative, url));
        }
    }

    record
        .progressive_stream_url
        .as_deref()
        .map(|url| (TransportMode::Progressive, url))
}

/// Owns one engine instance; dropping it destroys the engine
struct EngineLease {
    engine: Box<dyn AdaptiveEngine>,
}

impl Drop for EngineLease {
    fn drop(&mut self) {
        self.engine.destroy();
    }
}

struct Attachment {
    id: AttachmentId,
    mode: TransportMode,
    engine: Option<EngineLease>,
    network_recoveries: u32,
    media_recoveries: u32,
}

/// What the session should do after an engine event
#[derive(Debug, Clone, PartialEq)]
pub enum EngineOutcome {
    /// Stale, non-fatal or otherwise not actionable
    Ignored,
    /// Manifest parsed, media can start
    Ready,
    /// A recovery was started on the engine
    Recovering,
    /// Unrecoverable; the engine has already been released
    Failed(String),
}

/// Attaches media transports to one element and applies the fallback policy.
///
/// At most one transport is attached at a time: every attach tears the
/// previous one down first, and dropping the resolver releases whatever is
/// still attached.
pub struct StreamResolver {
    element: Arc<dyn MediaElement>,
    engines: Arc<dyn AdaptiveEngineFactory>,
    config: StreamingConfig,
    sink: EngineEventSink,
    attachment: Option<Attachment>,
    last_id: AttachmentId,
}

impl StreamResolver {
    pub fn new(
        element: Arc<dyn MediaElement>,
        engines: Arc<dyn AdaptiveEngineFactory>,
        config: StreamingConfig,
        sink: EngineEventSink,
    ) -> Self {
        Self {
            element,
            engines,
            config,
            sink,
            attachment: None,
            last_id: AttachmentId::new(0),
        }
    }

    /// Attach the transport for `record`, replacing any current attachment
    pub fn attach(&mut self, record: &VideoRecord) -> TransportMode {
        self.detach();

        let selection = select(
            record,
            self.engines.is_supported(),
            self.element.can_play_type(ADAPTIVE_MANIFEST_MIME),
        );
        let Some((mode, url)) = selection else {
            warn!("Video {} has no playable stream", record.id);
            return TransportMode::Unavailable;
        };

        let id = self.last_id.next();
        self.last_id = id;

        let engine = match mode {
            TransportMode::AdaptiveWorker => {
                let sink = self.sink.clone();
                let mut engine = self
                    .engines
                    .create(&self.config, Box::new(move |event| sink(id, event)));
                engine.load_source(url);
                engine.attach_media(self.element.clone());
                Some(EngineLease { engine })
            }
            _ => {
                self.element.set_source(url);
                None
            }
        };

        info!(
            "Video {} attached via {} (attachment {})",
            record.id, mode, id
        );
        self.attachment = Some(Attachment {
            id,
            mode,
            engine,
            network_recoveries: 0,
            media_recoveries: 0,
        });
        mode
    }

    /// Release the current transport, if any
    pub fn detach(&mut self) {
        if let Some(attachment) = self.attachment.take() {
            debug!(
                "Detaching {} transport (attachment {})",
                attachment.mode, attachment.id
            );
            drop(attachment);
            self.element.clear_source();
        }
    }

    /// Playback is moving again, so earlier failures no longer count against the budget
    pub fn reset_recovery_budget(&mut self) {
        if let Some(attachment) = self.attachment.as_mut()
            && (attachment.network_recoveries > 0 || attachment.media_recoveries > 0)
        {
            debug!("Resetting recovery budget (attachment {})", attachment.id);
            attachment.network_recoveries = 0;
            attachment.media_recoveries = 0;
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    pub fn current_attachment(&self) -> Option<AttachmentId> {
        self.attachment.as_ref().map(|a| a.id)
    }

    pub fn mode(&self) -> Option<TransportMode> {
        self.attachment.as_ref().map(|a| a.mode)
    }

    /// Whether `event` is the element's first-frame signal for the attached transport
    pub fn is_ready_signal(&self, event: &MediaEvent) -> bool {
        matches!(
            (self.mode(), event),
            (Some(TransportMode::AdaptiveNative), MediaEvent::LoadedMetadata)
                | (Some(TransportMode::Progressive), MediaEvent::LoadedData)
        )
    }

    /// Element errors only end playback when the element loads the media itself
    pub fn element_errors_are_terminal(&self) -> bool {
        matches!(
            self.mode(),
            Some(TransportMode::AdaptiveNative | TransportMode::Progressive)
        )
    }

    pub fn handle_engine_event(&mut self, id: AttachmentId, event: EngineEvent) -> EngineOutcome {
        let max_network = self.config.max_network_recoveries;
        let max_media = self.config.max_media_recoveries;

        let Some(attachment) = self.attachment.as_mut().filter(|a| a.id == id) else {
            trace!("Dropping event from stale attachment {}: {:?}", id, event);
            return EngineOutcome::Ignored;
        };
        let Some(lease) = attachment.engine.as_mut() else {
            return EngineOutcome::Ignored;
        };

        match event {
            EngineEvent::ManifestParsed => {
                debug!("Manifest parsed (attachment {})", id);
                attachment.network_recoveries = 0;
                attachment.media_recoveries = 0;
                EngineOutcome::Ready
            }
            EngineEvent::Error {
                fatal: false,
                kind,
                details,
            } => {
                warn!("Non-fatal {:?} engine error: {}", kind, details);
                EngineOutcome::Ignored
            }
            EngineEvent::Error {
                kind: EngineErrorKind::Network,
                details,
                ..
            } if attachment.network_recoveries < max_network => {
                attachment.network_recoveries += 1;
                warn!("Fatal network error ({}), restarting load", details);
                lease.engine.start_load();
                EngineOutcome::Recovering
            }
            EngineEvent::Error {
                kind: EngineErrorKind::Media,
                details,
                ..
            } if attachment.media_recoveries < max_media => {
                attachment.media_recoveries += 1;
                warn!("Fatal media error ({}), attempting recovery", details);
                lease.engine.recover_media_error();
                EngineOutcome::Recovering
            }
            EngineEvent::Error { kind, details, .. } => {
                error!("Unrecoverable {:?} engine error: {}", kind, details);
                self.detach();
                EngineOutcome::Failed(details)
            }
        }
    }
}

impl Drop for StreamResolver {
    fn drop(&mut self) {
        self.detach();
    }
}
