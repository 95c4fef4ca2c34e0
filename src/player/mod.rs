pub mod controller;
pub mod resolver;
pub mod session;
pub mod telemetry;
pub mod traits;
pub mod types;

pub use controller::{ItemController, ItemHandle, ItemState};
pub use resolver::{EngineEventSink, EngineOutcome, StreamResolver, select_transport};
pub use session::{LOAD_FAILED_MESSAGE, PlayRequest, PlaybackSession, SessionState};
pub use telemetry::{PlaybackTelemetry, TelemetrySnapshot, progress_percent};
pub use traits::{
    ADAPTIVE_MANIFEST_MIME, AdaptiveEngine, AdaptiveEngineFactory, EngineEventCallback,
    MediaElement,
};
pub use types::{EngineErrorKind, EngineEvent, LoadState, MediaEvent, TransportMode};
