//! Common types shared by the resolver, the session and the item controller

/// How a record's media reaches the element, chosen once per record load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// Adaptive manifest played through the in-process engine
    AdaptiveWorker,
    /// Adaptive manifest opened directly by the element
    AdaptiveNative,
    /// Single progressive file
    Progressive,
    /// Nothing playable
    Unavailable,
}

impl TransportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::AdaptiveWorker => "adaptive-worker",
            TransportMode::AdaptiveNative => "adaptive-native",
            TransportMode::Progressive => "progressive",
            TransportMode::Unavailable => "unavailable",
        }
    }
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Lifecycle of the media pipeline behind one session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Loading,
    Ready,
    Buffering,
    /// Terminal for the current record
    Error,
}

impl LoadState {
    pub fn is_error(&self) -> bool {
        matches!(self, LoadState::Error)
    }
}

/// Signals raised by the media element
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    LoadedMetadata,
    LoadedData,
    Waiting,
    Playing,
    Pause,
    TimeUpdate,
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorKind {
    Network,
    Media,
    Other,
}

/// Signals raised by the adaptive streaming engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    ManifestParsed,
    Error {
        kind: EngineErrorKind,
        fatal: bool,
        details: String,
    },
}
