#![cfg(test)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::StreamingConfig;
use crate::player::traits::{
    ADAPTIVE_MANIFEST_MIME, AdaptiveEngine, AdaptiveEngineFactory, EngineEventCallback,
    MediaElement,
};
use crate::player::types::EngineEvent;
use crate::utils::MediaError;

/// Ordered record of calls shared between mocks, used to check teardown ordering
pub type CallLog = Arc<Mutex<Vec<String>>>;

#[derive(Debug, Default)]
struct ElementState {
    source: Option<String>,
    poster: Option<String>,
    looping: bool,
    paused: bool,
    muted: bool,
    current_time: Duration,
    duration: Option<Duration>,
    rate: f64,
    play_calls: u32,
    pause_calls: u32,
    mutations: u32,
    seeks: Vec<Duration>,
    reject_play: Option<String>,
    fail_rate: bool,
}

/// In-memory media element
pub struct MockMediaElement {
    state: Mutex<ElementState>,
    native_adaptive: bool,
    log: CallLog,
}

impl MockMediaElement {
    pub fn new() -> Self {
        Self::with_log(Arc::new(Mutex::new(Vec::new())))
    }

    pub fn with_log(log: CallLog) -> Self {
        Self {
            state: Mutex::new(ElementState {
                paused: true,
                rate: 1.0,
                ..Default::default()
            }),
            native_adaptive: false,
            log,
        }
    }

    pub fn native_adaptive(mut self, supported: bool) -> Self {
        self.native_adaptive = supported;
        self
    }

    pub fn set_timeline(&self, current: Duration, duration: Option<Duration>) {
        let mut state = self.state.lock().unwrap();
        state.current_time = current;
        state.duration = duration;
    }

    pub fn set_paused(&self, paused: bool) {
        self.state.lock().unwrap().paused = paused;
    }

    pub fn reject_play(&self, reason: Option<&str>) {
        self.state.lock().unwrap().reject_play = reason.map(str::to_string);
    }

    pub fn fail_rate_changes(&self, fail: bool) {
        self.state.lock().unwrap().fail_rate = fail;
    }

    pub fn source(&self) -> Option<String> {
        self.state.lock().unwrap().source.clone()
    }

    pub fn poster(&self) -> Option<String> {
        self.state.lock().unwrap().poster.clone()
    }

    pub fn looping(&self) -> bool {
        self.state.lock().unwrap().looping
    }

    pub fn play_calls(&self) -> u32 {
        self.state.lock().unwrap().play_calls
    }

    pub fn pause_calls(&self) -> u32 {
        self.state.lock().unwrap().pause_calls
    }

    pub fn mutation_count(&self) -> u32 {
        self.state.lock().unwrap().mutations
    }

    pub fn seeks(&self) -> Vec<Duration> {
        self.state.lock().unwrap().seeks.clone()
    }

    fn mutate<T>(&self, call: &str, f: impl FnOnce(&mut ElementState) -> T) -> T {
        self.log.lock().unwrap().push(format!("element {}", call));
        let mut state = self.state.lock().unwrap();
        state.mutations += 1;
        f(&mut state)
    }
}

#[async_trait]
impl MediaElement for MockMediaElement {
    fn set_source(&self, url: &str) {
        self.mutate("set_source", |s| s.source = Some(url.to_string()));
    }

    fn clear_source(&self) {
        self.mutate("clear_source", |s| s.source = None);
    }

    fn set_poster(&self, url: &str) {
        self.mutate("set_poster", |s| s.poster = Some(url.to_string()));
    }

    fn set_loop(&self, looping: bool) {
        self.mutate("set_loop", |s| s.looping = looping);
    }

    fn can_play_type(&self, mime: &str) -> bool {
        self.native_adaptive && mime == ADAPTIVE_MANIFEST_MIME
    }

    async fn play(&self) -> Result<(), MediaError> {
        self.mutate("play", |s| {
            s.play_calls += 1;
            match s.reject_play.clone() {
                Some(reason) => Err(MediaError::PlayRejected(reason)),
                None => {
                    s.paused = false;
                    Ok(())
                }
            }
        })
    }

    fn pause(&self) {
        self.mutate("pause", |s| {
            s.pause_calls += 1;
            s.paused = true;
        });
    }

    fn is_paused(&self) -> bool {
        self.state.lock().unwrap().paused
    }

    fn set_muted(&self, muted: bool) {
        self.mutate("set_muted", |s| s.muted = muted);
    }

    fn is_muted(&self) -> bool {
        self.state.lock().unwrap().muted
    }

    fn current_time(&self) -> Duration {
        self.state.lock().unwrap().current_time
    }

    fn duration(&self) -> Option<Duration> {
        self.state.lock().unwrap().duration
    }

    fn set_current_time(&self, position: Duration) -> Result<(), MediaError> {
        self.mutate("set_current_time", |s| {
            if s.duration.is_some_and(|total| position > total) {
                return Err(MediaError::SeekFailed {
                    position: position.as_secs_f64(),
                    message: "beyond end of media".to_string(),
                });
            }
            s.current_time = position;
            s.seeks.push(position);
            Ok(())
        })
    }

    fn playback_rate(&self) -> f64 {
        self.state.lock().unwrap().rate
    }

    fn set_playback_rate(&self, rate: f64) -> Result<(), MediaError> {
        self.mutate("set_playback_rate", |s| {
            if s.fail_rate {
                return Err(MediaError::RateRejected {
                    rate,
                    message: "not supported".to_string(),
                });
            }
            s.rate = rate;
            Ok(())
        })
    }
}

/// What a mock engine has been asked to do
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineRecord {
    pub source: Option<String>,
    pub attached: bool,
    pub start_loads: u32,
    pub recoveries: u32,
    pub destroyed: bool,
}

struct MockEngine {
    index: usize,
    record: Arc<Mutex<EngineRecord>>,
    log: CallLog,
}

impl AdaptiveEngine for MockEngine {
    fn load_source(&mut self, url: &str) {
        self.record.lock().unwrap().source = Some(url.to_string());
    }

    fn attach_media(&mut self, _element: Arc<dyn MediaElement>) {
        self.log.lock().unwrap().push(format!("engine#{} attach", self.index));
        self.record.lock().unwrap().attached = true;
    }

    fn start_load(&mut self) {
        self.record.lock().unwrap().start_loads += 1;
    }

    fn recover_media_error(&mut self) {
        self.record.lock().unwrap().recoveries += 1;
    }

    fn destroy(&mut self) {
        self.log.lock().unwrap().push(format!("engine#{} destroy", self.index));
        let mut record = self.record.lock().unwrap();
        record.destroyed = true;
        record.attached = false;
    }
}

/// Engine factory that keeps every engine's callback so tests can raise events
pub struct MockEngineFactory {
    supported: bool,
    log: CallLog,
    records: Mutex<Vec<Arc<Mutex<EngineRecord>>>>,
    callbacks: Mutex<Vec<EngineEventCallback>>,
    configs: Mutex<Vec<StreamingConfig>>,
}

impl MockEngineFactory {
    pub fn new(supported: bool) -> Self {
        Self::with_log(supported, Arc::new(Mutex::new(Vec::new())))
    }

    pub fn with_log(supported: bool, log: CallLog) -> Self {
        Self {
            supported,
            log,
            records: Mutex::new(Vec::new()),
            callbacks: Mutex::new(Vec::new()),
            configs: Mutex::new(Vec::new()),
        }
    }

    pub fn created(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn record(&self, index: usize) -> EngineRecord {
        self.records.lock().unwrap()[index].lock().unwrap().clone()
    }

    pub fn config(&self, index: usize) -> StreamingConfig {
        self.configs.lock().unwrap()[index].clone()
    }

    pub fn emit(&self, index: usize, event: EngineEvent) {
        let callbacks = self.callbacks.lock().unwrap();
        (callbacks[index])(event);
    }
}

impl AdaptiveEngineFactory for MockEngineFactory {
    fn is_supported(&self) -> bool {
        self.supported
    }

    fn create(
        &self,
        config: &StreamingConfig,
        on_event: EngineEventCallback,
    ) -> Box<dyn AdaptiveEngine> {
        let mut records = self.records.lock().unwrap();
        let index = records.len();
        self.log.lock().unwrap().push(format!("engine#{} create", index));

        let record = Arc::new(Mutex::new(EngineRecord::default()));
        records.push(record.clone());
        self.callbacks.lock().unwrap().push(on_event);
        self.configs.lock().unwrap().push(config.clone());

        Box::new(MockEngine {
            index,
            record,
            log: self.log.clone(),
        })
    }
}

pub fn new_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Position of the first log entry equal to `entry`
pub fn log_position(log: &CallLog, entry: &str) -> Option<usize> {
    log.lock().unwrap().iter().position(|e| e == entry)
}
