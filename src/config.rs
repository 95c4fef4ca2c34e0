use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub gestures: GestureConfig,

    #[serde(default)]
    pub streaming: StreamingConfig,

    #[serde(default)]
    pub feed: FeedConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default)]
    pub start_muted: bool,

    #[serde(default = "default_true")]
    pub loop_playback: bool,

    #[serde(default = "default_min_speed")]
    pub min_speed: f64,

    #[serde(default = "default_max_speed")]
    pub max_speed: f64,
}

/// What a long press turns into once the arming timer fires
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LongPressMode {
    /// Horizontal drag moves the playback position
    #[default]
    JumpToTime,
    /// Horizontal drag ramps the playback rate
    RateRamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureConfig {
    #[serde(default)]
    pub long_press_mode: LongPressMode,

    #[serde(default = "default_gesture_window_ms")]
    pub long_press_ms: u64,

    #[serde(default = "default_gesture_window_ms")]
    pub double_tap_window_ms: u64,

    /// Movement (in px) beyond which a pressed finger no longer counts as a tap
    #[serde(default = "default_tap_slop")]
    pub tap_slop_px: f64,

    #[serde(default = "default_scrub_px_per_second")]
    pub scrub_px_per_second: f64,

    #[serde(default = "default_ramp_px_per_step")]
    pub ramp_px_per_step: f64,

    #[serde(default = "default_max_speed")]
    pub max_ramp_rate: f64,

    #[serde(default = "default_heart_duration_ms")]
    pub heart_duration_ms: u64,
}

/// Options handed to the adaptive streaming engine on creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamingConfig {
    #[serde(default = "default_true")]
    pub enable_worker: bool,

    #[serde(default = "default_true")]
    pub low_latency_mode: bool,

    #[serde(default = "default_back_buffer")]
    pub back_buffer_length_secs: u64,

    #[serde(default = "default_recoveries")]
    pub max_network_recoveries: u32,

    #[serde(default = "default_recoveries")]
    pub max_media_recoveries: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Items kept mounted on either side of the active one
    #[serde(default = "default_mount_window")]
    pub mount_window: usize,

    /// Remaining items below which another page should be fetched
    #[serde(default = "default_prefetch_threshold")]
    pub prefetch_threshold: usize,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            info!("No config file found, using defaults");
            let config = Config::default();
            config.save_to(&config_path)?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", path);
        let contents = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;
        config.validate().context("Invalid config file")?;
        info!("Config loaded successfully");
        Ok(config)
    }

    /// Reject values that deserialize fine but cannot drive playback or gestures
    pub fn validate(&self) -> Result<()> {
        let playback = &self.playback;
        ensure!(
            playback.min_speed.is_finite() && playback.min_speed > 0.0,
            "playback.min_speed must be a positive number"
        );
        ensure!(
            playback.max_speed.is_finite() && playback.max_speed >= playback.min_speed,
            "playback.max_speed must be a number no smaller than min_speed"
        );

        let gestures = &self.gestures;
        for (name, value) in [
            ("tap_slop_px", gestures.tap_slop_px),
            ("scrub_px_per_second", gestures.scrub_px_per_second),
            ("ramp_px_per_step", gestures.ramp_px_per_step),
        ] {
            ensure!(
                value.is_finite() && value > 0.0,
                "gestures.{} must be a positive number",
                name
            );
        }
        ensure!(
            gestures.max_ramp_rate.is_finite() && gestures.max_ramp_rate >= 1.0,
            "gestures.max_ramp_rate must be at least 1"
        );
        Ok(())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents).context("Failed to write config file")?;

        debug!("Config saved to {:?}", path);
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to get config directory")?;
        Ok(config_dir.join("feedreel").join("config.toml"))
    }
}

impl PlaybackConfig {
    /// Clamp `rate` to the configured range, or to the default range if that one is unusable
    pub fn clamp_speed(&self, rate: f64) -> f64 {
        if rate.is_nan() {
            return 1.0;
        }
        let usable = self.min_speed.is_finite()
            && self.max_speed.is_finite()
            && self.min_speed <= self.max_speed;
        if usable {
            rate.clamp(self.min_speed, self.max_speed)
        } else {
            rate.clamp(default_min_speed(), default_max_speed())
        }
    }
}

impl GestureConfig {
    pub fn long_press_delay(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }

    pub fn double_tap_window(&self) -> Duration {
        Duration::from_millis(self.double_tap_window_ms)
    }

    pub fn heart_duration(&self) -> Duration {
        Duration::from_millis(self.heart_duration_ms)
    }
}

impl FeedConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            start_muted: false,
            loop_playback: default_true(),
            min_speed: default_min_speed(),
            max_speed: default_max_speed(),
        }
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            long_press_mode: LongPressMode::default(),
            long_press_ms: default_gesture_window_ms(),
            double_tap_window_ms: default_gesture_window_ms(),
            tap_slop_px: default_tap_slop(),
            scrub_px_per_second: default_scrub_px_per_second(),
            ramp_px_per_step: default_ramp_px_per_step(),
            max_ramp_rate: default_max_speed(),
            heart_duration_ms: default_heart_duration_ms(),
        }
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            enable_worker: default_true(),
            low_latency_mode: default_true(),
            back_buffer_length_secs: default_back_buffer(),
            max_network_recoveries: default_recoveries(),
            max_media_recoveries: default_recoveries(),
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout(),
            mount_window: default_mount_window(),
            prefetch_threshold: default_prefetch_threshold(),
        }
    }
}

// Default value functions
fn default_true() -> bool { true }
fn default_min_speed() -> f64 { 0.5 }
fn default_max_speed() -> f64 { 3.0 }
fn default_gesture_window_ms() -> u64 { 300 }
fn default_tap_slop() -> f64 { 10.0 }
fn default_scrub_px_per_second() -> f64 { 10.0 }
fn default_ramp_px_per_step() -> f64 { 50.0 }
fn default_heart_duration_ms() -> u64 { 1000 }
fn default_back_buffer() -> u64 { 90 }
fn default_recoveries() -> u32 { 1 }
fn default_api_url() -> String { "https://video.imgdesu.art/api/videos/random".to_string() }
fn default_timeout() -> u64 { 30 }
fn default_mount_window() -> usize { 2 }
fn default_prefetch_threshold() -> usize { 2 }
