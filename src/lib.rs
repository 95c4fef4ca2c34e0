//! Playback and gesture core for a vertically scrolling short-video feed.

pub mod api;
pub mod config;
pub mod feed;
pub mod gesture;
pub mod models;
pub mod player;
pub mod utils;

#[cfg(test)]
mod test_utils;
