use crate::common::{TestFeed, page, progressive_record, settle};
use feedreel::config::{Config, LongPressMode};
use feedreel::gesture::{GestureOverlay, GesturePhase, TouchInput, TouchTarget};
use feedreel::player::{ItemHandle, MediaElement};
use std::time::Duration;

const START: TouchInput = TouchInput::Start {
    x: 200.0,
    y: 400.0,
    target: TouchTarget::Surface,
};

async fn feed_with(config: Config) -> TestFeed {
    let mut t = TestFeed::new(config);
    t.feed
        .append_page(page((1..=3).map(progressive_record).collect()))
        .await
        .unwrap();
    settle().await;
    t
}

fn active(t: &TestFeed) -> ItemHandle {
    t.feed.item(t.feed.active_index().unwrap()).unwrap().clone()
}

#[tokio::test(start_paused = true)]
async fn test_tap_pauses_and_resumes() {
    let t = feed_with(Config::default()).await;
    let handle = active(&t);
    let element = t.elements.get(1);
    assert!(!element.is_paused());

    handle.touch(START).await.unwrap();
    handle.touch(TouchInput::End).await.unwrap();
    settle().await;
    assert!(element.is_paused());

    // Outside the double-tap window, so a second single tap
    tokio::time::advance(Duration::from_millis(400)).await;
    handle.touch(START).await.unwrap();
    handle.touch(TouchInput::End).await.unwrap();
    settle().await;
    assert!(!element.is_paused());
    assert!(!handle.state().session.is_liked);
}

#[tokio::test(start_paused = true)]
async fn test_double_tap_shows_heart_for_a_second() {
    let t = feed_with(Config::default()).await;
    let handle = active(&t);

    for _ in 0..2 {
        handle.touch(START).await.unwrap();
        tokio::time::advance(Duration::from_millis(50)).await;
        handle.touch(TouchInput::End).await.unwrap();
    }
    settle().await;

    let state = handle.state();
    assert!(state.session.is_liked);
    assert!(state.heart_visible);

    tokio::time::advance(Duration::from_millis(900)).await;
    settle().await;
    assert!(handle.state().heart_visible);

    tokio::time::advance(Duration::from_millis(200)).await;
    settle().await;
    assert!(!handle.state().heart_visible);
}

#[tokio::test(start_paused = true)]
async fn test_long_press_scrub_clamps_to_the_end() {
    let t = feed_with(Config::default()).await;
    let handle = active(&t);
    let element = t.elements.get(1);
    element.set_timeline(Duration::from_secs(50), Some(Duration::from_secs(60)));

    handle.touch(START).await.unwrap();
    tokio::time::advance(Duration::from_millis(350)).await;
    settle().await;
    assert_eq!(handle.state().gesture, GesturePhase::Scrubbing);

    handle
        .touch(TouchInput::Move { x: 600.0, y: 400.0 })
        .await
        .unwrap();
    assert_eq!(element.current_time(), Duration::from_secs(60));
    assert_eq!(
        handle.state().overlay,
        Some(GestureOverlay::Scrub {
            position: Duration::from_secs(60),
            total: Duration::from_secs(60),
        })
    );

    handle.touch(TouchInput::End).await.unwrap();
    assert_eq!(handle.state().overlay, None);
    // Releasing a long press never toggles playback
    assert!(!element.is_paused());
}

#[tokio::test(start_paused = true)]
async fn test_rate_ramp_is_restored_when_scrolled_away() {
    let mut config = Config::default();
    config.gestures.long_press_mode = LongPressMode::RateRamp;
    let mut t = feed_with(config).await;
    let handle = active(&t);
    let element = t.elements.get(1);

    handle.touch(START).await.unwrap();
    tokio::time::advance(Duration::from_millis(350)).await;
    settle().await;
    handle
        .touch(TouchInput::Move { x: 250.0, y: 400.0 })
        .await
        .unwrap();
    assert_eq!(element.playback_rate(), 2.0);

    t.feed.activate(1).await.unwrap();
    settle().await;
    assert_eq!(element.playback_rate(), 1.0);
    assert_eq!(handle.state().gesture, GesturePhase::Idle);
    assert!(element.is_paused());
}

#[tokio::test(start_paused = true)]
async fn test_touch_on_control_is_not_consumed() {
    let t = feed_with(Config::default()).await;
    let handle = active(&t);

    let control = TouchInput::Start {
        x: 10.0,
        y: 10.0,
        target: TouchTarget::Control,
    };
    assert!(!handle.touch(control).await.unwrap());
    assert!(!handle.touch(TouchInput::End).await.unwrap());
    assert!(!t.elements.get(1).is_paused());
}
