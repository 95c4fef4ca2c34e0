use crate::common::mocks::MockElements;
use crate::common::{TestFeed, adaptive_record, page, progressive_record, settle};
use feedreel::config::Config;
use feedreel::models::VideoId;
use feedreel::player::{EngineErrorKind, EngineEvent, LoadState, MediaElement, MediaEvent};

#[tokio::test]
async fn test_at_most_one_item_plays_while_scrolling() {
    let mut t = TestFeed::new(Config::default());
    t.feed
        .append_page(page((1..=8).map(progressive_record).collect()))
        .await
        .unwrap();
    settle().await;
    assert_eq!(t.elements.playing(), vec![1]);

    for (scroll_top, expected) in [(700.0, 2), (1500.0, 3), (3900.0, 6), (2300.0, 4)] {
        t.feed.on_scroll(scroll_top, 780.0).await.unwrap();
        settle().await;
        assert_eq!(t.elements.playing(), vec![expected]);
        assert_eq!(t.feed.active_id(), Some(VideoId::new(expected)));
    }
}

#[tokio::test]
async fn test_rejected_autoplay_does_not_break_the_feed() {
    let mut t = TestFeed::with_elements(
        Config::default(),
        MockElements::rejecting_play("autoplay policy"),
    );
    t.feed
        .append_page(page((1..=3).map(progressive_record).collect()))
        .await
        .unwrap();
    settle().await;

    assert!(t.elements.playing().is_empty());
    let state = t.feed.item(0).unwrap().state();
    assert_eq!(state.session.error, None);
    assert!(state.session.is_active);

    // Scrolling on still works
    assert!(t.feed.on_scroll(800.0, 800.0).await.unwrap());
    assert_eq!(t.feed.active_index(), Some(1));
}

#[tokio::test]
async fn test_unplayable_record_shows_failure_and_feed_continues() {
    let mut t = TestFeed::new(Config::default());
    let broken = feedreel::models::VideoRecord::new(2, "https://cdn.example.com/2.jpg");
    t.feed
        .append_page(page(vec![progressive_record(1), broken, progressive_record(3)]))
        .await
        .unwrap();

    t.feed.activate(1).await.unwrap();
    settle().await;
    let state = t.feed.item(1).unwrap().state();
    assert_eq!(state.session.load_state, LoadState::Error);
    assert_eq!(state.session.error.as_deref(), Some("Failed to load video"));
    assert!(t.elements.playing().is_empty());

    t.feed.activate(2).await.unwrap();
    settle().await;
    assert_eq!(t.elements.playing(), vec![3]);
}

#[tokio::test]
async fn test_unmounted_items_release_engines() {
    let mut t = TestFeed::new(Config::default());
    t.feed
        .append_page(page((1..=10).map(adaptive_record).collect()))
        .await
        .unwrap();
    assert_eq!(t.engines.live(), vec![0, 1, 2]);

    t.feed.activate(9).await.unwrap();
    assert_eq!(t.feed.active_index(), Some(9));
    // Items 7..=9 mounted, everything mounted before was released
    assert_eq!(t.engines.live().len(), 3);
    for index in 0..3 {
        assert!(t.engines.record(index).destroyed);
    }

    t.feed.shutdown().await;
    assert!(t.engines.live().is_empty());
}

#[tokio::test]
async fn test_manifest_parsed_makes_active_item_play() {
    let mut t = TestFeed::new(Config::default());
    t.feed
        .append_page(page(vec![adaptive_record(1), adaptive_record(2)]))
        .await
        .unwrap();

    t.engines.emit(0, EngineEvent::ManifestParsed);
    settle().await;

    let handle = t.feed.item(0).unwrap();
    assert_eq!(handle.state().session.load_state, LoadState::Ready);
    assert!(!t.elements.get(1).is_paused());
    assert_eq!(t.engines.record(0).source.as_deref(), Some("https://cdn.example.com/1/index.m3u8"));
}

#[tokio::test]
async fn test_network_failure_restarts_load_once() {
    let mut t = TestFeed::new(Config::default());
    t.feed
        .append_page(page(vec![adaptive_record(1)]))
        .await
        .unwrap();
    let network_error = || EngineEvent::Error {
        kind: EngineErrorKind::Network,
        fatal: true,
        details: "manifestLoadError".to_string(),
    };

    t.engines.emit(0, network_error());
    settle().await;
    assert_eq!(t.engines.record(0).start_loads, 1);
    assert_eq!(
        t.feed.item(0).unwrap().state().session.load_state,
        LoadState::Loading
    );

    t.engines.emit(0, network_error());
    settle().await;
    assert_eq!(
        t.feed.item(0).unwrap().state().session.load_state,
        LoadState::Error
    );
    assert!(t.engines.record(0).destroyed);
}

#[tokio::test]
async fn test_progress_follows_time_updates() {
    let mut t = TestFeed::new(Config::default());
    t.feed
        .append_page(page(vec![progressive_record(1)]))
        .await
        .unwrap();
    settle().await;

    let element = t.elements.get(1);
    element.set_timeline(
        std::time::Duration::from_secs(15),
        Some(std::time::Duration::from_secs(60)),
    );
    let handle = t.feed.item(0).unwrap();
    handle.media_event(MediaEvent::TimeUpdate).unwrap();
    settle().await;

    let state = handle.state();
    assert_eq!(state.session.progress, 25.0);
    assert!(state.session.is_playing);
}

#[tokio::test]
async fn test_mute_and_like_survive_scrolling_away() {
    let mut t = TestFeed::new(Config::default());
    t.feed
        .append_page(page((1..=3).map(progressive_record).collect()))
        .await
        .unwrap();

    let handle = t.feed.item(0).unwrap().clone();
    assert!(handle.toggle_mute().await.unwrap());
    assert!(handle.toggle_like().await.unwrap());

    t.feed.activate(1).await.unwrap();
    t.feed.activate(0).await.unwrap();

    let state = handle.state();
    assert!(state.session.is_muted);
    assert!(state.session.is_liked);
    assert!(t.elements.get(1).is_muted());
}
