//! End-to-end tests over the three-thread pipeline.
//!
//! Timing is deliberately generous: assertions poll with long deadlines
//! rather than assuming a tick lands inside a fixed sleep.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use strata::{Engine, EngineConfig, EngineError, Notification, Vec3};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn fast_config() -> EngineConfig {
    EngineConfig {
        update_hz: 240.0,
        node_capacity: 64,
        render_item_capacity: 64,
        ..EngineConfig::default()
    }
}

/// Polls `condition` until it holds or the deadline passes.
fn wait_for(deadline: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    condition()
}

#[test]
fn engine_ticks_and_stops_cleanly() {
    init_tracing();
    let mut engine = Engine::start(fast_config()).unwrap();
    assert!(wait_for(Duration::from_secs(5), || engine.frame_count() > 3));

    engine.stop();
    let frames = engine.frame_count();
    std::thread::sleep(Duration::from_millis(20));
    // No tick runs after stop.
    assert_eq!(engine.frame_count(), frames);
}

#[test]
fn staged_nodes_reach_the_render_hook() {
    init_tracing();
    let items_seen = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&items_seen);
    let engine = Engine::start_with_render_hook(
        fast_config(),
        Box::new(move |_, frame| {
            counter.fetch_max(frame.items.len() as u64, Ordering::Relaxed);
        }),
    )
    .unwrap();

    let node = engine.create_node().unwrap();
    engine.connect_to_stage(node).unwrap();
    engine
        .set_node_position(node, Vec3::new(1.0, 2.0, 3.0))
        .unwrap();

    assert!(wait_for(Duration::from_secs(5), || {
        items_seen.load(Ordering::Relaxed) == 1
    }));
}

#[test]
fn animation_completion_is_notified() {
    init_tracing();
    let engine = Engine::start(fast_config()).unwrap();
    let node = engine.create_node().unwrap();
    engine.connect_to_stage(node).unwrap();
    let animation = engine.animate_opacity(node, 0.0, 5).unwrap();

    let mut notifications = Vec::new();
    assert!(wait_for(Duration::from_secs(5), || {
        notifications.extend(engine.pump_notifications());
        notifications
            .iter()
            .any(|n| *n == Notification::AnimationFinished { animation })
    }));
}

#[test]
fn removed_nodes_report_destruction() {
    init_tracing();
    let engine = Engine::start(fast_config()).unwrap();
    let node = engine.create_node().unwrap();
    engine.connect_to_stage(node).unwrap();
    engine.remove_node(node).unwrap();

    let mut notifications = Vec::new();
    assert!(wait_for(Duration::from_secs(5), || {
        notifications.extend(engine.pump_notifications());
        notifications
            .iter()
            .any(|n| *n == Notification::NodeDestroyed { node })
    }));
}

#[test]
fn zero_tick_rate_is_rejected_before_threads_spawn() {
    init_tracing();
    let config = EngineConfig {
        update_hz: 0.0,
        ..fast_config()
    };
    assert!(matches!(
        Engine::start(config),
        Err(EngineError::InvalidConfig(_))
    ));
}

#[test]
fn node_capacity_is_enforced() {
    init_tracing();
    let config = EngineConfig {
        node_capacity: 2,
        ..fast_config()
    };
    let engine = Engine::start(config).unwrap();
    engine.create_node().unwrap();
    engine.create_node().unwrap();
    assert!(engine.create_node().is_err());
}
