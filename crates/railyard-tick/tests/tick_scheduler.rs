//! Integration tests for the tick scheduler.
//!
//! Every async test starts with tokio's clock paused, so sleeps resolve
//! as soon as the runtime is idle and `advance` moves time explicitly.

use std::time::Duration;

use railyard_tick::{TickConfig, TickPolicy, TickScheduler};
use tokio::time::Instant;

fn config_20hz() -> TickConfig {
    TickConfig::with_rate(20)
}

// =========================================================================
// TickConfig
// =========================================================================

#[test]
fn test_default_config_is_60hz_burst() {
    let cfg = TickConfig::default();
    assert_eq!(cfg.tick_rate_hz, 60);
    assert_eq!(cfg.policy, TickPolicy::Burst);
    assert_eq!(cfg.tick_duration(), Some(Duration::from_secs_f64(1.0 / 60.0)));
}

#[test]
fn test_manual_config_has_no_duration() {
    assert_eq!(TickConfig::manual().tick_duration(), None);
}

#[test]
fn test_validated_clamps_rate_and_thresholds() {
    let cfg = TickConfig {
        tick_rate_hz: 1_000,
        budget_warn_threshold: 1.5,
        budget_critical_threshold: 0.9,
        ..TickConfig::default()
    }
    .validated();
    assert_eq!(cfg.tick_rate_hz, TickConfig::MAX_TICK_RATE_HZ);
    assert_eq!(cfg.budget_critical_threshold, 0.9);
    assert_eq!(cfg.budget_warn_threshold, 0.9);
}

// =========================================================================
// Scheduler creation
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_scheduler_initial_state() {
    let s = TickScheduler::new(config_20hz());
    assert_eq!(s.tick_count(), 0);
    assert_eq!(s.tick_rate_hz(), 20);
    assert!(!s.is_manual());
    assert!(!s.is_paused());
    assert_eq!(s.tick_duration(), Some(Duration::from_millis(50)));
}

#[tokio::test(start_paused = true)]
async fn test_manual_scheduler_never_fires() {
    let mut s = TickScheduler::new(TickConfig::manual());
    assert!(s.is_manual());
    let result = tokio::time::timeout(Duration::from_secs(5), s.wait_for_tick()).await;
    assert!(result.is_err(), "manual scheduler should pend forever");
}

// =========================================================================
// Tick firing
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_wait_for_tick_fires_one_period_after_creation() {
    let start = Instant::now();
    let mut s = TickScheduler::with_rate(20);

    let info = s.wait_for_tick().await;
    assert_eq!(info.tick, 1);
    assert_eq!(info.dt, Duration::from_millis(50));
    assert!(!info.overrun);
    assert_eq!(info.late_by, Duration::ZERO);
    assert_eq!(Instant::now() - start, Duration::from_millis(50));
}

#[tokio::test(start_paused = true)]
async fn test_ticks_stay_on_fixed_grid() {
    let start = Instant::now();
    let mut s = TickScheduler::with_rate(20);
    for expected in 1..=5u64 {
        let info = s.wait_for_tick().await;
        assert_eq!(info.tick, expected);
        assert_eq!(Instant::now() - start, Duration::from_millis(50 * expected));
    }
}

// =========================================================================
// Late ticks
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_burst_fires_every_missed_tick_without_waiting() {
    let mut s = TickScheduler::with_rate(20);
    // Deadlines at 50, 100 and 150 ms all pass.
    tokio::time::advance(Duration::from_millis(175)).await;
    let stalled_at = Instant::now();

    for expected in 1..=3 {
        let info = s.wait_for_tick().await;
        assert_eq!(info.tick, expected);
        assert_eq!(info.ticks_skipped, 0);
        assert_eq!(Instant::now(), stalled_at, "missed ticks fire immediately");
    }
    assert!(s.metrics().total_overruns >= 2);

    // Back on the grid at 200 ms.
    let info = s.wait_for_tick().await;
    assert_eq!(info.tick, 4);
    assert_eq!(Instant::now() - stalled_at, Duration::from_millis(25));
    assert_eq!(s.metrics().total_skipped, 0);
}

#[tokio::test(start_paused = true)]
async fn test_skip_policy_drops_missed_ticks() {
    let mut s = TickScheduler::new(TickConfig {
        policy: TickPolicy::Skip,
        ..config_20hz()
    });
    tokio::time::advance(Duration::from_millis(175)).await;

    let info = s.wait_for_tick().await;
    assert_eq!(info.tick, 1);
    assert!(info.overrun);
    assert_eq!(info.late_by, Duration::from_millis(125));
    assert_eq!(info.ticks_skipped, 2);

    let before = Instant::now();
    s.wait_for_tick().await;
    assert_eq!(Instant::now() - before, Duration::from_millis(50));
    assert_eq!(s.metrics().total_skipped, 2);
}

// =========================================================================
// Pause / Resume
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_pause_prevents_ticks() {
    let mut s = TickScheduler::new(config_20hz());
    s.wait_for_tick().await;
    s.pause();
    assert!(s.is_paused());
    let result = tokio::time::timeout(Duration::from_secs(1), s.wait_for_tick()).await;
    assert!(result.is_err(), "paused scheduler should pend");
}

#[tokio::test(start_paused = true)]
async fn test_resume_does_not_replay_paused_time() {
    let mut s = TickScheduler::new(config_20hz());
    s.wait_for_tick().await;
    s.pause();
    tokio::time::advance(Duration::from_secs(2)).await;
    s.resume();
    assert!(!s.is_paused());

    let info = s.wait_for_tick().await;
    assert_eq!(info.tick, 2);
    assert!(!info.overrun);
}

#[tokio::test(start_paused = true)]
async fn test_pause_resume_idempotent() {
    let mut s = TickScheduler::new(config_20hz());
    s.pause();
    s.pause();
    assert!(s.is_paused());
    s.resume();
    s.resume();
    assert!(!s.is_paused());
}

// =========================================================================
// Metrics
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_metrics_count_ticks() {
    let mut s = TickScheduler::new(config_20hz());
    assert_eq!(s.metrics().total_ticks, 0);
    for _ in 0..3 {
        s.wait_for_tick().await;
        s.record_tick_end();
    }
    assert_eq!(s.metrics().total_ticks, 3);
}

#[tokio::test(start_paused = true)]
async fn test_record_tick_end_without_tick_is_noop() {
    let mut s = TickScheduler::new(config_20hz());
    s.record_tick_end();
    assert_eq!(s.metrics().total_ticks, 0);
    assert_eq!(s.metrics().max_tick_time, Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_record_tick_end_tracks_wall_clock_work() {
    let mut s = TickScheduler::new(config_20hz());
    s.wait_for_tick().await;
    // Work time is measured on the real clock, not tokio's.
    std::thread::sleep(Duration::from_micros(200));
    s.record_tick_end();

    let m = s.metrics();
    assert!(m.max_tick_time > Duration::ZERO);
    assert!(m.budget_utilization > 0.0);
    assert!(m.budget_utilization < 1.0);
}

#[tokio::test(start_paused = true)]
async fn test_metrics_disabled_skips_timing() {
    let mut s = TickScheduler::new(TickConfig {
        metrics_enabled: false,
        ..config_20hz()
    });
    s.wait_for_tick().await;
    std::thread::sleep(Duration::from_micros(200));
    s.record_tick_end();
    assert_eq!(s.metrics().avg_tick_time, Duration::ZERO);
    assert_eq!(s.metrics().max_tick_time, Duration::ZERO);
}

// =========================================================================
// select! loop, as used by the world actor
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_select_loop_serves_commands_between_ticks() {
    let mut s = TickScheduler::new(config_20hz());
    let (tx, mut rx) = tokio::sync::mpsc::channel::<&str>(4);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(160)).await;
        tx.send("stop").await.ok();
    });

    let mut ticks = 0u64;
    loop {
        tokio::select! {
            Some(cmd) = rx.recv() => {
                assert_eq!(cmd, "stop");
                break;
            }
            info = s.wait_for_tick() => {
                ticks += 1;
                s.record_tick_end();
                assert_eq!(info.tick, ticks);
            }
        }
    }
    assert_eq!(ticks, 3);
}
