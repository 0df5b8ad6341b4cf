//! Fixed-timestep tick scheduler for Railyard.
//!
//! The world advances in discrete ticks (60 Hz by default). Each tick is a
//! deadline on a fixed grid, `start + n * period`, so a slow tick never
//! shifts the ones after it.
//!
//! # Manual mode
//!
//! With `tick_rate_hz == 0` [`TickScheduler::wait_for_tick`] pends forever
//! and the owner steps the world itself, e.g. once per rendered frame.
//!
//! # Integration
//!
//! The scheduler sits inside the world actor's `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = commands.recv() => { /* apply command */ }
//!         info = scheduler.wait_for_tick() => {
//!             let report = world.tick();
//!             scheduler.record_tick_end();
//!         }
//!     }
//! }
//! ```

use std::time::{Duration, Instant};

use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do with deadlines that passed while a tick was running late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickPolicy {
    /// Fire every missed tick back to back until caught up. No tick is
    /// ever dropped or merged, so the simulation stays exact.
    #[default]
    Burst,
    /// Fire once, then restart the grid from now. Missed ticks are lost
    /// and counted in [`TickInfo::ticks_skipped`].
    Skip,
}

/// Configuration for a [`TickScheduler`].
#[derive(Debug, Clone, PartialEq)]
pub struct TickConfig {
    /// Tick rate in Hz. 0 = manual mode (never fires on its own).
    pub tick_rate_hz: u32,
    pub policy: TickPolicy,
    /// Fraction of the budget (0.0–1.0) at which a tick logs a warning.
    pub budget_warn_threshold: f64,
    /// Fraction of the budget (0.0–1.0) at which a tick is logged as
    /// critical.
    pub budget_critical_threshold: f64,
    /// Track average and max tick time.
    pub metrics_enabled: bool,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60,
            policy: TickPolicy::default(),
            budget_warn_threshold: 0.80,
            budget_critical_threshold: 1.0,
            metrics_enabled: true,
        }
    }
}

impl TickConfig {
    pub const MAX_TICK_RATE_HZ: u32 = 128;

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self {
            tick_rate_hz,
            ..Default::default()
        }
    }

    /// A config whose ticks only happen when the owner asks for them.
    pub fn manual() -> Self {
        Self::with_rate(0)
    }

    /// Clamps out-of-range values:
    /// - `tick_rate_hz` capped to [`Self::MAX_TICK_RATE_HZ`] (0 stays manual).
    /// - Thresholds clamped to `0.0..=1.0`, warn ≤ critical.
    pub fn validated(mut self) -> Self {
        if self.tick_rate_hz > Self::MAX_TICK_RATE_HZ {
            warn!(
                rate = self.tick_rate_hz,
                max = Self::MAX_TICK_RATE_HZ,
                "tick_rate_hz exceeds maximum, clamping"
            );
            self.tick_rate_hz = Self::MAX_TICK_RATE_HZ;
        }
        self.budget_warn_threshold = self.budget_warn_threshold.clamp(0.0, 1.0);
        self.budget_critical_threshold = self.budget_critical_threshold.clamp(0.0, 1.0);
        if self.budget_warn_threshold > self.budget_critical_threshold {
            self.budget_warn_threshold = self.budget_critical_threshold;
        }
        self
    }

    /// Length of one tick, or `None` in manual mode.
    pub fn tick_duration(&self) -> Option<Duration> {
        if self.tick_rate_hz == 0 {
            None
        } else {
            Some(Duration::from_secs_f64(1.0 / self.tick_rate_hz as f64))
        }
    }
}

// ---------------------------------------------------------------------------
// Tick info
// ---------------------------------------------------------------------------

/// Returned by [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone, PartialEq)]
pub struct TickInfo {
    /// Starts at 1.
    pub tick: u64,
    /// Always `1 / tick_rate`. Simulation steps are fixed-size; `dt` is
    /// informational.
    pub dt: Duration,
    /// Fired more than 10% of a period after its deadline.
    pub overrun: bool,
    /// How far past the deadline the tick fired.
    pub late_by: Duration,
    /// Deadlines dropped under [`TickPolicy::Skip`]. Always 0 for `Burst`.
    pub ticks_skipped: u64,
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Runtime counters. Timing values refer to the work reported through
/// [`TickScheduler::record_tick_end`].
#[derive(Debug, Clone, Default)]
pub struct TickMetrics {
    pub total_ticks: u64,
    pub total_overruns: u64,
    pub total_skipped: u64,
    /// Exponential moving average, α = 0.1.
    pub avg_tick_time: Duration,
    pub max_tick_time: Duration,
    /// Last tick's work time over the budget. Above 1.0 means overrun.
    pub budget_utilization: f64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Drives the world's fixed-step loop. One per world actor.
#[derive(Debug)]
pub struct TickScheduler {
    config: TickConfig,
    tick_duration: Option<Duration>,
    tick_count: u64,
    next_tick: Option<TokioInstant>,
    /// Set by `wait_for_tick`, consumed by `record_tick_end`.
    tick_start: Option<Instant>,
    paused: bool,
    metrics: TickMetrics,
}

impl TickScheduler {
    /// Creates a scheduler. The first tick is due one period from now.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();
        let tick_duration = config.tick_duration();
        let next_tick = tick_duration.map(|d| TokioInstant::now() + d);

        match tick_duration {
            None => debug!("tick scheduler created in manual mode"),
            Some(d) => debug!(
                rate_hz = config.tick_rate_hz,
                budget_ms = d.as_secs_f64() * 1000.0,
                policy = ?config.policy,
                "tick scheduler created"
            ),
        }

        Self {
            config,
            tick_duration,
            tick_count: 0,
            next_tick,
            tick_start: None,
            paused: false,
            metrics: TickMetrics::default(),
        }
    }

    pub fn with_rate(tick_rate_hz: u32) -> Self {
        Self::new(TickConfig::with_rate(tick_rate_hz))
    }

    /// Waits for the next deadline.
    ///
    /// Pends forever in manual mode or while paused; `select!` keeps
    /// serving its other branches. Cancel-safe: nothing changes until the
    /// deadline is reached.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let (next, period) = match (self.next_tick, self.tick_duration) {
            (Some(next), Some(period)) if !self.paused => (next, period),
            _ => std::future::pending().await,
        };

        time::sleep_until(next).await;

        let now = TokioInstant::now();
        self.tick_count += 1;
        self.tick_start = Some(Instant::now());

        let late_by = now.saturating_duration_since(next);
        let overrun = late_by > period / 10;
        let mut ticks_skipped = 0;

        self.next_tick = Some(match self.config.policy {
            TickPolicy::Burst => {
                let behind = whole_periods(late_by, period);
                if behind > 0 {
                    trace!(tick = self.tick_count, behind, "tick behind schedule, bursting");
                }
                next + period
            }
            TickPolicy::Skip => {
                ticks_skipped = whole_periods(late_by, period);
                if ticks_skipped > 0 {
                    warn!(
                        tick = self.tick_count,
                        skipped = ticks_skipped,
                        late_ms = late_by.as_secs_f64() * 1000.0,
                        "tick overrun, skipping ahead"
                    );
                }
                now + period
            }
        });

        if overrun {
            self.metrics.total_overruns += 1;
        }
        self.metrics.total_skipped += ticks_skipped;
        self.metrics.total_ticks += 1;

        trace!(tick = self.tick_count, overrun, "tick fired");

        TickInfo {
            tick: self.tick_count,
            dt: period,
            overrun,
            late_by,
            ticks_skipped,
        }
    }

    /// Marks the end of the current tick's work for budget tracking.
    /// A no-op if no tick is in progress.
    pub fn record_tick_end(&mut self) {
        let Some(start) = self.tick_start.take() else {
            return;
        };
        let elapsed = start.elapsed();

        if let Some(budget) = self.tick_duration {
            let utilization = elapsed.as_secs_f64() / budget.as_secs_f64();
            self.metrics.budget_utilization = utilization;

            if utilization >= self.config.budget_critical_threshold {
                warn!(
                    tick = self.tick_count,
                    elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                    budget_ms = budget.as_secs_f64() * 1000.0,
                    utilization_pct = format!("{:.1}", utilization * 100.0),
                    "tick exceeded budget"
                );
            } else if utilization >= self.config.budget_warn_threshold {
                warn!(
                    tick = self.tick_count,
                    elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                    budget_ms = budget.as_secs_f64() * 1000.0,
                    utilization_pct = format!("{:.1}", utilization * 100.0),
                    "tick approaching budget limit"
                );
            }
        }

        if self.config.metrics_enabled {
            self.metrics.max_tick_time = self.metrics.max_tick_time.max(elapsed);
            let alpha = 0.1;
            let prev = self.metrics.avg_tick_time.as_secs_f64();
            self.metrics.avg_tick_time =
                Duration::from_secs_f64(prev * (1.0 - alpha) + elapsed.as_secs_f64() * alpha);
        }
    }

    /// Stops ticks until [`resume`](Self::resume). Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(tick = self.tick_count, "tick scheduler paused");
        }
    }

    /// Restarts the grid one period from now, so time spent paused is
    /// not replayed as a burst.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            if let Some(period) = self.tick_duration {
                self.next_tick = Some(TokioInstant::now() + period);
            }
            debug!(tick = self.tick_count, "tick scheduler resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_manual(&self) -> bool {
        self.tick_duration.is_none()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn metrics(&self) -> &TickMetrics {
        &self.metrics
    }

    pub fn tick_rate_hz(&self) -> u32 {
        self.config.tick_rate_hz
    }

    pub fn tick_duration(&self) -> Option<Duration> {
        self.tick_duration
    }
}

fn whole_periods(late_by: Duration, period: Duration) -> u64 {
    (late_by.as_nanos() / period.as_nanos().max(1)) as u64
}
