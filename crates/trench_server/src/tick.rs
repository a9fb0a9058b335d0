//! # Tick Loop
//!
//! Fixed-timestep pacing for the match.
//!
//! ```text
//! loop
//!   wait_for_next_tick()
//!   while should_tick()
//!     start = begin_tick()
//!     ... inputs, world.update(dt), broadcasts ...
//!     end_tick(start)
//! ```
//!
//! A slow tick is not skipped: the accumulator keeps the debt and the loop
//! catches up with back-to-back ticks.

use std::time::{Duration, Instant};

/// Tick timing statistics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickStats {
    /// Shortest tick observed (µs).
    pub min_tick_us: u64,
    /// Longest tick observed (µs).
    pub max_tick_us: u64,
    /// Rolling average (µs).
    pub avg_tick_us: u64,
    /// Ticks that overran their budget.
    pub late_ticks: u64,
    /// Ticks measured.
    pub total_ticks: u64,
}

impl TickStats {
    fn new(budget: Duration) -> Self {
        Self {
            min_tick_us: u64::MAX,
            max_tick_us: 0,
            avg_tick_us: micros(budget),
            late_ticks: 0,
            total_ticks: 0,
        }
    }

    fn record(&mut self, duration: Duration, budget: Duration) {
        let us = micros(duration);
        self.total_ticks += 1;
        self.min_tick_us = self.min_tick_us.min(us);
        self.max_tick_us = self.max_tick_us.max(us);
        self.avg_tick_us = (self.avg_tick_us * 15 + us) / 16;
        if duration > budget {
            self.late_ticks += 1;
        }
    }

    /// Share of ticks that ran late, in percent.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn late_percent(&self) -> f64 {
        self.late_ticks as f64 / self.total_ticks.max(1) as f64 * 100.0
    }
}

fn micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

/// Fixed-timestep tick controller.
#[derive(Debug)]
pub struct TickLoop {
    tick_duration: Duration,
    last_poll: Instant,
    accumulator: Duration,
    tick_count: u64,
    stats: TickStats,
}

impl TickLoop {
    /// Creates a loop running `tick_rate` times per second.
    ///
    /// A zero rate is treated as 1 Hz.
    #[must_use]
    pub fn new(tick_rate: u32) -> Self {
        let tick_duration = Duration::from_micros(1_000_000 / u64::from(tick_rate.max(1)));
        Self {
            tick_duration,
            last_poll: Instant::now(),
            accumulator: Duration::ZERO,
            tick_count: 0,
            stats: TickStats::new(tick_duration),
        }
    }

    /// Returns true while a tick is owed.
    #[must_use]
    pub fn should_tick(&mut self) -> bool {
        let now = Instant::now();
        self.accumulator += now.duration_since(self.last_poll);
        self.last_poll = now;
        self.accumulator >= self.tick_duration
    }

    /// Pays one tick off the accumulator and returns its start time.
    #[must_use]
    pub fn begin_tick(&mut self) -> Instant {
        self.accumulator = self.accumulator.saturating_sub(self.tick_duration);
        self.tick_count += 1;
        Instant::now()
    }

    /// Records how long the tick that began at `start` took.
    pub fn end_tick(&mut self, start: Instant) {
        let duration = start.elapsed();
        self.stats.record(duration, self.tick_duration);
        if duration > self.tick_duration {
            tracing::debug!(
                tick = self.tick_count,
                took_us = micros(duration),
                budget_us = micros(self.tick_duration),
                "tick overran its budget"
            );
        }
    }

    /// Sleeps until the next tick is due, spinning for the last stretch.
    pub fn wait_for_next_tick(&self) {
        let owed = self.accumulator + self.last_poll.elapsed();
        if owed >= self.tick_duration {
            return;
        }
        let remaining = self.tick_duration - owed;
        if remaining > Duration::from_millis(1) {
            std::thread::sleep(remaining - Duration::from_micros(500));
        }
        while self.accumulator + self.last_poll.elapsed() < self.tick_duration {
            std::hint::spin_loop();
        }
    }

    /// Ticks begun so far.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Timing statistics.
    #[must_use]
    pub const fn stats(&self) -> &TickStats {
        &self.stats
    }

    /// Budget of one tick.
    #[must_use]
    pub const fn tick_duration(&self) -> Duration {
        self.tick_duration
    }

    /// Budget of one tick, in seconds.
    #[must_use]
    pub fn dt(&self) -> f32 {
        self.tick_duration.as_secs_f32()
    }

    /// Clears the statistics.
    pub fn reset_stats(&mut self) {
        self.stats = TickStats::new(self.tick_duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_duration() {
        let tick_loop = TickLoop::new(60);
        assert_eq!(tick_loop.tick_count(), 0);
        assert_eq!(tick_loop.tick_duration(), Duration::from_micros(16_666));
        assert!((tick_loop.dt() - 0.016_666).abs() < 1e-6);
        assert_eq!(TickLoop::new(0).tick_duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_owed_ticks_run() {
        let mut tick_loop = TickLoop::new(1000);
        std::thread::sleep(Duration::from_millis(5));

        assert!(tick_loop.should_tick());
        let start = tick_loop.begin_tick();
        tick_loop.end_tick(start);

        assert_eq!(tick_loop.tick_count(), 1);
        assert_eq!(tick_loop.stats().total_ticks, 1);
    }

    #[test]
    fn test_stats_track_late_ticks() {
        let mut tick_loop = TickLoop::new(1000);
        std::thread::sleep(Duration::from_millis(2));

        while tick_loop.should_tick() {
            let start = tick_loop.begin_tick();
            std::thread::sleep(Duration::from_millis(2));
            tick_loop.end_tick(start);
            if tick_loop.tick_count() >= 3 {
                break;
            }
        }

        let stats = tick_loop.stats();
        assert!(stats.total_ticks >= 1);
        assert_eq!(stats.late_ticks, stats.total_ticks);
        assert!(stats.min_tick_us <= stats.max_tick_us);
        assert!(stats.late_percent() > 99.0);

        tick_loop.reset_stats();
        assert_eq!(tick_loop.stats().total_ticks, 0);
    }

    #[test]
    fn test_wait_returns_when_due() {
        let mut tick_loop = TickLoop::new(500);
        tick_loop.wait_for_next_tick();
        assert!(tick_loop.should_tick());
    }
}
