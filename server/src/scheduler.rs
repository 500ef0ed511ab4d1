//! Drift-free timers for the simulation and broadcast drivers.
//!
//! Both timers keep a last-fired instant and move it forward by whole periods,
//! so late polls never shift the schedule.

use std::time::{Duration, Instant};

/// Steps owed by the fixed-step clock at one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepBudget {
    pub steps: u32,
    /// Periods discarded because the backlog exceeded the catch-up cap.
    pub dropped: u64,
}

#[derive(Debug, Clone)]
pub struct FixedStepClock {
    period: Duration,
    last: Instant,
    max_catch_up: u32,
}

impl FixedStepClock {
    pub fn new(period: Duration, max_catch_up: u32, now: Instant) -> Self {
        Self {
            period: period.max(Duration::from_micros(1)),
            last: now,
            max_catch_up: max_catch_up.max(1),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Number of whole periods elapsed since the last fire, capped. The excess
    /// beyond the cap is dropped and the clock re-anchors on `now`.
    pub fn due_steps(&mut self, now: Instant) -> StepBudget {
        let owed = periods_between(self.last, now, self.period);
        if owed == 0 {
            return StepBudget::default();
        }

        if owed > self.max_catch_up as u64 {
            self.last = now;
            return StepBudget {
                steps: self.max_catch_up,
                dropped: owed - self.max_catch_up as u64,
            };
        }

        self.last = advance(self.last, self.period, owed);
        StepBudget {
            steps: owed as u32,
            dropped: 0,
        }
    }

    pub fn reset(&mut self, now: Instant) {
        self.last = now;
    }
}

/// Periodic trigger that fires at most once per poll.
///
/// The slot grid advances by whole periods, so the schedule never drifts.
/// Consecutive fires are also never closer than one period, even when the poll
/// rate does not divide the period.
#[derive(Debug, Clone)]
pub struct Cadence {
    period: Duration,
    anchor: Instant,
    last_fired: Instant,
}

impl Cadence {
    pub fn new(period: Duration, now: Instant) -> Self {
        Self {
            period: period.max(Duration::from_micros(1)),
            anchor: now,
            last_fired: now,
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn poll(&mut self, now: Instant) -> bool {
        let elapsed = periods_between(self.anchor, now, self.period);
        if elapsed == 0 || now.saturating_duration_since(self.last_fired) < self.period {
            return false;
        }
        self.anchor = advance(self.anchor, self.period, elapsed);
        self.last_fired = now;
        true
    }

    pub fn reset(&mut self, now: Instant) {
        self.anchor = now;
        self.last_fired = now;
    }
}

fn periods_between(from: Instant, to: Instant, period: Duration) -> u64 {
    let elapsed = to.saturating_duration_since(from).as_nanos();
    (elapsed / period.as_nanos()).min(u64::MAX as u128) as u64
}

fn advance(from: Instant, period: Duration, periods: u64) -> Instant {
    let nanos = period.as_nanos().saturating_mul(periods as u128);
    from + Duration::from_nanos(nanos.min(u64::MAX as u128) as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;

    const TICK: Duration = Duration::from_millis(16);

    #[test]
    fn test_no_steps_before_first_period() {
        let start = Instant::now();
        let mut clock = FixedStepClock::new(TICK, 5, start);
        assert_eq!(clock.due_steps(start).steps, 0);
        assert_eq!(clock.due_steps(start + Duration::from_millis(15)).steps, 0);
    }

    #[test]
    fn test_one_step_per_period() {
        let start = Instant::now();
        let mut clock = FixedStepClock::new(TICK, 5, start);
        for i in 1..=100u32 {
            assert_eq!(clock.due_steps(start + TICK * i).steps, 1);
        }
    }

    #[test]
    fn test_catch_up_after_delay() {
        let start = Instant::now();
        let mut clock = FixedStepClock::new(TICK, 5, start);
        let budget = clock.due_steps(start + Duration::from_millis(50));
        assert_eq!(budget, StepBudget { steps: 3, dropped: 0 });

        // The 2ms remainder carries over: 64ms is one more period.
        assert_eq!(clock.due_steps(start + Duration::from_millis(64)).steps, 1);
    }

    #[test]
    fn test_catch_up_is_bounded() {
        let start = Instant::now();
        let mut clock = FixedStepClock::new(TICK, 5, start);
        let late = start + Duration::from_secs(2);
        let budget = clock.due_steps(late);
        assert_eq!(budget.steps, 5);
        assert_eq!(budget.dropped, 125 - 5);

        // Backlog is gone, not deferred.
        assert_eq!(clock.due_steps(late + Duration::from_millis(10)).steps, 0);
        assert_eq!(clock.due_steps(late + TICK).steps, 1);
    }

    #[test]
    fn test_clock_does_not_drift_with_jittery_polls() {
        let start = Instant::now();
        let mut clock = FixedStepClock::new(TICK, 5, start);
        let mut total = 0;
        // Poll every 17ms for ~1.6s: always slightly late.
        for i in 1..=100u32 {
            total += clock.due_steps(start + Duration::from_millis(17) * i).steps;
        }
        assert_eq!(total, 1700 / 16);
    }

    #[test]
    fn test_clock_reset() {
        let start = Instant::now();
        let mut clock = FixedStepClock::new(TICK, 5, start);
        let later = start + Duration::from_millis(40);
        clock.reset(later);
        assert_eq!(clock.due_steps(later + Duration::from_millis(15)).steps, 0);
        assert_eq!(clock.due_steps(later + TICK).steps, 1);
    }

    #[test]
    fn test_cadence_fires_once_per_period() {
        let start = Instant::now();
        let period = Duration::from_millis(100);
        let mut cadence = Cadence::new(period, start);

        let mut fired = Vec::new();
        // Driven at a tick rate that divides the period.
        for i in 1..=200u32 {
            let now = start + Duration::from_millis(10) * i;
            if cadence.poll(now) {
                fired.push(now);
            }
        }

        assert_eq!(fired.len(), 20);
        for pair in fired.windows(2) {
            assert!(pair[1] - pair[0] >= period);
        }
    }

    fn cadence_gaps(tick: Duration, period: Duration, polls: u32) -> Vec<Duration> {
        let start = Instant::now();
        let mut cadence = Cadence::new(period, start);
        let mut last_fire: Option<Instant> = None;
        let mut gaps = Vec::new();
        for i in 1..=polls {
            let now = start + tick * i;
            if cadence.poll(now) {
                if let Some(previous) = last_fire {
                    gaps.push(now - previous);
                }
                last_fire = Some(now);
            }
        }
        gaps
    }

    #[test]
    fn test_cadence_never_faster_than_period() {
        let period = Duration::from_millis(100);
        let gaps = cadence_gaps(TICK, period, 1000);

        assert!(!gaps.is_empty());
        assert!(gaps.iter().all(|gap| *gap >= period), "{:?}", gaps);

        let window = TICK * 1000;
        assert!(gaps.len() as u128 + 1 <= window.as_millis() / period.as_millis());
    }

    #[test]
    fn test_cadence_with_configured_periods() {
        let config = SimConfig {
            tick_ms: 20.0,
            broadcast_ms: 150,
            ..SimConfig::default()
        };
        let gaps = cadence_gaps(config.tick_period(), config.broadcast_period(), 600);
        assert!(gaps.iter().all(|gap| *gap >= config.broadcast_period()));

        let defaults = SimConfig::default();
        let gaps = cadence_gaps(defaults.tick_period(), defaults.broadcast_period(), 600);
        assert!(gaps.len() > 50);
        assert!(gaps.iter().all(|gap| *gap >= defaults.broadcast_period()));
    }

    #[test]
    fn test_cadence_late_poll_fires_once() {
        let start = Instant::now();
        let period = Duration::from_millis(100);
        let mut cadence = Cadence::new(period, start);

        let late = start + Duration::from_millis(450);
        assert!(cadence.poll(late));
        assert!(!cadence.poll(late));
        assert!(!cadence.poll(start + Duration::from_millis(499)));
        // Slot 500 has passed but the last fire was only 50ms ago.
        assert!(!cadence.poll(start + Duration::from_millis(500)));
        assert!(cadence.poll(start + Duration::from_millis(550)));
        // Grid stays on whole periods: slot 600 is the next one.
        assert!(!cadence.poll(start + Duration::from_millis(599)));
        assert!(!cadence.poll(start + Duration::from_millis(640)));
        assert!(cadence.poll(start + Duration::from_millis(650)));
    }

    #[test]
    fn test_cadence_reset() {
        let start = Instant::now();
        let period = Duration::from_millis(100);
        let mut cadence = Cadence::new(period, start);
        let later = start + Duration::from_millis(90);
        cadence.reset(later);
        assert!(!cadence.poll(start + Duration::from_millis(110)));
        assert!(cadence.poll(start + Duration::from_millis(190)));
    }
}
