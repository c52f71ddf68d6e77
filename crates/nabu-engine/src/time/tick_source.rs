use std::time::{Duration, Instant};

/// External fixed-refresh timer driving a [`super::RenderLoop`].
pub trait TickSource: Send + 'static {
    /// Blocks until the next tick is due and returns the instant it fired.
    fn wait(&mut self) -> Instant;
}

/// Fixed-period timer.
///
/// Each deadline is the previous deadline plus one period. When a tick
/// overruns past the next deadline, the schedule is re-based on the late
/// tick instead of firing a burst, so ticks are never doubled or skipped.
#[derive(Debug, Clone)]
pub struct IntervalTimer {
    period: Duration,
    next: Option<Instant>,
}

impl IntervalTimer {
    /// Shortest period accepted; keeps the loop from spinning on the lock.
    pub const MIN_PERIOD: Duration = Duration::from_millis(1);

    /// `period` is clamped to at least [`Self::MIN_PERIOD`].
    pub fn new(period: Duration) -> Self {
        Self { period: period.max(Self::MIN_PERIOD), next: None }
    }

    /// `hz` is clamped to `1..=1000`.
    pub fn from_hz(hz: u32) -> Self {
        Self::new(Duration::from_secs(1) / hz.max(1))
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.next
    }
}

impl TickSource for IntervalTimer {
    fn wait(&mut self) -> Instant {
        let (deadline, fired) = match self.next {
            // First tick fires immediately.
            None => {
                let now = Instant::now();
                (now, now)
            }
            Some(deadline) => {
                let now = Instant::now();
                if deadline > now {
                    std::thread::sleep(deadline - now);
                }
                (deadline, Instant::now())
            }
        };

        let next = deadline + self.period;
        self.next = Some(if next > fired { next } else { fired + self.period });
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_rebases_after_overrun() {
        let p = Duration::from_millis(5);
        let mut timer = IntervalTimer::new(p);

        let t0 = timer.wait();
        assert_eq!(timer.next_deadline(), Some(t0 + p));

        std::thread::sleep(p * 4);
        let t1 = timer.wait();
        assert!(t1 >= t0 + p * 4);
        assert_eq!(timer.next_deadline(), Some(t1 + p));

        let t2 = timer.wait();
        assert!(t2 >= t1 + p);
    }

    #[test]
    fn from_hz_computes_period() {
        assert_eq!(IntervalTimer::from_hz(50).period(), Duration::from_millis(20));
        assert_eq!(IntervalTimer::from_hz(0).period(), Duration::from_secs(1));
    }

    #[test]
    fn period_never_drops_below_minimum() {
        assert_eq!(IntervalTimer::from_hz(u32::MAX).period(), IntervalTimer::MIN_PERIOD);
        assert_eq!(IntervalTimer::from_hz(5_000).period(), IntervalTimer::MIN_PERIOD);
        assert_eq!(IntervalTimer::new(Duration::ZERO).period(), IntervalTimer::MIN_PERIOD);
        assert_eq!(IntervalTimer::from_hz(1000).period(), Duration::from_millis(1));
    }
}
