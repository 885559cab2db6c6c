use chrono::Duration;

/// A refill rate plus a bucket capacity.
///
/// The rate is kept as the exact ratio `requests / window` so that refill
/// arithmetic stays in integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    pub(crate) requests: u32,
    pub(crate) window: Duration,
    pub(crate) burst: u32,
}

impl Limit {
    /// `requests` tokens refilled every `window`, with a burst of `requests`.
    #[must_use]
    pub fn new(requests: u32, window: Duration) -> Self {
        let requests = requests.max(1);
        let window = if window <= Duration::zero() {
            Duration::seconds(1)
        } else {
            window
        };
        Self {
            requests,
            window,
            burst: requests,
        }
    }

    #[must_use]
    pub fn per_second(requests: u32) -> Self {
        Self::new(requests, Duration::seconds(1))
    }

    #[must_use]
    pub fn per_minute(requests: u32) -> Self {
        Self::new(requests, Duration::minutes(1))
    }

    #[must_use]
    pub fn per_hour(requests: u32) -> Self {
        Self::new(requests, Duration::hours(1))
    }

    #[must_use]
    pub fn with_burst(mut self, burst: u32) -> Self {
        self.burst = burst.max(1);
        self
    }

    pub fn burst(&self) -> u32 {
        self.burst
    }

    pub fn rate_per_sec(&self) -> f64 {
        f64::from(self.requests) / (self.window_ms() as f64 / 1000.0)
    }

    /// Time for one token to refill.
    pub fn refill_interval(&self) -> Duration {
        Duration::milliseconds(
            i64::try_from(self.window_ms().div_ceil(u64::from(self.requests))).unwrap_or(i64::MAX),
        )
    }

    pub(crate) fn window_ms(&self) -> u64 {
        u64::try_from(self.window.num_milliseconds()).unwrap_or(1).max(1)
    }
}

impl Default for Limit {
    /// 60 requests per 30 minutes, burst 60.
    fn default() -> Self {
        Self::new(60, Duration::minutes(30))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limit() {
        let limit = Limit::default();
        assert_eq!(limit.burst(), 60);
        assert_eq!(limit.refill_interval(), Duration::seconds(30));
    }

    #[test]
    fn test_limit_per_minute() {
        let limit = Limit::per_minute(60);
        assert_eq!(limit.burst(), 60);
        assert!((limit.rate_per_sec() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_limit_with_burst() {
        let limit = Limit::per_hour(3600).with_burst(10);
        assert_eq!(limit.burst(), 10);
        assert_eq!(limit.refill_interval(), Duration::seconds(1));
    }

    #[test]
    fn test_degenerate_inputs_are_clamped() {
        let limit = Limit::new(0, Duration::zero());
        assert_eq!(limit.burst(), 1);
        assert_eq!(limit.window_ms(), 1000);
    }
}
