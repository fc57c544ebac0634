//! Backoff applied between failed batch items
//!
//! Every failure bumps a counter and blocks for `counter ^ exponent`
//! seconds. The counter starts at 1 and is bumped before the delay is
//! computed, so with the default exponent the delays run 4s, 9s, 16s, ...
//! The sleep only paces the dispatch of the remaining outcomes; nothing is
//! re-submitted by the backoff itself.

use log::debug;
use std::time::Duration;

/// Blocks the current thread for a given duration
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

/// Sleeper backed by `std::thread::sleep`
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Backoff tuning
#[derive(Debug, Clone)]
pub struct BackoffOptions {
    /// Initial value of the failure counter
    pub initial_factor: u32,
    pub exponent: u32,
    /// Reset the counter after a successful item (off: the counter only grows)
    pub reset_on_success: bool,
    /// Upper bound for a single delay; unbounded when `None`
    pub max_delay: Option<Duration>,
}

impl Default for BackoffOptions {
    fn default() -> Self {
        Self {
            initial_factor: 1,
            exponent: 2,
            reset_on_success: false,
            max_delay: None,
        }
    }
}

/// Failure counter and delay state
pub struct Backoff {
    options: BackoffOptions,
    factor: u32,
    current_delay: Duration,
    sleeper: Box<dyn Sleeper>,
}

impl Backoff {
    pub fn new(options: BackoffOptions, sleeper: Box<dyn Sleeper>) -> Self {
        Self {
            factor: options.initial_factor,
            current_delay: Duration::ZERO,
            options,
            sleeper,
        }
    }

    /// Backoff with default options that really sleeps
    pub fn blocking() -> Self {
        Self::new(BackoffOptions::default(), Box::new(ThreadSleeper))
    }

    /// Current value of the failure counter
    pub fn attempt_count(&self) -> u32 {
        self.factor
    }

    /// Delay applied after the most recent failure
    pub fn current_delay(&self) -> Duration {
        self.current_delay
    }

    /// Record a failure and block for the resulting delay
    pub fn on_failure(&mut self) -> Duration {
        self.factor = self.factor.saturating_add(1);
        let secs = u64::from(self.factor).saturating_pow(self.options.exponent);
        let mut delay = Duration::from_secs(secs);
        if let Some(max) = self.options.max_delay {
            delay = delay.min(max);
        }
        self.current_delay = delay;

        debug!("Backoff: sleep({}s) : {}", delay.as_secs(), self.factor);
        self.sleeper.sleep(delay);
        delay
    }

    /// Record a success
    pub fn on_success(&mut self) {
        if self.options.reset_on_success {
            self.factor = self.options.initial_factor;
            self.current_delay = Duration::ZERO;
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingSleeper;
    use super::*;

    fn secs(values: &[u64]) -> Vec<Duration> {
        values.iter().copied().map(Duration::from_secs).collect()
    }

    #[test]
    fn test_quadratic_growth() {
        let sleeper = RecordingSleeper::default();
        let mut backoff = Backoff::new(BackoffOptions::default(), Box::new(sleeper.clone()));

        assert_eq!(backoff.on_failure(), Duration::from_secs(4));
        assert_eq!(backoff.on_failure(), Duration::from_secs(9));
        assert_eq!(backoff.on_failure(), Duration::from_secs(16));
        assert_eq!(backoff.attempt_count(), 4);
        assert_eq!(sleeper.recorded(), secs(&[4, 9, 16]));
    }

    #[test]
    fn test_success_does_not_reset_by_default() {
        let sleeper = RecordingSleeper::default();
        let mut backoff = Backoff::new(BackoffOptions::default(), Box::new(sleeper.clone()));

        backoff.on_failure();
        backoff.on_success();
        backoff.on_failure();
        assert_eq!(sleeper.recorded(), secs(&[4, 9]));
    }

    #[test]
    fn test_reset_on_success() {
        let sleeper = RecordingSleeper::default();
        let options = BackoffOptions {
            reset_on_success: true,
            ..BackoffOptions::default()
        };
        let mut backoff = Backoff::new(options, Box::new(sleeper.clone()));

        backoff.on_failure();
        backoff.on_failure();
        backoff.on_success();
        assert_eq!(backoff.current_delay(), Duration::ZERO);
        backoff.on_failure();
        assert_eq!(sleeper.recorded(), secs(&[4, 9, 4]));
    }

    #[test]
    fn test_max_delay_caps_sleep() {
        let sleeper = RecordingSleeper::default();
        let options = BackoffOptions {
            max_delay: Some(Duration::from_secs(10)),
            ..BackoffOptions::default()
        };
        let mut backoff = Backoff::new(options, Box::new(sleeper.clone()));

        for _ in 0..3 {
            backoff.on_failure();
        }
        assert_eq!(sleeper.recorded(), secs(&[4, 9, 10]));
    }
}
