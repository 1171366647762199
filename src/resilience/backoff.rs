//! Exponential backoff schedule.

use std::time::Duration;

/// Infinite sequence of delays: `initial`, `initial * factor`, `initial * factor^2`, ...
///
/// Saturates at `Duration::MAX` instead of overflowing.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    next: Duration,
    factor: f64,
}

impl ExponentialBackoff {
    pub fn new(initial: Duration, factor: f64) -> Self {
        Self {
            next: initial,
            factor,
        }
    }
}

impl Iterator for ExponentialBackoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let current = self.next;
        self.next = Duration::try_from_secs_f64(current.as_secs_f64() * self.factor)
            .unwrap_or(Duration::MAX);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_sequence() {
        let delays: Vec<_> = ExponentialBackoff::new(Duration::from_millis(500), 2.0)
            .take(4)
            .collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_millis(500),
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
            ]
        );
    }

    #[test]
    fn test_fractional_factor() {
        let mut b = ExponentialBackoff::new(Duration::from_millis(100), 1.5);
        assert_eq!(b.next(), Some(Duration::from_millis(100)));
        assert_eq!(b.next(), Some(Duration::from_millis(150)));
        assert_eq!(b.next(), Some(Duration::from_millis(225)));
    }

    #[test]
    fn test_saturates() {
        let mut b = ExponentialBackoff::new(Duration::from_secs(u64::MAX / 2), 10.0);
        b.next();
        assert_eq!(b.next(), Some(Duration::MAX));
        assert_eq!(b.next(), Some(Duration::MAX));
    }
}
