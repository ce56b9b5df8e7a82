//! Request deadline carried into write transactions

use std::time::{Duration, Instant};

/// Point in time after which a pending transaction must not commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(Option<Instant>);

impl Deadline {
    /// Deadline `timeout` from now
    pub fn after(timeout: Duration) -> Self {
        Self(Some(Instant::now() + timeout))
    }

    /// No deadline (background jobs, tests)
    pub fn none() -> Self {
        Self(None)
    }

    pub fn is_expired(&self) -> bool {
        self.0.is_some_and(|at| Instant::now() >= at)
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline() {
        assert!(!Deadline::none().is_expired());
        assert!(!Deadline::after(Duration::from_secs(60)).is_expired());
        assert!(Deadline::after(Duration::ZERO).is_expired());
    }
}
