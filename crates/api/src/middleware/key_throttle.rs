//! Device-key attempt throttling.
//!
//! The `key` query parameter is a bearer secret, so guesses against the
//! device endpoint are throttled per target device.

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovRateLimiter,
};
use std::{
    collections::HashMap,
    num::NonZeroU32,
    sync::{Arc, RwLock},
};
use uuid::Uuid;

/// Type alias for the rate limiter used per device.
type DeviceRateLimiter = GovRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Throttle state shared across all requests. Keyed by device id so a
/// flood of guesses against one device cannot lock out others.
pub struct KeyAttemptLimiter {
    limiters: RwLock<HashMap<Uuid, Arc<DeviceRateLimiter>>>,
    attempts_per_minute: u32,
}

impl KeyAttemptLimiter {
    /// Create a new limiter with the specified attempt budget per minute.
    pub fn new(attempts_per_minute: u32) -> Self {
        Self {
            limiters: RwLock::new(HashMap::new()),
            attempts_per_minute,
        }
    }

    fn get_or_create_limiter(&self, device_id: Uuid) -> Arc<DeviceRateLimiter> {
        {
            let limiters = self.limiters.read().unwrap();
            if let Some(limiter) = limiters.get(&device_id) {
                return limiter.clone();
            }
        }

        let mut limiters = self.limiters.write().unwrap();

        // Double-check in case another thread created it
        if let Some(limiter) = limiters.get(&device_id) {
            return limiter.clone();
        }

        let quota = Quota::per_minute(
            NonZeroU32::new(self.attempts_per_minute).unwrap_or(NonZeroU32::new(30).unwrap()),
        );
        let limiter = Arc::new(GovRateLimiter::direct(quota));
        limiters.insert(device_id, limiter.clone());
        limiter
    }

    /// Check whether another key attempt against the device is allowed.
    /// Returns Err with retry_after seconds when throttled.
    pub fn check(&self, device_id: Uuid) -> Result<(), u64> {
        let limiter = self.get_or_create_limiter(device_id);

        match limiter.check() {
            Ok(_) => Ok(()),
            Err(not_until) => {
                let wait_time = not_until.wait_time_from(governor::clock::Clock::now(
                    &governor::clock::DefaultClock::default(),
                ));
                Err(wait_time.as_secs().max(1))
            }
        }
    }
}

impl std::fmt::Debug for KeyAttemptLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyAttemptLimiter")
            .field("attempts_per_minute", &self.attempts_per_minute)
            .field("active_limiters", &self.limiters.read().unwrap().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_within_budget() {
        let limiter = KeyAttemptLimiter::new(5);
        let device = Uuid::new_v4();
        for _ in 0..5 {
            assert!(limiter.check(device).is_ok());
        }
    }

    #[test]
    fn test_throttles_over_budget() {
        let limiter = KeyAttemptLimiter::new(2);
        let device = Uuid::new_v4();
        assert!(limiter.check(device).is_ok());
        assert!(limiter.check(device).is_ok());
        assert!(limiter.check(device).is_err());
    }

    #[test]
    fn test_devices_throttled_independently() {
        let limiter = KeyAttemptLimiter::new(1);
        let device_a = Uuid::new_v4();
        let device_b = Uuid::new_v4();
        assert!(limiter.check(device_a).is_ok());
        assert!(limiter.check(device_a).is_err());
        assert!(limiter.check(device_b).is_ok());
    }
}
