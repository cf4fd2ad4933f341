//! Per-host health records
//!
//! A [`RetryableHost`] tracks whether an endpoint is usable, when its state
//! last changed and how many consecutive timeouts it has accumulated. The
//! records are only mutated by the [`RetryStrategy`](crate::RetryStrategy),
//! which is why the mutators take the current instant explicitly and are
//! crate-private.

use crate::call_type::{CallType, CallTypes};
use std::time::{Duration, Instant};

/// Health state of one configured endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryableHost {
    url: String,
    call_types: CallTypes,
    is_up: bool,
    last_updated: Instant,
    retry_count: u32,
}

impl RetryableHost {
    /// Create a healthy host
    pub fn new(url: impl Into<String>, call_types: CallTypes) -> Self {
        Self {
            url: url.into(),
            call_types,
            is_up: true,
            last_updated: Instant::now(),
            retry_count: 0,
        }
    }

    /// Endpoint identity, e.g. `myapp-dsn.algolia.net`
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Call types accepted by this host
    #[must_use]
    pub fn call_types(&self) -> CallTypes {
        self.call_types
    }

    /// Whether the host is currently eligible
    #[must_use]
    pub fn is_up(&self) -> bool {
        self.is_up
    }

    /// Instant of the last state transition
    #[must_use]
    pub fn last_updated(&self) -> Instant {
        self.last_updated
    }

    /// Consecutive timeouts since the last reset
    #[must_use]
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Whether the host accepts the given call type
    #[must_use]
    pub fn supports(&self, call_type: CallType) -> bool {
        self.call_types.contains(call_type)
    }

    /// Effective per-attempt timeout: `base * (retry_count + 1)`
    #[must_use]
    pub fn timeout(&self, base: Duration) -> Duration {
        base.saturating_mul(self.retry_count.saturating_add(1))
    }

    pub(crate) fn reset(&mut self, now: Instant) {
        self.is_up = true;
        self.retry_count = 0;
        self.last_updated = now;
    }

    /// A timed out host stays up but gets a larger budget next time.
    pub(crate) fn has_timed_out(&mut self, now: Instant) {
        self.is_up = true;
        self.retry_count = self.retry_count.saturating_add(1);
        self.last_updated = now;
    }

    pub(crate) fn has_failed(&mut self, now: Instant) {
        self.is_up = false;
        self.last_updated = now;
    }
}

/// Reset every host whose state is older than `expiration_delay`
pub(crate) fn reset_expired(hosts: &mut [RetryableHost], expiration_delay: Duration, now: Instant) {
    for host in hosts
        .iter_mut()
        .filter(|h| now.saturating_duration_since(h.last_updated) > expiration_delay)
    {
        host.reset(now);
    }
}

/// Reset every host supporting `call_type`, expired or not
pub(crate) fn reset_all(hosts: &mut [RetryableHost], call_type: CallType, now: Instant) {
    for host in hosts.iter_mut().filter(|h| h.supports(call_type)) {
        host.reset(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn host(call_types: CallTypes) -> RetryableHost {
        RetryableHost::new("test-dsn.algolia.net", call_types)
    }

    #[test]
    fn test_new_host_is_up() {
        let h = host(CallTypes::Universal);
        assert!(h.is_up());
        assert_eq!(h.retry_count(), 0);
        assert!(h.supports(CallType::Read));
        assert!(h.supports(CallType::Write));
    }

    #[test]
    fn test_has_failed_marks_down_without_touching_retry_count() {
        let now = Instant::now();
        let mut h = host(CallTypes::Read);
        h.has_timed_out(now);
        h.has_failed(now);
        assert!(!h.is_up());
        assert_eq!(h.retry_count(), 1);
    }

    #[test]
    fn test_reset_restores_host() {
        let now = Instant::now();
        let mut h = host(CallTypes::Read);
        h.has_timed_out(now);
        h.has_failed(now);

        let later = now + Duration::from_secs(1);
        h.reset(later);
        assert!(h.is_up());
        assert_eq!(h.retry_count(), 0);
        assert_eq!(h.last_updated(), later);
    }

    #[test]
    fn test_timeout_scales_with_retry_count() {
        let now = Instant::now();
        let base = Duration::from_secs(2);
        let mut h = host(CallTypes::Read);
        assert_eq!(h.timeout(base), Duration::from_secs(2));

        h.has_timed_out(now);
        assert_eq!(h.timeout(base), Duration::from_secs(4));

        h.has_timed_out(now);
        assert_eq!(h.timeout(base), Duration::from_secs(6));
    }

    #[test]
    fn test_reset_expired_only_touches_old_hosts() {
        let start = Instant::now();
        let mut hosts = vec![host(CallTypes::Read), host(CallTypes::Write)];
        hosts[0].has_failed(start);
        hosts[1].has_failed(start + Duration::from_secs(200));

        reset_expired(&mut hosts, Duration::from_secs(300), start + Duration::from_secs(301));

        assert!(hosts[0].is_up());
        assert!(!hosts[1].is_up());
    }

    #[test]
    fn test_reset_all_filters_by_call_type() {
        let now = Instant::now();
        let mut hosts = vec![
            host(CallTypes::Read),
            host(CallTypes::Write),
            host(CallTypes::Universal),
        ];
        for h in &mut hosts {
            h.has_failed(now);
        }

        reset_all(&mut hosts, CallType::Read, now);

        assert!(hosts[0].is_up());
        assert!(!hosts[1].is_up());
        assert!(hosts[2].is_up());
    }

    proptest! {
        #[test]
        fn prop_timeouts_never_take_host_down(timeouts in 1u32..50, base_ms in 1u64..10_000) {
            let now = Instant::now();
            let base = Duration::from_millis(base_ms);
            let mut h = host(CallTypes::Universal);
            let mut previous = h.timeout(base);

            for _ in 0..timeouts {
                h.has_timed_out(now);
                prop_assert!(h.is_up());
                let current = h.timeout(base);
                prop_assert!(current > previous);
                previous = current;
            }

            prop_assert_eq!(h.retry_count(), timeouts);
            prop_assert_eq!(previous, base * (timeouts + 1));
        }
    }
}
