//! Host selection and health bookkeeping
//!
//! The [`RetryStrategy`] owns the host list shared by every request issued
//! through a client. Reads ([`HostIterator::next`]) and writes
//! ([`RetryStrategy::notify`]) go through the same mutex, so concurrent
//! requests observe each other's outcomes immediately.
//!
//! # Example
//!
//! ```rust
//! use algolia_core::{CallType, CallTypes, RetryStrategy, RetryableHost, TransportError};
//!
//! let strategy = RetryStrategy::new(vec![
//!     RetryableHost::new("app-1.algolianet.com", CallTypes::Universal),
//!     RetryableHost::new("app-2.algolianet.com", CallTypes::Universal),
//! ]);
//!
//! let mut hosts = strategy.retryable_hosts(CallType::Read);
//! let first = hosts.next().unwrap();
//! strategy.notify::<()>(first.url(), &Err(TransportError::http(503, None)));
//!
//! assert_eq!(hosts.next().unwrap().url(), "app-2.algolianet.com");
//! ```

use crate::call_type::CallType;
use crate::error::TransportResult;
use crate::host::{self, RetryableHost};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Delay after which a host marked down becomes eligible again
pub const DEFAULT_EXPIRATION_DELAY: Duration = Duration::from_secs(300);

/// How an attempt ended, from the point of view of host health
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The host answered with a usable response
    Success,
    /// The attempt timed out; the host stays up with a larger budget
    Timeout,
    /// The host failed in a way another host may not; it goes down
    Retryable,
    /// The failure is host-independent; health is left untouched
    Other,
}

impl Outcome {
    /// Classify the result of one attempt
    ///
    /// Decoding failures still count as [`Outcome::Other`]: the host did
    /// answer, the payload was simply unusable.
    pub fn classify<T>(result: &TransportResult<T>) -> Self {
        match result {
            Ok(_) => Self::Success,
            Err(e) if e.is_timeout() => Self::Timeout,
            Err(e) if e.is_retryable() => Self::Retryable,
            Err(_) => Self::Other,
        }
    }
}

/// Shared retry policy over an ordered list of hosts
#[derive(Debug, Clone)]
pub struct RetryStrategy {
    hosts: Arc<Mutex<Vec<RetryableHost>>>,
    expiration_delay: Duration,
}

impl RetryStrategy {
    /// Create a strategy over the given hosts, in priority order
    pub fn new(hosts: Vec<RetryableHost>) -> Self {
        Self {
            hosts: Arc::new(Mutex::new(hosts)),
            expiration_delay: DEFAULT_EXPIRATION_DELAY,
        }
    }

    /// Builder-style method to set the host expiration delay
    #[must_use]
    pub fn with_expiration_delay(mut self, delay: Duration) -> Self {
        self.expiration_delay = delay;
        self
    }

    /// Current host expiration delay
    #[must_use]
    pub fn expiration_delay(&self) -> Duration {
        self.expiration_delay
    }

    /// Snapshot of the host list, for diagnostics
    #[must_use]
    pub fn hosts(&self) -> Vec<RetryableHost> {
        lock(&self.hosts).clone()
    }

    /// Hosts to try, in order, for one logical request of `call_type`
    ///
    /// Expired hosts are reset first. If no host supporting `call_type` is
    /// up afterwards, all of them are reset so a request is never locked
    /// out permanently.
    pub fn retryable_hosts(&self, call_type: CallType) -> HostIterator {
        self.retryable_hosts_at(call_type, Instant::now())
    }

    pub(crate) fn retryable_hosts_at(&self, call_type: CallType, now: Instant) -> HostIterator {
        {
            let mut hosts = lock(&self.hosts);
            host::reset_expired(&mut hosts, self.expiration_delay, now);

            if !hosts.iter().any(|h| h.supports(call_type) && h.is_up()) {
                debug!(call_type = %call_type, "No host up, resetting all");
                host::reset_all(&mut hosts, call_type, now);
            }
        }

        HostIterator {
            hosts: Arc::clone(&self.hosts),
            call_type,
            attempted: Vec::new(),
        }
    }

    /// Record the result of an attempt against `url`
    pub fn notify<T>(&self, url: &str, result: &TransportResult<T>) {
        self.notify_at(url, Outcome::classify(result), Instant::now());
    }

    pub(crate) fn notify_at(&self, url: &str, outcome: Outcome, now: Instant) {
        let mut hosts = lock(&self.hosts);
        let Some(host) = hosts.iter_mut().find(|h| h.url() == url) else {
            warn!(url = %url, "Outcome reported for unknown host");
            debug_assert!(false, "outcome reported for unknown host {url}");
            return;
        };

        match outcome {
            Outcome::Success => host.reset(now),
            Outcome::Timeout => host.has_timed_out(now),
            Outcome::Retryable => host.has_failed(now),
            Outcome::Other => return,
        }

        debug!(
            url = %url,
            outcome = ?outcome,
            is_up = host.is_up(),
            retry_count = host.retry_count(),
            "Host state updated"
        );
    }
}

fn lock(hosts: &Mutex<Vec<RetryableHost>>) -> MutexGuard<'_, Vec<RetryableHost>> {
    hosts.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Pull-based cursor over the hosts eligible for one logical request
///
/// Every call to [`next`](Iterator::next) looks at the live host list, so
/// a host taken down by a concurrent request is skipped right away. A host
/// is yielded at most once per iterator.
#[derive(Debug)]
pub struct HostIterator {
    hosts: Arc<Mutex<Vec<RetryableHost>>>,
    call_type: CallType,
    attempted: Vec<String>,
}

impl HostIterator {
    /// Call type this iterator selects hosts for
    #[must_use]
    pub fn call_type(&self) -> CallType {
        self.call_type
    }
}

impl Iterator for HostIterator {
    type Item = RetryableHost;

    fn next(&mut self) -> Option<Self::Item> {
        let host = lock(&self.hosts)
            .iter()
            .find(|h| {
                h.supports(self.call_type)
                    && h.is_up()
                    && !self.attempted.iter().any(|url| url == h.url())
            })
            .cloned()?;

        self.attempted.push(host.url().to_string());
        Some(host)
    }
}
