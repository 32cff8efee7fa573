//! Lock-free client statistics

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Thread-safe request counters shared by every clone of a client.
#[derive(Debug, Default)]
pub struct ClientStats {
    /// Logical requests issued, counting each retried request once
    pub request_count: AtomicU64,
    /// Requests that resolved with a response
    pub successful_requests: AtomicU64,
    /// Requests that rejected after retries were exhausted
    pub failed_requests: AtomicU64,
    /// Extra attempts triggered by the retry policy
    pub retries: AtomicU64,
    /// Request body bytes handed to the transport
    pub total_bytes_sent: AtomicU64,
    /// Response body bytes materialized by the client
    pub total_bytes_received: AtomicU64,
    /// Wall time across all requests in nanoseconds
    pub total_response_time_nanos: AtomicU64,
}

/// Immutable snapshot of client statistics at a point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientStatsSnapshot {
    pub request_count: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub retries: u64,
    pub total_bytes_sent: u64,
    pub total_bytes_received: u64,
    pub total_response_time_nanos: u64,
}

impl ClientStats {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn record_request(&self) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_sent(&self, bytes: u64) {
        self.total_bytes_sent.fetch_add(bytes, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_received(&self, bytes: u64) {
        self.total_bytes_received.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn record_outcome(&self, success: bool, elapsed: Duration) {
        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.total_response_time_nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    /// Read every counter with relaxed ordering.
    #[inline]
    #[must_use]
    pub fn snapshot(&self) -> ClientStatsSnapshot {
        ClientStatsSnapshot {
            request_count: self.request_count.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            total_bytes_sent: self.total_bytes_sent.load(Ordering::Relaxed),
            total_bytes_received: self.total_bytes_received.load(Ordering::Relaxed),
            total_response_time_nanos: self.total_response_time_nanos.load(Ordering::Relaxed),
        }
    }

    /// Zero every counter.
    pub fn reset(&self) {
        for counter in [
            &self.request_count,
            &self.successful_requests,
            &self.failed_requests,
            &self.retries,
            &self.total_bytes_sent,
            &self.total_bytes_received,
            &self.total_response_time_nanos,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl ClientStatsSnapshot {
    /// Share of settled requests that succeeded, `1.0` before any request.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        let settled = self.successful_requests + self.failed_requests;
        if settled == 0 {
            1.0
        } else {
            self.successful_requests as f64 / settled as f64
        }
    }

    #[must_use]
    pub fn average_response_time(&self) -> Duration {
        let settled = self.successful_requests + self.failed_requests;
        if settled == 0 {
            Duration::ZERO
        } else {
            Duration::from_nanos(self.total_response_time_nanos / settled)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_recorded_events() {
        let stats = ClientStats::new();
        stats.record_request();
        stats.record_retry();
        stats.record_sent(10);
        stats.record_received(32);
        stats.record_outcome(true, Duration::from_millis(4));
        stats.record_request();
        stats.record_outcome(false, Duration::from_millis(2));

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.request_count, 2);
        assert_eq!(snapshot.retries, 1);
        assert_eq!(snapshot.total_bytes_sent, 10);
        assert_eq!(snapshot.total_bytes_received, 32);
        assert!((snapshot.success_rate() - 0.5).abs() < f64::EPSILON);
        assert_eq!(snapshot.average_response_time(), Duration::from_millis(3));

        stats.reset();
        assert_eq!(stats.snapshot(), ClientStatsSnapshot::default());
    }
}
