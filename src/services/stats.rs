use crate::models::Stats;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

pub struct PaymentStats {
    prepared: AtomicU64,
    completed_success: AtomicU64,
    completed_failure: AtomicU64,
    replayed: AtomicU64,
    rejected: AtomicU64,
    start_time: Instant,
}

impl Default for PaymentStats {
    fn default() -> Self {
        Self::new()
    }
}

impl PaymentStats {
    pub fn new() -> Self {
        Self {
            prepared: AtomicU64::new(0),
            completed_success: AtomicU64::new(0),
            completed_failure: AtomicU64::new(0),
            replayed: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_prepared(&self) {
        self.prepared.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_completion(&self, success: bool) {
        if success {
            self.completed_success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.completed_failure.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_replay(&self) {
        self.replayed.fetch_add(1, Ordering::Relaxed);
    }

    /// Callbacks refused before any outcome was processed.
    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> Stats {
        Stats {
            prepared: self.prepared.load(Ordering::Relaxed),
            completed_success: self.completed_success.load(Ordering::Relaxed),
            completed_failure: self.completed_failure.load(Ordering::Relaxed),
            replayed: self.replayed.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            uptime_seconds: self.uptime_seconds(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_each_kind_separately() {
        let stats = PaymentStats::new();
        stats.record_prepared();
        stats.record_prepared();
        stats.record_completion(true);
        stats.record_completion(false);
        stats.record_replay();
        stats.record_rejected();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.prepared, 2);
        assert_eq!(snapshot.completed_success, 1);
        assert_eq!(snapshot.completed_failure, 1);
        assert_eq!(snapshot.replayed, 1);
        assert_eq!(snapshot.rejected, 1);
    }
}
