//! # minuet-metrics
//!
//! Lightweight metrics store for Minuet components.
//!
//! Counters and gauges keyed by name, safe to share across threads. Writers
//! pay one read-lock acquisition on the hot path; the map write lock is only
//! taken the first time a name is seen.

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

/// Thread-safe counter and gauge store
#[derive(Default)]
pub struct Metrics {
    counters: RwLock<HashMap<String, Arc<AtomicU64>>>,
    gauges: RwLock<HashMap<String, Arc<AtomicI64>>>,
}

impl Metrics {
    /// Create an empty metrics store
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment a counter by one
    pub fn inc(&self, name: &str) {
        self.add(name, 1);
    }

    /// Increment a counter by `delta`
    pub fn add(&self, name: &str, delta: u64) {
        if let Some(c) = self.counters.read().get(name) {
            c.fetch_add(delta, Ordering::Relaxed);
            return;
        }
        self.counters
            .write()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(AtomicU64::new(0)))
            .fetch_add(delta, Ordering::Relaxed);
    }

    /// Set a gauge to `value`
    pub fn set(&self, name: &str, value: i64) {
        if let Some(g) = self.gauges.read().get(name) {
            g.store(value, Ordering::Relaxed);
            return;
        }
        self.gauges
            .write()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(AtomicI64::new(0)))
            .store(value, Ordering::Relaxed);
    }

    /// Current value of a counter; zero if never touched
    pub fn counter(&self, name: &str) -> u64 {
        self.counters
            .read()
            .get(name)
            .map_or(0, |c| c.load(Ordering::Relaxed))
    }

    /// Current value of a gauge; zero if never set
    pub fn gauge(&self, name: &str) -> i64 {
        self.gauges
            .read()
            .get(name)
            .map_or(0, |g| g.load(Ordering::Relaxed))
    }

    /// Snapshot of every counter, sorted by name
    pub fn counters(&self) -> Vec<(String, u64)> {
        let mut out: Vec<_> = self
            .counters
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.load(Ordering::Relaxed)))
            .collect();
        out.sort();
        out
    }

    /// Snapshot of every gauge, sorted by name
    pub fn gauges(&self) -> Vec<(String, i64)> {
        let mut out: Vec<_> = self
            .gauges
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.load(Ordering::Relaxed)))
            .collect();
        out.sort();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_starts_at_zero() {
        let m = Metrics::new();
        assert_eq!(m.counter("never.seen"), 0);
    }

    #[test]
    fn test_counter_accumulates() {
        let m = Metrics::new();
        m.inc("events");
        m.add("events", 4);
        assert_eq!(m.counter("events"), 5);
    }

    #[test]
    fn test_gauge_overwrites() {
        let m = Metrics::new();
        m.set("depth", 10);
        m.set("depth", -3);
        assert_eq!(m.gauge("depth"), -3);
    }

    #[test]
    fn test_snapshots_sorted() {
        let m = Metrics::new();
        m.inc("b");
        m.inc("a");
        let names: Vec<_> = m.counters().into_iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_concurrent_increments() {
        use std::thread;

        let m = Arc::new(Metrics::new());
        let mut handles = vec![];
        for _ in 0..8 {
            let m = Arc::clone(&m);
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    m.inc("hits");
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(m.counter("hits"), 8000);
    }
}
