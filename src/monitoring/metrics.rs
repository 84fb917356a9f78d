// Copyright (c) 2025 Campus Advisor
// SPDX-License-Identifier: BUSL-1.1

//! In-process metrics counters.
//!
//! Named monotonic counters, snapshotable for periodic logging. No exporter
//! surface; observability pipelines are out of scope.

use std::collections::HashMap;
use std::sync::Mutex;

pub mod names {
    pub const QUERIES_TOTAL: &str = "queries_total";
    pub const QUERIES_DEGRADED: &str = "queries_degraded";
    pub const QUERIES_CANCELLED: &str = "queries_cancelled";
    pub const INDEX_REBUILDS: &str = "index_rebuilds";

    pub fn routed_to(domain: &str) -> String {
        format!("queries_routed_to_{}", domain.replace('-', "_"))
    }

    pub fn degraded(domain: &str) -> String {
        format!("domain_degraded_{}", domain.replace('-', "_"))
    }
}

#[derive(Debug, Default)]
pub struct EngineMetrics {
    counters: Mutex<HashMap<String, u64>>,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self, name: &str) {
        self.increment_by(name, 1);
    }

    pub fn increment_by(&self, name: &str, value: u64) {
        let mut counters = self.counters.lock().unwrap();
        *counters.entry(name.to_string()).or_insert(0) += value;
    }

    pub fn get(&self, name: &str) -> u64 {
        self.counters.lock().unwrap().get(name).copied().unwrap_or(0)
    }

    pub fn snapshot(&self) -> HashMap<String, u64> {
        self.counters.lock().unwrap().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = EngineMetrics::new();
        assert_eq!(metrics.get(names::QUERIES_TOTAL), 0);

        metrics.increment(names::QUERIES_TOTAL);
        metrics.increment(names::QUERIES_TOTAL);
        metrics.increment_by(&names::routed_to("financial-aid"), 3);

        assert_eq!(metrics.get(names::QUERIES_TOTAL), 2);
        assert_eq!(metrics.get("queries_routed_to_financial_aid"), 3);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.len(), 2);
    }
}
