use chrono::{DateTime, Utc};
use num_traits::ToPrimitive;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::services::pipeline::Stage;

const MAX_DURATION_HISTORY: usize = 1000;

fn as_f64<T: ToPrimitive>(value: T) -> f64 {
    value.to_f64().unwrap_or(f64::MAX)
}

/// Nearest-rank percentile over an ascending slice; 0 when empty.
fn nearest_rank(sorted: &[u64], pct: u8) -> u64 {
    let Some(last) = sorted.len().checked_sub(1) else {
        return 0;
    };
    let rank = (sorted.len() * usize::from(pct.min(100))).div_ceil(100);
    sorted[rank.saturating_sub(1).min(last)]
}

#[derive(Clone, Default, Serialize)]
pub struct MetricsStats {
    pub total_runs: u64,
    pub failed_runs: u64,
    pub success_rate: f64,
    pub fetch_failures: u64,
    pub parse_failures: u64,
    pub encode_failures: u64,
    pub store_failures: u64,
    pub records_written: u64,
    pub last_run_records: u64,
    pub last_run_at: Option<DateTime<Utc>>,
    pub avg_run_duration_ms: f64,
    pub p50_run_duration_ms: u64,
    pub p95_run_duration_ms: u64,
    pub p99_run_duration_ms: u64,
}

#[derive(Default)]
struct Counters {
    total_runs: u64,
    failed_runs: u64,
    fetch_failures: u64,
    parse_failures: u64,
    encode_failures: u64,
    store_failures: u64,
    records_written: u64,
    last_run_records: u64,
    last_run_at: Option<DateTime<Utc>>,
}

/// Process-wide counters for pipeline runs triggered through the service.
pub struct Metrics {
    counters: Arc<RwLock<Counters>>,
    run_durations_ms: Arc<RwLock<VecDeque<u64>>>,
}

impl Metrics {
    #[must_use]
    pub fn new() -> Self {
        Self {
            counters: Arc::new(RwLock::new(Counters::default())),
            run_durations_ms: Arc::new(RwLock::new(VecDeque::new())),
        }
    }

    pub async fn record_success(&self, records: usize, duration_ms: u64) {
        let records = u64::try_from(records).unwrap_or(u64::MAX);
        {
            let mut counters = self.counters.write().await;
            counters.total_runs += 1;
            counters.records_written = counters.records_written.saturating_add(records);
            counters.last_run_records = records;
            counters.last_run_at = Some(Utc::now());
        }
        self.record_duration(duration_ms).await;
    }

    pub async fn record_failure(&self, stage: Stage, duration_ms: u64) {
        {
            let mut counters = self.counters.write().await;
            counters.total_runs += 1;
            counters.failed_runs += 1;
            counters.last_run_at = Some(Utc::now());
            let per_stage = match stage {
                Stage::Fetch => &mut counters.fetch_failures,
                Stage::Parse => &mut counters.parse_failures,
                Stage::Encode => &mut counters.encode_failures,
                Stage::Store => &mut counters.store_failures,
            };
            *per_stage += 1;
        }
        self.record_duration(duration_ms).await;
    }

    async fn record_duration(&self, duration_ms: u64) {
        let mut durations = self.run_durations_ms.write().await;
        durations.push_back(duration_ms);
        if durations.len() > MAX_DURATION_HISTORY {
            durations.pop_front();
        }
    }

    #[must_use]
    pub async fn get_stats(&self) -> MetricsStats {
        let counters = self.counters.read().await;
        let success_rate = if counters.total_runs > 0 {
            as_f64(counters.total_runs - counters.failed_runs) / as_f64(counters.total_runs)
                * 100.0
        } else {
            0.0
        };

        let durations = self.run_durations_ms.read().await;
        let mut sorted: Vec<u64> = durations.iter().copied().collect();
        sorted.sort_unstable();
        let avg_run_duration_ms = if sorted.is_empty() {
            0.0
        } else {
            let total: f64 = sorted.iter().map(|&x| as_f64(x)).sum();
            total / as_f64(sorted.len())
        };

        MetricsStats {
            total_runs: counters.total_runs,
            failed_runs: counters.failed_runs,
            success_rate,
            fetch_failures: counters.fetch_failures,
            parse_failures: counters.parse_failures,
            encode_failures: counters.encode_failures,
            store_failures: counters.store_failures,
            records_written: counters.records_written,
            last_run_records: counters.last_run_records,
            last_run_at: counters.last_run_at,
            avg_run_duration_ms,
            p50_run_duration_ms: nearest_rank(&sorted, 50),
            p95_run_duration_ms: nearest_rank(&sorted, 95),
            p99_run_duration_ms: nearest_rank(&sorted, 99),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
