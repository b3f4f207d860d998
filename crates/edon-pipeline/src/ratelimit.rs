// crates/edon-pipeline/src/ratelimit.rs
// ============================================================================
// Module: Rate Limiter
// Description: Enforces per-subject, per-window request counts against the
// store's persisted counters.
// Purpose: Give every request a durable, restart-surviving rate limit
// instead of the evaluator's deliberately non-durable `ActionHistory`.
// Dependencies: edon-core, edon-config, edon-store-sqlite
// ============================================================================

//! ## Overview
//! A request is admitted only if it would not exceed any of the three
//! windows (minute, hour, day) in its selected table. Per spec, a counter
//! is incremented only once the handler has produced a response whose
//! status is 2xx — `check_and_record` is called by `edon-server` after the
//! handler returns, not before, so a request that the handler itself
//! rejects never consumes quota.

use edon_config::RateLimitTable;
use edon_config::RateLimitTables;
use edon_core::RateLimitWindow;
use edon_core::SharedClock;
use edon_core::Timestamp;
use edon_store_sqlite::SqliteStore;

use crate::error::PipelineError;
use crate::request::EndpointClass;

/// Reads current counters for `subject` under `class` and returns an error
/// if any window is already at or past its limit. Does not increment
/// anything; call [`RateLimiter::record`] after a successful response.
pub struct RateLimiter<'a> {
    store: &'a SqliteStore,
    tables: RateLimitTables,
    clock: &'a SharedClock,
}

impl<'a> RateLimiter<'a> {
    /// Builds a rate limiter bound to `store`'s counters and `tables`'
    /// configured limits.
    #[must_use]
    pub fn new(store: &'a SqliteStore, tables: RateLimitTables, clock: &'a SharedClock) -> Self {
        Self { store, tables, clock }
    }

    /// Checks `subject`'s current counters against `class`'s table without
    /// mutating anything.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::RateLimited`] if any window is at or past
    /// its limit, or [`PipelineError::Internal`] on a store failure.
    pub fn check(&self, subject: &str, class: EndpointClass) -> Result<(), PipelineError> {
        let table = self.table_for(class);
        let now = self.clock.now();
        for window in [RateLimitWindow::Minute, RateLimitWindow::Hour, RateLimitWindow::Day] {
            let limit = limit_for(table, window);
            let bucket_key = bucket_key(window, now);
            let count = self
                .store
                .read_rate_limit_counter(subject, window_label(window), &bucket_key)
                .map_err(|err| PipelineError::Internal(err.to_string()))?;
            if count >= limit {
                tracing::debug!(subject, ?window, count, limit, "rate limit exceeded");
                return Err(PipelineError::RateLimited {
                    detail: format!("{subject} exceeded the {window:?} rate limit"),
                    retry_after_secs: seconds_until_bucket_reset(window, now),
                });
            }
        }
        Ok(())
    }

    /// Increments `subject`'s counters for every window under `class`.
    /// Callers invoke this only after a handler returns a 2xx response.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Internal`] on a store failure.
    pub fn record(&self, subject: &str, class: EndpointClass) -> Result<(), PipelineError> {
        let now = self.clock.now();
        for window in [RateLimitWindow::Minute, RateLimitWindow::Hour, RateLimitWindow::Day] {
            let bucket_key = bucket_key(window, now);
            self.store
                .increment_rate_limit_counter(subject, window_label(window), &bucket_key, now)
                .map_err(|err| PipelineError::Internal(err.to_string()))?;
        }
        Ok(())
    }

    fn table_for(&self, class: EndpointClass) -> RateLimitTable {
        match class {
            EndpointClass::Default => self.tables.default,
            EndpointClass::Polling => self.tables.polling,
        }
    }
}

fn limit_for(table: RateLimitTable, window: RateLimitWindow) -> u32 {
    match window {
        RateLimitWindow::Minute => table.per_minute,
        RateLimitWindow::Hour => table.per_hour,
        RateLimitWindow::Day => table.per_day,
    }
}

fn window_label(window: RateLimitWindow) -> &'static str {
    match window {
        RateLimitWindow::Minute => "minute",
        RateLimitWindow::Hour => "hour",
        RateLimitWindow::Day => "day",
    }
}

/// Buckets `now` into the window's current slot, coarse enough that two
/// calls within the same slot share a counter row.
fn bucket_key(window: RateLimitWindow, now: Timestamp) -> String {
    let unix = now.unix_seconds();
    let slot = unix / window.seconds();
    format!("{slot}")
}

fn seconds_until_bucket_reset(window: RateLimitWindow, now: Timestamp) -> u64 {
    let unix = now.unix_seconds();
    let period = window.seconds();
    let remainder = unix.rem_euclid(period);
    u64::try_from(period - remainder).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use edon_core::SystemClock;
    use tempfile::tempdir;

    use super::*;

    fn table(limit: u32) -> RateLimitTables {
        RateLimitTables {
            default: RateLimitTable { per_minute: limit, per_hour: limit * 10, per_day: limit * 100 },
            anonymous: RateLimitTable { per_minute: 1, per_hour: 1, per_day: 1 },
            polling: RateLimitTable { per_minute: limit, per_hour: limit * 10, per_day: limit * 100 },
        }
    }

    #[test]
    fn records_consume_quota_until_exceeded() {
        let dir = tempdir().unwrap();
        let store = edon_store_sqlite::SqliteStore::open(edon_store_sqlite::SqliteStoreConfig::new(
            dir.path().join("gw.db"),
        ))
        .unwrap();
        let clock: SharedClock = Arc::new(SystemClock);
        let limiter = RateLimiter::new(&store, table(2), &clock);

        limiter.check("agent-1", EndpointClass::Default).unwrap();
        limiter.record("agent-1", EndpointClass::Default).unwrap();
        limiter.check("agent-1", EndpointClass::Default).unwrap();
        limiter.record("agent-1", EndpointClass::Default).unwrap();

        let result = limiter.check("agent-1", EndpointClass::Default);
        assert!(matches!(result, Err(PipelineError::RateLimited { .. })));
    }

    #[test]
    fn distinct_subjects_have_independent_quota() {
        let dir = tempdir().unwrap();
        let store = edon_store_sqlite::SqliteStore::open(edon_store_sqlite::SqliteStoreConfig::new(
            dir.path().join("gw.db"),
        ))
        .unwrap();
        let clock: SharedClock = Arc::new(SystemClock);
        let limiter = RateLimiter::new(&store, table(1), &clock);

        limiter.record("agent-1", EndpointClass::Default).unwrap();
        limiter.check("agent-2", EndpointClass::Default).unwrap();
    }
}
