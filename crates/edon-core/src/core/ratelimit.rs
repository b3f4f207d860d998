// crates/edon-core/src/core/ratelimit.rs
// ============================================================================
// Module: Rate Limit Windows
// Description: The three sliding windows the pipeline's rate limiter
// tracks per tenant/endpoint class.
// Purpose: Share one vocabulary for window kinds between the in-memory
// counter and the persisted snapshot the store keeps across restarts.
// Dependencies: serde
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

/// A sliding window a rate limit counter is tracked over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitWindow {
    /// One-minute window.
    Minute,
    /// One-hour window.
    Hour,
    /// One-day window.
    Day,
}

impl RateLimitWindow {
    /// Window length in whole seconds.
    #[must_use]
    pub const fn seconds(self) -> i64 {
        match self {
            Self::Minute => 60,
            Self::Hour => 60 * 60,
            Self::Day => 24 * 60 * 60,
        }
    }
}

/// Which limit table applies to a request, chosen by the pipeline from
/// the caller's authentication state and the endpoint it is hitting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitClass {
    /// The default, authenticated-tenant table.
    Default,
    /// Unauthenticated or anonymous callers; far stricter.
    Anonymous,
    /// High-frequency polling endpoints (`/health`, `/timeseries`).
    Polling,
}

/// One `(count, limit)` pair for a single window, used to report
/// `Retry-After`-style context back to the caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitCounter {
    /// The window this counter covers.
    pub window: RateLimitWindow,
    /// Requests counted so far within the current window.
    pub count: u32,
    /// Maximum requests allowed within the window.
    pub limit: u32,
}

impl RateLimitCounter {
    /// Whether this counter has exceeded its limit.
    #[must_use]
    pub const fn is_exceeded(self) -> bool {
        self.count >= self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_window_is_twenty_four_hours() {
        assert_eq!(RateLimitWindow::Day.seconds(), RateLimitWindow::Hour.seconds() * 24);
    }

    #[test]
    fn counter_at_limit_is_exceeded() {
        let counter = RateLimitCounter { window: RateLimitWindow::Minute, count: 10, limit: 10 };
        assert!(counter.is_exceeded());
    }
}
