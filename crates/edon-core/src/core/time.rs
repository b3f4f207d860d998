// crates/edon-core/src/core/time.rs
// ============================================================================
// Module: Gateway Clock
// Description: Timestamp newtype and the Clock abstraction the evaluator
// and pipeline use instead of reading wall-clock time directly.
// Purpose: Make "now" an explicit, injectable dependency so evaluation
// stays a pure function of its inputs.
// Dependencies: time
// ============================================================================

use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// A UTC instant, serialized as RFC 3339 text on the wire.
///
/// # Invariants
/// - Always UTC; callers must convert before constructing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    /// Wraps an existing `OffsetDateTime`, converting it to UTC.
    #[must_use]
    pub fn new(at: OffsetDateTime) -> Self {
        Self(at.to_offset(time::UtcOffset::UTC))
    }

    /// Parses an RFC 3339 timestamp string.
    ///
    /// # Errors
    ///
    /// Returns an error when `raw` is not valid RFC 3339.
    pub fn from_rfc3339(raw: &str) -> Result<Self, time::error::Parse> {
        OffsetDateTime::parse(raw, &Rfc3339).map(Self::new)
    }

    /// Returns the RFC 3339 string form of this timestamp.
    #[must_use]
    pub fn to_rfc3339(self) -> String {
        self.0.format(&Rfc3339).unwrap_or_else(|_| self.0.unix_timestamp().to_string())
    }

    /// Returns the local hour-of-day (0-23) for work-hours checks.
    ///
    /// `work_hours_only` is documented as "gateway-local time"; the
    /// gateway's local offset is injected by the caller rather than read
    /// from the OS, keeping the evaluator pure.
    #[must_use]
    pub fn hour_in_offset(self, offset: time::UtcOffset) -> u8 {
        self.0.to_offset(offset).hour()
    }

    /// Returns the Unix timestamp in whole seconds.
    #[must_use]
    pub const fn unix_seconds(self) -> i64 {
        self.0.unix_timestamp()
    }

    /// Returns the number of whole seconds between `self` and `earlier`.
    #[must_use]
    pub fn seconds_since(self, earlier: Timestamp) -> i64 {
        self.unix_seconds() - earlier.unix_seconds()
    }
}

impl Serialize for Timestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_rfc3339())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Timestamp::from_rfc3339(&raw).map_err(serde::de::Error::custom)
    }
}

/// Source of "now" for evaluation and rate limiting.
///
/// # Invariants
/// - Implementations must be monotonic-enough for rate/loop windows: time
///   may not run backwards within a process lifetime.
pub trait Clock: Send + Sync {
    /// Returns the current instant.
    fn now(&self) -> Timestamp;
}

/// Clock backed by the operating system's wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::new(OffsetDateTime::now_utc())
    }
}

/// Shared, cloneable handle to a clock implementation.
pub type SharedClock = Arc<dyn Clock>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc3339_round_trips() {
        let at = Timestamp::from_rfc3339("2026-03-05T09:30:00Z").unwrap();
        assert_eq!(at.to_rfc3339(), "2026-03-05T09:30:00Z");
    }

    #[test]
    fn seconds_since_is_positive_for_later_timestamp() {
        let earlier = Timestamp::from_rfc3339("2026-03-05T09:00:00Z").unwrap();
        let later = Timestamp::from_rfc3339("2026-03-05T09:01:00Z").unwrap();
        assert_eq!(later.seconds_since(earlier), 60);
    }
}
