//! Millisecond timestamps for history and transmission records.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::Error;

/// Milliseconds since the Unix epoch.
///
/// Records produced by one scenario should be stamped with [`tick`](Self::tick)
/// so their order never goes backwards even if the wall clock does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// The epoch itself; used as the "never" default of decoded records.
    pub const EPOCH: Timestamp = Timestamp(0);

    /// Creates a timestamp at the current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        Self(millis)
    }

    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    #[must_use]
    pub const fn as_millis(&self) -> i64 {
        self.0
    }

    /// Returns a timestamp strictly after `self`, at the current time when
    /// the clock has moved past it.
    #[must_use]
    pub fn tick(&self) -> Self {
        let now = Self::now();
        if now.0 > self.0 {
            now
        } else {
            Self(self.0.saturating_add(1))
        }
    }

    /// Converts to a chrono UTC datetime.
    pub fn to_datetime(&self) -> Result<DateTime<Utc>, Error> {
        DateTime::<Utc>::from_timestamp_millis(self.0)
            .ok_or_else(|| Error::InvalidTimestamp(self.0.to_string()))
    }

    /// Parses an RFC 3339 string.
    pub fn parse_rfc3339(s: &str) -> Result<Self, Error> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| Self(dt.timestamp_millis()))
            .map_err(|e| Error::InvalidTimestamp(format!("{s}: {e}")))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Ok(dt) => write!(f, "{}", dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Err(_) => write!(f, "{}ms", self.0),
        }
    }
}
