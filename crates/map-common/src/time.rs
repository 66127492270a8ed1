//! Time range expressions for backend queries.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// One endpoint of a time range.
///
/// Absolute endpoints are concrete UTC timestamps. Relative endpoints are
/// backend date-math expressions ("now-15m", "now/d") passed through to the
/// query verbatim; the backend resolves them at execution time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TimeExpr {
    Absolute(DateTime<Utc>),
    Relative(String),
}

impl TimeExpr {
    /// Render the endpoint the way the backend's range filter expects it.
    pub fn to_query_value(&self) -> String {
        match self {
            TimeExpr::Absolute(dt) => dt.to_rfc3339(),
            TimeExpr::Relative(expr) => expr.clone(),
        }
    }
}

impl std::fmt::Display for TimeExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_query_value())
    }
}

/// A closed time range used to scope aggregation queries.
///
/// Equality is structural: two ranges with the same relative expressions are
/// equal even though they may resolve to different instants, which is exactly
/// the comparison the refresh decision needs (the user has not changed the
/// time picker).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: TimeExpr,
    pub to: TimeExpr,
}

impl TimeRange {
    pub fn new(from: TimeExpr, to: TimeExpr) -> Self {
        Self { from, to }
    }

    /// Range between two absolute timestamps.
    pub fn absolute(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self::new(TimeExpr::Absolute(from), TimeExpr::Absolute(to))
    }

    /// Range between two relative date-math expressions.
    pub fn relative(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::new(
            TimeExpr::Relative(from.into()),
            TimeExpr::Relative(to.into()),
        )
    }

    /// Parse an RFC 3339 pair into an absolute range.
    pub fn from_rfc3339(from: &str, to: &str) -> Result<Self, TimeParseError> {
        Ok(Self::absolute(parse_rfc3339(from)?, parse_rfc3339(to)?))
    }
}

fn parse_rfc3339(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    // Accept a bare date as midnight UTC
    if let Ok(ndt) =
        chrono::NaiveDateTime::parse_from_str(&format!("{}T00:00:00", s), "%Y-%m-%dT%H:%M:%S")
    {
        return Ok(Utc.from_utc_datetime(&ndt));
    }

    Err(TimeParseError::InvalidFormat(s.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),
}
