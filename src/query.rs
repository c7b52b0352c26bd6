//! Translation of caller-supplied query parameters into store queries.
//!
//! Every supplied parameter narrows the result set (predicates AND
//! together). Out-of-range pagination values are rejected, not clamped:
//! a silently adjusted page would be inconsistent with what the caller
//! believes it requested. Each rejection names the offending parameter.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use crate::store::MessageFilter;

/// Raw query string of `GET /messages`, before validation.
///
/// Numeric fields arrive as strings so that a malformed value produces a
/// named validation error instead of a generic extractor rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub from: Option<String>,
    pub since: Option<String>,
    pub q: Option<String>,
}

/// Validated pagination bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub limit: i64,
    pub offset: i64,
}

/// Parameter validation failures, reported to the caller verbatim.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("limit must be an integer between 1 and {max}")]
    InvalidLimit { max: i64 },

    #[error("offset must be a non-negative integer")]
    InvalidOffset,

    #[error("since must be an RFC 3339 timestamp")]
    InvalidSince,
}

/// Bounds the query engine validates against.
#[derive(Debug, Clone, Copy)]
pub struct PageLimits {
    /// Page size used when `limit` is absent.
    pub default_limit: i64,

    /// Largest accepted `limit`.
    pub max_limit: i64,
}

/// Validates `raw` into a typed filter and pagination bounds.
///
/// Absent parameters fall back to defaults (`limit` = configured default,
/// `offset` = 0, no predicates). Present parameters must be valid: there
/// is no clamping on this path.
pub fn build_query(raw: &ListQuery, limits: PageLimits) -> Result<(MessageFilter, PageParams), QueryError> {
    let limit = match &raw.limit {
        None => limits.default_limit,
        Some(s) => {
            let parsed: i64 = s.parse().map_err(|_| QueryError::InvalidLimit {
                max: limits.max_limit,
            })?;
            if parsed < 1 || parsed > limits.max_limit {
                return Err(QueryError::InvalidLimit {
                    max: limits.max_limit,
                });
            }
            parsed
        }
    };

    let offset = match &raw.offset {
        None => 0,
        Some(s) => {
            let parsed: i64 = s.parse().map_err(|_| QueryError::InvalidOffset)?;
            if parsed < 0 {
                return Err(QueryError::InvalidOffset);
            }
            parsed
        }
    };

    let mut filter = MessageFilter::new();
    if let Some(sender) = &raw.from {
        filter = filter.sender_eq(sender.clone());
    }
    if let Some(since) = &raw.since {
        let since: DateTime<Utc> = DateTime::parse_from_rfc3339(since)
            .map_err(|_| QueryError::InvalidSince)?
            .with_timezone(&Utc);
        filter = filter.received_since(since);
    }
    if let Some(needle) = &raw.q {
        filter = filter.body_contains(needle.clone());
    }

    Ok((filter, PageParams { limit, offset }))
}
