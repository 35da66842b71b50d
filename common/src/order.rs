use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Timestamp layout the e-commerce service uses for `date_placed`.
pub const ECOMMERCE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// External order identifier (e.g. "OSCR-1000").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(pub String);

impl OrderNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The part of a commerce order the refund window depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub number: OrderNumber,
    pub date_placed: DateTime<Utc>,
}

/// Errors from the order service. None of these are swallowed by callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error("order service unreachable: {0}")]
    Transport(String),
    #[error("order service returned HTTP {status} for order {order}")]
    UnexpectedStatus { order: OrderNumber, status: u16 },
    #[error("malformed order response for {order}: {reason}")]
    Malformed { order: OrderNumber, reason: String },
    #[error("could not authenticate with the order service: {0}")]
    Auth(String),
    #[error("invalid order service configuration: {0}")]
    Config(String),
}

/// Read a `date_placed` value. Accepts the service's UTC layout and full RFC 3339.
pub fn parse_date_placed(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, ECOMMERCE_DATE_FORMAT) {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Abstraction over where order details come from (the remote commerce
/// service in production, fixed tables in tests).
#[allow(async_fn_in_trait)]
pub trait OrderLookup {
    /// Fetch one order by number.
    async fn placed_order(&self, number: &OrderNumber) -> Result<PlacedOrder, OrderError>;
}
