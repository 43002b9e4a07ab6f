//! Error types for trade ingestion and balance queries.

use crate::models::raw_row::TradeField;
use thiserror::Error;

/// Why a single raw row could not be turned into a [`Trade`](crate::models::trade::Trade).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    /// The value of `field` is missing or could not be parsed.
    #[error("malformed field `{field}`: {detail}")]
    MalformedField { field: TradeField, detail: String },
}

impl RejectionReason {
    pub fn malformed(field: TradeField, detail: impl Into<String>) -> Self {
        RejectionReason::MalformedField {
            field,
            detail: detail.into(),
        }
    }

    /// The field that failed normalization.
    pub fn field(&self) -> TradeField {
        match self {
            RejectionReason::MalformedField { field, .. } => *field,
        }
    }

    pub fn detail(&self) -> &str {
        match self {
            RejectionReason::MalformedField { detail, .. } => detail,
        }
    }
}

/// Failure reported by a [`TradeStore`](crate::db::TradeStore).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No usable connection to the backing store.
    #[error("trade store unavailable: {0}")]
    Unavailable(String),

    /// The backing store rejected the operation.
    #[error("trade store backend error: {0}")]
    Backend(String),

    /// A stored document could not be decoded back into a trade.
    #[error("corrupt trade document: {0}")]
    Corrupt(String),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Failure of a single balance query. Never accompanied by a partial result.
#[derive(Error, Debug)]
pub enum QueryError {
    /// The cutoff timestamp is missing or unparseable.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The trade store could not serve the query.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl QueryError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        QueryError::InvalidQuery(msg.into())
    }
}

/// Failure of a whole ingestion batch.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The raw row source could not be read.
    #[error("failed to read trade rows: {0}")]
    Source(#[from] csv::Error),

    /// Appending accepted trades failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A row was rejected while the abort-on-first-error policy was active.
    #[error("row {line} rejected: {reason}")]
    Rejected { line: u64, reason: RejectionReason },
}
