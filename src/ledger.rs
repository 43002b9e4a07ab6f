//! Ingestion driver and query entry point over an injected trade store.

use serde::{Deserialize, Serialize};
use std::io::Read;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::db::TradeStore;
use crate::error::{IngestError, QueryError};
use crate::models::{raw_row::{RawRow, TradeField}, AssetBalances};
use crate::utils::{
    balance_aggregator::BalanceAggregator,
    csv_source::CsvRowSource,
    record_normalizer::{NormalizedBatch, RecordNormalizer},
    timestamp::TimeZoneMode,
};

/// What to do with a batch that contains rejected rows.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IngestPolicy {
    /// Store the accepted rows, report the rejected ones.
    #[default]
    SkipInvalid,
    /// Store nothing if any row is rejected.
    AbortOnFirstError,
}

impl FromStr for IngestPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" | "skip_invalid" => Ok(IngestPolicy::SkipInvalid),
            "abort" | "abort_on_first_error" => Ok(IngestPolicy::AbortOnFirstError),
            other => Err(format!("unknown ingest policy {:?} (expected skip or abort)", other)),
        }
    }
}

/// One rejected row as shown to the uploader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub line: Option<u64>,
    pub field: TradeField,
    pub detail: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub accepted: usize,
    pub rejected: Vec<Rejection>,
}

impl IngestReport {
    fn from_batch(batch: &NormalizedBatch) -> Self {
        Self {
            accepted: batch.accepted.len(),
            rejected: batch
                .rejected
                .iter()
                .map(|(row, reason)| Rejection {
                    line: row.line,
                    field: reason.field(),
                    detail: reason.detail().to_string(),
                })
                .collect(),
        }
    }
}

/// Ingests trade batches and answers balance queries.
///
/// Holds no state besides the store handle; batches and queries may run
/// concurrently from clones of the same ledger.
#[derive(Clone)]
pub struct TradeLedger {
    store: Arc<dyn TradeStore>,
    normalizer: RecordNormalizer,
    aggregator: BalanceAggregator,
    policy: IngestPolicy,
}

impl TradeLedger {
    pub fn new(store: Arc<dyn TradeStore>, time_zone: TimeZoneMode, policy: IngestPolicy) -> Self {
        Self {
            aggregator: BalanceAggregator::new(Arc::clone(&store), time_zone),
            normalizer: RecordNormalizer::new(time_zone),
            store,
            policy,
        }
    }

    pub fn normalizer(&self) -> &RecordNormalizer {
        &self.normalizer
    }

    pub fn policy(&self) -> IngestPolicy {
        self.policy
    }

    pub fn normalize_batch<I>(&self, rows: I) -> NormalizedBatch
    where
        I: IntoIterator<Item = RawRow>,
    {
        self.normalizer.normalize_batch(rows)
    }

    /// Normalizes `rows` and appends the accepted trades in a single call.
    pub async fn ingest<I>(&self, rows: I) -> Result<IngestReport, IngestError>
    where
        I: IntoIterator<Item = RawRow>,
    {
        self.commit(self.normalize_batch(rows)).await
    }

    /// Reads CSV rows from `reader`, normalizing each as it is read, and
    /// ingests the result. Only header and I/O failures end the read.
    pub async fn ingest_csv<R: Read>(&self, reader: R) -> Result<IngestReport, IngestError> {
        let mut batch = NormalizedBatch::default();
        for row in CsvRowSource::new(reader)? {
            self.normalizer.normalize_into(&mut batch, row?);
        }
        self.commit(batch).await
    }

    async fn commit(&self, batch: NormalizedBatch) -> Result<IngestReport, IngestError> {
        let report = IngestReport::from_batch(&batch);

        for rejection in &report.rejected {
            warn!(
                "Rejected row {}: field={} {}",
                rejection.line.map_or("?".to_string(), |l| l.to_string()),
                rejection.field,
                rejection.detail
            );
        }

        if self.policy == IngestPolicy::AbortOnFirstError {
            if let Some((row, reason)) = batch.rejected.into_iter().next() {
                return Err(IngestError::Rejected {
                    line: row.line.unwrap_or(0),
                    reason,
                });
            }
        }

        self.store.append(&batch.accepted).await?;
        info!(
            "Ingested batch: accepted={}, rejected={}",
            report.accepted,
            report.rejected.len()
        );
        Ok(report)
    }

    pub async fn compute_balances(&self, cutoff: Option<&str>) -> Result<AssetBalances, QueryError> {
        self.aggregator.compute_balances(cutoff).await
    }

    pub async fn balances_at(
        &self,
        cutoff: chrono::DateTime<chrono::Utc>,
    ) -> Result<AssetBalances, QueryError> {
        self.aggregator.balances_at(cutoff).await
    }
}
