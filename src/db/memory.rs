use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::TradeStore;
use crate::error::StoreError;
use crate::models::trade::Trade;

/// In-process trade store for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryTradeStore {
    trades: RwLock<Vec<Trade>>,
}

impl MemoryTradeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trades(trades: Vec<Trade>) -> Self {
        Self {
            trades: RwLock::new(trades),
        }
    }

    pub async fn len(&self) -> usize {
        self.trades.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.trades.read().await.is_empty()
    }
}

#[async_trait]
impl TradeStore for MemoryTradeStore {
    async fn append(&self, trades: &[Trade]) -> Result<(), StoreError> {
        self.trades.write().await.extend_from_slice(trades);
        tracing::debug!("Appended {} trades to memory store", trades.len());
        Ok(())
    }

    async fn query_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Trade>, StoreError> {
        Ok(self
            .trades
            .read()
            .await
            .iter()
            .filter(|trade| trade.timestamp < cutoff)
            .cloned()
            .collect())
    }
}
