use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::TradeStore;
use crate::error::QueryError;
use crate::models::{trade::Trade, AssetBalances};
use crate::utils::timestamp::{parse_cutoff, TimeZoneMode};

/// Folds trades into net per-asset balances.
///
/// Only trades strictly before `cutoff` count. Buys add, sells subtract.
/// Each asset's signed quantities are summed in `total_cmp` order, so the
/// result does not depend on the order the store returned the trades in.
/// Entries that end exactly at `0.0` are removed; float residue such as
/// `1e-12` is kept as is.
pub fn fold_balances<'a, I>(trades: I, cutoff: DateTime<Utc>) -> AssetBalances
where
    I: IntoIterator<Item = &'a Trade>,
{
    let mut legs: HashMap<&str, Vec<f64>> = HashMap::new();

    for trade in trades.into_iter().filter(|t| t.timestamp < cutoff) {
        legs.entry(trade.asset()).or_default().push(trade.signed_quantity());
    }

    legs.into_iter()
        .filter_map(|(asset, mut quantities)| {
            quantities.sort_by(f64::total_cmp);
            let balance = quantities.into_iter().fold(0.0, |acc, q| acc + q);
            (balance != 0.0).then(|| (asset.to_string(), balance))
        })
        .collect()
}

/// Answers point-in-time balance queries against a trade store.
#[derive(Clone)]
pub struct BalanceAggregator {
    store: Arc<dyn TradeStore>,
    time_zone: TimeZoneMode,
}

impl BalanceAggregator {
    pub fn new(store: Arc<dyn TradeStore>, time_zone: TimeZoneMode) -> Self {
        Self { store, time_zone }
    }

    /// Parses `cutoff` and computes balances as of that instant.
    pub async fn compute_balances(&self, cutoff: Option<&str>) -> Result<AssetBalances, QueryError> {
        let cutoff = parse_cutoff(cutoff, self.time_zone)?;
        self.balances_at(cutoff).await
    }

    pub async fn balances_at(&self, cutoff: DateTime<Utc>) -> Result<AssetBalances, QueryError> {
        let trades = self.store.query_before(cutoff).await.map_err(|e| {
            tracing::error!("Error retrieving trades before {}: {}", cutoff, e);
            e
        })?;

        let balances = fold_balances(&trades, cutoff);
        tracing::info!(
            "Computed balances before {}: trades={}, assets={}",
            cutoff,
            trades.len(),
            balances.len()
        );
        Ok(balances)
    }
}
