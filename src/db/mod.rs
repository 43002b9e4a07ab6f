pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::{Client, Collection};

use crate::error::StoreError;
use crate::models::trade::Trade;

pub use memory::MemoryTradeStore;

/// Append-only store of normalized trades.
///
/// Implementations own their isolation: appends are independent inserts and
/// queries are read-only scans.
#[async_trait]
pub trait TradeStore: Send + Sync {
    async fn append(&self, trades: &[Trade]) -> Result<(), StoreError>;

    /// All trades with `timestamp < cutoff`, in no particular order.
    async fn query_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Trade>, StoreError>;
}

/// MongoDB-backed trade store.
///
/// Without the update flag the store runs in dummy mode: appended documents
/// are only logged at `info` and queries fail with [`StoreError::Unavailable`].
pub struct MongoTradeStore {
    _client: Option<Client>,
    collection: Option<Collection<Document>>,
    collection_name: String,
    is_dummy: bool,
}

impl MongoTradeStore {
    pub async fn new(
        database_url: &str,
        database_name: &str,
        collection_name: &str,
        update_flag: bool,
    ) -> Result<Self> {
        use tracing::info;

        if update_flag {
            info!("Connecting to MongoDB: {}", database_url);
            let client = Client::with_uri_str(database_url).await?;
            let database = client.database(database_name);

            match database.run_command(doc! {"ping": 1}).await {
                Ok(_) => {
                    info!(
                        "Trade store initialized (real connection): database={}, collection={}, status=connected",
                        database.name(),
                        collection_name
                    );
                }
                Err(e) => {
                    tracing::error!("Database ping failed: {}", e);
                    return Err(e.into());
                }
            }

            Ok(Self {
                collection: Some(database.collection::<Document>(collection_name)),
                collection_name: collection_name.to_string(),
                _client: Some(client),
                is_dummy: false,
            })
        } else {
            info!("Trade store initialized (dummy connection)");

            Ok(Self {
                _client: None,
                collection: None,
                collection_name: collection_name.to_string(),
                is_dummy: true,
            })
        }
    }

    pub fn is_dummy(&self) -> bool {
        self.is_dummy
    }

    /// One `[DB-INSERT-<collection>] <document>` line per trade.
    pub fn insert_preview(&self, trades: &[Trade]) -> Vec<String> {
        trades
            .iter()
            .map(|trade| format!("[DB-INSERT-{}] {}", self.collection_name, trade.to_document()))
            .collect()
    }

    fn collection(&self) -> Result<&Collection<Document>, StoreError> {
        self.collection
            .as_ref()
            .ok_or_else(|| StoreError::Unavailable("no database connection (dummy mode)".to_string()))
    }
}

#[async_trait]
impl TradeStore for MongoTradeStore {
    async fn append(&self, trades: &[Trade]) -> Result<(), StoreError> {
        if self.is_dummy {
            for line in self.insert_preview(trades) {
                tracing::info!("{}", line);
            }
            tracing::info!("Dummy mode, skipping insert of {} trades", trades.len());
            return Ok(());
        }

        let docs: Vec<Document> = trades.iter().map(Trade::to_document).collect();
        for doc in &docs {
            tracing::debug!("[DB-INSERT-{}] {}", self.collection_name, doc);
        }
        // insert_many refuses an empty batch
        if docs.is_empty() {
            return Ok(());
        }

        match self.collection()?.insert_many(docs).await {
            Ok(result) => {
                tracing::info!("Inserted {} trade documents", result.inserted_ids.len());
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to insert trade documents: {}", e);
                Err(e.into())
            }
        }
    }

    async fn query_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<Trade>, StoreError> {
        let collection = self.collection()?;
        let filter = doc! {
            "utcTime": { "$lt": mongodb::bson::DateTime::from_millis(cutoff.timestamp_millis()) }
        };
        tracing::debug!("Querying trades: filter={}", filter);

        let docs: Vec<Document> = collection
            .find(filter)
            .await
            .map_err(|e| {
                tracing::error!("Trade query failed: {}", e);
                StoreError::from(e)
            })?
            .try_collect()
            .await?;

        docs.iter().map(Trade::from_document).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dummy_store_skips_append_and_refuses_queries() {
        let store = MongoTradeStore::new("", "trades", "trades", false).await.unwrap();
        assert!(store.is_dummy());

        let trade = Trade::new(
            1,
            Utc::now(),
            crate::models::operation::Operation::Buy,
            "BTC/USDT".to_string(),
            1.0,
            1.0,
        );
        let preview = store.insert_preview(std::slice::from_ref(&trade));
        assert_eq!(preview.len(), 1);
        assert!(preview[0].starts_with("[DB-INSERT-trades] "));
        assert!(preview[0].contains("market") && preview[0].contains("BTC/USDT"));
        assert!(store.append(&[trade]).await.is_ok());

        let err = store.query_before(Utc::now()).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
