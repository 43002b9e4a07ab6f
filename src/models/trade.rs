use chrono::{DateTime, Utc};
use mongodb::bson::{doc, Bson, Document};
use serde::{Deserialize, Serialize};
use super::operation::Operation;
use crate::error::StoreError;

/// One normalized buy/sell event. Created once at ingestion, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub user_id: i64,
    pub timestamp: DateTime<Utc>,
    pub operation: Operation,
    pub market: String,
    pub quantity: f64,
    pub price: f64,
}

impl Trade {
    pub fn new(
        user_id: i64,
        timestamp: DateTime<Utc>,
        operation: Operation,
        market: String,
        quantity: f64,
        price: f64,
    ) -> Self {
        Self {
            user_id,
            timestamp,
            operation,
            market,
            quantity,
            price,
        }
    }

    /// Base asset of the market, e.g. `BTC` for `BTC/USDT`.
    pub fn asset(&self) -> &str {
        self.market
            .split_once('/')
            .map_or(self.market.as_str(), |(base, _)| base)
    }

    /// Quantity with the operation's sign applied.
    pub fn signed_quantity(&self) -> f64 {
        self.operation.sign() * self.quantity
    }

    /// Document layout of the `trades` collection.
    pub fn to_document(&self) -> Document {
        doc! {
            "userId": self.user_id,
            "utcTime": mongodb::bson::DateTime::from_millis(self.timestamp.timestamp_millis()),
            "operation": self.operation.as_str(),
            "market": &self.market,
            "buySellAmount": self.quantity,
            "price": self.price,
        }
    }

    pub fn from_document(doc: &Document) -> Result<Self, StoreError> {
        let corrupt = |key: &str, e: &dyn std::fmt::Display| {
            StoreError::Corrupt(format!("field {}: {}", key, e))
        };

        let user_id = match doc.get("userId") {
            Some(Bson::Int64(v)) => *v,
            Some(Bson::Int32(v)) => i64::from(*v),
            // Documents written by other clients may carry numbers as doubles
            Some(Bson::Double(v)) if v.fract() == 0.0 => *v as i64,
            other => return Err(corrupt("userId", &format!("unexpected value {:?}", other))),
        };
        let millis = doc
            .get_datetime("utcTime")
            .map_err(|e| corrupt("utcTime", &e))?
            .timestamp_millis();
        let timestamp = DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| corrupt("utcTime", &format!("out of range: {}", millis)))?;
        let operation = doc
            .get_str("operation")
            .map_err(|e| corrupt("operation", &e))?
            .parse::<Operation>()
            .map_err(|e| corrupt("operation", &e))?;
        let market = doc
            .get_str("market")
            .map_err(|e| corrupt("market", &e))?
            .to_string();

        Ok(Self {
            user_id,
            timestamp,
            operation,
            market,
            quantity: number(doc, "buySellAmount").map_err(|e| corrupt("buySellAmount", &e))?,
            price: number(doc, "price").map_err(|e| corrupt("price", &e))?,
        })
    }
}

fn number(doc: &Document, key: &str) -> Result<f64, String> {
    match doc.get(key) {
        Some(Bson::Double(v)) => Ok(*v),
        Some(Bson::Int32(v)) => Ok(f64::from(*v)),
        Some(Bson::Int64(v)) => Ok(*v as f64),
        other => Err(format!("unexpected value {:?}", other)),
    }
}
