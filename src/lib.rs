pub mod config;
pub mod db;
pub mod error;
pub mod ledger;
pub mod models;
pub mod utils;

pub use db::{MemoryTradeStore, MongoTradeStore, TradeStore};
pub use error::{IngestError, QueryError, RejectionReason, StoreError};
pub use ledger::{IngestPolicy, IngestReport, TradeLedger};
pub use models::{operation::Operation, raw_row::{RawRow, TradeField}, trade::Trade, AssetBalances};
pub use utils::record_normalizer::{normalize_batch, NormalizedBatch, RecordNormalizer};
pub use utils::timestamp::TimeZoneMode;
