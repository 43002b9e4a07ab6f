pub mod timestamp;
pub mod record_normalizer;
pub mod balance_aggregator;
pub mod csv_source;
