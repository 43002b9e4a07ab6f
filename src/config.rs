use anyhow::{anyhow, Result};
use std::env;

use crate::ledger::IngestPolicy;
use crate::utils::timestamp::TimeZoneMode;

pub const DEFAULT_DATABASE: &str = "trades";
pub const DEFAULT_COLLECTION: &str = "trades";

/// Runtime settings shared by the binaries.
///
/// Read from the environment (after `.env` is loaded); command line flags
/// override individual values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// MongoDB connection string (`MONGODB_URL`).
    pub database_url: Option<String>,
    /// `TRADELEDGER_DATABASE`, default `trades`.
    pub database_name: String,
    /// `TRADELEDGER_COLLECTION`, default `trades`.
    pub collection: String,
    /// `TRADELEDGER_TZ`: `local` (default) or `utc`.
    pub time_zone: TimeZoneMode,
    /// `TRADELEDGER_ON_ERROR`: `skip` (default) or `abort`.
    pub ingest_policy: IngestPolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: None,
            database_name: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            time_zone: TimeZoneMode::default(),
            ingest_policy: IngestPolicy::default(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let time_zone = match lookup("TRADELEDGER_TZ") {
            Some(v) => v.parse::<TimeZoneMode>().map_err(|e| anyhow!("TRADELEDGER_TZ: {}", e))?,
            None => defaults.time_zone,
        };
        let ingest_policy = match lookup("TRADELEDGER_ON_ERROR") {
            Some(v) => v.parse::<IngestPolicy>().map_err(|e| anyhow!("TRADELEDGER_ON_ERROR: {}", e))?,
            None => defaults.ingest_policy,
        };

        Ok(Self {
            database_url: lookup("MONGODB_URL").filter(|v| !v.is_empty()),
            database_name: lookup("TRADELEDGER_DATABASE").unwrap_or(defaults.database_name),
            collection: lookup("TRADELEDGER_COLLECTION").unwrap_or(defaults.collection),
            time_zone,
            ingest_policy,
        })
    }

    pub fn require_database_url(&self) -> Result<&str> {
        self.database_url
            .as_deref()
            .ok_or_else(|| anyhow!("MONGODB_URL must be set (or pass --database-url)"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.time_zone, TimeZoneMode::Local);
        assert!(settings.require_database_url().is_err());
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("MONGODB_URL", "mongodb://localhost:27017"),
            ("TRADELEDGER_COLLECTION", "uploads"),
            ("TRADELEDGER_TZ", "utc"),
            ("TRADELEDGER_ON_ERROR", "abort"),
        ]))
        .unwrap();

        assert_eq!(settings.require_database_url().unwrap(), "mongodb://localhost:27017");
        assert_eq!(settings.database_name, "trades");
        assert_eq!(settings.collection, "uploads");
        assert_eq!(settings.time_zone, TimeZoneMode::Utc);
        assert_eq!(settings.ingest_policy, IngestPolicy::AbortOnFirstError);
    }

    #[test]
    fn test_bad_time_zone() {
        assert!(Settings::from_lookup(lookup(&[("TRADELEDGER_TZ", "est")])).is_err());
    }
}
