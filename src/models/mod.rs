pub mod trade;
pub mod operation;
pub mod raw_row;

use std::collections::HashMap;

/// Net signed quantity per base asset symbol.
pub type AssetBalances = HashMap<String, f64>;
