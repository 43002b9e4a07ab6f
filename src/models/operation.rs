use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Operation {
    Buy,
    Sell,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Buy => "Buy",
            Operation::Sell => "Sell",
        }
    }

    /// Sign applied to the traded quantity when folding balances.
    pub fn sign(&self) -> f64 {
        match self {
            Operation::Buy => 1.0,
            Operation::Sell => -1.0,
        }
    }
}

impl FromStr for Operation {
    type Err = String;

    // Case-sensitive: "buy" or "BUY" are not operations.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Buy" => Ok(Operation::Buy),
            "Sell" => Ok(Operation::Sell),
            other => Err(format!("expected \"Buy\" or \"Sell\", got {:?}", other)),
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
