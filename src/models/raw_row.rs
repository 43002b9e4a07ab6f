use serde::{Deserialize, Serialize};

/// The fixed, ordered set of columns a trade row is built from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TradeField {
    UserId,
    UtcTime,
    Operation,
    Market,
    Amount,
    Price,
}

impl TradeField {
    pub const ALL: [TradeField; 6] = [
        TradeField::UserId,
        TradeField::UtcTime,
        TradeField::Operation,
        TradeField::Market,
        TradeField::Amount,
        TradeField::Price,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeField::UserId => "user_id",
            TradeField::UtcTime => "utc_time",
            TradeField::Operation => "operation",
            TradeField::Market => "market",
            TradeField::Amount => "amount",
            TradeField::Price => "price",
        }
    }

    /// Header of the CSV column carrying this field.
    pub fn column(&self) -> &'static str {
        match self {
            TradeField::UserId => "User_ID",
            TradeField::UtcTime => "UTC_Time",
            TradeField::Operation => "Operation",
            TradeField::Market => "Market",
            TradeField::Amount => "Buy/Sell Amount",
            TradeField::Price => "Price",
        }
    }

    pub fn from_column(column: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.column() == column)
    }
}

impl std::fmt::Display for TradeField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One textual trade row as read from an upload, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRow {
    /// 1-based line in the source file, if known.
    pub line: Option<u64>,
    pub user_id: Option<String>,
    pub utc_time: Option<String>,
    pub operation: Option<String>,
    pub market: Option<String>,
    pub amount: Option<String>,
    pub price: Option<String>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a row from `(column, value)` pairs. Unknown columns are ignored.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut row = Self::default();
        for (column, value) in pairs {
            if let Some(field) = TradeField::from_column(column) {
                row.set(field, value);
            }
        }
        row
    }

    pub fn with_line(mut self, line: u64) -> Self {
        self.line = Some(line);
        self
    }

    pub fn get(&self, field: TradeField) -> Option<&str> {
        self.slot(field).as_deref()
    }

    pub fn set(&mut self, field: TradeField, value: impl Into<String>) {
        *self.slot_mut(field) = Some(value.into());
    }

    fn slot(&self, field: TradeField) -> &Option<String> {
        match field {
            TradeField::UserId => &self.user_id,
            TradeField::UtcTime => &self.utc_time,
            TradeField::Operation => &self.operation,
            TradeField::Market => &self.market,
            TradeField::Amount => &self.amount,
            TradeField::Price => &self.price,
        }
    }

    fn slot_mut(&mut self, field: TradeField) -> &mut Option<String> {
        match field {
            TradeField::UserId => &mut self.user_id,
            TradeField::UtcTime => &mut self.utc_time,
            TradeField::Operation => &mut self.operation,
            TradeField::Market => &mut self.market,
            TradeField::Amount => &mut self.amount,
            TradeField::Price => &mut self.price,
        }
    }
}
