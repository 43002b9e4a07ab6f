use crate::error::RejectionReason;
use crate::models::{
    operation::Operation,
    raw_row::{RawRow, TradeField},
    trade::Trade,
};
use crate::utils::timestamp::{parse_trade_time, TimeZoneMode};
use serde::Serialize;

/// Outcome of normalizing a batch of raw rows.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub accepted: Vec<Trade>,
    pub rejected: Vec<(RawRow, RejectionReason)>,
}

impl NormalizedBatch {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            accepted: self.accepted.len(),
            rejected: self.rejected.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub accepted: usize,
    pub rejected: usize,
}

/// Turns raw textual rows into [`Trade`]s.
///
/// Fields are checked in [`TradeField::ALL`] order and the first failing
/// field is reported. Quantities are not sign-checked: a negative
/// `Buy/Sell Amount` is accepted and must be validated by the caller if it
/// matters.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordNormalizer {
    time_zone: TimeZoneMode,
}

impl RecordNormalizer {
    pub fn new(time_zone: TimeZoneMode) -> Self {
        Self { time_zone }
    }

    pub fn time_zone(&self) -> TimeZoneMode {
        self.time_zone
    }

    pub fn normalize(&self, row: &RawRow) -> Result<Trade, RejectionReason> {
        let user_id = required(row, TradeField::UserId)?
            .trim()
            .parse::<i64>()
            .map_err(|e| RejectionReason::malformed(TradeField::UserId, e.to_string()))?;

        let timestamp = parse_trade_time(required(row, TradeField::UtcTime)?, self.time_zone)
            .map_err(|e| RejectionReason::malformed(TradeField::UtcTime, e))?;

        let operation = required(row, TradeField::Operation)?
            .parse::<Operation>()
            .map_err(|e| RejectionReason::malformed(TradeField::Operation, e))?;

        let market = required(row, TradeField::Market)?;
        if !market.contains('/') {
            return Err(RejectionReason::malformed(
                TradeField::Market,
                format!("expected \"BASE/QUOTE\", got {:?}", market),
            ));
        }

        let quantity = decimal(row, TradeField::Amount)?;
        let price = decimal(row, TradeField::Price)?;

        Ok(Trade::new(
            user_id,
            timestamp,
            operation,
            market.to_string(),
            quantity,
            price,
        ))
    }

    /// Normalizes every row; rejected rows are collected, never fatal.
    pub fn normalize_batch<I>(&self, rows: I) -> NormalizedBatch
    where
        I: IntoIterator<Item = RawRow>,
    {
        let mut batch = NormalizedBatch::default();
        for row in rows {
            self.normalize_into(&mut batch, row);
        }
        batch
    }

    /// Normalizes one row onto the accepted or rejected side of `batch`.
    pub fn normalize_into(&self, batch: &mut NormalizedBatch, row: RawRow) {
        match self.normalize(&row) {
            Ok(trade) => batch.accepted.push(trade),
            Err(reason) => batch.rejected.push((row, reason)),
        }
    }
}

fn required(row: &RawRow, field: TradeField) -> Result<&str, RejectionReason> {
    match row.get(field) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        Some(_) => Err(RejectionReason::malformed(field, "empty value")),
        None => Err(RejectionReason::malformed(
            field,
            format!("missing column {:?}", field.column()),
        )),
    }
}

fn decimal(row: &RawRow, field: TradeField) -> Result<f64, RejectionReason> {
    let raw = required(row, field)?;
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|e| RejectionReason::malformed(field, format!("{:?}: {}", raw, e)))?;
    if !value.is_finite() {
        return Err(RejectionReason::malformed(
            field,
            format!("{:?} is not a finite number", raw),
        ));
    }
    Ok(value)
}

/// Normalizes a batch with the default (local time) interpretation.
pub fn normalize_batch<I>(rows: I) -> NormalizedBatch
where
    I: IntoIterator<Item = RawRow>,
{
    RecordNormalizer::default().normalize_batch(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn row(user: &str, time: &str, op: &str, market: &str, amount: &str, price: &str) -> RawRow {
        RawRow::from_pairs([
            ("User_ID", user),
            ("UTC_Time", time),
            ("Operation", op),
            ("Market", market),
            ("Buy/Sell Amount", amount),
            ("Price", price),
        ])
    }

    fn utc() -> RecordNormalizer {
        RecordNormalizer::new(TimeZoneMode::Utc)
    }

    fn rejected_field(row: &RawRow) -> TradeField {
        utc().normalize(row).unwrap_err().field()
    }

    #[test]
    fn test_normalize_valid_row() {
        let trade = utc()
            .normalize(&row("1", "26-09-2022 10:00", "Buy", "BTC/USDT", "2", "20000"))
            .unwrap();

        assert_eq!(trade.user_id, 1);
        assert_eq!(trade.timestamp, Utc.with_ymd_and_hms(2022, 9, 26, 10, 0, 0).unwrap());
        assert_eq!(trade.operation, Operation::Buy);
        assert_eq!(trade.market, "BTC/USDT");
        assert_eq!(trade.quantity, 2.0);
        assert_eq!(trade.price, 20000.0);
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let input = row("42", "01-01-2023 23:59", "Sell", "ETH/USDT", "0.125", "1200.5");
        let normalizer = RecordNormalizer::default();
        assert_eq!(normalizer.normalize(&input), normalizer.normalize(&input));
    }

    #[test]
    fn test_malformed_user_id() {
        let input = row("abc", "26-09-2022 10:00", "Buy", "BTC/USDT", "2", "20000");
        let err = utc().normalize(&input).unwrap_err();
        assert_eq!(err.field(), TradeField::UserId);
        assert!(err.to_string().starts_with("malformed field `user_id`"));
    }

    #[test]
    fn test_each_field_reports_itself() {
        let ok = ["1", "26-09-2022 10:00", "Buy", "BTC/USDT", "2", "20000"];
        let bad = ["1.5", "26-09-2022", "buy", "BTCUSDT", "two", "NaN"];

        for (i, field) in TradeField::ALL.into_iter().enumerate() {
            let mut values = ok;
            values[i] = bad[i];
            let input = row(values[0], values[1], values[2], values[3], values[4], values[5]);
            assert_eq!(rejected_field(&input), field);
        }
    }

    #[test]
    fn test_missing_and_empty_columns() {
        let mut input = row("1", "26-09-2022 10:00", "Buy", "BTC/USDT", "2", "20000");
        input.price = None;
        assert_eq!(rejected_field(&input), TradeField::Price);

        input.set(TradeField::Price, "1");
        input.set(TradeField::Market, "  ");
        assert_eq!(rejected_field(&input), TradeField::Market);
    }

    #[test]
    fn test_first_failing_field_wins() {
        let input = row("x", "bad", "Hold", "BTC", "y", "z");
        assert_eq!(rejected_field(&input), TradeField::UserId);
    }

    #[test]
    fn test_negative_amount_accepted() {
        let trade = utc()
            .normalize(&row("1", "26-09-2022 10:00", "Sell", "BTC/USDT", "-3.5", "20000"))
            .unwrap();
        assert_eq!(trade.quantity, -3.5);
    }

    #[test]
    fn test_infinite_price_rejected() {
        let input = row("1", "26-09-2022 10:00", "Buy", "BTC/USDT", "1", "inf");
        assert_eq!(rejected_field(&input), TradeField::Price);
    }

    #[test]
    fn test_batch_keeps_going_after_rejection() {
        let rows = vec![
            row("1", "26-09-2022 10:00", "Buy", "BTC/USDT", "2", "20000").with_line(2),
            row("abc", "26-09-2022 10:00", "Buy", "BTC/USDT", "2", "20000").with_line(3),
            row("1", "26-09-2022 11:00", "Sell", "BTC/USDT", "0.5", "21000").with_line(4),
        ];

        let batch = utc().normalize_batch(rows);

        assert_eq!(batch.summary(), BatchSummary { accepted: 2, rejected: 1 });
        assert!(!batch.is_clean());
        let (raw, reason) = &batch.rejected[0];
        assert_eq!(raw.line, Some(3));
        assert_eq!(reason.field(), TradeField::UserId);
    }
}
