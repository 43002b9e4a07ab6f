use csv::{ByteRecord, ByteRecordsIntoIter, ReaderBuilder};
use std::io::Read;

use crate::models::raw_row::{RawRow, TradeField};

/// Lazily reads [`RawRow`]s from CSV data with a header line.
///
/// Columns are matched by header name; unknown columns are ignored and short
/// rows simply leave the trailing fields unset. Bytes that are not valid
/// UTF-8 are replaced with U+FFFD, so a garbled value fails normalization of
/// its own row instead of ending the read.
pub struct CsvRowSource<R> {
    fields: Vec<Option<TradeField>>,
    records: ByteRecordsIntoIter<R>,
}

impl<R: Read> CsvRowSource<R> {
    pub fn new(reader: R) -> Result<Self, csv::Error> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let fields: Vec<Option<TradeField>> = rdr
            .byte_headers()?
            .iter()
            .map(|header| {
                let header = String::from_utf8_lossy(header);
                TradeField::from_column(header.trim_start_matches('\u{feff}').trim())
            })
            .collect();

        let source = Self {
            fields,
            records: rdr.into_byte_records(),
        };
        let missing = source.missing_fields();
        if !missing.is_empty() {
            tracing::warn!("CSV header lacks columns: {:?}", missing);
        }
        Ok(source)
    }

    /// Recognized fields with no matching header column.
    pub fn missing_fields(&self) -> Vec<TradeField> {
        TradeField::ALL
            .into_iter()
            .filter(|field| !self.fields.contains(&Some(*field)))
            .collect()
    }

    fn to_row(fields: &[Option<TradeField>], record: &ByteRecord) -> RawRow {
        let mut row = RawRow::new();
        for (field, value) in fields.iter().zip(record.iter()) {
            if let Some(field) = field {
                row.set(*field, String::from_utf8_lossy(value));
            }
        }
        match record.position() {
            Some(pos) => row.with_line(pos.line()),
            None => row,
        }
    }
}

impl<R: Read> Iterator for CsvRowSource<R> {
    type Item = Result<RawRow, csv::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        Some(record.map(|rec| Self::to_row(&self.fields, &rec)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_follow_header_order() {
        let data = "\u{feff}Price,Market,Extra,User_ID,Operation,UTC_Time,Buy/Sell Amount\n\
                    20000,BTC/USDT,x,1,Buy,26-09-2022 10:00,2\n";
        let rows: Vec<RawRow> = CsvRowSource::new(data.as_bytes())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.line, Some(2));
        assert_eq!(row.get(TradeField::UserId), Some("1"));
        assert_eq!(row.get(TradeField::UtcTime), Some("26-09-2022 10:00"));
        assert_eq!(row.get(TradeField::Amount), Some("2"));
        assert_eq!(row.get(TradeField::Price), Some("20000"));
    }

    #[test]
    fn test_short_rows_and_missing_columns() {
        let data = "User_ID,UTC_Time,Operation,Market\n1,26-09-2022 10:00\n";
        let source = CsvRowSource::new(data.as_bytes()).unwrap();
        assert_eq!(source.missing_fields(), vec![TradeField::Amount, TradeField::Price]);

        let rows: Vec<RawRow> = source.collect::<Result<_, _>>().unwrap();
        assert_eq!(rows[0].get(TradeField::UtcTime), Some("26-09-2022 10:00"));
        assert_eq!(rows[0].get(TradeField::Operation), None);
    }

    #[test]
    fn test_invalid_utf8_stays_in_its_row() {
        let mut data = b"User_ID,UTC_Time,Operation,Market,Buy/Sell Amount,Price\n".to_vec();
        data.extend_from_slice(b"1,26-09-2022 10:00,Buy,BTC/USDT,2,20000\n");
        data.extend_from_slice(b"1,26-09-2022 10:30,Buy,BTC/USDT,1,2\xff0\n");
        data.extend_from_slice(b"1,26-09-2022 11:00,Sell,BTC/USDT,0.5,21000\n");

        let rows: Vec<RawRow> = CsvRowSource::new(data.as_slice())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].line, Some(3));
        assert_eq!(rows[1].get(TradeField::Price), Some("2\u{fffd}0"));
        assert_eq!(rows[2].get(TradeField::Price), Some("21000"));
    }
}
