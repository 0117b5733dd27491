use crate::error::{Result, WalletError};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

/// One transfer request row: who sends, who receives, how much.
///
/// The sender column stands in for the authenticated identity the driver
/// resolves before calling the engine.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct TransferRow {
    pub sender: String,
    pub recipient: String,
    pub amount: Decimal,
}

/// Reads transfer requests from a CSV source.
///
/// This reader wraps `csv::Reader` and provides an iterator over
/// `Result<TransferRow>`. It handles whitespace trimming and flexible
/// record lengths automatically.
pub struct TransferReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> TransferReader<R> {
    /// Creates a new `TransferReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes rows.
    ///
    /// This allows for processing large files in a streaming fashion without
    /// loading the entire dataset into memory.
    pub fn rows(self) -> impl Iterator<Item = Result<TransferRow>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(WalletError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reader_valid_stream() {
        let data = "sender, recipient, amount\n\
                    alice@example.com, bob@example.com, 100.50\n\
                    bob@example.com, alice@example.com, 20";
        let reader = TransferReader::new(data.as_bytes());
        let rows: Vec<Result<TransferRow>> = reader.rows().collect();

        assert_eq!(rows.len(), 2);
        let first = rows[0].as_ref().unwrap();
        assert_eq!(first.sender, "alice@example.com");
        assert_eq!(first.amount, dec!(100.50));
    }

    #[test]
    fn test_reader_malformed_amount() {
        let data = "sender, recipient, amount\n\
                    alice@example.com, bob@example.com, lots";
        let reader = TransferReader::new(data.as_bytes());
        let rows: Vec<Result<TransferRow>> = reader.rows().collect();

        assert!(rows[0].is_err());
    }
}
