use crate::domain::account::Account;
use crate::error::Result;
use std::io::Write;

/// UTF-8 byte order mark, so spreadsheet tools detect the encoding.
const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Writes account balances as semicolon-delimited CSV.
///
/// Emits a `Nombre;Email;Saldo` header and a UTF-8 BOM, the format the
/// existing spreadsheet consumers expect.
pub struct BalanceWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> BalanceWriter<W> {
    pub fn new(mut sink: W) -> Result<Self> {
        sink.write_all(BOM)?;
        let writer = csv::WriterBuilder::new()
            .delimiter(b';')
            .from_writer(sink);
        Ok(Self { writer })
    }

    /// Writes the header plus one row per account and flushes the sink.
    pub fn write_accounts(&mut self, accounts: &[Account]) -> Result<()> {
        self.writer.write_record(["Nombre", "Email", "Saldo"])?;
        for account in accounts {
            let balance = account.balance.to_string();
            self.writer.write_record([
                account.name.as_str(),
                account.email.as_str(),
                balance.as_str(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
