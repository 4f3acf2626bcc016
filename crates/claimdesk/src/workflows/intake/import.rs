use super::domain::{parse_record_date, Transaction};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::io::Read;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum TransactionImportError {
    #[error("failed to read transaction export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid transaction CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: amount must be greater than zero")]
    NonPositiveAmount { row: usize },
}

/// Reads spreadsheet exports with the columns
/// `transaction_date,start_date,end_date,amount,due_date`.
pub struct TransactionImporter;

impl TransactionImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Transaction>, TransactionImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    /// Checks transactions that arrived already parsed, numbering rows from 1.
    pub fn from_transactions(
        transactions: Vec<Transaction>,
    ) -> Result<Vec<Transaction>, TransactionImportError> {
        if let Some(index) = transactions
            .iter()
            .position(|transaction| transaction.amount <= Decimal::ZERO)
        {
            return Err(TransactionImportError::NonPositiveAmount { row: index + 1 });
        }
        Ok(transactions)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<Transaction>, TransactionImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);
        let mut transactions = Vec::new();

        for (index, record) in csv_reader.deserialize::<TransactionRow>().enumerate() {
            let row = record?;
            // header is line 1
            let line = index + 2;
            if row.amount <= Decimal::ZERO {
                return Err(TransactionImportError::NonPositiveAmount { row: line });
            }
            transactions.push(row.into_transaction());
        }

        Ok(transactions)
    }
}

#[derive(Debug, Deserialize)]
struct TransactionRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    transaction_date: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    start_date: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    end_date: Option<String>,
    #[serde(deserialize_with = "amount_with_separators")]
    amount: Decimal,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    due_date: Option<String>,
}

impl TransactionRow {
    fn into_transaction(self) -> Transaction {
        let start_date = parse_record_date(self.start_date.as_deref());
        let end_date = parse_record_date(self.end_date.as_deref());
        let due_date = parse_record_date(self.due_date.as_deref());

        if self.start_date.is_some() || self.end_date.is_some() {
            Transaction::period(start_date, end_date, self.amount, due_date)
        } else {
            let transaction_date = parse_record_date(self.transaction_date.as_deref());
            Transaction::dated(transaction_date, self.amount, due_date)
        }
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn amount_with_separators<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let cleaned: String = raw.chars().filter(|ch| *ch != ',').collect();
    cleaned
        .trim()
        .parse::<Decimal>()
        .map_err(|err| serde::de::Error::custom(format!("invalid amount '{raw}': {err}")))
}
