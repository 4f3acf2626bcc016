//! Flat row shape the bond table stores, and its conversion into [`Bond`].

use super::domain::{
    Bond, BondError, DateBound, Expense, InterestInterval, MAX_CLAIM_AMOUNT, MAX_INTEREST_RATE,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BondRecord {
    #[serde(default)]
    pub principal: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_1_rate: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_1_start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_1_end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_2_rate: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_2_start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_2_end_date: Option<String>,
    /// List form of the interval columns; counts toward the same cap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interest_intervals: Option<Vec<IntervalRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expenses: Option<Vec<ExpenseRecord>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalRecord {
    #[serde(default)]
    pub rate: Option<Decimal>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    #[serde(default)]
    pub item: String,
    #[serde(default)]
    pub amount: Option<Decimal>,
}

fn interval_from_columns(
    rate: Option<Decimal>,
    start: Option<&str>,
    end: Option<&str>,
) -> Option<InterestInterval> {
    let interval = InterestInterval {
        rate,
        start: DateBound::parse(start),
        end: DateBound::parse(end),
    };
    (!interval.is_blank()).then_some(interval)
}

impl ExpenseRecord {
    /// A row with neither label nor amount is an unfilled slot.
    fn is_blank(&self) -> bool {
        self.item.trim().is_empty() && self.amount.is_none()
    }
}

fn within_limit(value: Decimal, limit: Decimal, field: &'static str) -> Result<(), BondError> {
    if value.abs() > limit {
        Err(BondError::ValueOutOfRange { field })
    } else {
        Ok(())
    }
}

impl TryFrom<&BondRecord> for Bond {
    type Error = BondError;

    fn try_from(record: &BondRecord) -> Result<Self, Self::Error> {
        within_limit(record.principal, MAX_CLAIM_AMOUNT, "principal")?;
        let mut bond = Bond::new(record.principal);

        let columns = [
            interval_from_columns(
                record.interest_1_rate,
                record.interest_1_start_date.as_deref(),
                record.interest_1_end_date.as_deref(),
            ),
            interval_from_columns(
                record.interest_2_rate,
                record.interest_2_start_date.as_deref(),
                record.interest_2_end_date.as_deref(),
            ),
        ];
        let listed = record.interest_intervals.iter().flatten().map(|interval| {
            interval_from_columns(
                interval.rate,
                interval.start_date.as_deref(),
                interval.end_date.as_deref(),
            )
        });

        for interval in columns.into_iter().chain(listed).flatten() {
            if let Some(rate) = interval.rate {
                within_limit(rate, MAX_INTEREST_RATE, "interest_rate")?;
            }
            bond.add_interval(interval)?;
        }

        for expense in record.expenses.iter().flatten() {
            if expense.is_blank() {
                continue;
            }
            let amount = expense.amount.unwrap_or(Decimal::ZERO);
            within_limit(amount, MAX_CLAIM_AMOUNT, "expense_amount")?;
            bond.add_expense(Expense::new(expense.item.trim(), amount));
        }

        Ok(bond)
    }
}

impl TryFrom<BondRecord> for Bond {
    type Error = BondError;

    fn try_from(record: BondRecord) -> Result<Self, Self::Error> {
        Bond::try_from(&record)
    }
}

impl From<&Bond> for BondRecord {
    fn from(bond: &Bond) -> Self {
        let mut record = BondRecord {
            principal: bond.principal(),
            ..BondRecord::default()
        };

        let mut intervals = bond.intervals().iter();
        if let Some(first) = intervals.next() {
            record.interest_1_rate = first.rate;
            record.interest_1_start_date = first.start.to_record();
            record.interest_1_end_date = first.end.to_record();
        }
        if let Some(second) = intervals.next() {
            record.interest_2_rate = second.rate;
            record.interest_2_start_date = second.start.to_record();
            record.interest_2_end_date = second.end.to_record();
        }

        if !bond.expenses().is_empty() {
            record.expenses = Some(
                bond.expenses()
                    .iter()
                    .map(|expense| ExpenseRecord {
                        item: expense.label.clone(),
                        amount: Some(expense.amount),
                    })
                    .collect(),
            );
        }

        record
    }
}
