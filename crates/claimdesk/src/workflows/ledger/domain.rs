use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Most interest intervals a single bond may carry.
pub const MAX_INTEREST_INTERVALS: usize = 2;

/// Largest principal or expense amount, in won, a bond record may carry.
pub const MAX_CLAIM_AMOUNT: Decimal = Decimal::from_parts(2_808_348_672, 232_830_643, 0, false, 0);

/// Largest annual rate, in percent, a bond record may carry.
pub const MAX_INTEREST_RATE: Decimal = Decimal::from_parts(1_000, 0, 0, false, 0);

/// Source of "today" for open-ended accrual.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Local wall-clock date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Pinned date, used for reproducible reports and tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// One endpoint of an interest interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "date", rename_all = "snake_case")]
pub enum DateBound {
    Fixed(NaiveDate),
    /// Evaluated as the current date every time the bond is read.
    Today,
    #[default]
    Unset,
}

impl DateBound {
    /// Reads the stored representation: `"dynamic"` means today, anything unparseable is unset.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(value) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
            return Self::Unset;
        };

        if value.eq_ignore_ascii_case("dynamic") {
            return Self::Today;
        }

        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Self::Fixed)
            .unwrap_or(Self::Unset)
    }

    /// Inverse of [`DateBound::parse`].
    pub fn to_record(self) -> Option<String> {
        match self {
            Self::Fixed(date) => Some(date.format("%Y-%m-%d").to_string()),
            Self::Today => Some("dynamic".to_string()),
            Self::Unset => None,
        }
    }

    pub fn is_set(self) -> bool {
        !matches!(self, Self::Unset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InterestInterval {
    /// Annual rate in percent.
    pub rate: Option<Decimal>,
    pub start: DateBound,
    pub end: DateBound,
}

impl InterestInterval {
    pub fn new(rate: Decimal, start: DateBound, end: DateBound) -> Self {
        Self {
            rate: Some(rate),
            start,
            end,
        }
    }

    /// An interval with no rate and no dates contributes nothing and is not stored.
    pub fn is_blank(&self) -> bool {
        self.rate.is_none() && !self.start.is_set() && !self.end.is_set()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub label: String,
    pub amount: Decimal,
}

impl Expense {
    pub fn new(label: impl Into<String>, amount: Decimal) -> Self {
        Self {
            label: label.into(),
            amount,
        }
    }

    pub fn counts_toward_total(&self) -> bool {
        self.amount > Decimal::ZERO
    }
}

/// A debt with its interest schedule and itemized costs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Bond {
    principal: Decimal,
    intervals: Vec<InterestInterval>,
    expenses: Vec<Expense>,
}

impl Bond {
    pub fn new(principal: Decimal) -> Self {
        Self {
            principal,
            ..Self::default()
        }
    }

    pub fn principal(&self) -> Decimal {
        self.principal
    }

    pub fn set_principal(&mut self, principal: Decimal) {
        self.principal = principal;
    }

    pub fn intervals(&self) -> &[InterestInterval] {
        &self.intervals
    }

    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn add_interval(&mut self, interval: InterestInterval) -> Result<(), BondError> {
        if self.intervals.len() >= MAX_INTEREST_INTERVALS {
            return Err(BondError::TooManyIntervals {
                max: MAX_INTEREST_INTERVALS,
            });
        }
        self.intervals.push(interval);
        Ok(())
    }

    pub fn with_interval(mut self, interval: InterestInterval) -> Result<Self, BondError> {
        self.add_interval(interval)?;
        Ok(self)
    }

    pub fn remove_interval(&mut self, index: usize) -> Result<InterestInterval, BondError> {
        if index >= self.intervals.len() {
            return Err(BondError::IntervalNotFound(index));
        }
        Ok(self.intervals.remove(index))
    }

    pub fn add_expense(&mut self, expense: Expense) {
        self.expenses.push(expense);
    }

    pub fn with_expense(mut self, expense: Expense) -> Self {
        self.add_expense(expense);
        self
    }

    pub fn remove_expense(&mut self, index: usize) -> Result<Expense, BondError> {
        if index >= self.expenses.len() {
            return Err(BondError::ExpenseNotFound(index));
        }
        Ok(self.expenses.remove(index))
    }

    /// Expenses that enter totals and the displayed breakdown.
    pub fn billable_expenses(&self) -> impl Iterator<Item = &Expense> {
        self.expenses.iter().filter(|expense| expense.counts_toward_total())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BondError {
    #[error("이자 구간은 최대 {max}개까지 추가할 수 있습니다.")]
    TooManyIntervals { max: usize },
    #[error("interest interval {0} does not exist")]
    IntervalNotFound(usize),
    #[error("expense {0} does not exist")]
    ExpenseNotFound(usize),
    #[error("{field} 값이 허용 범위를 벗어났습니다.")]
    ValueOutOfRange { field: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn parse_maps_dynamic_and_garbage() {
        assert_eq!(DateBound::parse(Some("dynamic")), DateBound::Today);
        assert_eq!(
            DateBound::parse(Some("2024-03-01")),
            DateBound::Fixed(date(2024, 3, 1))
        );
        assert_eq!(DateBound::parse(Some("03/01/2024")), DateBound::Unset);
        assert_eq!(DateBound::parse(Some("  ")), DateBound::Unset);
        assert_eq!(DateBound::parse(None), DateBound::Unset);
    }

    #[test]
    fn record_limits_are_whole_numbers() {
        assert_eq!(MAX_CLAIM_AMOUNT, Decimal::from(1_000_000_000_000_000_000_i64));
        assert_eq!(MAX_INTEREST_RATE, Decimal::from(1_000));
    }

    #[test]
    fn third_interval_is_rejected() {
        let interval = InterestInterval::new(Decimal::from(5), DateBound::Unset, DateBound::Unset);
        let mut bond = Bond::new(Decimal::from(1_000))
            .with_interval(interval)
            .and_then(|bond| bond.with_interval(interval))
            .expect("two intervals allowed");

        assert_eq!(
            bond.add_interval(interval),
            Err(BondError::TooManyIntervals { max: 2 })
        );
        assert_eq!(bond.intervals().len(), 2);

        bond.remove_interval(0).expect("first interval exists");
        assert!(bond.add_interval(interval).is_ok());
    }

    #[test]
    fn billable_expenses_skip_zero_amounts() {
        let bond = Bond::new(Decimal::from(1_000))
            .with_expense(Expense::new("인지대", Decimal::from(5_000)))
            .with_expense(Expense::new("송달료", Decimal::ZERO));

        let labels: Vec<_> = bond.billable_expenses().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["인지대"]);
    }
}
