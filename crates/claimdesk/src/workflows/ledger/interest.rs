use super::domain::{Bond, Clock, DateBound, Expense, InterestInterval};
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Days-per-year basis for simple interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayCount {
    #[default]
    Actual365_25,
    Actual365,
}

impl DayCount {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "365.25" | "actual_365_25" => Some(Self::Actual365_25),
            "365" | "actual_365" => Some(Self::Actual365),
            _ => None,
        }
    }

    pub fn days_per_year(self) -> Decimal {
        match self {
            Self::Actual365_25 => Decimal::new(36525, 2),
            Self::Actual365 => Decimal::from(365),
        }
    }
}

/// Resolves a bound to a calendar date; `Unset` has none.
pub fn resolve_date(bound: DateBound, clock: &dyn Clock) -> Option<NaiveDate> {
    match bound {
        DateBound::Fixed(date) => Some(date),
        DateBound::Today => Some(clock.today()),
        DateBound::Unset => None,
    }
}

/// Whole-day span between two bounds, if both resolve.
pub fn days_between(start: DateBound, end: DateBound, clock: &dyn Clock) -> Option<i64> {
    let start = resolve_date(start, clock)?;
    let end = resolve_date(end, clock)?;
    Some((end - start).num_days())
}

/// Simple interest accrued over one interval. Missing or non-positive inputs and inverted
/// spans accrue nothing.
pub fn interval_interest(
    rate: Option<Decimal>,
    start: DateBound,
    end: DateBound,
    principal: Decimal,
    clock: &dyn Clock,
    day_count: DayCount,
) -> Decimal {
    let Some(rate) = rate.filter(|rate| *rate > Decimal::ZERO) else {
        return Decimal::ZERO;
    };
    if principal <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    match days_between(start, end, clock) {
        Some(days) if days > 0 => principal
            .checked_mul(rate)
            .and_then(|amount| amount.checked_div(Decimal::ONE_HUNDRED))
            .and_then(|amount| amount.checked_mul(Decimal::from(days)))
            .and_then(|amount| amount.checked_div(day_count.days_per_year()))
            // out of Decimal range; bond records cap their inputs well below this
            .unwrap_or(Decimal::ZERO),
        _ => Decimal::ZERO,
    }
}

/// Sum of positive amounts. Shared by claim totals and the generated claim text.
pub fn sum_amounts<I>(amounts: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    saturating_sum(amounts.into_iter().filter(|amount| *amount > Decimal::ZERO))
}

/// Adds without panicking; a sum beyond the Decimal range pins to `Decimal::MAX`.
fn saturating_sum<I>(amounts: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    amounts.into_iter().fold(Decimal::ZERO, |total, amount| {
        total.checked_add(amount).unwrap_or(Decimal::MAX)
    })
}

/// Rounds to the whole won.
pub fn round_won(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntervalAccrual {
    pub rate: Option<Decimal>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub days: Option<i64>,
    /// Rounded to the whole won; this is the figure totals are built from.
    pub interest: Decimal,
}

/// Itemized total claim for a bond, evaluated on a single day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimBreakdown {
    pub evaluated_on: NaiveDate,
    pub principal: Decimal,
    pub intervals: Vec<IntervalAccrual>,
    pub expenses: Vec<Expense>,
    pub interest_total: Decimal,
    pub expense_total: Decimal,
    pub total: Decimal,
}

/// Computes accruals and totals against an injected clock.
#[derive(Clone)]
pub struct InterestCalculator {
    clock: Arc<dyn Clock>,
    day_count: DayCount,
}

impl std::fmt::Debug for InterestCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterestCalculator")
            .field("today", &self.clock.today())
            .field("day_count", &self.day_count)
            .finish()
    }
}

impl InterestCalculator {
    pub fn new(clock: Arc<dyn Clock>, day_count: DayCount) -> Self {
        Self { clock, day_count }
    }

    pub fn day_count(&self) -> DayCount {
        self.day_count
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn resolve_date(&self, bound: DateBound) -> Option<NaiveDate> {
        resolve_date(bound, self.clock.as_ref())
    }

    pub fn interval_interest(&self, interval: &InterestInterval, principal: Decimal) -> Decimal {
        interval_interest(
            interval.rate,
            interval.start,
            interval.end,
            principal,
            self.clock.as_ref(),
            self.day_count,
        )
    }

    pub fn accrual(&self, interval: &InterestInterval, principal: Decimal) -> IntervalAccrual {
        let clock = self.clock.as_ref();
        IntervalAccrual {
            rate: interval.rate,
            start: resolve_date(interval.start, clock),
            end: resolve_date(interval.end, clock),
            days: days_between(interval.start, interval.end, clock),
            interest: round_won(self.interval_interest(interval, principal)),
        }
    }

    pub fn breakdown(&self, bond: &Bond) -> ClaimBreakdown {
        let principal = bond.principal();
        let intervals: Vec<IntervalAccrual> = bond
            .intervals()
            .iter()
            .map(|interval| self.accrual(interval, principal))
            .collect();
        let expenses: Vec<Expense> = bond.billable_expenses().cloned().collect();

        let interest_total = saturating_sum(intervals.iter().map(|accrual| accrual.interest));
        let expense_total = sum_amounts(expenses.iter().map(|expense| expense.amount));
        let total = saturating_sum([principal.max(Decimal::ZERO), interest_total, expense_total]);

        ClaimBreakdown {
            evaluated_on: self.clock.today(),
            principal,
            intervals,
            expenses,
            interest_total,
            expense_total,
            total,
        }
    }

    pub fn total_claim(&self, bond: &Bond) -> Decimal {
        self.breakdown(bond).total
    }
}
