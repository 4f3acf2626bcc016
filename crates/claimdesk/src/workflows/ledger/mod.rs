//! Interest accrual, total claim, and recovery rate calculations for a bond.

pub mod domain;
mod interest;
pub mod record;
pub mod recovery;

pub use domain::{
    Bond, BondError, Clock, DateBound, Expense, FixedClock, InterestInterval, SystemClock,
    MAX_CLAIM_AMOUNT, MAX_INTEREST_INTERVALS, MAX_INTEREST_RATE,
};
pub use interest::{
    days_between, interval_interest, resolve_date, round_won, sum_amounts, ClaimBreakdown,
    DayCount, IntervalAccrual, InterestCalculator,
};
pub use record::{BondRecord, ExpenseRecord, IntervalRecord};
pub use recovery::{
    recovered_amount, recovery_rate, EnforcementAction, EnforcementStatus, RecoverySummary,
    RecoveryTier,
};
