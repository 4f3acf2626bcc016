use super::interest::sum_amounts;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Status an enforcement action reports; only closed actions have collected money.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EnforcementStatus {
    Closed,
    Other(String),
}

impl From<String> for EnforcementStatus {
    fn from(value: String) -> Self {
        if value.trim().eq_ignore_ascii_case("closed") {
            Self::Closed
        } else {
            Self::Other(value)
        }
    }
}

impl From<EnforcementStatus> for String {
    fn from(value: EnforcementStatus) -> Self {
        match value {
            EnforcementStatus::Closed => "closed".to_string(),
            EnforcementStatus::Other(raw) => raw,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnforcementAction {
    pub amount: Decimal,
    pub status: EnforcementStatus,
}

pub fn recovered_amount(actions: &[EnforcementAction]) -> Decimal {
    sum_amounts(
        actions
            .iter()
            .filter(|action| action.status == EnforcementStatus::Closed)
            .map(|action| action.amount),
    )
}

/// Percentage of `denominator` recovered. Zero when nothing is recovered or there is nothing
/// to recover against. Not capped at 100; a ratio beyond the Decimal range reads as `Decimal::MAX`.
pub fn recovery_rate(recovered: Decimal, denominator: Option<Decimal>) -> Decimal {
    match denominator {
        Some(denominator) if denominator > Decimal::ZERO && recovered > Decimal::ZERO => {
            recovered
                .checked_div(denominator)
                .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
                .unwrap_or(Decimal::MAX)
        }
        _ => Decimal::ZERO,
    }
}

/// Display band for a recovery rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryTier {
    Low,
    Moderate,
    High,
}

impl RecoveryTier {
    pub fn for_rate(rate: Decimal) -> Self {
        if rate >= Decimal::from(80) {
            Self::High
        } else if rate >= Decimal::from(50) {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Low => "0–49%",
            Self::Moderate => "50–79%",
            Self::High => "80%+",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoverySummary {
    pub recovered: Decimal,
    /// Percent, rounded to one decimal place.
    pub rate: Decimal,
    pub tier: RecoveryTier,
    pub tier_label: &'static str,
    pub over_recovered: bool,
}

impl RecoverySummary {
    pub fn from_actions(actions: &[EnforcementAction], denominator: Option<Decimal>) -> Self {
        let recovered = recovered_amount(actions);
        let rate = recovery_rate(recovered, denominator);
        let tier = RecoveryTier::for_rate(rate);

        Self {
            recovered,
            rate: rate.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero),
            tier,
            tier_label: tier.label(),
            over_recovered: rate > Decimal::ONE_HUNDRED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(amount: i64, status: &str) -> EnforcementAction {
        EnforcementAction {
            amount: Decimal::from(amount),
            status: EnforcementStatus::from(status.to_string()),
        }
    }

    #[test]
    fn only_closed_actions_count() {
        let actions = vec![
            action(300_000, "closed"),
            action(200_000, "in_progress"),
            action(100_000, "Closed"),
        ];
        assert_eq!(recovered_amount(&actions), Decimal::from(400_000));
    }

    #[test]
    fn zero_denominator_or_recovery_yields_zero() {
        assert_eq!(recovery_rate(Decimal::ZERO, Some(Decimal::from(10))), Decimal::ZERO);
        assert_eq!(recovery_rate(Decimal::from(10), Some(Decimal::ZERO)), Decimal::ZERO);
        assert_eq!(recovery_rate(Decimal::from(10), None), Decimal::ZERO);
    }

    #[test]
    fn tiers_follow_display_bands() {
        assert_eq!(RecoveryTier::for_rate(Decimal::from(49)), RecoveryTier::Low);
        assert_eq!(RecoveryTier::for_rate(Decimal::from(50)), RecoveryTier::Moderate);
        assert_eq!(RecoveryTier::for_rate(Decimal::new(799, 1)), RecoveryTier::Moderate);
        assert_eq!(RecoveryTier::for_rate(Decimal::from(80)), RecoveryTier::High);
    }

    #[test]
    fn over_recovery_is_flagged_not_clamped() {
        let summary =
            RecoverySummary::from_actions(&[action(1_500_000, "closed")], Some(Decimal::from(1_000_000)));
        assert_eq!(summary.rate, Decimal::from(150));
        assert!(summary.over_recovered);
        assert_eq!(summary.tier, RecoveryTier::High);
    }

    #[test]
    fn tiny_denominator_does_not_overflow() {
        let rate = recovery_rate(Decimal::MAX, Some(Decimal::new(1, 20)));
        assert_eq!(rate, Decimal::MAX);
        assert_eq!(RecoveryTier::for_rate(rate), RecoveryTier::High);
    }

    #[test]
    fn status_round_trips_through_wire_strings() {
        let parsed: EnforcementAction =
            serde_json::from_str(r#"{"amount": 5000, "status": "pending"}"#).expect("parses");
        assert_eq!(parsed.status, EnforcementStatus::Other("pending".to_string()));
        assert_eq!(parsed.amount, Decimal::from(5_000));
    }
}
