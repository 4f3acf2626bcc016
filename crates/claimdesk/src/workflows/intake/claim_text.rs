//! Deterministic 청구취지 (claim statement) text for a list of transactions.

use super::domain::Transaction;
use crate::workflows::ledger::{round_won, sum_amounts};
use chrono::{DateTime, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::cmp::Ordering;

/// Shown wherever a date is missing or unusable.
pub const DATE_PLACEHOLDER: &str = "날짜 미입력";

/// Annual rate from the accrual start until the trigger event.
pub const PRE_TRIGGER_RATE_PERCENT: u32 = 6;
/// Annual rate from the day after the trigger event until payment.
pub const POST_TRIGGER_RATE_PERCENT: u32 = 12;
pub const TRIGGER_EVENT: &str = "이 사건 소장 부본 송달일";

const CLAUSE_LABELS: [&str; 14] = [
    "가", "나", "다", "라", "마", "바", "사", "아", "자", "차", "카", "타", "파", "하",
];

/// Builds the claim statement. An empty list produces an empty string. Rows without a positive
/// amount are left out of the clauses just as they are left out of the total.
pub fn generate_claim_text(transactions: &[Transaction]) -> String {
    let mut ordered: Vec<Transaction> = transactions
        .iter()
        .filter(|transaction| transaction.amount > Decimal::ZERO)
        .copied()
        .collect();
    sort_by_due_date(&mut ordered);

    let total = sum_amounts(ordered.iter().map(|transaction| transaction.amount));

    match ordered.as_slice() {
        [] => String::new(),
        [only] => format!(
            "피고는 원고에게 {}원 및 이에 대하여 {} {}",
            format_amount(total),
            accrual_start(only.due_date),
            rate_clause(),
        ),
        many => {
            let mut lines = Vec::with_capacity(many.len() + 2);
            lines.push(format!("피고는 원고에게 {}원 및 그 중", format_amount(total)));
            let last = many.len() - 1;
            for (index, transaction) in many.iter().enumerate() {
                let separator = if index == last { "" } else { "," };
                lines.push(format!(
                    "{}. {}원에 대하여는 {}{}",
                    clause_label(index),
                    format_amount(transaction.amount),
                    accrual_start(transaction.due_date),
                    separator,
                ));
            }
            lines.push(format!("각 {}", rate_clause()));
            lines.join("\n")
        }
    }
}

/// Ascending by due date; entries without one keep their relative order at the end.
pub fn sort_by_due_date(transactions: &mut [Transaction]) {
    transactions.sort_by(|a, b| compare_due_dates(a.due_date, b.due_date));
}

fn compare_due_dates(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn rate_clause() -> String {
    format!(
        "{TRIGGER_EVENT}까지는 연 {PRE_TRIGGER_RATE_PERCENT}%의, 그 다음날부터 다 갚는 날까지는 연 {POST_TRIGGER_RATE_PERCENT}%의 각 비율로 계산한 돈을 지급하라."
    )
}

fn accrual_start(due_date: Option<NaiveDate>) -> String {
    match usable_date(due_date) {
        Some(date) => format!("{}.부터", date.format("%Y.%m.%d")),
        None => format!("{DATE_PLACEHOLDER}부터"),
    }
}

fn clause_label(index: usize) -> String {
    CLAUSE_LABELS
        .get(index)
        .map(|label| (*label).to_string())
        .unwrap_or_else(|| (index + 1).to_string())
}

/// The epoch is what an empty date field used to parse to; it never means a real date here.
fn usable_date(date: Option<NaiveDate>) -> Option<NaiveDate> {
    date.filter(|date| NaiveDate::from_ymd_opt(1970, 1, 1) != Some(*date))
}

/// `YYYY.MM.DD`, or the placeholder when unset.
pub fn format_naive_date(date: Option<NaiveDate>) -> String {
    match usable_date(date) {
        Some(date) => date.format("%Y.%m.%d").to_string(),
        None => DATE_PLACEHOLDER.to_string(),
    }
}

/// Formats a stored date string (`YYYY-MM-DD` or RFC 3339). Unparseable input is treated as
/// unset.
pub fn format_date(raw: Option<&str>) -> String {
    format_naive_date(raw.and_then(parse_loose_date))
}

fn parse_loose_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }

    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Whole won with thousands separators, e.g. `1,000,000`.
pub fn format_amount(amount: Decimal) -> String {
    let won = round_won(amount).to_i128().unwrap_or_default();
    let digits = won.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if won < 0 {
        grouped.push('-');
    }
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}
