use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Selects which scripted question list applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseType {
    Loan,
    Goods,
    Construction,
}

impl CaseType {
    pub const fn ordered() -> [Self; 3] {
        [Self::Loan, Self::Goods, Self::Construction]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Loan => "대여금",
            Self::Goods => "물품대금",
            Self::Construction => "공사대금",
        }
    }

    /// Construction claims are recorded per work period rather than per date.
    pub const fn transaction_layout(self) -> TransactionLayout {
        match self {
            Self::Loan | Self::Goods => TransactionLayout::Dated,
            Self::Construction => TransactionLayout::Period,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let value = raw.trim();
        Self::ordered()
            .into_iter()
            .find(|case_type| case_type.key() == value || case_type.label() == value)
    }

    pub const fn key(self) -> &'static str {
        match self {
            Self::Loan => "loan",
            Self::Goods => "goods",
            Self::Construction => "construction",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Text,
    Date,
    DateRange,
    Number,
    Transactions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    pub key: &'static str,
    pub prompt: &'static str,
    pub kind: StepKind,
}

/// A validated answer to one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Answer {
    Text(String),
    Date(NaiveDate),
    DateRange { start: NaiveDate, end: NaiveDate },
    Number(Decimal),
    Transactions(Vec<Transaction>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionLayout {
    Dated,
    Period,
}

impl TransactionLayout {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Dated => "거래일",
            Self::Period => "기간",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionTiming {
    Dated {
        transaction_date: Option<NaiveDate>,
    },
    Period {
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    },
}

impl TransactionTiming {
    pub const fn layout(&self) -> TransactionLayout {
        match self {
            Self::Dated { .. } => TransactionLayout::Dated,
            Self::Period { .. } => TransactionLayout::Period,
        }
    }
}

/// One transaction collected during intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TransactionRecord", into = "TransactionRecord")]
pub struct Transaction {
    pub timing: TransactionTiming,
    pub amount: Decimal,
    pub due_date: Option<NaiveDate>,
}

impl Transaction {
    pub fn dated(transaction_date: Option<NaiveDate>, amount: Decimal, due_date: Option<NaiveDate>) -> Self {
        Self {
            timing: TransactionTiming::Dated { transaction_date },
            amount,
            due_date,
        }
    }

    pub fn period(
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        amount: Decimal,
        due_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            timing: TransactionTiming::Period {
                start_date,
                end_date,
            },
            amount,
            due_date,
        }
    }
}

/// Stored shape of a transaction; blank or malformed dates read as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

pub(crate) fn parse_record_date(raw: Option<&str>) -> Option<NaiveDate> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(|value| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok())
}

fn record_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|date| date.format("%Y-%m-%d").to_string())
}

impl From<TransactionRecord> for Transaction {
    fn from(record: TransactionRecord) -> Self {
        let start_date = parse_record_date(record.start_date.as_deref());
        let end_date = parse_record_date(record.end_date.as_deref());
        let due_date = parse_record_date(record.due_date.as_deref());

        if start_date.is_some() || end_date.is_some() {
            Transaction::period(start_date, end_date, record.amount, due_date)
        } else {
            let transaction_date = parse_record_date(record.transaction_date.as_deref());
            Transaction::dated(transaction_date, record.amount, due_date)
        }
    }
}

impl From<Transaction> for TransactionRecord {
    fn from(transaction: Transaction) -> Self {
        let mut record = TransactionRecord {
            amount: transaction.amount,
            due_date: record_date(transaction.due_date),
            ..TransactionRecord::default()
        };
        match transaction.timing {
            TransactionTiming::Dated { transaction_date } => {
                record.transaction_date = record_date(transaction_date);
            }
            TransactionTiming::Period {
                start_date,
                end_date,
            } => {
                record.start_date = record_date(start_date);
                record.end_date = record_date(end_date);
            }
        }
        record
    }
}

/// Literal answers accepted at the confirmation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationChoice {
    Affirmative,
    Negative,
}

impl ConfirmationChoice {
    pub const AFFIRMATIVE: &'static str = "예";
    pub const NEGATIVE: &'static str = "아니오";

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            Self::AFFIRMATIVE => Some(Self::Affirmative),
            Self::NEGATIVE => Some(Self::Negative),
            _ => None,
        }
    }
}

/// Client-chosen key that makes persisting one intake idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdempotencyKey(pub Uuid);

impl IdempotencyKey {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Blocking validation failures shown to the person answering.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeError {
    #[error("사건 유형을 먼저 선택해 주세요.")]
    NoCaseTypeSelected,
    #[error("답변을 입력해 주세요.")]
    EmptyAnswer,
    #[error("날짜는 YYYY-MM-DD 형식으로 입력해 주세요. ('{0}')")]
    InvalidDate(String),
    #[error("기간은 'YYYY-MM-DD ~ YYYY-MM-DD' 형식으로, 시작일이 종료일보다 늦지 않게 입력해 주세요.")]
    InvalidDateRange,
    #[error("0보다 큰 금액을 숫자로 입력해 주세요. ('{0}')")]
    InvalidNumber(String),
    #[error("거래 내역을 1건 이상 입력해 주세요.")]
    NoTransactions,
    #[error("지금은 거래 내역을 입력하는 단계가 아닙니다.")]
    NotTransactionStep,
    #[error("거래 금액은 0보다 커야 합니다.")]
    NonPositiveAmount,
    #[error("이 사건 유형은 {}별로 거래 내역을 입력해야 합니다.", .expected.label())]
    TransactionLayout { expected: TransactionLayout },
    #[error("{0}번째 거래 내역이 없습니다.")]
    TransactionNotFound(usize),
    #[error("'{}' 또는 '{}'로 답해 주세요.", ConfirmationChoice::AFFIRMATIVE, ConfirmationChoice::NEGATIVE)]
    InvalidConfirmation(String),
    #[error("아직 확인 단계가 아닙니다.")]
    NotAwaitingConfirmation,
    #[error("이미 제출된 상담입니다. 처음부터 다시 시작해 주세요.")]
    AlreadySubmitted,
}
