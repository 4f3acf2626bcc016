use super::blueprint::{ScenarioBlueprint, CONFIRMATION_PROMPT};
use super::claim_text::{generate_claim_text, sort_by_due_date};
use super::domain::{
    Answer, CaseType, ConfirmationChoice, IdempotencyKey, IntakeError, Step, StepKind,
    Transaction,
};
use crate::workflows::ledger::sum_amounts;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Where a session stands in its scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "step_index", rename_all = "snake_case")]
pub enum IntakeState {
    NoCaseTypeSelected,
    AwaitingStepAnswer(usize),
    AwaitingFinalConfirmation,
    Submitted,
}

/// Result of a successful session action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// The next step to present.
    Asked(Step),
    /// A step was reopened after going back; its previous answer is gone.
    Reopened(Step),
    AwaitingConfirmation,
    CaseTypeCleared,
    Submitted(IntakeSubmission),
}

impl Transition {
    pub fn prompt(&self) -> Option<&str> {
        match self {
            Self::Asked(step) | Self::Reopened(step) => Some(step.prompt),
            Self::AwaitingConfirmation => Some(CONFIRMATION_PROMPT),
            Self::CaseTypeCleared | Self::Submitted(_) => None,
        }
    }
}

/// Everything a finished intake hands over for persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntakeSubmission {
    pub idempotency_key: IdempotencyKey,
    pub case_type: CaseType,
    pub answers: BTreeMap<String, Answer>,
    /// Sorted by due date, missing dates last.
    pub transactions: Vec<Transaction>,
    pub total_amount: Decimal,
    pub claim_text: String,
}

/// Working memory of one scripted intake conversation.
#[derive(Debug, Clone)]
pub struct IntakeSession {
    idempotency_key: IdempotencyKey,
    blueprint: Option<ScenarioBlueprint>,
    question_index: Option<usize>,
    answers: BTreeMap<String, Answer>,
    pending_transactions: Vec<Transaction>,
    submitted: bool,
}

impl Default for IntakeSession {
    fn default() -> Self {
        Self::new()
    }
}

impl IntakeSession {
    pub fn new() -> Self {
        Self::with_key(IdempotencyKey::generate())
    }

    pub fn with_key(idempotency_key: IdempotencyKey) -> Self {
        Self {
            idempotency_key,
            blueprint: None,
            question_index: None,
            answers: BTreeMap::new(),
            pending_transactions: Vec::new(),
            submitted: false,
        }
    }

    pub fn idempotency_key(&self) -> IdempotencyKey {
        self.idempotency_key
    }

    pub fn case_type(&self) -> Option<CaseType> {
        self.blueprint.as_ref().map(ScenarioBlueprint::case_type)
    }

    pub fn question_index(&self) -> Option<usize> {
        self.question_index
    }

    pub fn answers(&self) -> &BTreeMap<String, Answer> {
        &self.answers
    }

    pub fn pending_transactions(&self) -> &[Transaction] {
        &self.pending_transactions
    }

    pub fn state(&self) -> IntakeState {
        if self.submitted {
            return IntakeState::Submitted;
        }
        match (&self.blueprint, self.question_index) {
            (Some(blueprint), Some(index)) if index >= blueprint.len() => {
                IntakeState::AwaitingFinalConfirmation
            }
            (Some(_), Some(index)) => IntakeState::AwaitingStepAnswer(index),
            _ => IntakeState::NoCaseTypeSelected,
        }
    }

    pub fn current_step(&self) -> Option<&Step> {
        let index = self.question_index?;
        self.blueprint.as_ref()?.step(index)
    }

    /// Prompt for whatever the session is waiting on.
    pub fn prompt(&self) -> Option<&str> {
        match self.state() {
            IntakeState::AwaitingStepAnswer(_) => self.current_step().map(|step| step.prompt),
            IntakeState::AwaitingFinalConfirmation => Some(CONFIRMATION_PROMPT),
            IntakeState::NoCaseTypeSelected | IntakeState::Submitted => None,
        }
    }

    /// Starts (or restarts) the scenario for `case_type` at its first step.
    pub fn select_case_type(&mut self, case_type: CaseType) -> Result<Transition, IntakeError> {
        self.ensure_open()?;

        let blueprint = ScenarioBlueprint::for_case_type(case_type);
        let first = blueprint
            .step(0)
            .cloned()
            .ok_or(IntakeError::NoCaseTypeSelected)?;

        self.blueprint = Some(blueprint);
        self.question_index = Some(0);
        self.answers.clear();
        self.pending_transactions.clear();

        Ok(Transition::Asked(first))
    }

    /// Answers the current step. On a transaction table this closes the table; at the
    /// confirmation step the answer must be one of the confirmation literals.
    pub fn answer(&mut self, raw: &str) -> Result<Transition, IntakeError> {
        match self.state() {
            IntakeState::Submitted => Err(IntakeError::AlreadySubmitted),
            IntakeState::NoCaseTypeSelected => Err(IntakeError::NoCaseTypeSelected),
            IntakeState::AwaitingFinalConfirmation => {
                let choice = ConfirmationChoice::parse(raw)
                    .ok_or_else(|| IntakeError::InvalidConfirmation(raw.trim().to_string()))?;
                self.confirm(choice)
            }
            IntakeState::AwaitingStepAnswer(_) => {
                let step = self
                    .current_step()
                    .cloned()
                    .ok_or(IntakeError::NoCaseTypeSelected)?;
                if step.kind == StepKind::Transactions {
                    return self.complete_transactions();
                }
                let answer = parse_answer(step.kind, raw)?;
                self.answers.insert(step.key.to_string(), answer);
                Ok(self.advance())
            }
        }
    }

    pub fn add_transaction(&mut self, transaction: Transaction) -> Result<usize, IntakeError> {
        let case_type = self.transaction_step_case_type()?;

        if transaction.amount <= Decimal::ZERO {
            return Err(IntakeError::NonPositiveAmount);
        }
        let expected = case_type.transaction_layout();
        if transaction.timing.layout() != expected {
            return Err(IntakeError::TransactionLayout { expected });
        }

        self.pending_transactions.push(transaction);
        Ok(self.pending_transactions.len())
    }

    pub fn remove_transaction(&mut self, index: usize) -> Result<Transaction, IntakeError> {
        self.transaction_step_case_type()?;
        if index >= self.pending_transactions.len() {
            return Err(IntakeError::TransactionNotFound(index + 1));
        }
        Ok(self.pending_transactions.remove(index))
    }

    /// Closes the transaction table; refuses while it is empty.
    pub fn complete_transactions(&mut self) -> Result<Transition, IntakeError> {
        self.transaction_step_case_type()?;
        if self.pending_transactions.is_empty() {
            return Err(IntakeError::NoTransactions);
        }

        let key = self
            .current_step()
            .map(|step| step.key.to_string())
            .ok_or(IntakeError::NotTransactionStep)?;
        let transactions = std::mem::take(&mut self.pending_transactions);
        self.answers.insert(key, Answer::Transactions(transactions));
        Ok(self.advance())
    }

    /// Steps back one question, discarding its answer. From the first question the case type
    /// itself is cleared.
    pub fn go_back(&mut self) -> Result<Transition, IntakeError> {
        self.ensure_open()?;
        let index = self.question_index.ok_or(IntakeError::NoCaseTypeSelected)?;

        self.pending_transactions.clear();

        if index == 0 {
            self.blueprint = None;
            self.question_index = None;
            self.answers.clear();
            return Ok(Transition::CaseTypeCleared);
        }

        let previous = index - 1;
        let step = self
            .blueprint
            .as_ref()
            .and_then(|blueprint| blueprint.step(previous))
            .cloned()
            .ok_or(IntakeError::NoCaseTypeSelected)?;
        self.answers.remove(step.key);
        self.question_index = Some(previous);

        Ok(Transition::Reopened(step))
    }

    /// Affirmative submits exactly once; negative reopens the last question.
    pub fn confirm(&mut self, choice: ConfirmationChoice) -> Result<Transition, IntakeError> {
        self.ensure_open()?;
        if self.state() != IntakeState::AwaitingFinalConfirmation {
            return Err(IntakeError::NotAwaitingConfirmation);
        }

        match choice {
            ConfirmationChoice::Negative => self.go_back(),
            ConfirmationChoice::Affirmative => {
                let submission = self.build_submission()?;
                self.submitted = true;
                Ok(Transition::Submitted(submission))
            }
        }
    }

    /// Drops everything and returns to case type selection. A new idempotency key is issued,
    /// since whatever follows is a different intake.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Transactions answered so far, in collection order.
    pub fn collected_transactions(&self) -> Vec<Transaction> {
        self.answers
            .values()
            .filter_map(|answer| match answer {
                Answer::Transactions(transactions) => Some(transactions.as_slice()),
                _ => None,
            })
            .flatten()
            .copied()
            .collect()
    }

    fn build_submission(&self) -> Result<IntakeSubmission, IntakeError> {
        let case_type = self.case_type().ok_or(IntakeError::NoCaseTypeSelected)?;
        let mut transactions = self.collected_transactions();
        if transactions.is_empty() {
            return Err(IntakeError::NoTransactions);
        }
        sort_by_due_date(&mut transactions);

        Ok(IntakeSubmission {
            idempotency_key: self.idempotency_key,
            case_type,
            answers: self.answers.clone(),
            total_amount: sum_amounts(transactions.iter().map(|transaction| transaction.amount)),
            claim_text: generate_claim_text(&transactions),
            transactions,
        })
    }

    fn advance(&mut self) -> Transition {
        let next = self.question_index.map_or(0, |index| index + 1);
        self.question_index = Some(next);

        match self
            .blueprint
            .as_ref()
            .and_then(|blueprint| blueprint.step(next))
        {
            Some(step) => Transition::Asked(step.clone()),
            None => Transition::AwaitingConfirmation,
        }
    }

    fn ensure_open(&self) -> Result<(), IntakeError> {
        if self.submitted {
            Err(IntakeError::AlreadySubmitted)
        } else {
            Ok(())
        }
    }

    fn transaction_step_case_type(&self) -> Result<CaseType, IntakeError> {
        self.ensure_open()?;
        let case_type = self.case_type().ok_or(IntakeError::NoCaseTypeSelected)?;
        match self.current_step() {
            Some(step) if step.kind == StepKind::Transactions => Ok(case_type),
            _ => Err(IntakeError::NotTransactionStep),
        }
    }
}

fn parse_answer(kind: StepKind, raw: &str) -> Result<Answer, IntakeError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(IntakeError::EmptyAnswer);
    }

    match kind {
        StepKind::Text => Ok(Answer::Text(value.to_string())),
        StepKind::Date => parse_date(value).map(Answer::Date),
        StepKind::DateRange => {
            let (start, end) = value
                .split_once('~')
                .ok_or(IntakeError::InvalidDateRange)?;
            let start = parse_date(start.trim()).map_err(|_| IntakeError::InvalidDateRange)?;
            let end = parse_date(end.trim()).map_err(|_| IntakeError::InvalidDateRange)?;
            if start > end {
                return Err(IntakeError::InvalidDateRange);
            }
            Ok(Answer::DateRange { start, end })
        }
        StepKind::Number => parse_amount(value).map(Answer::Number),
        StepKind::Transactions => Err(IntakeError::NotTransactionStep),
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, IntakeError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| IntakeError::InvalidDate(value.to_string()))
}

fn parse_amount(value: &str) -> Result<Decimal, IntakeError> {
    let cleaned: String = value
        .trim_end_matches('원')
        .chars()
        .filter(|ch| *ch != ',' && !ch.is_whitespace())
        .collect();

    match Decimal::from_str(&cleaned) {
        Ok(amount) if amount > Decimal::ZERO => Ok(amount),
        _ => Err(IntakeError::InvalidNumber(value.to_string())),
    }
}
