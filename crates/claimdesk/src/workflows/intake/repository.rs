use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{Answer, CaseType, IdempotencyKey, Transaction};
use super::session::IntakeSubmission;

/// Identifier of the case a claim is filed under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CaseId(pub String);

/// Persisted outcome of an intake: the transactions verbatim plus the generated claim text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    pub case_id: CaseId,
    pub idempotency_key: IdempotencyKey,
    pub case_type: CaseType,
    pub answers: BTreeMap<String, Answer>,
    pub transactions: Vec<Transaction>,
    pub claim_text: String,
    pub claim_confirmed: bool,
}

impl ClaimRecord {
    pub fn from_submission(case_id: CaseId, submission: IntakeSubmission) -> Self {
        Self {
            case_id,
            idempotency_key: submission.idempotency_key,
            case_type: submission.case_type,
            answers: submission.answers,
            transactions: submission.transactions,
            claim_text: submission.claim_text,
            claim_confirmed: false,
        }
    }
}

/// External record store. Implementations must reject a second insert carrying an
/// idempotency key they already hold; that rejection is the only duplicate guard.
pub trait ClaimStore: Send + Sync {
    fn insert(&self, record: ClaimRecord) -> Result<ClaimRecord, StoreError>;
    fn find_by_key(&self, key: &IdempotencyKey) -> Result<Option<ClaimRecord>, StoreError>;
    fn fetch(&self, case_id: &CaseId) -> Result<Vec<ClaimRecord>, StoreError>;
    fn update(&self, record: ClaimRecord) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("a claim with idempotency key {0} already exists")]
    Conflict(IdempotencyKey),
    #[error("claim not found")]
    NotFound,
    #[error("claim store unavailable: {0}")]
    Unavailable(String),
}
