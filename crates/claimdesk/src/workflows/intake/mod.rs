//! Scripted claim intake: case-type keyed questions, transaction collection, and the
//! generated claim statement.

mod blueprint;
pub mod claim_text;
pub mod domain;
pub mod import;
pub mod repository;
pub mod router;
pub mod service;
mod session;

#[cfg(test)]
mod tests;

pub use blueprint::{ScenarioBlueprint, CONFIRMATION_PROMPT};
pub use claim_text::{format_amount, format_date, format_naive_date, generate_claim_text};
pub use domain::{
    Answer, CaseType, ConfirmationChoice, IdempotencyKey, IntakeError, Step, StepKind,
    Transaction, TransactionLayout, TransactionRecord, TransactionTiming,
};
pub use import::{TransactionImportError, TransactionImporter};
pub use repository::{CaseId, ClaimRecord, ClaimStore, StoreError};
pub use router::intake_router;
pub use service::{IntakeService, IntakeServiceError, SessionId, SessionView};
pub use session::{IntakeSession, IntakeState, IntakeSubmission, Transition};
