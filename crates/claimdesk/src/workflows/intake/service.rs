use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::domain::{
    Answer, CaseType, ConfirmationChoice, IdempotencyKey, IntakeError, Transaction,
};
use super::repository::{CaseId, ClaimRecord, ClaimStore, StoreError};
use super::session::{IntakeSession, IntakeState, IntakeSubmission, Transition};

/// Handle for one in-progress intake conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone)]
struct SessionEntry {
    case_id: CaseId,
    session: IntakeSession,
    claim: Option<ClaimRecord>,
}

/// Snapshot of a session returned to callers after every action.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub case_id: CaseId,
    pub state: IntakeState,
    pub case_type: Option<CaseType>,
    pub prompt: Option<String>,
    pub answers: BTreeMap<String, Answer>,
    pub pending_transactions: Vec<Transaction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim: Option<ClaimRecord>,
}

impl SessionView {
    fn from_entry(session_id: SessionId, entry: &SessionEntry) -> Self {
        Self {
            session_id,
            case_id: entry.case_id.clone(),
            state: entry.session.state(),
            case_type: entry.session.case_type(),
            prompt: entry.session.prompt().map(str::to_string),
            answers: entry.session.answers().clone(),
            pending_transactions: entry.session.pending_transactions().to_vec(),
            claim: entry.claim.clone(),
        }
    }
}

type SharedEntry = Arc<Mutex<SessionEntry>>;

/// Hosts intake sessions between round trips and persists finished intakes through the
/// injected store.
///
/// Each session has its own lock, held for the whole of an action including persistence, so
/// actions on one session apply in order and none is lost. The registry lock is only held to
/// look an entry up.
pub struct IntakeService<S> {
    store: Arc<S>,
    sessions: Mutex<HashMap<SessionId, SharedEntry>>,
}

impl<S> IntakeService<S>
where
    S: ClaimStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn open_session(&self, case_id: CaseId) -> SessionView {
        let session_id = SessionId(Uuid::new_v4());
        let entry = SessionEntry {
            case_id,
            session: IntakeSession::new(),
            claim: None,
        };
        let view = SessionView::from_entry(session_id, &entry);
        self.lock_sessions()
            .insert(session_id, Arc::new(Mutex::new(entry)));
        view
    }

    pub fn session(&self, session_id: SessionId) -> Result<SessionView, IntakeServiceError> {
        let shared = self.shared_entry(session_id)?;
        let entry = lock_entry(&shared);
        Ok(SessionView::from_entry(session_id, &entry))
    }

    /// Unregisters the session. An action already running on it completes, but its result is
    /// never registered again.
    pub fn close_session(&self, session_id: SessionId) -> Result<(), IntakeServiceError> {
        self.lock_sessions()
            .remove(&session_id)
            .map(|_| ())
            .ok_or(IntakeServiceError::SessionNotFound(session_id))
    }

    pub fn select_case_type(
        &self,
        session_id: SessionId,
        case_type: CaseType,
    ) -> Result<SessionView, IntakeServiceError> {
        self.apply(session_id, |session| session.select_case_type(case_type))
    }

    pub fn answer(
        &self,
        session_id: SessionId,
        raw: &str,
    ) -> Result<SessionView, IntakeServiceError> {
        self.apply(session_id, |session| session.answer(raw))
    }

    pub fn add_transaction(
        &self,
        session_id: SessionId,
        transaction: Transaction,
    ) -> Result<SessionView, IntakeServiceError> {
        self.mutate(session_id, |session| {
            session.add_transaction(transaction).map(|_| ())
        })
    }

    pub fn remove_transaction(
        &self,
        session_id: SessionId,
        index: usize,
    ) -> Result<SessionView, IntakeServiceError> {
        self.mutate(session_id, |session| {
            session.remove_transaction(index).map(|_| ())
        })
    }

    pub fn go_back(&self, session_id: SessionId) -> Result<SessionView, IntakeServiceError> {
        self.apply(session_id, IntakeSession::go_back)
    }

    pub fn confirm(
        &self,
        session_id: SessionId,
        choice: ConfirmationChoice,
    ) -> Result<SessionView, IntakeServiceError> {
        self.apply(session_id, |session| session.confirm(choice))
    }

    pub fn reset(&self, session_id: SessionId) -> Result<SessionView, IntakeServiceError> {
        let shared = self.shared_entry(session_id)?;
        let mut entry = lock_entry(&shared);
        entry.session.reset();
        entry.claim = None;
        Ok(SessionView::from_entry(session_id, &entry))
    }

    /// Persists a finished intake. A key the store already holds returns the stored record
    /// instead of creating another.
    pub fn persist_submission(
        &self,
        case_id: CaseId,
        submission: IntakeSubmission,
    ) -> Result<ClaimRecord, IntakeServiceError> {
        let record = ClaimRecord::from_submission(case_id, submission);
        let key = record.idempotency_key;

        match self.store.insert(record) {
            Ok(stored) => {
                info!(
                    case_id = %stored.case_id.0,
                    idempotency_key = %key,
                    transactions = stored.transactions.len(),
                    "claim intake persisted"
                );
                Ok(stored)
            }
            Err(StoreError::Conflict(existing)) => {
                warn!(idempotency_key = %existing, "duplicate claim intake submission ignored");
                self.store
                    .find_by_key(&existing)?
                    .ok_or(IntakeServiceError::Store(StoreError::NotFound))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Marks the generated claim text as reviewed and accepted.
    pub fn confirm_claim(
        &self,
        key: &IdempotencyKey,
    ) -> Result<ClaimRecord, IntakeServiceError> {
        let mut record = self
            .store
            .find_by_key(key)?
            .ok_or(StoreError::NotFound)?;
        record.claim_confirmed = true;
        self.store.update(record.clone())?;
        info!(case_id = %record.case_id.0, idempotency_key = %key, "claim text confirmed");
        Ok(record)
    }

    pub fn claims_for_case(&self, case_id: &CaseId) -> Result<Vec<ClaimRecord>, IntakeServiceError> {
        Ok(self.store.fetch(case_id)?)
    }

    /// Runs a state transition on a working copy, persisting on submission, and writes the
    /// copy back only once everything succeeded. The session stays locked throughout.
    fn apply<F>(&self, session_id: SessionId, action: F) -> Result<SessionView, IntakeServiceError>
    where
        F: FnOnce(&mut IntakeSession) -> Result<Transition, IntakeError>,
    {
        let shared = self.shared_entry(session_id)?;
        let mut entry = lock_entry(&shared);
        let mut working = entry.clone();

        if let Transition::Submitted(submission) = action(&mut working.session)? {
            let record = self.persist_submission(working.case_id.clone(), submission)?;
            working.claim = Some(record);
        }

        *entry = working;
        Ok(SessionView::from_entry(session_id, &entry))
    }

    fn mutate<F>(&self, session_id: SessionId, action: F) -> Result<SessionView, IntakeServiceError>
    where
        F: FnOnce(&mut IntakeSession) -> Result<(), IntakeError>,
    {
        let shared = self.shared_entry(session_id)?;
        let mut entry = lock_entry(&shared);
        let mut working = entry.session.clone();
        action(&mut working)?;
        entry.session = working;
        Ok(SessionView::from_entry(session_id, &entry))
    }

    fn shared_entry(&self, session_id: SessionId) -> Result<SharedEntry, IntakeServiceError> {
        self.lock_sessions()
            .get(&session_id)
            .cloned()
            .ok_or(IntakeServiceError::SessionNotFound(session_id))
    }

    fn lock_sessions(&self) -> MutexGuard<'_, HashMap<SessionId, SharedEntry>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn lock_entry(shared: &Mutex<SessionEntry>) -> MutexGuard<'_, SessionEntry> {
    shared
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, thiserror::Error)]
pub enum IntakeServiceError {
    #[error(transparent)]
    Intake(#[from] IntakeError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("intake session {0} not found")]
    SessionNotFound(SessionId),
}
