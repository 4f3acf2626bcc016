use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::workflows::intake::domain::{CaseType, IdempotencyKey, Transaction};
use crate::workflows::intake::repository::{CaseId, ClaimRecord, ClaimStore, StoreError};
use crate::workflows::intake::service::{IntakeService, SessionId};
use crate::workflows::intake::intake_router;

pub(super) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub(super) fn case_id() -> CaseId {
    CaseId("case-2024-0117".to_string())
}

pub(super) fn loan_transaction(amount: i64, due: NaiveDate) -> Transaction {
    Transaction::dated(Some(due - chrono::Duration::days(30)), Decimal::from(amount), Some(due))
}

pub(super) fn build_service() -> (IntakeService<MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    (IntakeService::new(store.clone()), store)
}

/// Walks a loan intake up to the confirmation prompt.
pub(super) fn loan_session_awaiting_confirmation<S>(service: &IntakeService<S>) -> SessionId
where
    S: ClaimStore + 'static,
{
    let session_id = service.open_session(case_id()).session_id;
    service
        .select_case_type(session_id, CaseType::Loan)
        .expect("case type selected");
    service.answer(session_id, "김채권").expect("creditor");
    service.answer(session_id, "이채무").expect("debtor");
    service
        .add_transaction(session_id, loan_transaction(2_000_000, date(2024, 2, 1)))
        .expect("first transaction");
    service
        .add_transaction(session_id, loan_transaction(1_000_000, date(2024, 1, 1)))
        .expect("second transaction");
    service.answer(session_id, "").expect("table closed");
    service.answer(session_id, "2024-06-30").expect("demand date");
    session_id
}

#[derive(Default, Clone)]
pub(super) struct MemoryStore {
    pub(super) records: Arc<Mutex<HashMap<IdempotencyKey, ClaimRecord>>>,
}

impl MemoryStore {
    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("store mutex poisoned").len()
    }
}

impl ClaimStore for MemoryStore {
    fn insert(&self, record: ClaimRecord) -> Result<ClaimRecord, StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        if guard.contains_key(&record.idempotency_key) {
            return Err(StoreError::Conflict(record.idempotency_key));
        }
        guard.insert(record.idempotency_key, record.clone());
        Ok(record)
    }

    fn find_by_key(&self, key: &IdempotencyKey) -> Result<Option<ClaimRecord>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard.get(key).cloned())
    }

    fn fetch(&self, case_id: &CaseId) -> Result<Vec<ClaimRecord>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| &record.case_id == case_id)
            .cloned()
            .collect())
    }

    fn update(&self, record: ClaimRecord) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        if !guard.contains_key(&record.idempotency_key) {
            return Err(StoreError::NotFound);
        }
        guard.insert(record.idempotency_key, record);
        Ok(())
    }
}

/// Store whose inserts announce themselves and then wait to be released, so a test can act on
/// a session while its submission is still being persisted.
pub(super) struct GatedStore {
    pub(super) inner: MemoryStore,
    entered: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
}

impl GatedStore {
    /// Returns the store, the receiver that hears each insert begin, and the sender that lets
    /// it finish.
    pub(super) fn new() -> (Self, Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let store = Self {
            inner: MemoryStore::default(),
            entered: Mutex::new(entered_tx),
            release: Mutex::new(release_rx),
        };
        (store, entered_rx, release_tx)
    }
}

impl ClaimStore for GatedStore {
    fn insert(&self, record: ClaimRecord) -> Result<ClaimRecord, StoreError> {
        let _ = self.entered.lock().expect("gate mutex poisoned").send(());
        let _ = self.release.lock().expect("gate mutex poisoned").recv();
        self.inner.insert(record)
    }

    fn find_by_key(&self, key: &IdempotencyKey) -> Result<Option<ClaimRecord>, StoreError> {
        self.inner.find_by_key(key)
    }

    fn fetch(&self, case_id: &CaseId) -> Result<Vec<ClaimRecord>, StoreError> {
        self.inner.fetch(case_id)
    }

    fn update(&self, record: ClaimRecord) -> Result<(), StoreError> {
        self.inner.update(record)
    }
}

pub(super) struct UnavailableStore;

impl ClaimStore for UnavailableStore {
    fn insert(&self, _record: ClaimRecord) -> Result<ClaimRecord, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn find_by_key(&self, _key: &IdempotencyKey) -> Result<Option<ClaimRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _case_id: &CaseId) -> Result<Vec<ClaimRecord>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: ClaimRecord) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn router_with_service(service: IntakeService<MemoryStore>) -> axum::Router {
    intake_router(Arc::new(service))
}
