use chrono::NaiveDate;
use claimdesk::workflows::intake::{CaseId, ClaimRecord, ClaimStore, IdempotencyKey, StoreError};
use claimdesk::workflows::ledger::DayCount;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) day_count: DayCount,
}

/// Process-local claim store keyed by idempotency key.
#[derive(Default, Clone)]
pub(crate) struct InMemoryClaimStore {
    records: Arc<Mutex<HashMap<IdempotencyKey, ClaimRecord>>>,
}

impl InMemoryClaimStore {
    fn guard(&self) -> Result<MutexGuard<'_, HashMap<IdempotencyKey, ClaimRecord>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("claim store mutex poisoned".to_string()))
    }
}

impl ClaimStore for InMemoryClaimStore {
    fn insert(&self, record: ClaimRecord) -> Result<ClaimRecord, StoreError> {
        let mut guard = self.guard()?;
        if guard.contains_key(&record.idempotency_key) {
            return Err(StoreError::Conflict(record.idempotency_key));
        }
        guard.insert(record.idempotency_key, record.clone());
        Ok(record)
    }

    fn find_by_key(&self, key: &IdempotencyKey) -> Result<Option<ClaimRecord>, StoreError> {
        Ok(self.guard()?.get(key).cloned())
    }

    fn fetch(&self, case_id: &CaseId) -> Result<Vec<ClaimRecord>, StoreError> {
        Ok(self
            .guard()?
            .values()
            .filter(|record| &record.case_id == case_id)
            .cloned()
            .collect())
    }

    fn update(&self, record: ClaimRecord) -> Result<(), StoreError> {
        let mut guard = self.guard()?;
        if guard.contains_key(&record.idempotency_key) {
            guard.insert(record.idempotency_key, record);
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn deserialize_optional_date<'de, D>(
    deserializer: D,
) -> Result<Option<NaiveDate>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    opt.map(|value| parse_date(&value).map_err(serde::de::Error::custom))
        .transpose()
}
