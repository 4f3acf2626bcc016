use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::domain::{CaseType, ConfirmationChoice, IdempotencyKey, IntakeError, Transaction};
use super::repository::{CaseId, ClaimStore, StoreError};
use super::service::{IntakeService, IntakeServiceError, SessionId, SessionView};

#[derive(Debug, Deserialize)]
pub(crate) struct OpenSessionRequest {
    pub(crate) case_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CaseTypeRequest {
    pub(crate) case_type: CaseType,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AnswerRequest {
    pub(crate) answer: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConfirmRequest {
    pub(crate) choice: String,
}

/// Router exposing the intake conversation and claim confirmation endpoints.
pub fn intake_router<S>(service: Arc<IntakeService<S>>) -> Router
where
    S: ClaimStore + 'static,
{
    Router::new()
        .route("/api/v1/intake/sessions", post(open_handler::<S>))
        .route(
            "/api/v1/intake/sessions/:session_id",
            get(session_handler::<S>).delete(close_handler::<S>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/case-type",
            post(case_type_handler::<S>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/answer",
            post(answer_handler::<S>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/transactions",
            post(add_transaction_handler::<S>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/transactions/:index",
            delete(remove_transaction_handler::<S>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/back",
            post(back_handler::<S>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/confirm",
            post(confirm_handler::<S>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/reset",
            post(reset_handler::<S>),
        )
        .route(
            "/api/v1/intake/claims/:idempotency_key/confirm",
            post(confirm_claim_handler::<S>),
        )
        .route("/api/v1/cases/:case_id/claims", get(case_claims_handler::<S>))
        .with_state(service)
}

type ServiceState<S> = State<Arc<IntakeService<S>>>;

fn view_response(status: StatusCode, result: Result<SessionView, IntakeServiceError>) -> Response {
    match result {
        Ok(view) => (status, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: IntakeServiceError) -> Response {
    let status = match &err {
        IntakeServiceError::Intake(_) => StatusCode::UNPROCESSABLE_ENTITY,
        IntakeServiceError::SessionNotFound(_)
        | IntakeServiceError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
        IntakeServiceError::Store(StoreError::Conflict(_)) => StatusCode::CONFLICT,
        IntakeServiceError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
    };
    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}

pub(crate) async fn open_handler<S>(
    State(service): ServiceState<S>,
    Json(request): Json<OpenSessionRequest>,
) -> Response
where
    S: ClaimStore + 'static,
{
    let view = service.open_session(CaseId(request.case_id));
    (StatusCode::CREATED, Json(view)).into_response()
}

pub(crate) async fn session_handler<S>(
    State(service): ServiceState<S>,
    Path(session_id): Path<Uuid>,
) -> Response
where
    S: ClaimStore + 'static,
{
    view_response(StatusCode::OK, service.session(SessionId(session_id)))
}

pub(crate) async fn close_handler<S>(
    State(service): ServiceState<S>,
    Path(session_id): Path<Uuid>,
) -> Response
where
    S: ClaimStore + 'static,
{
    match service.close_session(SessionId(session_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn case_type_handler<S>(
    State(service): ServiceState<S>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<CaseTypeRequest>,
) -> Response
where
    S: ClaimStore + 'static,
{
    view_response(
        StatusCode::OK,
        service.select_case_type(SessionId(session_id), request.case_type),
    )
}

pub(crate) async fn answer_handler<S>(
    State(service): ServiceState<S>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<AnswerRequest>,
) -> Response
where
    S: ClaimStore + 'static,
{
    view_response(
        StatusCode::OK,
        service.answer(SessionId(session_id), &request.answer),
    )
}

pub(crate) async fn add_transaction_handler<S>(
    State(service): ServiceState<S>,
    Path(session_id): Path<Uuid>,
    Json(transaction): Json<Transaction>,
) -> Response
where
    S: ClaimStore + 'static,
{
    view_response(
        StatusCode::OK,
        service.add_transaction(SessionId(session_id), transaction),
    )
}

pub(crate) async fn remove_transaction_handler<S>(
    State(service): ServiceState<S>,
    Path((session_id, index)): Path<(Uuid, usize)>,
) -> Response
where
    S: ClaimStore + 'static,
{
    view_response(
        StatusCode::OK,
        service.remove_transaction(SessionId(session_id), index),
    )
}

pub(crate) async fn back_handler<S>(
    State(service): ServiceState<S>,
    Path(session_id): Path<Uuid>,
) -> Response
where
    S: ClaimStore + 'static,
{
    view_response(StatusCode::OK, service.go_back(SessionId(session_id)))
}

pub(crate) async fn confirm_handler<S>(
    State(service): ServiceState<S>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<ConfirmRequest>,
) -> Response
where
    S: ClaimStore + 'static,
{
    let result = ConfirmationChoice::parse(&request.choice)
        .ok_or_else(|| IntakeError::InvalidConfirmation(request.choice.trim().to_string()))
        .map_err(IntakeServiceError::from)
        .and_then(|choice| service.confirm(SessionId(session_id), choice));
    view_response(StatusCode::OK, result)
}

pub(crate) async fn reset_handler<S>(
    State(service): ServiceState<S>,
    Path(session_id): Path<Uuid>,
) -> Response
where
    S: ClaimStore + 'static,
{
    view_response(StatusCode::OK, service.reset(SessionId(session_id)))
}

pub(crate) async fn confirm_claim_handler<S>(
    State(service): ServiceState<S>,
    Path(key): Path<Uuid>,
) -> Response
where
    S: ClaimStore + 'static,
{
    match service.confirm_claim(&IdempotencyKey(key)) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn case_claims_handler<S>(
    State(service): ServiceState<S>,
    Path(case_id): Path<String>,
) -> Response
where
    S: ClaimStore + 'static,
{
    match service.claims_for_case(&CaseId(case_id)) {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(err) => error_response(err),
    }
}
