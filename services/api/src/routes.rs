use crate::infra::{deserialize_optional_date, AppState};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use chrono::NaiveDate;
use claimdesk::error::AppError;
use claimdesk::workflows::intake::claim_text::sort_by_due_date;
use claimdesk::workflows::intake::{
    generate_claim_text, intake_router, ClaimStore, IntakeService, Transaction,
    TransactionImporter,
};
use claimdesk::workflows::ledger::{
    sum_amounts, Bond, BondRecord, ClaimBreakdown, Clock, EnforcementAction, FixedClock,
    InterestCalculator, RecoverySummary, SystemClock,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;

/// Which figure the recovery rate is measured against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum RecoveryBasis {
    #[default]
    Principal,
    TotalClaim,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClaimTotalRequest {
    pub(crate) bond: BondRecord,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) today: Option<NaiveDate>,
    #[serde(default)]
    pub(crate) enforcement: Vec<EnforcementAction>,
    #[serde(default)]
    pub(crate) recovery_basis: RecoveryBasis,
}

#[derive(Debug, Serialize)]
pub(crate) struct ClaimTotalResponse {
    pub(crate) breakdown: ClaimBreakdown,
    pub(crate) recovery_basis: RecoveryBasis,
    pub(crate) recovery: RecoverySummary,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClaimTextRequest {
    #[serde(default)]
    pub(crate) transactions: Vec<Transaction>,
    /// Spreadsheet export used instead of `transactions` when present.
    #[serde(default)]
    pub(crate) csv: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ClaimTextResponse {
    pub(crate) total_amount: Decimal,
    pub(crate) transactions: Vec<Transaction>,
    pub(crate) claim_text: String,
}

pub(crate) fn with_claim_routes<S>(service: Arc<IntakeService<S>>) -> axum::Router
where
    S: ClaimStore + 'static,
{
    intake_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/claims/total",
            axum::routing::post(claim_total_endpoint),
        )
        .route(
            "/api/v1/claims/text",
            axum::routing::post(claim_text_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn claim_total_endpoint(
    Extension(state): Extension<AppState>,
    Json(payload): Json<ClaimTotalRequest>,
) -> Result<Json<ClaimTotalResponse>, AppError> {
    let ClaimTotalRequest {
        bond,
        today,
        enforcement,
        recovery_basis,
    } = payload;

    let bond = Bond::try_from(bond)?;
    let clock: Arc<dyn Clock> = match today {
        Some(date) => Arc::new(FixedClock(date)),
        None => Arc::new(SystemClock),
    };
    let calculator = InterestCalculator::new(clock, state.day_count);
    let breakdown = calculator.breakdown(&bond);

    let denominator = match recovery_basis {
        RecoveryBasis::Principal => breakdown.principal,
        RecoveryBasis::TotalClaim => breakdown.total,
    };
    let recovery = RecoverySummary::from_actions(&enforcement, Some(denominator));

    Ok(Json(ClaimTotalResponse {
        breakdown,
        recovery_basis,
        recovery,
    }))
}

pub(crate) async fn claim_text_endpoint(
    Json(payload): Json<ClaimTextRequest>,
) -> Result<Json<ClaimTextResponse>, AppError> {
    let ClaimTextRequest { transactions, csv } = payload;

    let mut transactions = match csv {
        Some(csv) => TransactionImporter::from_reader(Cursor::new(csv.into_bytes()))?,
        None => TransactionImporter::from_transactions(transactions)?,
    };
    let claim_text = generate_claim_text(&transactions);
    sort_by_due_date(&mut transactions);
    let total_amount = sum_amounts(transactions.iter().map(|transaction| transaction.amount));

    Ok(Json(ClaimTextResponse {
        total_amount,
        transactions,
        claim_text,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::InMemoryClaimStore;
    use axum::body::Body;
    use axum::http::Request;
    use claimdesk::workflows::ledger::{DayCount, RecoveryTier};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn app_state(ready: bool) -> AppState {
        let recorder = PrometheusBuilder::new().build_recorder();
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(recorder.handle()),
            day_count: DayCount::Actual365_25,
        }
    }

    fn app(ready: bool) -> axum::Router {
        let service = Arc::new(IntakeService::new(Arc::new(InMemoryClaimStore::default())));
        with_claim_routes(service).layer(Extension(app_state(ready)))
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json payload")
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    #[tokio::test]
    async fn claim_total_endpoint_itemizes_interest_and_recovery() {
        let request = ClaimTotalRequest {
            bond: serde_json::from_value(json!({
                "principal": 1000000,
                "interest_1_rate": 12,
                "interest_1_start_date": "2024-01-01",
                "interest_1_end_date": "dynamic",
                "expenses": [{"item": "인지대", "amount": 5000}, {"item": "송달료", "amount": 0}]
            }))
            .expect("bond parses"),
            today: NaiveDate::from_ymd_opt(2025, 1, 1),
            enforcement: serde_json::from_value(json!([
                {"amount": 600000, "status": "closed"},
                {"amount": 300000, "status": "pending"}
            ]))
            .expect("actions parse"),
            recovery_basis: RecoveryBasis::Principal,
        };

        let Json(body) = claim_total_endpoint(Extension(app_state(true)), Json(request))
            .await
            .expect("total computes");

        assert_eq!(body.breakdown.intervals[0].interest, Decimal::from(120_246));
        assert_eq!(body.breakdown.expenses.len(), 1);
        assert_eq!(body.breakdown.total, Decimal::from(1_125_246));
        assert_eq!(body.recovery.recovered, Decimal::from(600_000));
        assert_eq!(body.recovery.rate, Decimal::from(60));
        assert_eq!(body.recovery.tier, RecoveryTier::Moderate);
    }

    #[tokio::test]
    async fn claim_total_rejects_a_third_interval() {
        let response = app(true)
            .oneshot(post_json(
                "/api/v1/claims/total",
                json!({
                    "bond": {
                        "principal": 1000,
                        "interest_1_rate": 5,
                        "interest_2_rate": 12,
                        "interest_intervals": [{"rate": 15}]
                    }
                }),
            ))
            .await
            .expect("request handled");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn claim_text_endpoint_letters_transactions_by_due_date() {
        let response = app(true)
            .oneshot(post_json(
                "/api/v1/claims/text",
                json!({
                    "transactions": [
                        {"transactionDate": "2024-01-10", "amount": 2000000, "dueDate": "2024-02-01"},
                        {"transactionDate": "2023-12-01", "amount": 1000000, "dueDate": "2024-01-01"}
                    ]
                }),
            ))
            .await
            .expect("request handled");

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let text = body["claim_text"].as_str().expect("claim text");
        assert!(text.starts_with("피고는 원고에게 3,000,000원 및 그 중"));
        assert!(text.contains("가. 1,000,000원에 대하여는 2024.01.01.부터,"));
        assert_eq!(body["transactions"][0]["dueDate"], "2024-01-01");
    }

    #[tokio::test]
    async fn claim_text_endpoint_reports_bad_csv_rows() {
        let response = app(true)
            .oneshot(post_json(
                "/api/v1/claims/text",
                json!({
                    "csv": "transaction_date,start_date,end_date,amount,due_date\n2024-01-05,,,-10,\n"
                }),
            ))
            .await
            .expect("request handled");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn claim_text_endpoint_rejects_non_positive_amounts() {
        let response = app(true)
            .oneshot(post_json(
                "/api/v1/claims/text",
                json!({
                    "transactions": [
                        {"transactionDate": "2024-01-01", "amount": 1000000, "dueDate": "2024-01-01"},
                        {"transactionDate": "2024-01-15", "amount": -400000, "dueDate": "2024-02-01"}
                    ]
                }),
            ))
            .await
            .expect("request handled");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"]
            .as_str()
            .expect("error message")
            .contains("row 2"));
    }

    #[tokio::test]
    async fn claim_total_rejects_principal_beyond_the_record_limit() {
        let response = app(true)
            .oneshot(post_json(
                "/api/v1/claims/total",
                json!({
                    "bond": {
                        "principal": "10000000000000000000000000",
                        "interest_1_rate": 20,
                        "interest_1_start_date": "1900-01-01",
                        "interest_1_end_date": "dynamic"
                    }
                }),
            ))
            .await
            .expect("request handled");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn readiness_reflects_startup_flag() {
        let response = app(false)
            .oneshot(
                Request::builder()
                    .uri("/ready")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("request handled");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json_body(response).await["status"], "initializing");
    }
}
