//! HTTP surface
//!
//! Two read-only endpoints, `/beneficiary` and `/payer`, each taking an
//! `address` query parameter and answering with a `{message, data}`
//! envelope.

use crate::error::AnalysisError;
use crate::records::{CounterpartyAggregate, TransactionRecord};
use crate::service::FundFlowService;
use crate::source::ApiKey;
use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub const BENEFICIARY_PATH: &str = "/beneficiary";
pub const PAYER_PATH: &str = "/payer";
pub const HEALTH_PATH: &str = "/health";

const SUCCESS: &str = "success";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: FundFlowService,
    pub key: ApiKey,
}

/// Response envelope.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub message: String,
    pub data: Vec<T>,
}

impl<T> Envelope<T> {
    pub fn success(data: Vec<T>) -> Self {
        Self {
            message: SUCCESS.to_string(),
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Beneficiary {
    #[serde(rename = "beneficiary_address")]
    pub address: String,
    pub amount: f64,
    pub transactions: Vec<TransactionRecord>,
}

impl From<CounterpartyAggregate> for Beneficiary {
    fn from(agg: CounterpartyAggregate) -> Self {
        let (address, amount, transactions) = agg.into_parts();
        Self {
            address,
            amount,
            transactions,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Payer {
    #[serde(rename = "payer_address")]
    pub address: String,
    pub amount: f64,
    pub transactions: Vec<TransactionRecord>,
}

impl From<CounterpartyAggregate> for Payer {
    fn from(agg: CounterpartyAggregate) -> Self {
        let (address, amount, transactions) = agg.into_parts();
        Self {
            address,
            amount,
            transactions,
        }
    }
}

/// Error response with the same envelope shape as a success.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new<T: Into<String>>(status: StatusCode, message: T) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Envelope::<()> {
            message: self.message,
            data: Vec::new(),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<AnalysisError> for ApiError {
    fn from(err: AnalysisError) -> Self {
        if err.is_client_error() {
            return ApiError::new(StatusCode::BAD_REQUEST, err.to_string());
        }
        warn!("Analysis failed: {}", err);
        match err {
            AnalysisError::UpstreamFetch { .. } => {
                ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Error fetching transactions")
            }
            other => ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AddressQuery {
    address: Option<String>,
}

impl AddressQuery {
    fn require(self) -> Result<String, ApiError> {
        match self.address {
            Some(address) if !address.trim().is_empty() => Ok(address),
            _ => Err(ApiError::new(StatusCode::BAD_REQUEST, "missing address query parameter")),
        }
    }
}

pub fn make_router(state: AppState) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health_check))
        .route(BENEFICIARY_PATH, get(beneficiary))
        .route(PAYER_PATH, get(payer))
        .with_state(state)
}

/// Serve until Ctrl+C.
pub async fn serve(bind: SocketAddr, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    info!("Listening on {}", bind);

    axum::serve(listener, make_router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Received Ctrl+C, shutting down gracefully...");
        })
        .await
        .context("HTTP server error")
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

async fn beneficiary(
    State(state): State<AppState>,
    Query(query): Query<AddressQuery>,
) -> Result<Json<Envelope<Beneficiary>>, ApiError> {
    let address = query.require()?;
    let aggregates = state.service.beneficiaries(&address, &state.key).await?;
    Ok(Json(Envelope::success(
        aggregates.into_iter().map(Beneficiary::from).collect(),
    )))
}

async fn payer(
    State(state): State<AppState>,
    Query(query): Query<AddressQuery>,
) -> Result<Json<Envelope<Payer>>, ApiError> {
    let address = query.require()?;
    let aggregates = state.service.payers(&address, &state.key).await?;
    Ok(Json(Envelope::success(
        aggregates.into_iter().map(Payer::from).collect(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::service::AnalysisSettings;
    use crate::source::fakes::{tx, StaticOracle, StaticSource};
    use crate::types::Category;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    const A: &str = "0x742d35cc6634c0532925a3b844bc454e4438f44e";
    const T: &str = "0x00000000000000000000000000000000000000ff";

    fn router(source: StaticSource) -> Router {
        let service = FundFlowService::new(
            Arc::new(source),
            Arc::new(StaticOracle::default()),
            AnalysisSettings::default(),
        );
        make_router(AppState {
            service,
            key: ApiKey::new("test-key"),
        })
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_beneficiary_success_shape() {
        let source = StaticSource::new(vec![tx(A, T, "2000000000000000000", "0x1")], vec![], vec![]);
        let (status, body) = get_json(router(source), &format!("/beneficiary?address={}", A)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "success");
        let item = &body["data"][0];
        assert_eq!(item["beneficiary_address"], T);
        assert_eq!(item["amount"], 2.0);
        assert_eq!(item["transactions"][0]["transaction_id"], "0x1");
        assert_eq!(item["transactions"][0]["tx_amount"], 2.0);
        assert_eq!(item["transactions"][0]["date_time"], "2024-03-29 11:28:31");
    }

    #[tokio::test]
    async fn test_payer_success_shape() {
        let source = StaticSource::new(vec![tx(A, T, "1000000000000000000", "0x1")], vec![], vec![]);
        let (status, body) = get_json(router(source), &format!("/payer?address={}", T)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"][0]["payer_address"], A);
        assert_eq!(body["data"][0]["amount"], 1.0);
    }

    #[tokio::test]
    async fn test_invalid_address_is_bad_request() {
        let (status, body) = get_json(router(StaticSource::default()), "/beneficiary?address=invalidaddress").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["data"], Value::Array(vec![]));
    }

    #[tokio::test]
    async fn test_missing_address_is_bad_request() {
        let (status, _) = get_json(router(StaticSource::default()), "/beneficiary").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = get_json(router(StaticSource::default()), "/payer?address=").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_server_error() {
        let source = StaticSource::new(vec![], vec![], vec![])
            .failing(Category::Token, || FetchError::Transport("down".into()));
        let (status, body) = get_json(router(source), &format!("/payer?address={}", T)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Error fetching transactions");
    }

    #[tokio::test]
    async fn test_health() {
        let response = router(StaticSource::default())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
