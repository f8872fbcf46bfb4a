//! REST surface of the netting engine
//!
//! Request bodies are explicit typed DTOs validated here, before
//! anything reaches the engine.

use crate::error::ApiError;
use crate::extract::ValidatedJson;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use netting_core::{
    Currency, NettingAgreement, NettingProposal, NettingService, NettingSettlement, NewAgreement,
    PartyId, SettlementRequest,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    /// The engine facade
    pub service: Arc<NettingService>,
}

/// Body of `POST /agreements`
#[derive(Debug, Deserialize)]
pub struct CreateAgreementRequest {
    /// Counterparty on the AR side
    pub customer_party: String,
    /// Counterparty on the AP side
    pub supplier_party: String,
    /// ISO 4217 code of the netting currency
    pub netting_currency: String,
}

/// Body of `POST /settlements`
#[derive(Debug, Deserialize)]
pub struct CreateSettlementRequest {
    /// Agreement to settle against
    pub agreement_id: Uuid,
    /// Amount to offset on both sides
    pub netted_amount: Decimal,
}

/// Body of `GET /health`
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Liveness marker
    pub status: &'static str,
    /// Service name
    pub service: &'static str,
    /// Crate version
    pub version: &'static str,
}

/// Build the gateway router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/agreements", get(list_agreements).post(create_agreement))
        .route("/agreements/:id/proposal", get(get_proposal))
        .route("/settlements", post(create_settlement))
        .route("/settlements/:id", get(get_settlement))
        .with_state(state)
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "netting-gateway",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn list_agreements(
    State(state): State<AppState>,
) -> Result<Json<Vec<NettingAgreement>>, ApiError> {
    Ok(Json(state.service.list_agreements().await?))
}

async fn create_agreement(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<CreateAgreementRequest>,
) -> Result<(StatusCode, Json<NettingAgreement>), ApiError> {
    let netting_currency = Currency::parse(&body.netting_currency).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "unsupported netting currency: {}",
            body.netting_currency
        ))
    })?;

    let agreement = state
        .service
        .create_agreement(NewAgreement {
            customer_party: PartyId::new(body.customer_party),
            supplier_party: PartyId::new(body.supplier_party),
            netting_currency,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(agreement)))
}

/// Computed fresh on every call; never cached
async fn get_proposal(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<NettingProposal>, ApiError> {
    Ok(Json(state.service.propose(id).await?))
}

async fn create_settlement(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<CreateSettlementRequest>,
) -> Result<(StatusCode, Json<NettingSettlement>), ApiError> {
    let settlement = state
        .service
        .settle(SettlementRequest {
            agreement_id: body.agreement_id,
            netted_amount: body.netted_amount,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(settlement)))
}

async fn get_settlement(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<NettingSettlement>, ApiError> {
    Ok(Json(state.service.get_settlement(id).await?))
}
