//! HTTP error mapping
//!
//! Maps domain errors onto the external contract: client-caused
//! validation failures are 4xx, retryable execution failures are 409
//! (with enough detail to drive a retry against a fresh proposal),
//! subledger failures are 502, everything else is 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use netting_core::Error as CoreError;

/// Gateway error
#[derive(Debug)]
pub enum ApiError {
    /// Request rejected at the boundary before reaching the engine
    BadRequest(String),
    /// Error surfaced by the netting engine
    Domain(CoreError),
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError::Domain(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Domain(err) => match err {
                CoreError::AgreementNotFound(_) | CoreError::SettlementNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                CoreError::Validation(_)
                | CoreError::CurrencyMismatch { .. }
                | CoreError::InvalidLineAmount { .. }
                | CoreError::Config(_) => StatusCode::BAD_REQUEST,
                CoreError::AgreementNotActive { .. }
                | CoreError::StaleProposal { .. }
                | CoreError::ConcurrentSettlementConflict(_) => StatusCode::CONFLICT,
                CoreError::SubledgerPosting { .. } | CoreError::CompensationFailed { .. } => {
                    StatusCode::BAD_GATEWAY
                }
                CoreError::Storage(_) | CoreError::Io(_) | CoreError::Other(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Domain(err) => match err {
                CoreError::AgreementNotFound(_) => "agreement_not_found",
                CoreError::AgreementNotActive { .. } => "agreement_not_active",
                CoreError::CurrencyMismatch { .. } => "currency_mismatch",
                CoreError::InvalidLineAmount { .. } => "invalid_line_amount",
                CoreError::StaleProposal { .. } => "stale_proposal",
                CoreError::ConcurrentSettlementConflict(_) => "concurrent_settlement_conflict",
                CoreError::SubledgerPosting { .. } => "subledger_posting_failure",
                CoreError::CompensationFailed { .. } => "compensation_failed",
                CoreError::SettlementNotFound(_) => "settlement_not_found",
                CoreError::Validation(_) => "validation",
                CoreError::Storage(_) => "storage",
                CoreError::Config(_) => "config",
                CoreError::Io(_) => "io",
                CoreError::Other(_) => "internal",
            },
        }
    }

    fn retryable(&self) -> bool {
        match self {
            ApiError::BadRequest(_) => false,
            ApiError::Domain(err) => err.is_retryable(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = serde_json::json!({
            "error": match &self {
                ApiError::BadRequest(msg) => msg.clone(),
                ApiError::Domain(err) => err.to_string(),
            },
            "kind": self.kind(),
            "retryable": self.retryable(),
            "timestamp": Utc::now(),
        });

        // Surface the recomputed ceiling so a client can retry without
        // another proposal round-trip
        if let ApiError::Domain(CoreError::StaleProposal { ceiling, .. }) = &self {
            body["ceiling"] = serde_json::json!(ceiling.to_string());
        }

        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[test]
    fn test_status_mapping() {
        let not_found = ApiError::from(CoreError::AgreementNotFound(Uuid::new_v4()));
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert!(!not_found.retryable());

        let stale = ApiError::from(CoreError::StaleProposal {
            requested: dec!(100.00),
            ceiling: dec!(50.00),
        });
        assert_eq!(stale.status(), StatusCode::CONFLICT);
        assert!(stale.retryable());

        let conflict = ApiError::from(CoreError::ConcurrentSettlementConflict(Uuid::new_v4()));
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let posting = ApiError::from(CoreError::SubledgerPosting {
            side: netting_core::LedgerRole::Payable,
            reason: "down".to_string(),
        });
        assert_eq!(posting.status(), StatusCode::BAD_GATEWAY);
    }
}
