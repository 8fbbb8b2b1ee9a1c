//! Error types for web handlers.
//!
//! Bridges the domain error taxonomy to HTTP responses via Axum's
//! `IntoResponse`. Every failure becomes a `{ code, message }` JSON body;
//! business conflicts keep their current-state context in the message so
//! callers can retry correctly.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use seatswap_core::error::MarketError;
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
///
/// Wraps domain errors with an HTTP status and a stable machine-readable
/// code. Internal detail travels in `source` for logging and is never
/// exposed to the client.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    code: String,
    source: Option<anyhow::Error>,
}

impl ApiError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Attach a source error for logging.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            message.into(),
            "VALIDATION_ERROR".to_string(),
        )
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            message.into(),
            "NOT_FOUND".to_string(),
        )
    }

    /// Create a 409 Conflict error.
    #[must_use]
    pub fn conflict(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message.into(), code.into())
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR".to_string(),
        )
    }

    /// The HTTP status this error maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// The machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<MarketError> for ApiError {
    fn from(err: MarketError) -> Self {
        let message = err.to_string();
        match err {
            MarketError::Validation(_) => Self::bad_request(message),
            MarketError::ListingNotFound | MarketError::NotOwnerOrNotFound => {
                Self::not_found(message)
            }
            MarketError::AlreadyListed => Self::conflict("ALREADY_LISTED", message),
            MarketError::BidTooLow { .. } => Self::conflict("BID_TOO_LOW", message),
            MarketError::AlreadySettled => Self::conflict("ALREADY_SETTLED", message),
            MarketError::SettlementFailed { .. } => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                message,
                "SETTLEMENT_FAILED".to_string(),
            ),
            // The transaction may still finalize: 202 tells the caller the
            // outcome is pending, not failed.
            MarketError::SettlementPending { .. } => Self::new(
                StatusCode::ACCEPTED,
                message,
                "SETTLEMENT_PENDING".to_string(),
            ),
            MarketError::ReconciliationRequired { .. } => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                message,
                "RECONCILIATION_REQUIRED".to_string(),
            ),
            MarketError::Storage(store_err) => {
                Self::internal("An internal error occurred").with_source(store_err.into())
            }
        }
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Log internal errors with their source before it is dropped
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "request failed"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "request failed"
                );
            }
        }

        let body = ErrorBody {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use seatswap_core::store::StoreError;

    #[test]
    fn validation_maps_to_400() {
        let err = ApiError::from(MarketError::Validation("price is required".into()));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn ownership_failures_are_indistinguishable_404s() {
        let missing = ApiError::from(MarketError::ListingNotFound);
        let not_owner = ApiError::from(MarketError::NotOwnerOrNotFound);
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(not_owner.status(), StatusCode::NOT_FOUND);
        assert_eq!(missing.code(), not_owner.code());
    }

    #[test]
    fn bid_too_low_keeps_current_amount_in_message() {
        let err = ApiError::from(MarketError::BidTooLow {
            current: "10.5".parse().unwrap(),
        });
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "BID_TOO_LOW");
        assert!(err.to_string().contains("10.5"));
    }

    #[test]
    fn settlement_pending_is_202_not_an_outright_failure() {
        let err = ApiError::from(MarketError::SettlementPending {
            submission_id: "sub-1".into(),
            detail: "no confirmation within 60s".into(),
        });
        assert_eq!(err.status(), StatusCode::ACCEPTED);
        assert_eq!(err.code(), "SETTLEMENT_PENDING");
    }

    #[test]
    fn reconciliation_required_is_surfaced_distinctly() {
        let err = ApiError::from(MarketError::ReconciliationRequired {
            tx_reference: "0xdead".into(),
            detail: "ownership write failed".into(),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code(), "RECONCILIATION_REQUIRED");
        assert!(err.to_string().contains("0xdead"));
    }

    #[test]
    fn storage_errors_hide_detail_from_clients() {
        let err = ApiError::from(MarketError::Storage(StoreError::Unavailable(
            "pool closed".into(),
        )));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.to_string().contains("pool closed"));
    }
}
