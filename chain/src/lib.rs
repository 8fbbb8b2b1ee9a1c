//! JSON-RPC client for the settlement contract's gateway node.
//!
//! Implements [`LedgerGateway`] over HTTP JSON-RPC. The contract stays an
//! opaque oracle: this client knows two methods, one to submit a purchase
//! and one to poll for the receipt of an accepted submission.
//!
//! Confirmation is polled at a configured interval up to a caller-visible
//! timeout. On timeout the error says so explicitly — the transaction may
//! still finalize, and the settlement workflow reports that outcome as
//! pending rather than failed.
//!
//! # Example
//!
//! ```no_run
//! use seatswap_chain::JsonRpcLedgerGateway;
//! use std::time::Duration;
//!
//! # fn example() -> Result<(), seatswap_core::ledger::LedgerError> {
//! let gateway = JsonRpcLedgerGateway::builder()
//!     .endpoint("http://localhost:8545")
//!     .confirmation_timeout(Duration::from_secs(90))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use seatswap_core::ledger::{
    LedgerError, LedgerFuture, LedgerGateway, PendingSettlement, TxReference,
};
use seatswap_core::types::{TokenId, Wei};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::{Instant, sleep};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct RpcRequest<'a, P: Serialize> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmissionResult {
    submission_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Receipt {
    status: ReceiptStatus,
    tx_hash: Option<String>,
    reason: Option<String>,
}

#[derive(Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
#[serde(rename_all = "lowercase")]
enum ReceiptStatus {
    Pending,
    Confirmed,
    Rejected,
}

/// Ledger gateway over HTTP JSON-RPC.
pub struct JsonRpcLedgerGateway {
    http: reqwest::Client,
    endpoint: String,
    poll_interval: Duration,
    confirmation_timeout: Duration,
    next_id: AtomicU64,
}

impl JsonRpcLedgerGateway {
    /// Create a new builder.
    #[must_use]
    pub fn builder() -> JsonRpcLedgerGatewayBuilder {
        JsonRpcLedgerGatewayBuilder::default()
    }

    async fn call<P: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<T, LedgerError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| LedgerError::Transport(e.to_string()))?;
        let body: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| LedgerError::Transport(format!("malformed response: {e}")))?;
        if let Some(error) = body.error {
            return Err(LedgerError::Rejected {
                reason: format!("{} (code {})", error.message, error.code),
            });
        }
        body.result
            .ok_or_else(|| LedgerError::Transport("response carried neither result nor error".into()))
    }
}

/// Builder for configuring a [`JsonRpcLedgerGateway`].
#[derive(Default)]
pub struct JsonRpcLedgerGatewayBuilder {
    endpoint: Option<String>,
    poll_interval: Option<Duration>,
    confirmation_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
}

impl JsonRpcLedgerGatewayBuilder {
    /// Set the gateway node's HTTP endpoint.
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Set the receipt poll interval. Default: 1 second.
    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Set the total confirmation wait. Default: 60 seconds.
    #[must_use]
    pub const fn confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = Some(timeout);
        self
    }

    /// Set the per-request HTTP timeout. Default: 10 seconds.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Build the gateway client.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Transport`] when the endpoint is missing or
    /// the HTTP client cannot be constructed.
    pub fn build(self) -> Result<JsonRpcLedgerGateway, LedgerError> {
        let endpoint = self
            .endpoint
            .ok_or_else(|| LedgerError::Transport("endpoint not configured".into()))?;
        let http = reqwest::Client::builder()
            .timeout(self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT))
            .build()
            .map_err(|e| LedgerError::Transport(format!("failed to build http client: {e}")))?;
        Ok(JsonRpcLedgerGateway {
            http,
            endpoint,
            poll_interval: self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL),
            confirmation_timeout: self
                .confirmation_timeout
                .unwrap_or(DEFAULT_CONFIRMATION_TIMEOUT),
            next_id: AtomicU64::new(1),
        })
    }
}

impl LedgerGateway for JsonRpcLedgerGateway {
    fn submit_purchase(&self, token_id: TokenId, value: Wei) -> LedgerFuture<'_, PendingSettlement> {
        Box::pin(async move {
            let result: SubmissionResult = self
                .call(
                    "market_submitPurchase",
                    (token_id.as_i64(), value.as_u128().to_string()),
                )
                .await?;
            tracing::debug!(
                token_id = %token_id,
                value = %value,
                submission_id = %result.submission_id,
                "purchase submitted"
            );
            Ok(PendingSettlement {
                token_id,
                value,
                submission_id: result.submission_id,
            })
        })
    }

    fn await_confirmation(&self, pending: PendingSettlement) -> LedgerFuture<'_, TxReference> {
        Box::pin(async move {
            let started = Instant::now();
            loop {
                let receipt: Receipt = self
                    .call("market_getReceipt", (pending.submission_id.as_str(),))
                    .await?;
                match receipt.status {
                    ReceiptStatus::Confirmed => {
                        let tx_hash = receipt.tx_hash.ok_or_else(|| {
                            LedgerError::Transport("confirmed receipt without tx hash".into())
                        })?;
                        return Ok(TxReference::new(tx_hash));
                    }
                    ReceiptStatus::Rejected => {
                        return Err(LedgerError::Rejected {
                            reason: receipt
                                .reason
                                .unwrap_or_else(|| "rejected without reason".into()),
                        });
                    }
                    ReceiptStatus::Pending => {}
                }
                let waited = started.elapsed();
                if waited >= self.confirmation_timeout {
                    return Err(LedgerError::ConfirmationTimeout { waited });
                }
                sleep(self.poll_interval).await;
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn submit_request_wire_shape() {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 7,
            method: "market_submitPurchase",
            params: (42i64, "500000000000000000"),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["jsonrpc"], "2.0");
        assert_eq!(json["method"], "market_submitPurchase");
        assert_eq!(json["params"][0], 42);
        assert_eq!(json["params"][1], "500000000000000000");
    }

    #[test]
    fn receipt_statuses_parse() {
        let receipt: Receipt = serde_json::from_value(serde_json::json!({
            "status": "confirmed",
            "txHash": "0xfeed",
        }))
        .unwrap();
        assert_eq!(receipt.status, ReceiptStatus::Confirmed);
        assert_eq!(receipt.tx_hash.as_deref(), Some("0xfeed"));

        let rejected: Receipt = serde_json::from_value(serde_json::json!({
            "status": "rejected",
            "reason": "insufficient funds",
        }))
        .unwrap();
        assert_eq!(rejected.status, ReceiptStatus::Rejected);
    }
}
