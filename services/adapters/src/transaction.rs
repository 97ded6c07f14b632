//! Offer acceptance and transaction monitoring
//!
//! Signing happens in the caller's wallet. This module builds the unsigned
//! request, submits the signed blob when the wallet did not, and polls the
//! node until the transaction is validated or the wait window elapses.

use ledger_config::protocol::TES_SUCCESS;
use ledger_config::TransactionSettings;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use types::{AcceptResult, OfferSide};

use crate::queue::RequestQueue;
use crate::wallet::WalletAdapter;
use crate::{LedgerError, Result};

/// Node response to `submit`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub hash: String,
    pub engine_result: String,
}

/// Polls and submits transactions for one network
#[derive(Clone)]
pub struct TransactionMonitor {
    queue: Arc<RequestQueue>,
    poll_interval: Duration,
    validation_timeout: Duration,
}

impl TransactionMonitor {
    pub fn new(queue: Arc<RequestQueue>, settings: &TransactionSettings) -> Self {
        Self {
            queue,
            poll_interval: Duration::from_millis(settings.poll_interval_ms.max(1)),
            validation_timeout: Duration::from_millis(settings.validation_timeout_ms),
        }
    }

    /// Build the unsigned `NFTokenAcceptOffer` request
    pub fn accept_offer_tx(account: &str, offer_id: &str, side: OfferSide) -> Value {
        let offer_field = match side {
            OfferSide::Sell => "NFTokenSellOffer",
            OfferSide::Buy => "NFTokenBuyOffer",
        };
        json!({
            "TransactionType": "NFTokenAcceptOffer",
            "Account": account,
            offer_field: offer_id,
        })
    }

    /// Accept an offer with the caller's wallet and wait for validation
    pub async fn accept_nft_offer(
        &self,
        wallet: &dyn WalletAdapter,
        account: &str,
        offer_id: &str,
        side: OfferSide,
    ) -> Result<AcceptResult> {
        if account.is_empty() {
            return Err(LedgerError::InvalidRequest("account is required".to_string()));
        }
        if offer_id.len() != 64 || !offer_id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(LedgerError::InvalidRequest(format!(
                "offer id must be 64 hex characters, got {:?}",
                offer_id
            )));
        }

        let tx = Self::accept_offer_tx(account, offer_id, side);
        tracing::info!("Requesting {} signature for offer {}", wallet.kind(), offer_id);
        let signed = wallet.sign_transaction(tx).await?;

        let hash = match (signed.tx_blob, signed.hash) {
            (Some(blob), _) => self.submit(&blob).await?.hash,
            (None, Some(hash)) => hash,
            (None, None) => {
                return Err(LedgerError::InvalidResponse(format!(
                    "{} returned neither a hash nor a signed blob",
                    wallet.kind()
                )))
            }
        };

        self.wait_for_validation(&hash, &CancellationToken::new()).await
    }

    /// Submit a signed blob; rejected engine results become `TransactionFailed`
    pub async fn submit(&self, tx_blob: &str) -> Result<SubmitOutcome> {
        let result = self
            .queue
            .request("submit", json!({ "tx_blob": tx_blob }))
            .await?;

        let engine_result = result
            .get("engine_result")
            .and_then(Value::as_str)
            .ok_or_else(|| LedgerError::InvalidResponse("submit result lacks engine_result".to_string()))?
            .to_string();

        // tes: applied, ter: queued for a later ledger
        if !(engine_result.starts_with("tes") || engine_result.starts_with("ter")) {
            let message = result
                .get("engine_result_message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            return Err(LedgerError::TransactionFailed {
                code: engine_result,
                message,
            });
        }

        let hash = result
            .pointer("/tx_json/hash")
            .and_then(Value::as_str)
            .ok_or_else(|| LedgerError::InvalidResponse("submit result lacks tx_json.hash".to_string()))?
            .to_string();

        tracing::info!("Submitted {} ({})", hash, engine_result);
        Ok(SubmitOutcome {
            hash,
            engine_result,
        })
    }

    /// Poll `tx` until validated, the window elapses or `cancel` fires
    pub async fn wait_for_validation(
        &self,
        hash: &str,
        cancel: &CancellationToken,
    ) -> Result<AcceptResult> {
        let started = Instant::now();
        let deadline = started + self.validation_timeout;
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Err(LedgerError::Cancelled),
                _ = ticker.tick() => {}
            }

            if Instant::now() >= deadline {
                return Err(LedgerError::ValidationTimeout {
                    hash: hash.to_string(),
                    waited_ms: started.elapsed().as_millis() as u64,
                });
            }

            match self.queue.request("tx", json!({ "transaction": hash })).await {
                Ok(result) if result.get("validated").and_then(Value::as_bool) == Some(true) => {
                    return validated_outcome(hash, &result);
                }
                Ok(_) => tracing::debug!("{} not validated yet", hash),
                Err(LedgerError::NotFound(_)) => tracing::debug!("{} not found yet", hash),
                Err(e) if e.is_recoverable() => {
                    tracing::warn!("Polling {} failed, will retry: {}", hash, e)
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn validated_outcome(hash: &str, result: &Value) -> Result<AcceptResult> {
    let engine_result = result
        .pointer("/meta/TransactionResult")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    if engine_result != TES_SUCCESS {
        return Err(LedgerError::TransactionFailed {
            code: engine_result,
            message: format!("transaction {} validated without success", hash),
        });
    }

    Ok(AcceptResult {
        hash: hash.to_string(),
        engine_result,
        validated: true,
        ledger_index: result.get("ledger_index").and_then(Value::as_u64),
    })
}
