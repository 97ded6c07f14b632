//! Token prices
//!
//! The pricing service is asked first. When it is unreachable or has no
//! pair for the token, the native-asset order book gives a mid price in
//! native units.

use ledger_adapter::{ExternalService, LedgerClient, LedgerError, ServiceRateLimiter};
use ledger_config::protocol::VALIDATED_LEDGER;
use ledger_config::PricingSettings;
use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;
use types::TokenKey;

use crate::error::{QueryError, Result};

/// Drops per native unit
const DROPS_PER_UNIT: u64 = 1_000_000;

/// Offers read from each side of the book
const BOOK_DEPTH: u32 = 10;

/// Price data for one token
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceQuote {
    pub price_usd: Option<f64>,
    pub price_native: Option<f64>,
    pub change_24h: Option<f64>,
    pub volume_24h_native: Option<f64>,
    pub sparkline: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    #[serde(default)]
    pairs: Vec<PairStats>,
}

#[derive(Debug, Deserialize)]
struct PairStats {
    price: Option<f64>,
    #[serde(default)]
    price_xrp: Option<f64>,
    change_24h_percent: Option<f64>,
    volume_24h_xrp: Option<f64>,
    #[serde(default)]
    sparkline_24h: Option<Vec<f64>>,
    #[serde(default)]
    history: Option<Vec<HistoryPoint>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HistoryPoint {
    Price(f64),
    Point { price: f64 },
}

impl HistoryPoint {
    fn price(&self) -> f64 {
        match self {
            HistoryPoint::Price(price) | HistoryPoint::Point { price } => *price,
        }
    }
}

/// Client for the external pricing service
pub struct PricingClient {
    client: Client,
    base_url: String,
    timeout_ms: u64,
    rate_limiter: ServiceRateLimiter,
}

impl PricingClient {
    pub fn new(settings: &PricingSettings) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(settings.request_timeout_ms.max(1)))
            .build()?;
        Ok(Self {
            client,
            base_url: settings.service_url.trim_end_matches('/').to_string(),
            timeout_ms: settings.request_timeout_ms,
            rate_limiter: ServiceRateLimiter::new()
                .with_service(ExternalService::Pricing, settings.requests_per_second),
        })
    }

    /// `GET /token/{issuer}/{currency}/stats`
    pub async fn token_stats(&self, token: &TokenKey) -> Result<PriceQuote> {
        let url = format!(
            "{}/token/{}/{}/stats",
            self.base_url, token.issuer, token.currency
        );
        self.rate_limiter.wait(ExternalService::Pricing).await;

        let failure = |reason: String| QueryError::Pricing {
            url: url.clone(),
            reason,
        };

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                failure(format!("timed out after {}ms", self.timeout_ms))
            } else {
                failure(e.to_string())
            }
        })?;
        if !response.status().is_success() {
            return Err(failure(format!("status {}", response.status().as_u16())));
        }
        let stats: StatsResponse = response.json().await.map_err(|e| failure(e.to_string()))?;

        let pair = stats
            .pairs
            .into_iter()
            .next()
            .ok_or_else(|| failure("no trading pairs".to_string()))?;

        let sparkline = match (pair.sparkline_24h, pair.history) {
            (Some(points), _) if !points.is_empty() => points,
            (_, Some(history)) => history.iter().map(HistoryPoint::price).collect(),
            _ => Vec::new(),
        };

        Ok(PriceQuote {
            price_usd: pair.price,
            price_native: pair.price_xrp,
            change_24h: pair.change_24h_percent,
            volume_24h_native: pair.volume_24h_xrp,
            sparkline,
        })
    }

    /// Service quote, or the order-book mid price when the service fails
    pub async fn quote(&self, client: &LedgerClient, token: &TokenKey) -> Result<PriceQuote> {
        match self.token_stats(token).await {
            Ok(quote) => Ok(quote),
            Err(e) => {
                debug!("{}; falling back to order book", e);
                let price_native = book_mid_price(client, token).await?;
                Ok(PriceQuote {
                    price_native: Some(price_native),
                    ..PriceQuote::default()
                })
            }
        }
    }
}

fn issued(token: &TokenKey) -> Value {
    json!({ "currency": token.currency, "issuer": token.issuer })
}

fn native(client: &LedgerClient) -> Value {
    json!({ "currency": client.network().native_currency() })
}

/// Mid price of `token` in native units from the top of both books
pub async fn book_mid_price(client: &LedgerClient, token: &TokenKey) -> Result<f64> {
    // Asks: takers receive the token and pay native
    let asks = book_offers(client, issued(token), native(client)).await?;
    // Bids: takers receive native and pay the token
    let bids = book_offers(client, native(client), issued(token)).await?;

    let ask = asks
        .first()
        .and_then(|offer| native_per_token(offer.get("TakerPays")?, offer.get("TakerGets")?));
    let bid = bids
        .first()
        .and_then(|offer| native_per_token(offer.get("TakerGets")?, offer.get("TakerPays")?));

    let mid = match (ask, bid) {
        (Some(ask), Some(bid)) => mid_point(ask, bid),
        (Some(price), None) | (None, Some(price)) => Some(price),
        (None, None) => None,
    };
    let Some(mid) = mid else {
        return Err(QueryError::PriceUnavailable {
            currency: token.currency.clone(),
            issuer: token.issuer.clone(),
        });
    };

    mid.to_f64().ok_or_else(|| QueryError::PriceUnavailable {
        currency: token.currency.clone(),
        issuer: token.issuer.clone(),
    })
}

async fn book_offers(client: &LedgerClient, taker_gets: Value, taker_pays: Value) -> Result<Vec<Value>> {
    let result = client
        .queue()
        .request(
            "book_offers",
            json!({
                "taker_gets": taker_gets,
                "taker_pays": taker_pays,
                "limit": BOOK_DEPTH,
                "ledger_index": VALIDATED_LEDGER,
            }),
        )
        .await;

    match result {
        Ok(result) => Ok(result
            .get("offers")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default()),
        Err(LedgerError::NotFound(_)) => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

/// Native units per token given a drops amount and an issued amount
fn native_per_token(drops: &Value, issued: &Value) -> Option<Decimal> {
    let drops = Decimal::from_str(drops.as_str()?).ok()?;
    let tokens = Decimal::from_str(issued.get("value")?.as_str()?).ok()?;
    if tokens.is_zero() {
        return None;
    }
    drops
        .checked_div(Decimal::from(DROPS_PER_UNIT))?
        .checked_div(tokens)
}

/// Halfway between two prices; `None` if the sum leaves the decimal range
fn mid_point(ask: Decimal, bid: Decimal) -> Option<Decimal> {
    ask.checked_add(bid)?.checked_div(Decimal::TWO)
}
