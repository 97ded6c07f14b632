//! Request and response envelopes for the public query functions
//!
//! Every public call returns `{success, data?, error?}`; errors never cross
//! this boundary as panics or raw error types.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::amount::Offer;
use crate::nft::NormalizedNft;
use crate::token::NormalizedToken;

/// Machine-readable failure surfaced to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Stable code, e.g. `CONNECTION_FAILED`
    pub code: String,
    /// Human-readable detail, upstream message preserved
    pub message: String,
}

/// Uniform response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl<T> ApiResponse<T> {
    /// Successful response
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Failed response
    pub fn err(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

/// Token listing; the list is shared with the cache
pub type TokenResponse = ApiResponse<Arc<Vec<NormalizedToken>>>;

/// NFT listing; the list is shared with the cache
pub type NftResponse = ApiResponse<Arc<Vec<NormalizedNft>>>;

/// Which side of an NFT offer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferSide {
    Sell,
    Buy,
}

/// Offers for one NFT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffersRequest {
    pub network: String,
    pub nft_id: String,
    /// Keep offers whose expiration has passed
    #[serde(default)]
    pub include_expired: bool,
}

/// Sell and buy offers for one NFT
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftOffers {
    pub nft_id: String,
    pub sell_offers: Vec<Offer>,
    pub buy_offers: Vec<Offer>,
}

pub type OffersResponse = ApiResponse<NftOffers>;

/// Accept an existing NFT offer with the caller's wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptOfferRequest {
    pub network: String,
    /// Account accepting the offer
    pub account: String,
    /// Ledger index of the offer
    pub offer_id: String,
    pub side: OfferSide,
}

/// Outcome of a validated acceptance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptResult {
    pub hash: String,
    pub engine_result: String,
    pub validated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_index: Option<u64>,
}

pub type AcceptResponse = ApiResponse<AcceptResult>;
