//! Rate limiting for outbound HTTP services
//!
//! Ledger RPC traffic is paced by the per-network request queue; the
//! metadata, CDN and pricing HTTP services get their own governor quotas.

use governor::{DefaultDirectRateLimiter, Quota};
use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroU32;
use std::sync::Arc;

/// External HTTP collaborators with their own quotas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExternalService {
    Metadata,
    Cdn,
    Gateway,
    Pricing,
}

impl fmt::Display for ExternalService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExternalService::Metadata => "metadata",
            ExternalService::Cdn => "cdn",
            ExternalService::Gateway => "gateway",
            ExternalService::Pricing => "pricing",
        };
        f.write_str(name)
    }
}

/// Rate limiter for external service requests
#[derive(Clone, Default)]
pub struct ServiceRateLimiter {
    limiters: HashMap<ExternalService, Arc<DefaultDirectRateLimiter>>,
}

impl ServiceRateLimiter {
    /// Create a limiter with no quotas configured
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure rate limit for a service
    pub fn configure_service(&mut self, service: ExternalService, requests_per_second: u32) {
        if let Ok(rate) = NonZeroU32::try_from(requests_per_second) {
            let quota = Quota::per_second(rate);
            let limiter = Arc::new(DefaultDirectRateLimiter::direct(quota));
            self.limiters.insert(service, limiter);
        } else {
            tracing::warn!(
                "Invalid rate limit for service {}: {}",
                service,
                requests_per_second
            );
        }
    }

    /// Builder-style variant of [`configure_service`](Self::configure_service)
    pub fn with_service(mut self, service: ExternalService, requests_per_second: u32) -> Self {
        self.configure_service(service, requests_per_second);
        self
    }

    /// Check if request is allowed (non-blocking)
    pub fn check(&self, service: ExternalService) -> bool {
        self.limiters
            .get(&service)
            .map(|limiter| limiter.check().is_ok())
            .unwrap_or(true) // Allow if no limiter configured
    }

    /// Wait until request is allowed
    pub async fn wait(&self, service: ExternalService) {
        if let Some(limiter) = self.limiters.get(&service) {
            limiter.until_ready().await;
        }
    }

    pub fn is_limited(&self, service: ExternalService) -> bool {
        self.limiters.contains_key(&service)
    }
}
