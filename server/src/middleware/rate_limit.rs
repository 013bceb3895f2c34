use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    web,
};
use dashmap::DashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::RateLimitSettings;
use crate::error::AudioCallError;

#[derive(Clone)]
pub struct RateLimiter {
    requests: Arc<DashMap<IpAddr, Vec<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            requests: Arc::new(DashMap::new()),
            max_requests,
            window,
        }
    }

    pub fn from_settings(settings: &RateLimitSettings) -> Self {
        Self::new(settings.max_requests, settings.window())
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn check_rate_limit(&self, ip: IpAddr) -> bool {
        let now = Instant::now();

        let mut entry = self.requests.entry(ip).or_default();

        // Remove old entries
        entry.retain(|&timestamp| now.duration_since(timestamp) < self.window);

        if entry.len() >= self.max_requests {
            return false;
        }

        entry.push(now);
        true
    }

    pub fn cleanup_old_entries(&self) -> usize {
        let now = Instant::now();
        let before = self.requests.len();

        self.requests.retain(|_, timestamps| {
            timestamps.retain(|&timestamp| now.duration_since(timestamp) < self.window);
            !timestamps.is_empty()
        });

        before.saturating_sub(self.requests.len())
    }

    pub fn tracked_clients(&self) -> usize {
        self.requests.len()
    }
}

/// Passes requests through untouched unless a `RateLimiter` is registered as app data.
pub async fn rate_limit_middleware(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    if let Some(rate_limiter) = req.app_data::<web::Data<RateLimiter>>() {
        let ip = req
            .peer_addr()
            .map(|addr| addr.ip())
            .ok_or(AudioCallError::RateLimitExceeded)?;

        if !rate_limiter.check_rate_limit(ip) {
            log::warn!("Rate limit exceeded for IP: {}", ip);
            return Err(AudioCallError::RateLimitExceeded.into());
        }
    }

    next.call(req).await
}
