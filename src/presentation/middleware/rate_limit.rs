use axum::{extract::Request, middleware::Next, response::Response};
use dashmap::DashMap;
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::correlation::client_ip;
use super::error::rate_limited_response;
use crate::infrastructure::config::{RateLimitClassSettings, RateLimitSettings};

/// Guarded path classes, each with its own budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathClass {
    Login,
    Register,
    GeneralAuth,
}

impl PathClass {
    fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Register => "register",
            Self::GeneralAuth => "general_auth",
        }
    }
}

/// Outcome of a budget check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited { retry_after: Duration },
}

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

impl Bucket {
    fn full(capacity: u32) -> Self {
        Self { tokens: f64::from(capacity), last_refill: Instant::now() }
    }

    /// Continuous refill at `capacity / window` tokens per second.
    fn refill(&mut self, settings: RateLimitClassSettings, now: Instant) {
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        let rate = f64::from(settings.capacity) / settings.window().as_secs_f64();
        self.tokens = (self.tokens + elapsed * rate).min(f64::from(settings.capacity));
        self.last_refill = now;
    }
}

/// Per-client-IP token bucket limiter for sensitive endpoints.
///
/// Buckets live in a size-capped concurrent map keyed by (class, IP):
/// distinct IPs land on different shards and do not contend on a global
/// lock. When the map is at capacity, idle full buckets are swept; if none
/// can be reclaimed the request is allowed rather than blocking traffic —
/// the limiter fails open and never errors.
pub struct RateLimiter {
    login: RateLimitClassSettings,
    register: RateLimitClassSettings,
    general_auth: RateLimitClassSettings,
    buckets: DashMap<(PathClass, IpAddr), Bucket>,
    max_tracked: usize,
    rejections: AtomicU64,
    evictions: AtomicU64,
    fail_open_allowances: AtomicU64,
}

impl RateLimiter {
    pub fn new(settings: &RateLimitSettings) -> Self {
        Self {
            login: settings.login,
            register: settings.register,
            general_auth: settings.general_auth,
            buckets: DashMap::new(),
            max_tracked: settings.max_tracked_clients,
            rejections: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            fail_open_allowances: AtomicU64::new(0),
        }
    }

    fn class_settings(&self, class: PathClass) -> RateLimitClassSettings {
        match class {
            PathClass::Login => self.login,
            PathClass::Register => self.register,
            PathClass::GeneralAuth => self.general_auth,
        }
    }

    /// Try to consume one token from the caller's bucket.
    pub fn check(&self, class: PathClass, ip: IpAddr) -> RateLimitDecision {
        let settings = self.class_settings(class);
        let key = (class, ip);

        if !self.buckets.contains_key(&key) && self.buckets.len() >= self.max_tracked {
            let swept = self.sweep_idle(Instant::now());
            self.evictions.fetch_add(swept as u64, Ordering::Relaxed);

            if self.buckets.len() >= self.max_tracked {
                // Fail open: dropping all traffic because the map is full
                // would be worse than letting one unbudgeted request through.
                warn!(
                    class = class.as_str(),
                    max_tracked = self.max_tracked,
                    "Rate limit map at capacity, allowing request unbudgeted"
                );
                self.fail_open_allowances.fetch_add(1, Ordering::Relaxed);
                return RateLimitDecision::Allowed;
            }
        }

        let now = Instant::now();
        let mut bucket = self.buckets.entry(key).or_insert_with(|| Bucket::full(settings.capacity));
        bucket.refill(settings, now);

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            RateLimitDecision::Allowed
        } else {
            let rate = f64::from(settings.capacity) / settings.window().as_secs_f64();
            let retry_after = Duration::from_secs_f64(((1.0 - bucket.tokens) / rate).max(0.0));
            self.rejections.fetch_add(1, Ordering::Relaxed);
            RateLimitDecision::Limited { retry_after }
        }
    }

    /// Drop buckets that have refilled back to capacity; they carry no state
    /// a fresh bucket would not have. Returns the number removed.
    fn sweep_idle(&self, now: Instant) -> usize {
        let before = self.buckets.len();
        self.buckets.retain(|(class, _), bucket| {
            let settings = self.class_settings(*class);
            bucket.refill(settings, now);
            bucket.tokens < f64::from(settings.capacity)
        });
        before - self.buckets.len()
    }

    pub fn stats(&self) -> RateLimiterStats {
        RateLimiterStats {
            tracked_clients: self.buckets.len(),
            max_tracked_clients: self.max_tracked,
            rejections: self.rejections.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            fail_open_allowances: self.fail_open_allowances.load(Ordering::Relaxed),
        }
    }
}

/// Operational counters exposed on the admin surface.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RateLimiterStats {
    pub tracked_clients: usize,
    pub max_tracked_clients: usize,
    pub rejections: u64,
    pub evictions: u64,
    pub fail_open_allowances: u64,
}

/// Rate limiting middleware for one path class.
///
/// An unresolvable client IP is treated like internal limiter pressure: the
/// request is allowed with a warning rather than rejected.
pub fn rate_limit_middleware(
    limiter: Arc<RateLimiter>,
    class: PathClass,
    trust_proxy_headers: bool,
) -> impl Fn(Request, Next) -> std::pin::Pin<Box<dyn std::future::Future<Output = Response> + Send>>
       + Clone {
    move |request: Request, next: Next| {
        let limiter = limiter.clone();
        Box::pin(async move {
            let Some(ip) = client_ip(&request, trust_proxy_headers) else {
                warn!(
                    class = class.as_str(),
                    path = request.uri().path(),
                    "Client IP unresolvable, allowing request unbudgeted"
                );
                return next.run(request).await;
            };

            match limiter.check(class, ip) {
                RateLimitDecision::Allowed => {
                    debug!(class = class.as_str(), %ip, "Rate limit check passed");
                    next.run(request).await
                }
                RateLimitDecision::Limited { retry_after } => {
                    warn!(
                        class = class.as_str(),
                        %ip,
                        retry_after_secs = retry_after.as_secs(),
                        "Rate limit exceeded"
                    );
                    rate_limited_response(retry_after, request.uri().path())
                }
            }
        })
    }
}
