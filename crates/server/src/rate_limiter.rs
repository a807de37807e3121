use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use configs::RateLimitConfig;
use dashmap::DashMap;
use tracing::{debug, warn};

use crate::errors::ApiError;

#[derive(Debug)]
pub struct TokenBucket {
    capacity: u64,
    tokens: u64,
    refill_rate: u64, // tokens per second
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(capacity: u64, refill_rate: u64, now: Instant) -> Self {
        Self { capacity, tokens: capacity, refill_rate, last_refill: now }
    }

    pub fn try_acquire(&mut self, now: Instant) -> bool {
        self.refill(now);
        if self.tokens >= 1 {
            self.tokens -= 1;
            true
        } else {
            false
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        let tokens_to_add = (elapsed.as_secs_f64() * self.refill_rate as f64) as u64;
        if tokens_to_add > 0 {
            self.tokens = (self.tokens + tokens_to_add).min(self.capacity);
            self.last_refill = now;
        }
    }

    fn is_full(&mut self, now: Instant) -> bool {
        self.refill(now);
        self.tokens >= self.capacity
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Auth,
    General,
}

impl Tier {
    /// `None` for paths that are not limited.
    pub fn for_path(path: &str) -> Option<Self> {
        if path.starts_with("/api/auth") {
            Some(Tier::Auth)
        } else if path.starts_with("/api/") {
            Some(Tier::General)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Limits {
    per_second: u64,
    burst: u64,
}

/// Token bucket per `(tier, caller ip)`.
pub struct RateLimiter {
    buckets: DashMap<(Tier, IpAddr), TokenBucket>,
    general: Limits,
    auth: Limits,
    enabled: bool,
}

impl RateLimiter {
    pub fn from_config(cfg: &RateLimitConfig) -> Self {
        Self {
            buckets: DashMap::new(),
            general: Limits { per_second: cfg.general_per_second, burst: cfg.general_burst },
            auth: Limits { per_second: cfg.auth_per_second, burst: cfg.auth_burst },
            enabled: cfg.enabled,
        }
    }

    pub fn check(&self, tier: Tier, ip: IpAddr) -> bool {
        self.check_at(tier, ip, Instant::now())
    }

    pub fn check_at(&self, tier: Tier, ip: IpAddr, now: Instant) -> bool {
        if !self.enabled {
            return true;
        }
        let limits = match tier {
            Tier::Auth => self.auth,
            Tier::General => self.general,
        };
        let allowed = self
            .buckets
            .entry((tier, ip))
            .or_insert_with(|| TokenBucket::new(limits.burst, limits.per_second, now))
            .try_acquire(now);
        if !allowed {
            warn!(%ip, ?tier, "rate limit exceeded");
        }
        allowed
    }

    /// Forget callers whose bucket has refilled completely; they are
    /// indistinguishable from new ones.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let before = self.buckets.len();
        self.buckets.retain(|_, b| !b.is_full(now));
        before.saturating_sub(self.buckets.len())
    }

    pub fn tracked(&self) -> usize {
        self.buckets.len()
    }
}

pub fn spawn_sweeper(limiter: Arc<RateLimiter>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(every);
        tick.tick().await;
        loop {
            tick.tick().await;
            let removed = limiter.sweep();
            if removed > 0 {
                debug!(removed, tracked = limiter.tracked(), "rate limiter swept");
            }
        }
    })
}

/// Caller address as reported by the edge proxy.
pub fn client_ip(headers: &HeaderMap) -> IpAddr {
    let from_header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse::<IpAddr>().ok())
    };
    from_header("cf-connecting-ip")
        .or_else(|| from_header("x-forwarded-for"))
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

pub async fn rate_limit(State(limiter): State<Arc<RateLimiter>>, req: Request, next: Next) -> Response {
    if let Some(tier) = Tier::for_path(req.uri().path()) {
        if !limiter.check(tier, client_ip(req.headers())) {
            return ApiError::too_many_requests().into_response();
        }
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn limiter(enabled: bool) -> RateLimiter {
        RateLimiter::from_config(&RateLimitConfig {
            enabled,
            general_per_second: 10,
            general_burst: 3,
            auth_per_second: 1,
            auth_burst: 2,
        })
    }

    #[test]
    fn test_token_bucket_basic() {
        let now = Instant::now();
        let mut bucket = TokenBucket::new(2, 1, now);
        assert!(bucket.try_acquire(now));
        assert!(bucket.try_acquire(now));
        assert!(!bucket.try_acquire(now));
    }

    #[test]
    fn test_token_bucket_refill() {
        let now = Instant::now();
        let mut bucket = TokenBucket::new(2, 1, now);
        assert!(bucket.try_acquire(now));
        assert!(bucket.try_acquire(now));
        assert!(!bucket.try_acquire(now + Duration::from_millis(500)));
        assert!(bucket.try_acquire(now + Duration::from_millis(1100)));
    }

    #[test]
    fn tiers_and_ips_are_separate() {
        let rl = limiter(true);
        let now = Instant::now();
        let a: IpAddr = "10.0.0.1".parse().unwrap();
        let b: IpAddr = "10.0.0.2".parse().unwrap();

        assert!(rl.check_at(Tier::Auth, a, now));
        assert!(rl.check_at(Tier::Auth, a, now));
        assert!(!rl.check_at(Tier::Auth, a, now));

        assert!(rl.check_at(Tier::Auth, b, now));
        assert!(rl.check_at(Tier::General, a, now));
    }

    #[test]
    fn test_rate_limiter_disabled() {
        let rl = limiter(false);
        let ip: IpAddr = "10.0.0.1".parse().unwrap();
        for _ in 0..100 {
            assert!(rl.check(Tier::Auth, ip));
        }
        assert_eq!(rl.tracked(), 0);
    }

    #[test]
    fn path_tiers() {
        assert_eq!(Tier::for_path("/api/auth"), Some(Tier::Auth));
        assert_eq!(Tier::for_path("/api/auth/logout"), Some(Tier::Auth));
        assert_eq!(Tier::for_path("/api/shops/1/increment"), Some(Tier::General));
        assert_eq!(Tier::for_path("/health"), None);
    }

    #[test]
    fn client_ip_prefers_edge_headers() {
        let mut h = HeaderMap::new();
        assert_eq!(client_ip(&h), IpAddr::V4(Ipv4Addr::LOCALHOST));

        h.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9, 10.0.0.1"));
        assert_eq!(client_ip(&h), "203.0.113.9".parse::<IpAddr>().unwrap());

        h.insert("cf-connecting-ip", HeaderValue::from_static("198.51.100.7"));
        assert_eq!(client_ip(&h), "198.51.100.7".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn sweep_forgets_idle_callers() {
        let rl = limiter(true);
        let ip: IpAddr = "10.0.0.1".parse().unwrap();
        let now = Instant::now();
        assert!(rl.check_at(Tier::General, ip, now));
        assert_eq!(rl.tracked(), 1);
        assert_eq!(rl.sweep_at(now), 0);
        assert_eq!(rl.sweep_at(now + Duration::from_secs(10)), 1);
        assert_eq!(rl.tracked(), 0);
    }
}
