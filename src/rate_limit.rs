/// Rate limiting
///
/// Global per-class limiters applied as router middleware, plus a keyed
/// limiter for anonymous submissions so one visitor can't flood a single
/// space's inbox.
use crate::config::RateLimitSettings;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use governor::{
    clock::DefaultClock,
    state::keyed::DefaultKeyedStateStore,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorLimiter,
};
use std::{num::NonZeroU32, sync::Arc, time::Duration};

/// Rate limiter manager
#[derive(Clone)]
pub struct RateLimiter {
    enabled: bool,
    submission_period: Duration,
    authenticated: Arc<GovernorLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    unauthenticated: Arc<GovernorLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    submissions: Arc<GovernorLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>>,
}

impl RateLimiter {
    pub fn new(settings: &RateLimitSettings) -> Self {
        let auth_quota = Quota::per_second(
            NonZeroU32::new(settings.authenticated_rps).unwrap_or(NonZeroU32::new(100).unwrap()),
        )
        .allow_burst(NonZeroU32::new(50).unwrap());

        let unauth_quota = Quota::per_second(
            NonZeroU32::new(settings.unauthenticated_rps).unwrap_or(NonZeroU32::new(10).unwrap()),
        )
        .allow_burst(NonZeroU32::new(10).unwrap());

        // `burst` submissions refilling evenly over the window
        let burst =
            NonZeroU32::new(settings.submission_burst).unwrap_or(NonZeroU32::new(10).unwrap());
        let period = Duration::from_secs(
            (settings.submission_window_secs / u64::from(burst.get())).max(1),
        );
        let submission_quota = Quota::with_period(period)
            .unwrap_or_else(|| Quota::per_minute(NonZeroU32::new(1).unwrap()))
            .allow_burst(burst);

        Self {
            enabled: settings.enabled,
            submission_period: period,
            authenticated: Arc::new(GovernorLimiter::direct(auth_quota)),
            unauthenticated: Arc::new(GovernorLimiter::direct(unauth_quota)),
            submissions: Arc::new(GovernorLimiter::keyed(submission_quota)),
        }
    }

    pub fn check_authenticated(&self) -> ApiResult<()> {
        if !self.enabled {
            return Ok(());
        }
        match self.authenticated.check() {
            Ok(_) => Ok(()),
            Err(_) => Err(ApiError::RateLimitExceeded {
                retry_after: Duration::from_secs(1),
            }),
        }
    }

    pub fn check_unauthenticated(&self) -> ApiResult<()> {
        if !self.enabled {
            return Ok(());
        }
        match self.unauthenticated.check() {
            Ok(_) => Ok(()),
            Err(_) => Err(ApiError::RateLimitExceeded {
                retry_after: Duration::from_secs(1),
            }),
        }
    }

    /// Public submission limiter keyed by `(client IP, space id)`
    pub fn check_submission(&self, client_ip: &str, space_id: &str) -> ApiResult<()> {
        if !self.enabled {
            return Ok(());
        }
        let key = format!("{}-{}", client_ip, space_id);
        match self.submissions.check_key(&key) {
            Ok(_) => Ok(()),
            Err(_) => Err(ApiError::RateLimitExceeded {
                retry_after: self.submission_period,
            }),
        }
    }
}

/// Router-level rate limiting middleware
pub async fn rate_limit_middleware(
    State(ctx): State<crate::context::AppContext>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let has_auth_header = request.headers().get("authorization").is_some();

    let result = if has_auth_header {
        ctx.rate_limiter.check_authenticated()
    } else {
        ctx.rate_limiter.check_unauthenticated()
    };

    match result {
        Ok(_) => Ok(next.run(request).await),
        Err(_) => Err(StatusCode::TOO_MANY_REQUESTS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(burst: u32) -> RateLimitSettings {
        RateLimitSettings {
            enabled: true,
            submission_burst: burst,
            submission_window_secs: 900,
            authenticated_rps: 100,
            unauthenticated_rps: 10,
        }
    }

    #[test]
    fn test_limiter_allows_initial_requests() {
        let limiter = RateLimiter::new(&settings(10));
        assert!(limiter.check_authenticated().is_ok());
        assert!(limiter.check_unauthenticated().is_ok());
        assert!(limiter.check_submission("1.2.3.4", "space1").is_ok());
    }

    #[test]
    fn test_submission_burst_exhausts_per_key() {
        let limiter = RateLimiter::new(&settings(3));

        for _ in 0..3 {
            assert!(limiter.check_submission("1.2.3.4", "space1").is_ok());
        }
        assert!(limiter.check_submission("1.2.3.4", "space1").is_err());

        // A different space is a different key
        assert!(limiter.check_submission("1.2.3.4", "space2").is_ok());
        // As is a different client
        assert!(limiter.check_submission("5.6.7.8", "space1").is_ok());
    }

    #[test]
    fn test_disabled_limiter_always_passes() {
        let mut s = settings(1);
        s.enabled = false;
        let limiter = RateLimiter::new(&s);

        for _ in 0..100 {
            assert!(limiter.check_submission("1.2.3.4", "space1").is_ok());
        }
    }
}
