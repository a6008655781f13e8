//! Shared API state: request context, auth identity, rate limiting,
//! and bearer-token helpers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rusqlite::Connection;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::Config;
use crate::providers::Providers;

/// Shared state injected into every handler via `Extension`.
#[derive(Clone)]
pub struct ApiContext {
    pub config: Arc<Config>,
    pub db: Arc<Mutex<Connection>>,
    pub rate_limiter: Arc<Mutex<RateLimiter>>,
    pub providers: Providers,
}

impl ApiContext {
    pub fn new(config: Arc<Config>, db: Arc<Mutex<Connection>>, providers: Providers) -> Self {
        Self {
            config,
            db,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(
                crate::config::RATE_LIMIT_MAX_REQUESTS,
                Duration::from_secs(crate::config::RATE_LIMIT_WINDOW_SECS),
            ))),
            providers,
        }
    }
}

/// Authenticated clinician, injected by the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub email: String,
}

/// Fixed-window rate limiter keyed by an opaque client key.
///
/// Each key gets `max_requests` per window; the (max+1)th request in a
/// window is rejected with the seconds remaining until the window rolls
/// over. Expired windows reset the count in full.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: HashMap<String, WindowState>,
}

struct WindowState {
    started: Instant,
    count: u32,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: HashMap::new(),
        }
    }

    /// Record one request for `key`. `Err(retry_after_secs)` when the
    /// current window is exhausted.
    pub fn check(&mut self, key: &str) -> Result<(), u64> {
        let now = Instant::now();

        // Lazy cleanup keeps the map from accumulating dead keys.
        if self.windows.len() > 10_000 {
            let window = self.window;
            self.windows
                .retain(|_, state| now.duration_since(state.started) < window);
        }

        let state = self
            .windows
            .entry(key.to_string())
            .or_insert(WindowState { started: now, count: 0 });

        if now.duration_since(state.started) >= self.window {
            state.started = now;
            state.count = 0;
        }

        if state.count >= self.max_requests {
            let elapsed = now.duration_since(state.started);
            let remaining = self.window.saturating_sub(elapsed);
            return Err(remaining.as_secs().max(1));
        }

        state.count += 1;
        Ok(())
    }
}

/// Generate a fresh URL-safe bearer token (256 bits of randomness).
pub fn generate_token() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 hex digest of a token. Only hashes are stored.
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_allows_up_to_max() {
        let mut limiter = RateLimiter::new(3, Duration::from_secs(60));
        for _ in 0..3 {
            assert!(limiter.check("client-a").is_ok());
        }
        assert!(limiter.check("client-a").is_err());
    }

    #[test]
    fn limiter_keys_are_independent() {
        let mut limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.check("client-a").is_ok());
        assert!(limiter.check("client-b").is_ok());
        assert!(limiter.check("client-a").is_err());
    }

    #[test]
    fn window_expiry_resets_count() {
        let mut limiter = RateLimiter::new(1, Duration::from_millis(30));
        assert!(limiter.check("client-a").is_ok());
        assert!(limiter.check("client-a").is_err());

        std::thread::sleep(Duration::from_millis(40));
        assert!(limiter.check("client-a").is_ok());
    }

    #[test]
    fn retry_after_is_at_least_one_second() {
        let mut limiter = RateLimiter::new(1, Duration::from_secs(60));
        limiter.check("client-a").unwrap();
        let retry_after = limiter.check("client-a").unwrap_err();
        assert!(retry_after >= 1);
        assert!(retry_after <= 60);
    }

    #[test]
    fn tokens_are_unique_and_url_safe() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert!(a.len() >= 42);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn hash_is_stable_hex() {
        let h1 = hash_token("secret");
        let h2 = hash_token("secret");
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert_ne!(h1, hash_token("other"));
    }
}
