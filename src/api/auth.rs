use crate::api::TokenExchange;
use crate::core::error::AuthError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Credential {
    value: String,
    expires_at: Instant,
}

impl Credential {
    fn is_usable(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

#[derive(Default)]
struct CacheState {
    credential: Option<Credential>,
    last_refresh: Option<Result<String, AuthError>>,
}

/// App access token cached until it expires.
///
/// Refreshes are single-flight: callers that queue up behind an in-flight
/// refresh receive that refresh's outcome instead of starting their own.
pub struct TokenCache {
    exchange: Arc<dyn TokenExchange>,
    state: Mutex<CacheState>,
    refreshes: AtomicU64,
}

impl TokenCache {
    pub fn new(exchange: Arc<dyn TokenExchange>) -> Self {
        Self {
            exchange,
            state: Mutex::new(CacheState::default()),
            refreshes: AtomicU64::new(0),
        }
    }

    pub async fn token(&self) -> Result<String, AuthError> {
        let seen = self.refreshes.load(Ordering::Acquire);
        let mut state = self.state.lock().await;

        if let Some(credential) = &state.credential {
            if credential.is_usable(Instant::now()) {
                return Ok(credential.value.clone());
            }
        }

        // A refresh finished while we were waiting for the lock.
        if self.refreshes.load(Ordering::Acquire) != seen {
            if let Some(outcome) = &state.last_refresh {
                return outcome.clone();
            }
        }

        let outcome = self.refresh(&mut state).await;
        state.last_refresh = Some(outcome.clone());
        self.refreshes.fetch_add(1, Ordering::Release);
        outcome
    }

    async fn refresh(&self, state: &mut CacheState) -> Result<String, AuthError> {
        tracing::info!("Requesting new Twitch token");
        let requested_at = Instant::now();

        let grant = match self.exchange.exchange().await {
            Ok(grant) => grant,
            Err(e) => {
                tracing::error!(error = %e, "Failed to get Twitch token");
                return Err(e);
            }
        };

        if grant.expires_in_secs == 0 {
            let err = AuthError::InvalidResponse("token expires immediately".to_string());
            tracing::error!(error = %err, "Failed to get Twitch token");
            return Err(err);
        }

        let ttl = Duration::from_secs(grant.expires_in_secs);
        state.credential = Some(Credential {
            value: grant.access_token.clone(),
            expires_at: requested_at + ttl,
        });
        tracing::info!(expires_in_secs = ttl.as_secs(), "Got new Twitch token");

        Ok(grant.access_token)
    }
}
