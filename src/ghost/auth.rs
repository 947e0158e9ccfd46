//! Admin key parsing and token minting.
//!
//! The backend authenticates each request with a short-lived JWT minted
//! from the long-lived admin key. A single cached token is shared by all
//! in-flight calls; the manager refreshes it before it runs out of the
//! safety margin and is the only component that ever touches the secret.

use std::fmt;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

use super::error::GhostError;
use super::API_VERSION;

/// Validity the backend grants to admin JWTs.
const TOKEN_TTL: Duration = Duration::from_secs(300);

/// Remaining validity below which the cached token is replaced. Longer than
/// the slowest expected backend call, so a token never expires mid-request.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

// ============================================================================
// Admin key
// ============================================================================

/// Parsed admin API key: `<id>:<secret>` with a hex-encoded secret.
#[derive(Clone)]
pub struct AdminKey {
    id: String,
    secret: Vec<u8>,
}

impl AdminKey {
    /// Parse the raw `id:secret` form. A key that fails here can never sign
    /// anything, which is why startup rejects it outright.
    pub fn parse(raw: &str) -> Result<Self, GhostError> {
        let (id, secret_hex) = raw.split_once(':').ok_or_else(|| {
            GhostError::Configuration("admin key must have the form 'id:secret'".to_string())
        })?;

        if id.is_empty() {
            return Err(GhostError::Configuration(
                "admin key id part is empty".to_string(),
            ));
        }

        let secret = hex::decode(secret_hex).map_err(|e| {
            GhostError::Configuration(format!("admin key secret is not valid hex: {}", e))
        })?;

        if secret.is_empty() {
            return Err(GhostError::Configuration(
                "admin key secret part is empty".to_string(),
            ));
        }

        Ok(Self {
            id: id.to_string(),
            secret,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Debug for AdminKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The secret must never end up in logs
        f.debug_struct("AdminKey")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Credential
// ============================================================================

/// A minted token plus its expiry. Cheap to clone; every in-flight backend
/// call holds its own copy.
#[derive(Debug, Clone)]
pub struct Credential {
    pub token: String,
    pub expires_at: Instant,
}

impl Credential {
    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

#[derive(Serialize)]
struct Claims {
    iat: u64,
    exp: u64,
    aud: String,
}

// ============================================================================
// Credential manager
// ============================================================================

/// Owns the cached credential. `get_valid_token` may be called from any
/// number of concurrent invocations; the mutex collapses simultaneous
/// refreshes into one mint and is only ever held across in-memory work.
pub struct CredentialManager {
    key: AdminKey,
    cached: Mutex<Option<Credential>>,
}

impl CredentialManager {
    pub fn new(key: AdminKey) -> Self {
        Self {
            key,
            cached: Mutex::new(None),
        }
    }

    /// Return a token with at least the safety margin of validity left,
    /// minting a fresh one if the cache is empty or close to expiry.
    pub async fn get_valid_token(&self) -> Result<Credential, GhostError> {
        let mut cached = self.cached.lock().await;

        if let Some(credential) = cached.as_ref() {
            if credential.remaining() > REFRESH_MARGIN {
                return Ok(credential.clone());
            }
        }

        let fresh = self.mint()?;
        debug!(kid = %self.key.id(), "minted fresh admin token");
        *cached = Some(fresh.clone());
        Ok(fresh)
    }

    /// Drop the cached credential so the next call mints a new one. Used
    /// after the backend rejects a token that looked valid locally.
    pub async fn invalidate(&self) {
        self.cached.lock().await.take();
    }

    fn mint(&self) -> Result<Credential, GhostError> {
        let iat = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| GhostError::Configuration("system clock is before unix epoch".to_string()))?
            .as_secs();

        let claims = Claims {
            iat,
            exp: iat + TOKEN_TTL.as_secs(),
            aud: format!("/{}/admin/", API_VERSION),
        };

        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(self.key.id.clone());

        let token = encode(&header, &claims, &EncodingKey::from_secret(&self.key.secret))
            .map_err(|e| GhostError::Configuration(format!("failed to sign admin token: {}", e)))?;

        Ok(Credential {
            token,
            expires_at: Instant::now() + TOKEN_TTL,
        })
    }
}
