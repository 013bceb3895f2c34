use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(3600);

const TOKEN_ALGORITHM: &str = "HS256";
const TOKEN_TYPE: &str = "JWT";

#[derive(Debug, thiserror::Error)]
pub enum AccessTokenError {
    #[error("access token api key is empty")]
    EmptyApiKey,

    #[error("access token secret is empty")]
    EmptySecret,

    #[error("access token ttl must be at least one second")]
    InvalidTtl,

    #[error("failed to encode access token claims: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("invalid access token format")]
    InvalidFormat,

    #[error("unsupported access token algorithm '{0}'")]
    UnsupportedAlgorithm(String),

    #[error("access token signature is invalid")]
    InvalidSignature,

    #[error("failed to decode access token payload")]
    PayloadDecode,

    #[error("failed to parse access token payload")]
    PayloadParse,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct TokenHeader {
    alg: String,
    typ: String,
}

impl TokenHeader {
    fn hs256() -> Self {
        Self {
            alg: TOKEN_ALGORITHM.to_string(),
            typ: TOKEN_TYPE.to_string(),
        }
    }
}

/// Room permissions carried in the `video` claim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VideoGrant {
    pub room: String,
    pub room_join: bool,
    pub can_publish: bool,
    pub can_subscribe: bool,
}

impl VideoGrant {
    /// Join, publish and subscribe rights on `room`.
    pub fn full_access(room: impl Into<String>) -> Self {
        Self {
            room: room.into(),
            room_join: true,
            can_publish: true,
            can_subscribe: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessClaims {
    pub exp: i64,
    pub iss: String,
    pub sub: String,
    pub nbf: i64,
    pub video: VideoGrant,
}

impl AccessClaims {
    pub fn new(issuer: String, participant: String, room: String, now: i64, ttl: Duration) -> Self {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        Self {
            exp: now.saturating_add(ttl_secs),
            iss: issuer,
            sub: participant,
            nbf: now,
            video: VideoGrant::full_access(room),
        }
    }

    pub fn validity_secs(&self) -> i64 {
        self.exp.saturating_sub(self.nbf)
    }
}

/// Issues room access tokens signed with the LiveKit API secret.
#[derive(Clone)]
pub struct AccessTokenIssuer {
    api_key: Arc<str>,
    secret: Arc<[u8]>,
    ttl: Duration,
}

impl AccessTokenIssuer {
    pub fn new(api_key: String, secret: Vec<u8>, ttl: Duration) -> Result<Self, AccessTokenError> {
        if api_key.is_empty() {
            return Err(AccessTokenError::EmptyApiKey);
        }
        if secret.is_empty() {
            return Err(AccessTokenError::EmptySecret);
        }
        if ttl.as_secs() == 0 {
            return Err(AccessTokenError::InvalidTtl);
        }

        Ok(Self {
            api_key: Arc::from(api_key),
            secret: Arc::<[u8]>::from(secret),
            ttl,
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Signs a full-access grant for `participant` on `room`, valid from `now`
    /// (unix seconds) for the configured ttl.
    pub fn issue_token(
        &self,
        room: &str,
        participant: &str,
        now: i64,
    ) -> Result<String, AccessTokenError> {
        let claims = AccessClaims::new(
            self.api_key.to_string(),
            participant.to_string(),
            room.to_string(),
            now,
            self.ttl,
        );
        let token = self.issue(&claims)?;

        log::debug!(
            "Issued access token for participant '{}' in room '{}' (nbf={}, exp={})",
            claims.sub,
            claims.video.room,
            claims.nbf,
            claims.exp
        );

        Ok(token)
    }

    pub fn issue(&self, claims: &AccessClaims) -> Result<String, AccessTokenError> {
        let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&TokenHeader::hs256())?);
        let claims_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
        let signing_input = format!("{header_b64}.{claims_b64}");
        let signature_b64 = URL_SAFE_NO_PAD.encode(self.sign(signing_input.as_bytes())?);
        Ok(format!("{signing_input}.{signature_b64}"))
    }

    /// Checks the signature and returns the embedded claims.
    ///
    /// Validity window checks are left to the media server that consumes the
    /// token; `nbf` and `exp` are returned as-is.
    pub fn decode(&self, token: &str) -> Result<AccessClaims, AccessTokenError> {
        let (signing_input, signature_b64) = token
            .rsplit_once('.')
            .ok_or(AccessTokenError::InvalidFormat)?;
        let (header_b64, claims_b64) = signing_input
            .split_once('.')
            .ok_or(AccessTokenError::InvalidFormat)?;
        if claims_b64.contains('.') {
            return Err(AccessTokenError::InvalidFormat);
        }

        let header_bytes = URL_SAFE_NO_PAD
            .decode(header_b64)
            .map_err(|_| AccessTokenError::InvalidFormat)?;
        let header: TokenHeader =
            serde_json::from_slice(&header_bytes).map_err(|_| AccessTokenError::InvalidFormat)?;
        if header.alg != TOKEN_ALGORITHM {
            return Err(AccessTokenError::UnsupportedAlgorithm(header.alg));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| AccessTokenError::InvalidFormat)?;

        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| AccessTokenError::InvalidSignature)?;
        mac.update(signing_input.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AccessTokenError::InvalidSignature)?;

        let payload = URL_SAFE_NO_PAD
            .decode(claims_b64)
            .map_err(|_| AccessTokenError::PayloadDecode)?;

        serde_json::from_slice(&payload).map_err(|_| AccessTokenError::PayloadParse)
    }

    fn sign(&self, bytes: &[u8]) -> Result<Vec<u8>, AccessTokenError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| AccessTokenError::InvalidSignature)?;
        mac.update(bytes);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

impl std::fmt::Debug for AccessTokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTokenIssuer")
            .field("api_key", &self.api_key)
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Current unix time in seconds.
pub fn now_secs() -> i64 {
    chrono::Utc::now().timestamp()
}
