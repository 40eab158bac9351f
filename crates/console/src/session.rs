//! Console sessions.
//!
//! A session is an HS256 token that carries the storage credentials of the
//! caller. The secret half of the credentials is sealed with
//! ChaCha20-Poly1305 under a key derived from the session secret, so the
//! token payload only shows the access key. Handlers never look inside it;
//! they receive a [`Principal`] and hand it to the client provider.

use std::fmt;

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::response::{IntoResponse, Response};
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use chrono::{Duration, Utc};
use http::header::AUTHORIZATION;
use http::request::Parts;
use http::StatusCode;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use storage::Credentials;

use crate::http_server::api::error::error_response;

const BEARER_PREFIX: &str = "Bearer ";
// ten years
const MAX_LIFETIME_HOURS: u64 = 24 * 365 * 10;
/// Size of a ChaCha20-Poly1305 nonce in bytes
const NONCE_SIZE: usize = 12;
// keeps the sealing key apart from the HMAC signing key
const SEALING_KEY_CONTEXT: &[u8] = b"console session credentials v1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Access key
    pub sub: String,
    /// Hex of `nonce || ciphertext` of the sealed secret credentials
    pub creds: String,
    pub exp: i64,
}

/// The part of the credentials that never appears in clear text.
#[derive(Serialize, Deserialize)]
struct SealedCredentials {
    secret_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    session_token: Option<String>,
}

/// The authenticated caller.
#[derive(Clone, PartialEq, Eq)]
pub struct Principal {
    credentials: Credentials,
}

impl Principal {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn access_key(&self) -> &str {
        &self.credentials.access_key
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("access_key", &self.credentials.access_key)
            .finish()
    }
}

/// Issues and validates session tokens.
#[derive(Clone)]
pub struct SessionManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    cipher: ChaCha20Poly1305,
    lifetime: Duration,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

impl SessionManager {
    pub fn new(secret: &str, lifetime_hours: u64) -> Self {
        let hours = lifetime_hours.min(MAX_LIFETIME_HOURS) as i64;

        let mut hasher = Sha256::new();
        hasher.update(SEALING_KEY_CONTEXT);
        hasher.update(secret.as_bytes());
        let sealing_key = hasher.finalize();

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            cipher: ChaCha20Poly1305::new(Key::from_slice(&sealing_key)),
            lifetime: Duration::hours(hours),
        }
    }

    /// Mint a token for `credentials`.
    pub fn issue(&self, credentials: &Credentials) -> Result<String, SessionError> {
        let sealed = SealedCredentials {
            secret_key: credentials.secret_key.clone(),
            session_token: credentials.session_token.clone(),
        };
        let plaintext =
            serde_json::to_vec(&sealed).map_err(|e| SessionError::Issue(e.to_string()))?;

        let claims = SessionClaims {
            sub: credentials.access_key.clone(),
            creds: self.seal(&credentials.access_key, &plaintext)?,
            exp: (Utc::now() + self.lifetime).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| SessionError::Issue(e.to_string()))
    }

    pub fn validate(&self, token: &str) -> Result<Principal, SessionError> {
        let claims = decode::<SessionClaims>(token, &self.decoding_key, &Validation::default())
            .map_err(|_| SessionError::InvalidToken)?
            .claims;

        let plaintext = self.open(&claims.sub, &claims.creds)?;
        let sealed: SealedCredentials =
            serde_json::from_slice(&plaintext).map_err(|_| SessionError::InvalidToken)?;

        let mut credentials = Credentials::new(claims.sub, sealed.secret_key);
        credentials.session_token = sealed.session_token;
        Ok(Principal::new(credentials))
    }

    // the access key is bound in as associated data
    fn seal(&self, access_key: &str, plaintext: &[u8]) -> Result<String, SessionError> {
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(
                &nonce,
                Payload {
                    msg: plaintext,
                    aad: access_key.as_bytes(),
                },
            )
            .map_err(|_| SessionError::Issue("failed to seal credentials".to_string()))?;

        let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(hex::encode(out))
    }

    fn open(&self, access_key: &str, sealed: &str) -> Result<Vec<u8>, SessionError> {
        let data = hex::decode(sealed).map_err(|_| SessionError::InvalidToken)?;
        if data.len() < NONCE_SIZE {
            return Err(SessionError::InvalidToken);
        }

        let (nonce, ciphertext) = data.split_at(NONCE_SIZE);
        self.cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: access_key.as_bytes(),
                },
            )
            .map_err(|_| SessionError::InvalidToken)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    SessionManager: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = SessionError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(SessionError::MissingToken)?;
        let token = header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(SessionError::InvalidToken)?;

        SessionManager::from_ref(state).validate(token)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("missing session token")]
    MissingToken,
    #[error("invalid or expired session token")]
    InvalidToken,
    #[error("failed to issue session token: {0}")]
    Issue(String),
}

impl IntoResponse for SessionError {
    fn into_response(self) -> Response {
        match self {
            SessionError::MissingToken | SessionError::InvalidToken => {
                tracing::warn!("rejected request: {}", self);
                error_response(StatusCode::UNAUTHORIZED, self.to_string())
            }
            SessionError::Issue(_) => {
                tracing::error!("{}", self);
                error_response(StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_secret_key_at_least_32_bytes";

    #[test]
    fn test_issue_and_validate() {
        let manager = SessionManager::new(SECRET, 1);
        let creds = Credentials::new("console", "console123").with_session_token("sts");

        let token = manager.issue(&creds).unwrap();
        let principal = manager.validate(&token).unwrap();

        assert_eq!(principal.credentials(), &creds);
        assert_eq!(principal.access_key(), "console");
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let issuer = SessionManager::new(SECRET, 1);
        let other = SessionManager::new("another_secret_key_at_least_32_b", 1);

        let token = issuer.issue(&Credentials::new("a", "b")).unwrap();
        assert!(matches!(
            other.validate(&token),
            Err(SessionError::InvalidToken)
        ));
    }

    fn claims_of(token: &str) -> SessionClaims {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        decode::<SessionClaims>(token, &DecodingKey::from_secret(b"unrelated"), &validation)
            .unwrap()
            .claims
    }

    fn sign(claims: &SessionClaims) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let manager = SessionManager::new(SECRET, 1);
        let token = manager.issue(&Credentials::new("a", "b")).unwrap();

        let mut claims = claims_of(&token);
        claims.exp = (Utc::now() - Duration::hours(2)).timestamp();

        assert!(matches!(
            manager.validate(&sign(&claims)),
            Err(SessionError::InvalidToken)
        ));
    }

    #[test]
    fn test_payload_does_not_reveal_secrets() {
        let manager = SessionManager::new(SECRET, 1);
        let creds =
            Credentials::new("AKIA", "LONG-LIVED-SECRET-KEY").with_session_token("STS-TOKEN");
        let token = manager.issue(&creds).unwrap();

        // anyone can read the payload without the signing key
        let claims = claims_of(&token);
        let payload = serde_json::to_string(&claims).unwrap();
        assert_eq!(claims.sub, "AKIA");
        assert!(!payload.contains("LONG-LIVED-SECRET-KEY"));
        assert!(!payload.contains("STS-TOKEN"));
        assert!(!token.contains("LONG-LIVED-SECRET-KEY"));

        assert_eq!(manager.validate(&token).unwrap().credentials(), &creds);
    }

    #[test]
    fn test_sealed_credentials_are_bound_to_access_key() {
        let manager = SessionManager::new(SECRET, 1);
        let token = manager.issue(&Credentials::new("alice", "b")).unwrap();

        // re-signed with the right key but claiming another access key
        let mut claims = claims_of(&token);
        claims.sub = "mallory".to_string();
        assert!(matches!(
            manager.validate(&sign(&claims)),
            Err(SessionError::InvalidToken)
        ));

        let mut claims = claims_of(&token);
        claims.creds = "00".repeat(NONCE_SIZE + 4);
        assert!(matches!(
            manager.validate(&sign(&claims)),
            Err(SessionError::InvalidToken)
        ));
    }

    #[test]
    fn test_debug_hides_secret_key() {
        let principal = Principal::new(Credentials::new("visible", "hidden"));
        let out = format!("{:?}", principal);
        assert!(out.contains("visible"));
        assert!(!out.contains("hidden"));
    }

    #[tokio::test]
    async fn test_extractor() {
        let manager = SessionManager::new(SECRET, 1);
        let token = manager.issue(&Credentials::new("a", "b")).unwrap();

        let request = http::Request::builder()
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();
        let principal = Principal::from_request_parts(&mut parts, &manager)
            .await
            .unwrap();
        assert_eq!(principal.access_key(), "a");

        let request = http::Request::builder().body(()).unwrap();
        let (mut parts, _) = request.into_parts();
        assert!(matches!(
            Principal::from_request_parts(&mut parts, &manager).await,
            Err(SessionError::MissingToken)
        ));

        let request = http::Request::builder()
            .header(AUTHORIZATION, "Basic abc")
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();
        assert!(matches!(
            Principal::from_request_parts(&mut parts, &manager).await,
            Err(SessionError::InvalidToken)
        ));
    }
}
