//! Session token issuance and verification.
//!
//! Tokens are HS256-signed JWTs containing a [`Claims`] payload. Only HS256
//! is accepted on verify, so a token declaring any other algorithm (including
//! `none` or an asymmetric one) is rejected before its signature is looked at.
//!
//! Expiry is checked here against the injected [`Clock`] rather than by
//! `jsonwebtoken`, with no leeway: a token is valid while `now < exp`.

use std::fmt;
use std::sync::Arc;

use chrono::TimeDelta;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use talent_core::clock::Clock;
use talent_core::types::{DbId, Timestamp};
use uuid::Uuid;

/// The only signing algorithm issued or accepted.
pub const TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

/// Default token lifetime in minutes (24 hours).
pub const DEFAULT_EXPIRY_MINS: i64 = 24 * 60;
/// Longest accepted token lifetime in minutes (one year).
pub const MAX_EXPIRY_MINS: i64 = 365 * 24 * 60;
/// Default `iss` claim.
pub const DEFAULT_ISSUER: &str = "talent-platform";
/// Default `aud` claim.
pub const DEFAULT_AUDIENCE: &str = "talent-platform-users";

/// JWT claims embedded in every session token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject -- the user's internal database id.
    pub sub: DbId,
    /// The user's email at issuance, informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Unique token identifier (UUID v4), the key for revocation.
    pub jti: String,
    pub iss: String,
    pub aud: String,
}

/// Configuration for token generation and validation.
#[derive(Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret used to sign and verify tokens.
    pub secret: String,
    /// Token lifetime in minutes. Zero issues already-expired tokens.
    pub expiry_mins: i64,
    pub issuer: String,
    pub audience: String,
}

impl JwtConfig {
    /// Config with default lifetime, issuer and audience.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expiry_mins: DEFAULT_EXPIRY_MINS,
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
        }
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("expiry_mins", &self.expiry_mins)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish()
    }
}

/// A freshly signed token and when it stops being valid.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

impl IssuedToken {
    pub fn expires_at(&self) -> Timestamp {
        Timestamp::from_timestamp(self.claims.exp, 0).unwrap_or_default()
    }

    /// Seconds between issuance and expiry.
    pub fn expires_in(&self) -> i64 {
        self.claims.exp - self.claims.iat
    }
}

/// A token could not be signed.
#[derive(Debug, thiserror::Error)]
pub enum IssueError {
    /// Issuance time plus lifetime does not fit in a timestamp.
    #[error("Token expiry is out of range")]
    ExpiryOutOfRange,

    #[error("Token encoding failed: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),
}

/// The token failed verification. Deliberately carries no reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Invalid or expired token")]
pub struct InvalidToken;

/// Issues and verifies signed, expiring session tokens.
///
/// Holds the signing keys derived once from the configured secret; cheap to
/// share behind `Arc`.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: TimeDelta,
    issuer: String,
    audience: String,
    clock: Arc<dyn Clock>,
}

impl TokenService {
    pub fn new(config: &JwtConfig, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(TOKEN_ALGORITHM);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.set_issuer(&[&config.issuer]);
        validation.set_audience(&[&config.audience]);

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            // Out-of-range lifetimes surface as `ExpiryOutOfRange` on issue.
            ttl: TimeDelta::try_minutes(config.expiry_mins).unwrap_or(TimeDelta::MAX),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            clock,
        }
    }

    /// Sign a token for `subject`, valid from now until now + TTL.
    pub fn issue(
        &self,
        subject: DbId,
        email: Option<&str>,
    ) -> Result<IssuedToken, IssueError> {
        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or(IssueError::ExpiryOutOfRange)?;
        let claims = Claims {
            sub: subject,
            email: email.map(str::to_string),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };

        let token = encode(&Header::new(TOKEN_ALGORITHM), &claims, &self.encoding_key)?;
        Ok(IssuedToken { token, claims })
    }

    /// Validate and decode a token, returning the embedded [`Claims`].
    ///
    /// Checks structure, declared algorithm, signature, issuer, audience and
    /// expiry. Every failure collapses into [`InvalidToken`].
    pub fn verify(&self, token: &str) -> Result<Claims, InvalidToken> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| {
                tracing::debug!(reason = %describe(e.kind()), "Token rejected");
                InvalidToken
            })?
            .claims;

        if self.clock.now().timestamp() >= claims.exp {
            tracing::debug!(reason = "expired", "Token rejected");
            return Err(InvalidToken);
        }
        Ok(claims)
    }
}

/// Short, secret-free label for a decode failure, for debug logs only.
fn describe(kind: &ErrorKind) -> &'static str {
    match kind {
        ErrorKind::InvalidSignature => "signature",
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => "algorithm",
        ErrorKind::InvalidIssuer => "issuer",
        ErrorKind::InvalidAudience => "audience",
        ErrorKind::MissingRequiredClaim(_) => "missing claim",
        _ => "malformed",
    }
}
