//! Access token issuing and verification.

use std::fmt;
use std::str::FromStr;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::debug;

use crate::claims::Claims;
use crate::config::JwtConfig;
use crate::errors::{AuthError, Result};

const BEARER: &str = "Bearer ";

/// Signs and verifies HMAC tokens with one shared secret.
#[derive(Clone)]
pub struct JwtCodec {
    header: Header,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl: i64,
}

impl fmt::Debug for JwtCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtCodec")
            .field("algorithm", &self.header.alg)
            .field("access_ttl", &self.access_ttl)
            .finish_non_exhaustive()
    }
}

impl JwtCodec {
    /// # Errors
    /// `Config` for an empty secret or a non-HMAC algorithm.
    pub fn from_config(cfg: &JwtConfig) -> Result<Self> {
        if cfg.secret.is_empty() {
            return Err(AuthError::Config("jwt secret is empty".to_owned()));
        }
        let alg = Algorithm::from_str(&cfg.algorithm)
            .map_err(|_| AuthError::Config(format!("unknown algorithm '{}'", cfg.algorithm)))?;
        if !matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) {
            return Err(AuthError::Config(format!(
                "algorithm '{}' is not supported; use HS256, HS384 or HS512",
                cfg.algorithm
            )));
        }

        let secret = cfg.secret.expose().as_bytes();
        let mut validation = Validation::new(alg);
        validation.leeway = cfg.leeway.as_secs();
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            header: Header::new(alg),
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            access_ttl: i64::try_from(cfg.access_ttl.as_secs()).unwrap_or(i64::MAX),
        })
    }

    /// Issue an access token for user `id`, valid for the configured TTL.
    ///
    /// # Errors
    /// `Signing` if the token cannot be encoded.
    pub fn issue(&self, id: i64) -> Result<String> {
        let iat = basekit_utils::utc_now().timestamp();
        let claims = Claims {
            iat,
            exp: iat.saturating_add(self.access_ttl),
            sub: id.to_string(),
            id,
        };
        self.issue_claims(&claims)
    }

    /// Sign arbitrary claims as they are.
    ///
    /// # Errors
    /// `Signing` if the token cannot be encoded.
    pub fn issue_claims(&self, claims: &Claims) -> Result<String> {
        encode(&self.header, claims, &self.encoding).map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    /// `TokenExpired` when the signature is valid but `exp` has passed,
    /// `TokenInvalid` for every other failure.
    pub fn decode(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => {
                    debug!(error = %e, "token rejected");
                    AuthError::TokenInvalid(e.to_string())
                }
            })
    }

    /// Like [`decode`](Self::decode), but an absent token is `Ok(None)`.
    ///
    /// # Errors
    /// As `decode` when a token is present.
    pub fn decode_optional(&self, token: Option<&str>) -> Result<Option<Claims>> {
        token.map(|t| self.decode(t)).transpose()
    }

    /// Claims of a token that must be present.
    ///
    /// # Errors
    /// `Unauthenticated` when absent, otherwise as `decode`.
    pub fn require(&self, token: Option<&str>) -> Result<Claims> {
        self.decode(token.ok_or(AuthError::Unauthenticated)?)
    }
}

/// Token from an `Authorization: Bearer <token>` header value.
#[must_use]
pub fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix(BEARER)
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
