//! Signing and verification of access and refresh tokens

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::domain::entities::token::{
    AccessClaims, AccessToken, RefreshClaims, RefreshToken, TokenClaims, TokenId, TokenKind,
};
use crate::errors::{DomainError, TokenError};

use super::config::TokenCodecConfig;

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// Issues and verifies HS256 tokens
///
/// The key used for a claim set is chosen by its [`TokenClaims::KIND`], so
/// access claims are only ever checked against the access secret and
/// refresh claims against the refresh secret.
pub struct TokenCodec {
    config: TokenCodecConfig,
    access_keys: KeyPair,
    refresh_keys: KeyPair,
    validation: Validation,
}

impl TokenCodec {
    /// Creates a new codec
    ///
    /// # Arguments
    ///
    /// * `config` - Secrets, lifetimes, issuer and audience
    pub fn new(config: TokenCodecConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "iat", "iss", "aud", "sub"]);
        validation.validate_exp = true;
        validation.leeway = 0;

        Self {
            access_keys: KeyPair::from_secret(&config.access_secret),
            refresh_keys: KeyPair::from_secret(&config.refresh_secret),
            config,
            validation,
        }
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.config.refresh_ttl
    }

    /// Issues an access token for `user_id` carrying the display name
    pub fn issue_access(&self, user_id: Uuid, name: &str) -> Result<AccessToken, DomainError> {
        self.issue_access_at(user_id, name, Utc::now())
    }

    /// Issues an access token as if signed at `issued_at`
    pub fn issue_access_at(
        &self,
        user_id: Uuid,
        name: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<AccessToken, DomainError> {
        let claims = AccessClaims {
            sub: user_id,
            name: name.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.config.access_ttl).timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            typ: TokenKind::Access,
        };
        self.sign(&claims).map(AccessToken::new)
    }

    /// Issues a refresh token for `user_id` bound to ledger row `token_id`
    pub fn issue_refresh(&self, user_id: Uuid, token_id: &TokenId) -> Result<RefreshToken, DomainError> {
        self.issue_refresh_at(user_id, token_id, Utc::now())
    }

    /// Issues a refresh token as if signed at `issued_at`
    pub fn issue_refresh_at(
        &self,
        user_id: Uuid,
        token_id: &TokenId,
        issued_at: DateTime<Utc>,
    ) -> Result<RefreshToken, DomainError> {
        let claims = RefreshClaims {
            sub: user_id,
            tid: token_id.clone(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.config.refresh_ttl).timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            typ: TokenKind::Refresh,
        };
        self.sign(&claims).map(RefreshToken::new)
    }

    /// Verifies an access token against the access secret
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        self.verify::<AccessClaims>(token)
    }

    /// Verifies a refresh token against the refresh secret
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        self.verify::<RefreshClaims>(token)
    }

    /// Verifies `token` as claim set `C`
    ///
    /// # Returns
    ///
    /// * `Ok(C)` - Signature, expiry, issuer, audience and `typ` all check out
    /// * `Err(TokenError::Expired)` - Valid signature but past `exp`
    /// * `Err(TokenError::BadSignature)` - Signed with another secret or tampered
    /// * `Err(TokenError::Malformed)` - Anything else
    pub fn verify<C: TokenClaims>(&self, token: &str) -> Result<C, TokenError> {
        let data = decode::<C>(token, &self.keys(C::KIND).decoding, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                _ => TokenError::Malformed,
            },
        )?;

        if data.claims.kind() != C::KIND {
            return Err(TokenError::Malformed);
        }
        Ok(data.claims)
    }

    /// Read the ledger identifier of a refresh token without checking it
    ///
    /// For holders that lack the refresh secret. The result is not trusted
    /// and must never decide access; `None` if the payload is unreadable.
    pub fn peek_refresh_id(token: &str) -> Option<TokenId> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.set_required_spec_claims::<&str>(&[]);
        validation.validate_exp = false;
        validation.validate_aud = false;

        decode::<RefreshClaims>(token, &DecodingKey::from_secret(&[]), &validation)
            .ok()
            .filter(|data| data.claims.kind() == TokenKind::Refresh)
            .map(|data| data.claims.tid)
    }

    fn sign<C: TokenClaims>(&self, claims: &C) -> Result<String, DomainError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.keys(C::KIND).encoding)
            .map_err(|_| DomainError::Token(TokenError::GenerationFailed))
    }

    fn keys(&self, kind: TokenKind) -> &KeyPair {
        match kind {
            TokenKind::Access => &self.access_keys,
            TokenKind::Refresh => &self.refresh_keys,
        }
    }
}
