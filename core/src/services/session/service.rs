//! Session manager implementation

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::entities::token::{AccessToken, LedgerEntry, RefreshToken, TokenId};
use crate::domain::entities::user::{NewUser, User, UserSummary, MIN_PASSWORD_LENGTH};
use crate::domain::password;
use crate::errors::{AuthError, DomainError, DomainResult, TokenError};
use crate::repositories::{RefreshLedger, UserDirectory};
use crate::services::token::TokenCodec;

use super::config::SessionConfig;

/// Tokens and user summary handed to a client after login, signup or refresh
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedSession {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub user: UserSummary,
}

/// Signup input
#[derive(Debug, Clone)]
pub struct SignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Orchestrates login, refresh with rotation, and logout
pub struct SessionManager<L, U>
where
    L: RefreshLedger,
    U: UserDirectory,
{
    ledger: Arc<L>,
    users: Arc<U>,
    codec: Arc<TokenCodec>,
    config: SessionConfig,
    /// Compared against when the email is unknown so both login failures cost a verify
    pub(super) dummy_hash: OnceCell<String>,
}

impl<L, U> SessionManager<L, U>
where
    L: RefreshLedger,
    U: UserDirectory,
{
    /// Create a new session manager
    ///
    /// # Arguments
    ///
    /// * `ledger` - Refresh token allow-list
    /// * `users` - Account lookups and password checks
    /// * `codec` - Token signing and verification
    /// * `config` - Password hashing settings
    pub fn new(ledger: Arc<L>, users: Arc<U>, codec: Arc<TokenCodec>, config: SessionConfig) -> Self {
        Self {
            ledger,
            users,
            codec,
            config,
            dummy_hash: OnceCell::new(),
        }
    }

    pub fn codec(&self) -> &Arc<TokenCodec> {
        &self.codec
    }

    /// Authenticate with email and password
    ///
    /// # Returns
    ///
    /// * `Ok(IssuedSession)` - New access/refresh pair
    /// * `Err(AuthError::InvalidCredentials)` - Unknown email or wrong password, indistinguishably
    pub async fn login(&self, email: &str, plaintext: &str) -> DomainResult<IssuedSession> {
        let user = match self.users.find_by_email(email.trim()).await? {
            Some(user) if self.users.verify_password(&user, plaintext).await => user,
            Some(_) => return Err(failed_login()),
            None => {
                let dummy = self
                    .dummy_hash
                    .get_or_try_init(|| password::dummy_hash(self.config.bcrypt_cost))
                    .await?;
                password::verify_blocking(plaintext, dummy).await;
                return Err(failed_login());
            }
        };

        let session = self.open_session(&user).await?;
        info!(user_id = %user.id, "User logged in");
        Ok(session)
    }

    /// Register a new account and open a session for it
    ///
    /// # Returns
    ///
    /// * `Ok(IssuedSession)` - Account created and logged in
    /// * `Err(DomainError::Validation)` - Missing name, bad email, or short password
    /// * `Err(AuthError::UserAlreadyExists)` - Email taken
    pub async fn signup(&self, request: SignupRequest) -> DomainResult<IssuedSession> {
        let name = request.name.trim().to_string();
        let email = request.email.trim().to_string();

        if name.is_empty() {
            return Err(DomainError::validation("Name is required"));
        }
        if !email.contains('@') {
            return Err(DomainError::validation("A valid email is required"));
        }
        if request.password.len() < MIN_PASSWORD_LENGTH {
            return Err(DomainError::validation(format!(
                "Password must be at least {} characters long",
                MIN_PASSWORD_LENGTH
            )));
        }
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AuthError::UserAlreadyExists.into());
        }

        let password_hash = password::hash_blocking(request.password, self.config.bcrypt_cost).await?;
        let user = self
            .users
            .create(User::new(NewUser {
                name,
                email,
                password_hash,
            }))
            .await?;

        let session = self.open_session(&user).await?;
        info!(user_id = %user.id, "User signed up");
        Ok(session)
    }

    /// Exchange a refresh token for a new pair, revoking the presented one
    ///
    /// Verification happens before any ledger access, so an expired token
    /// reports `Expired` even while its row still exists.
    ///
    /// # Returns
    ///
    /// * `Ok(IssuedSession)` - Rotated pair
    /// * `Err(TokenError::Expired | BadSignature | Malformed)` - Token did not verify
    /// * `Err(TokenError::Revoked)` - Row missing: replayed token or lost rotation race
    /// * `Err(AuthError::InvalidSubject)` - Account no longer exists
    pub async fn refresh(&self, presented: &str) -> DomainResult<IssuedSession> {
        let claims = self.codec.verify_refresh(presented)?;

        if !self.ledger.is_live(&claims.tid, claims.sub).await? {
            warn!(user_id = %claims.sub, "Revoked refresh token presented, possible replay");
            return Err(TokenError::Revoked.into());
        }

        let Some(user) = self.users.find_by_id(claims.sub).await? else {
            warn!(user_id = %claims.sub, "Refresh token subject no longer exists");
            if let Err(e) = self.ledger.revoke(&claims.tid).await {
                warn!(user_id = %claims.sub, "Failed to revoke orphaned refresh token: {}", e);
            }
            return Err(AuthError::InvalidSubject.into());
        };

        let token_id = TokenId::generate();
        let session = self.issue(&user, &token_id)?;

        let replacement = LedgerEntry::new(token_id, user.id);
        if !self.ledger.rotate(&claims.tid, user.id, replacement).await? {
            warn!(user_id = %user.id, "Refresh token rotated concurrently, possible replay");
            return Err(TokenError::Revoked.into());
        }

        debug!(user_id = %user.id, "Refresh token rotated");
        Ok(session)
    }

    /// End the session bound to `presented`
    ///
    /// Never fails: a token that no longer verifies has nothing left to
    /// revoke, and storage errors are only logged.
    pub async fn logout(&self, presented: &str) {
        let claims = match self.codec.verify_refresh(presented) {
            Ok(claims) => claims,
            Err(e) => {
                debug!("Logout with unverifiable refresh token: {}", e);
                return;
            }
        };

        match self.ledger.revoke(&claims.tid).await {
            Ok(_) => info!(user_id = %claims.sub, "User logged out"),
            Err(e) => warn!(user_id = %claims.sub, "Failed to revoke refresh token on logout: {}", e),
        }
    }

    /// Revoke every refresh token of `user_id`
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of sessions ended
    pub async fn logout_everywhere(&self, user_id: Uuid) -> DomainResult<usize> {
        let revoked = self.ledger.revoke_all_for(user_id).await?;
        info!(user_id = %user_id, revoked, "User logged out everywhere");
        Ok(revoked)
    }

    async fn open_session(&self, user: &User) -> DomainResult<IssuedSession> {
        let token_id = TokenId::generate();
        let session = self.issue(user, &token_id)?;
        self.ledger.record(LedgerEntry::new(token_id, user.id)).await?;
        Ok(session)
    }

    fn issue(&self, user: &User, token_id: &TokenId) -> DomainResult<IssuedSession> {
        Ok(IssuedSession {
            access_token: self.codec.issue_access(user.id, &user.name)?,
            refresh_token: self.codec.issue_refresh(user.id, token_id)?,
            user: user.summary(),
        })
    }
}

fn failed_login() -> DomainError {
    warn!("Failed login attempt");
    AuthError::InvalidCredentials.into()
}
