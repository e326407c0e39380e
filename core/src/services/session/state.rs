//! Authentication state machine

use crate::domain::entities::token::{AccessToken, TokenId};
use crate::domain::entities::user::UserSummary;
use crate::services::token::TokenCodec;

use super::service::IssuedSession;

/// Whether a holder currently has a session
///
/// Both states are steady: login and a successful refresh lead to
/// `Authenticated`, logout and a failed refresh lead back to `Anonymous`.
/// The refresh token itself is not part of the state; only its ledger
/// identifier is, as read from the token by whoever holds it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Anonymous,
    Authenticated {
        user: UserSummary,
        access_token: AccessToken,
        /// `None` when the refresh token's payload could not be read
        token_id: Option<TokenId>,
    },
}

impl SessionState {
    /// State after login, signup or refresh handed out `session`
    pub fn signed_in(session: &IssuedSession) -> Self {
        SessionState::Authenticated {
            user: session.user.clone(),
            access_token: session.access_token.clone(),
            token_id: TokenCodec::peek_refresh_id(session.refresh_token.as_str()),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }

    pub fn user(&self) -> Option<&UserSummary> {
        match self {
            SessionState::Authenticated { user, .. } => Some(user),
            SessionState::Anonymous => None,
        }
    }

    pub fn access_token(&self) -> Option<&AccessToken> {
        match self {
            SessionState::Authenticated { access_token, .. } => Some(access_token),
            SessionState::Anonymous => None,
        }
    }

    pub fn token_id(&self) -> Option<&TokenId> {
        match self {
            SessionState::Authenticated { token_id, .. } => token_id.as_ref(),
            SessionState::Anonymous => None,
        }
    }
}
