use actix_web::{web, HttpResponse};

use cn_core::repositories::{PostRepository, RefreshLedger, UserDirectory};
use cn_shared::MessageResponse;

use crate::app::AppState;
use crate::dto::auth::LogoutRequest;
use crate::handlers::error::handle_domain_error;
use crate::middleware::auth::AuthContext;

/// Handler for POST /api/auth/logout
///
/// Revokes the presented refresh token. Always answers 200, including for
/// a missing body or a token that no longer verifies.
pub async fn logout<L, U, P>(
    state: web::Data<AppState<L, U, P>>,
    request: Option<web::Json<LogoutRequest>>,
) -> HttpResponse
where
    L: RefreshLedger + 'static,
    U: UserDirectory + 'static,
    P: PostRepository + 'static,
{
    if let Some(token) = request.and_then(|r| r.into_inner().refresh_token) {
        state.sessions.logout(&token).await;
    }

    HttpResponse::Ok().json(MessageResponse::new("Logged out successfully"))
}

/// Handler for POST /api/auth/logout-all
///
/// Requires authentication. Revokes every refresh token of the caller; access
/// tokens already issued stay valid until they expire.
pub async fn logout_all<L, U, P>(
    state: web::Data<AppState<L, U, P>>,
    auth: AuthContext,
) -> HttpResponse
where
    L: RefreshLedger + 'static,
    U: UserDirectory + 'static,
    P: PostRepository + 'static,
{
    match state.sessions.logout_everywhere(auth.user_id).await {
        Ok(revoked) => HttpResponse::Ok().json(serde_json::json!({
            "message": "Logged out of all sessions",
            "revoked": revoked,
        })),
        Err(error) => handle_domain_error(error),
    }
}
