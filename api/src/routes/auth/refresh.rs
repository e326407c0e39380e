use actix_web::{web, HttpResponse};

use cn_core::repositories::{PostRepository, RefreshLedger, UserDirectory};

use crate::app::AppState;
use crate::dto::auth::RefreshTokenRequest;
use crate::handlers::error::handle_domain_error;

/// Handler for POST /api/auth/refresh
///
/// Exchanges a refresh token for a new access/refresh pair. The presented
/// token is consumed; presenting it again fails.
///
/// # Request Body
///
/// ```json
/// { "refresh_token": "eyJ..." }
/// ```
///
/// ## Errors
/// - 401 `invalid_session`: Expired, forged, revoked or already rotated
///   token, or the account no longer exists
pub async fn refresh<L, U, P>(
    state: web::Data<AppState<L, U, P>>,
    request: web::Json<RefreshTokenRequest>,
) -> HttpResponse
where
    L: RefreshLedger + 'static,
    U: UserDirectory + 'static,
    P: PostRepository + 'static,
{
    match state.sessions.refresh(&request.refresh_token).await {
        Ok(session) => HttpResponse::Ok().json(session),
        Err(error) => handle_domain_error(error),
    }
}
