use actix_web::{web, HttpResponse};
use validator::Validate;

use cn_core::repositories::{PostRepository, RefreshLedger, UserDirectory};

use crate::app::AppState;
use crate::dto::auth::LoginRequest;
use crate::handlers::error::{handle_domain_error, handle_validation_errors};

/// Handler for POST /api/auth/login
///
/// # Request Body
///
/// ```json
/// { "email": "a@x.com", "password": "secret1" }
/// ```
///
/// # Response
///
/// ## Success (200 OK)
/// ```json
/// {
///     "access_token": "eyJ...",
///     "refresh_token": "eyJ...",
///     "user": { "id": "...", "name": "Ada", "email": "a@x.com", "avatar_url": null }
/// }
/// ```
///
/// ## Errors
/// - 400 `invalid_credentials`: Unknown email or wrong password, indistinguishably
pub async fn login<L, U, P>(
    state: web::Data<AppState<L, U, P>>,
    request: web::Json<LoginRequest>,
) -> HttpResponse
where
    L: RefreshLedger + 'static,
    U: UserDirectory + 'static,
    P: PostRepository + 'static,
{
    if let Err(errors) = request.validate() {
        return handle_validation_errors(errors);
    }

    match state.sessions.login(&request.email, &request.password).await {
        Ok(session) => HttpResponse::Ok().json(session),
        Err(error) => handle_domain_error(error),
    }
}
