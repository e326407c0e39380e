use actix_web::{web, HttpResponse};
use validator::Validate;

use cn_core::repositories::{PostRepository, RefreshLedger, UserDirectory};

use crate::app::AppState;
use crate::dto::auth::SignupRequest;
use crate::handlers::error::{handle_domain_error, handle_validation_errors};

/// Handler for POST /api/auth/signup
///
/// Creates the account and opens a session for it in one step.
///
/// ## Errors
/// - 400 `validation_error`: Missing name, malformed email or short password
/// - 400 `user_exists`: Email already registered
pub async fn signup<L, U, P>(
    state: web::Data<AppState<L, U, P>>,
    request: web::Json<SignupRequest>,
) -> HttpResponse
where
    L: RefreshLedger + 'static,
    U: UserDirectory + 'static,
    P: PostRepository + 'static,
{
    let request = request.into_inner();
    if let Err(errors) = request.validate() {
        return handle_validation_errors(errors);
    }

    match state.sessions.signup(request.into()).await {
        Ok(session) => HttpResponse::Created().json(session),
        Err(error) => handle_domain_error(error),
    }
}
