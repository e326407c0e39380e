//! Profile handlers

use actix_web::{web, HttpResponse};
use uuid::Uuid;
use validator::Validate;

use cn_core::repositories::{PostRepository, RefreshLedger, UserDirectory};

use crate::app::AppState;
use crate::dto::user::UpdateProfileRequest;
use crate::handlers::error::{handle_domain_error, handle_validation_errors};
use crate::middleware::auth::AuthContext;

/// GET /api/users/{user_id}
///
/// Public profile. The password hash is never serialized.
pub async fn get_user<L, U, P>(
    state: web::Data<AppState<L, U, P>>,
    path: web::Path<Uuid>,
) -> HttpResponse
where
    L: RefreshLedger + 'static,
    U: UserDirectory + 'static,
    P: PostRepository + 'static,
{
    match state.profiles.get(path.into_inner()).await {
        Ok(user) => HttpResponse::Ok().json(user),
        Err(error) => handle_domain_error(error),
    }
}

/// GET /api/users/me
pub async fn get_me<L, U, P>(state: web::Data<AppState<L, U, P>>, auth: AuthContext) -> HttpResponse
where
    L: RefreshLedger + 'static,
    U: UserDirectory + 'static,
    P: PostRepository + 'static,
{
    match state.profiles.get(auth.user_id).await {
        Ok(user) => HttpResponse::Ok().json(user),
        Err(error) => handle_domain_error(error),
    }
}

/// PUT /api/users/me
///
/// Changing the password requires `current_password`.
pub async fn update_me<L, U, P>(
    state: web::Data<AppState<L, U, P>>,
    auth: AuthContext,
    request: web::Json<UpdateProfileRequest>,
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

    match state.profiles.update(auth.user_id, request.into()).await {
        Ok(user) => HttpResponse::Ok().json(user),
        Err(error) => handle_domain_error(error),
    }
}
