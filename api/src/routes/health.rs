use actix_web::{web, HttpResponse};

use cn_core::repositories::{PostRepository, RefreshLedger, UserDirectory};
use cn_shared::HealthResponse;

use crate::app::AppState;

/// GET /health
pub async fn health_check<L, U, P>(state: web::Data<AppState<L, U, P>>) -> HttpResponse
where
    L: RefreshLedger + 'static,
    U: UserDirectory + 'static,
    P: PostRepository + 'static,
{
    HttpResponse::Ok().json(HealthResponse::healthy(state.hub.subscriber_count()))
}
