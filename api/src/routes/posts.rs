//! Post, like and comment handlers
//!
//! Reads are public. Every write requires authentication and, on success,
//! publishes the matching broadcast event through the post service.

use actix_web::{web, HttpResponse};
use uuid::Uuid;
use validator::Validate;

use cn_core::domain::entities::post::MediaRef;
use cn_core::repositories::{PostRepository, RefreshLedger, UserDirectory};
use cn_shared::MessageResponse;

use crate::app::AppState;
use crate::dto::post::{CommentRequest, CreatePostRequest, LikeResponse, UpdatePostRequest};
use crate::handlers::error::{handle_domain_error, handle_validation_errors};
use crate::middleware::auth::AuthContext;

/// GET /api/posts
///
/// Newest first, each post's comments newest first.
pub async fn feed<L, U, P>(state: web::Data<AppState<L, U, P>>) -> HttpResponse
where
    L: RefreshLedger + 'static,
    U: UserDirectory + 'static,
    P: PostRepository + 'static,
{
    match state.posts.feed().await {
        Ok(posts) => HttpResponse::Ok().json(posts),
        Err(error) => handle_domain_error(error),
    }
}

/// GET /api/posts/{post_id}
pub async fn get_post<L, U, P>(
    state: web::Data<AppState<L, U, P>>,
    path: web::Path<Uuid>,
) -> HttpResponse
where
    L: RefreshLedger + 'static,
    U: UserDirectory + 'static,
    P: PostRepository + 'static,
{
    match state.posts.get(path.into_inner()).await {
        Ok(post) => HttpResponse::Ok().json(post),
        Err(error) => handle_domain_error(error),
    }
}

/// POST /api/posts
///
/// Media must already be uploaded; only references are stored.
pub async fn create_post<L, U, P>(
    state: web::Data<AppState<L, U, P>>,
    auth: AuthContext,
    request: web::Json<CreatePostRequest>,
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

    let media: Vec<MediaRef> = request.media.into_iter().map(MediaRef::from).collect();
    match state.posts.create(auth.user_id, &request.text, media).await {
        Ok(post) => HttpResponse::Created().json(post),
        Err(error) => handle_domain_error(error),
    }
}

/// PUT /api/posts/{post_id}
pub async fn edit_post<L, U, P>(
    state: web::Data<AppState<L, U, P>>,
    auth: AuthContext,
    path: web::Path<Uuid>,
    request: web::Json<UpdatePostRequest>,
) -> HttpResponse
where
    L: RefreshLedger + 'static,
    U: UserDirectory + 'static,
    P: PostRepository + 'static,
{
    if let Err(errors) = request.validate() {
        return handle_validation_errors(errors);
    }

    match state.posts.edit(path.into_inner(), auth.user_id, &request.text).await {
        Ok(post) => HttpResponse::Ok().json(post),
        Err(error) => handle_domain_error(error),
    }
}

/// DELETE /api/posts/{post_id}
pub async fn delete_post<L, U, P>(
    state: web::Data<AppState<L, U, P>>,
    auth: AuthContext,
    path: web::Path<Uuid>,
) -> HttpResponse
where
    L: RefreshLedger + 'static,
    U: UserDirectory + 'static,
    P: PostRepository + 'static,
{
    match state.posts.delete(path.into_inner(), auth.user_id).await {
        Ok(()) => HttpResponse::Ok().json(MessageResponse::new("Post deleted")),
        Err(error) => handle_domain_error(error),
    }
}

/// POST /api/posts/{post_id}/like
///
/// Toggles the caller's like and returns the resulting list of likers.
pub async fn toggle_like<L, U, P>(
    state: web::Data<AppState<L, U, P>>,
    auth: AuthContext,
    path: web::Path<Uuid>,
) -> HttpResponse
where
    L: RefreshLedger + 'static,
    U: UserDirectory + 'static,
    P: PostRepository + 'static,
{
    let post_id = path.into_inner();
    match state.posts.toggle_like(post_id, auth.user_id).await {
        Ok(likes) => HttpResponse::Ok().json(LikeResponse { post_id, likes }),
        Err(error) => handle_domain_error(error),
    }
}

/// POST /api/posts/{post_id}/comments
pub async fn add_comment<L, U, P>(
    state: web::Data<AppState<L, U, P>>,
    auth: AuthContext,
    path: web::Path<Uuid>,
    request: web::Json<CommentRequest>,
) -> HttpResponse
where
    L: RefreshLedger + 'static,
    U: UserDirectory + 'static,
    P: PostRepository + 'static,
{
    if let Err(errors) = request.validate() {
        return handle_validation_errors(errors);
    }

    match state
        .posts
        .add_comment(path.into_inner(), auth.user_id, &request.text)
        .await
    {
        Ok(comment) => HttpResponse::Created().json(comment),
        Err(error) => handle_domain_error(error),
    }
}

/// DELETE /api/posts/{post_id}/comments/{comment_id}
///
/// Allowed for the comment's author and the post's author.
pub async fn delete_comment<L, U, P>(
    state: web::Data<AppState<L, U, P>>,
    auth: AuthContext,
    path: web::Path<(Uuid, Uuid)>,
) -> HttpResponse
where
    L: RefreshLedger + 'static,
    U: UserDirectory + 'static,
    P: PostRepository + 'static,
{
    let (post_id, comment_id) = path.into_inner();
    match state.posts.delete_comment(post_id, comment_id, auth.user_id).await {
        Ok(()) => HttpResponse::Ok().json(MessageResponse::new("Comment deleted")),
        Err(error) => handle_domain_error(error),
    }
}
