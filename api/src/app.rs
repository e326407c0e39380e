//! Application state and factory
//!
//! This module handles the initialization of the application state
//! and provides the factory for creating the Actix-web application.

use std::sync::Arc;

use actix_web::{body::MessageBody, error::InternalError, web, App, HttpRequest, HttpResponse};
use tracing_actix_web::TracingLogger;

use cn_core::repositories::{PostRepository, RefreshLedger, UserDirectory};
use cn_core::services::{
    EventHub, PostService, ProfileService, SessionConfig, SessionManager, TokenCodec,
    TokenCodecConfig,
};
use cn_shared::{error_codes, AppConfig, ErrorResponse};

use crate::middleware::{auth::JwtAuth, cors::create_cors, security::SecurityMiddleware};
use crate::routes::{auth, events, health, posts, users};

/// Shared services handed to every handler
pub struct AppState<L, U, P>
where
    L: RefreshLedger,
    U: UserDirectory,
    P: PostRepository,
{
    pub sessions: Arc<SessionManager<L, U>>,
    pub posts: Arc<PostService<P, U>>,
    pub profiles: Arc<ProfileService<U>>,
    pub hub: EventHub,
    pub codec: Arc<TokenCodec>,
    pub config: Arc<AppConfig>,
}

impl<L, U, P> AppState<L, U, P>
where
    L: RefreshLedger,
    U: UserDirectory,
    P: PostRepository,
{
    /// Wire the services over the given storage backends
    ///
    /// # Arguments
    ///
    /// * `config` - Application configuration
    /// * `ledger` - Refresh token allow-list
    /// * `users` - User directory
    /// * `posts` - Post store
    /// * `hub` - Event hub created at process start
    pub fn new(config: AppConfig, ledger: Arc<L>, users: Arc<U>, posts: Arc<P>, hub: EventHub) -> Self {
        let codec = Arc::new(TokenCodec::new(TokenCodecConfig::from(&config.auth.jwt)));
        let sessions = Arc::new(SessionManager::new(
            ledger,
            users.clone(),
            codec.clone(),
            SessionConfig::from(&config.auth),
        ));
        let post_service = Arc::new(PostService::new(posts, users.clone(), hub.clone()));
        let profiles = Arc::new(ProfileService::new(users, config.auth.bcrypt_cost));

        Self {
            sessions,
            posts: post_service,
            profiles,
            hub,
            codec,
            config: Arc::new(config),
        }
    }
}

/// Create and configure the application with all dependencies
pub fn create_app<L, U, P>(
    app_state: web::Data<AppState<L, U, P>>,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
>
where
    L: RefreshLedger + 'static,
    U: UserDirectory + 'static,
    P: PostRepository + 'static,
{
    let config = app_state.config.clone();
    let codec = web::Data::from(app_state.codec.clone());

    let json_config = web::JsonConfig::default()
        .limit(config.server.max_payload_size)
        .error_handler(json_error_handler);

    App::new()
        .app_data(app_state)
        .app_data(codec)
        .app_data(json_config)
        // Registration order is the reverse of execution order: the
        // security check runs first, then CORS, then request tracing.
        .wrap(TracingLogger::default())
        .wrap(create_cors(&config.cors))
        .wrap(SecurityMiddleware::for_environment(config.environment))
        .route("/health", web::get().to(health::health_check::<L, U, P>))
        .service(
            web::scope("/api")
                .service(
                    web::scope("/auth")
                        .route("/login", web::post().to(auth::login::<L, U, P>))
                        .route("/signup", web::post().to(auth::signup::<L, U, P>))
                        .route("/refresh", web::post().to(auth::refresh::<L, U, P>))
                        .route("/logout", web::post().to(auth::logout::<L, U, P>))
                        .route(
                            "/logout-all",
                            web::post()
                                .to(auth::logout_all::<L, U, P>)
                                .wrap(JwtAuth::new()),
                        ),
                )
                .service(
                    web::scope("/posts")
                        .route("", web::get().to(posts::feed::<L, U, P>))
                        .route(
                            "",
                            web::post()
                                .to(posts::create_post::<L, U, P>)
                                .wrap(JwtAuth::new()),
                        )
                        .route("/{post_id}", web::get().to(posts::get_post::<L, U, P>))
                        .route(
                            "/{post_id}",
                            web::put()
                                .to(posts::edit_post::<L, U, P>)
                                .wrap(JwtAuth::new()),
                        )
                        .route(
                            "/{post_id}",
                            web::delete()
                                .to(posts::delete_post::<L, U, P>)
                                .wrap(JwtAuth::new()),
                        )
                        .route(
                            "/{post_id}/like",
                            web::post()
                                .to(posts::toggle_like::<L, U, P>)
                                .wrap(JwtAuth::new()),
                        )
                        .route(
                            "/{post_id}/comments",
                            web::post()
                                .to(posts::add_comment::<L, U, P>)
                                .wrap(JwtAuth::new()),
                        )
                        .route(
                            "/{post_id}/comments/{comment_id}",
                            web::delete()
                                .to(posts::delete_comment::<L, U, P>)
                                .wrap(JwtAuth::new()),
                        ),
                )
                .service(
                    web::scope("/users")
                        .route(
                            "/me",
                            web::get()
                                .to(users::get_me::<L, U, P>)
                                .wrap(JwtAuth::new()),
                        )
                        .route(
                            "/me",
                            web::put()
                                .to(users::update_me::<L, U, P>)
                                .wrap(JwtAuth::new()),
                        )
                        .route("/{user_id}", web::get().to(users::get_user::<L, U, P>)),
                )
                .route("/events", web::get().to(events::stream_events::<L, U, P>)),
        )
        .default_service(web::route().to(not_found))
}

/// Malformed JSON bodies get the shared error body instead of plain text
fn json_error_handler(err: actix_web::error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let body = ErrorResponse::new(error_codes::VALIDATION_ERROR, err.to_string());
    InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
}

/// Default 404 handler
async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::new(
        error_codes::NOT_FOUND,
        "The requested resource was not found",
    ))
}
