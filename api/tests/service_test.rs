//! Health, profile and fallback routes

mod common;

use actix_web::{http::StatusCode, test};
use serde_json::Value;

use cn_api::app::create_app;
use common::{bearer, login_request, seed_user, test_context};

#[actix_web::test]
async fn test_health_check() {
    let ctx = test_context();
    let app = test::init_service(create_app(ctx.state.clone())).await;
    let _subscription = ctx.hub.subscribe();

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["subscribers"], 1);
}

#[actix_web::test]
async fn test_public_profile_hides_password_hash() {
    let ctx = test_context();
    let user = seed_user(&ctx.users, "Ada", "a@x.com", "secret1").await;
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/users/{}", user.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["name"], "Ada");
    assert!(body.get("password_hash").is_none());

    let req = test::TestRequest::get()
        .uri(&format!("/api/users/{}", uuid::Uuid::new_v4()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_update_own_profile() {
    let ctx = test_context();
    seed_user(&ctx.users, "Ada", "a@x.com", "secret1").await;
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let resp = test::call_service(&app, login_request("a@x.com", "secret1").to_request()).await;
    let session: Value = test::read_body_json(resp).await;

    let req = test::TestRequest::put()
        .uri("/api/users/me")
        .insert_header(bearer(&session["access_token"]))
        .set_json(serde_json::json!({ "bio": "Engineer", "profession": "Analyst" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/users/me")
        .insert_header(bearer(&session["access_token"]))
        .to_request();
    let me: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(me["bio"], "Engineer");
    assert_eq!(me["email"], "a@x.com");
}

#[actix_web::test]
async fn test_unknown_route_is_json_404() {
    let ctx = test_context();
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/nowhere").to_request()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "not_found");
}

#[actix_web::test]
async fn test_non_http_origin_rejected() {
    let ctx = test_context();
    let app = test::init_service(create_app(ctx.state.clone())).await;

    let req = test::TestRequest::get()
        .uri("/health")
        .insert_header(("Origin", "file://"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}
