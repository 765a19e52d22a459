mod common;

use actix_web::cookie::Key;
use actix_web::http::StatusCode;
use actix_web::test;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use common::{bearer, context, login, register, sign_up};
use todoforge::create_app;

#[actix_rt::test]
async fn test_register_and_login_flow() {
    let ctx = context();
    let app = test::init_service(create_app(ctx.state.clone(), Key::generate(), false)).await;

    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(json!({
            "email": "alice@example.com",
            "password": "pw123",
            "userName": "alice"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["msg"], "User registered successfully");

    let token = login(&app, "alice@example.com", "pw123").await.unwrap();
    let claims = ctx.tokens.verify(&token).unwrap();
    assert_eq!(claims.exp - claims.iat, 3600);

    let req = test::TestRequest::get()
        .uri("/protected")
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["logged_in_as"], claims.sub);
}

#[actix_rt::test]
async fn test_duplicate_email_or_user_name_is_a_conflict() {
    let ctx = context();
    let app = test::init_service(create_app(ctx.state.clone(), Key::generate(), false)).await;

    assert_eq!(
        register(&app, "alice@example.com", "pw123", "alice").await,
        StatusCode::CREATED
    );
    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(json!({
            "email": "alice@example.com",
            "password": "other",
            "userName": "alice2"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["msg"], "Email already exists");

    let req = test::TestRequest::post()
        .uri("/register")
        .set_json(json!({
            "email": "other@example.com",
            "password": "pw123",
            "userName": "alice"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["msg"], "Username already exists");
    assert_eq!(ctx.store.user_count(), 1);
}

#[actix_rt::test]
async fn test_values_too_long_for_storage_are_bad_requests() {
    let ctx = context();
    let app = test::init_service(create_app(ctx.state.clone(), Key::generate(), false)).await;

    let long_email = format!("{}@example.com", "a".repeat(120));
    assert_eq!(
        register(&app, &long_email, "pw123", "alice").await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        register(&app, "alice@example.com", "pw123", &"a".repeat(121)).await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(ctx.store.user_count(), 0);
}

#[actix_rt::test]
async fn test_register_requires_every_field() {
    let ctx = context();
    let app = test::init_service(create_app(ctx.state.clone(), Key::generate(), false)).await;

    for body in [
        json!({ "password": "pw123", "userName": "alice" }),
        json!({ "email": "alice@example.com", "userName": "alice" }),
        json!({ "email": "alice@example.com", "password": "pw123" }),
        json!({ "email": "not-an-email", "password": "pw123", "userName": "alice" }),
        json!({ "email": "alice@example.com", "password": "", "userName": "alice" }),
    ] {
        let req = test::TestRequest::post()
            .uri("/register")
            .set_json(&body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body: {}", body);
    }
    assert_eq!(ctx.store.user_count(), 0);
}

#[actix_rt::test]
async fn test_login_failures_are_indistinguishable() {
    let ctx = context();
    let app = test::init_service(create_app(ctx.state.clone(), Key::generate(), false)).await;
    sign_up(&app, "alice@example.com", "alice").await;

    let mut messages = Vec::new();
    for (email, password) in [
        ("alice@example.com", "wrong"),
        ("nobody@example.com", "pw123"),
    ] {
        let req = test::TestRequest::post()
            .uri("/login")
            .set_json(json!({ "email": email, "password": password }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        messages.push(body["msg"].clone());
    }
    assert_eq!(messages[0], "Invalid email or password");
    assert_eq!(messages[0], messages[1]);
}

#[actix_rt::test]
async fn test_login_with_missing_fields_is_bad_request() {
    let ctx = context();
    let app = test::init_service(create_app(ctx.state.clone(), Key::generate(), false)).await;

    assert_eq!(
        login(&app, "alice@example.com", "").await,
        Err(StatusCode::BAD_REQUEST)
    );
    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(json!({ "email": "alice@example.com" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );
}

#[actix_rt::test]
async fn test_protected_rejects_missing_and_invalid_tokens() {
    let ctx = context();
    let app = test::init_service(create_app(ctx.state.clone(), Key::generate(), false)).await;

    let req = test::TestRequest::get().uri("/protected").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["msg"], "Missing Authorization Header");

    let req = test::TestRequest::get()
        .uri("/protected")
        .insert_header(bearer("not.a.token"))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let foreign = todoforge::auth::TokenService::new("some-other-secret", 3600)
        .issue(1)
        .unwrap();
    let req = test::TestRequest::get()
        .uri("/protected")
        .insert_header(bearer(&foreign))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_rt::test]
async fn test_expired_token_is_rejected() {
    let ctx = context();
    let app = test::init_service(create_app(ctx.state.clone(), Key::generate(), false)).await;
    sign_up(&app, "alice@example.com", "alice").await;

    let expired = todoforge::auth::TokenService::new(common::JWT_SECRET, -120)
        .issue(1)
        .unwrap();
    let req = test::TestRequest::get()
        .uri("/protected")
        .insert_header(bearer(&expired))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_rt::test]
async fn test_index_and_health_are_public() {
    let ctx = context();
    let app = test::init_service(create_app(ctx.state.clone(), Key::generate(), false)).await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
}
