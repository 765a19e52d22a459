mod common;

use std::time::Duration;

use actix_web::cookie::Key;
use actix_web::http::StatusCode;
use actix_web::test;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use common::{bearer, context, sign_up};
use todoforge::create_app;
use todoforge::store::UserStore;

#[actix_rt::test]
async fn test_todo_lifecycle() {
    let mut ctx = context();
    let app = test::init_service(create_app(ctx.state.clone(), Key::generate(), false)).await;
    let token = sign_up(&app, "alice@example.com", "alice").await;

    let req = test::TestRequest::post()
        .uri("/todos")
        .insert_header(bearer(&token))
        .set_json(json!({ "title": "write report" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["title"], "write report");
    assert_eq!(created["completed"], false);
    let id = created["id"].as_i64().unwrap();

    let req = test::TestRequest::get()
        .uri("/todos")
        .insert_header(bearer(&token))
        .to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed["todos"], json!([created]));

    let req = test::TestRequest::put()
        .uri(&format!("/todos/{}", id))
        .insert_header(bearer(&token))
        .set_json(json!({ "completed": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Value = test::read_body_json(resp).await;
    assert_eq!(updated["title"], "write report");
    assert_eq!(updated["completed"], true);

    let req = test::TestRequest::delete()
        .uri(&format!("/todos/{}", id))
        .insert_header(bearer(&token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["msg"], "To-do deleted successfully");

    let req = test::TestRequest::get()
        .uri("/todos")
        .insert_header(bearer(&token))
        .to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed["todos"], json!([]));

    let sent = tokio::time::timeout(Duration::from_secs(1), ctx.mail.recv())
        .await
        .expect("task-created email dispatched")
        .unwrap();
    assert_eq!(
        sent,
        ("alice@example.com".to_string(), "write report".to_string())
    );
}

#[actix_rt::test]
async fn test_todos_require_a_token() {
    let ctx = context();
    let app = test::init_service(create_app(ctx.state.clone(), Key::generate(), false)).await;

    let req = test::TestRequest::get().uri("/todos").to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let req = test::TestRequest::post()
        .uri("/todos")
        .set_json(json!({ "title": "sneaky" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(ctx.store.task_count(), 0);
}

#[actix_rt::test]
async fn test_other_users_todos_are_invisible() {
    let ctx = context();
    let app = test::init_service(create_app(ctx.state.clone(), Key::generate(), false)).await;
    let alice = sign_up(&app, "alice@example.com", "alice").await;
    let bob = sign_up(&app, "bob@example.com", "bob").await;

    let req = test::TestRequest::post()
        .uri("/todos")
        .insert_header(bearer(&alice))
        .set_json(json!({ "title": "private" }))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let uri = format!("/todos/{}", created["id"]);

    let req = test::TestRequest::put()
        .uri(&uri)
        .insert_header(bearer(&bob))
        .set_json(json!({ "title": "hijacked", "completed": true }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["msg"], "To-do not found");

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(bearer(&bob))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    let req = test::TestRequest::get()
        .uri("/todos")
        .insert_header(bearer(&bob))
        .to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed["todos"], json!([]));

    let req = test::TestRequest::get()
        .uri("/todos")
        .insert_header(bearer(&alice))
        .to_request();
    let listed: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(listed["todos"], json!([created]));
}

#[actix_rt::test]
async fn test_titles_are_trimmed_and_must_not_be_blank() {
    let ctx = context();
    let app = test::init_service(create_app(ctx.state.clone(), Key::generate(), false)).await;
    let token = sign_up(&app, "alice@example.com", "alice").await;

    for body in [json!({ "title": "   " }), json!({})] {
        let req = test::TestRequest::post()
            .uri("/todos")
            .insert_header(bearer(&token))
            .set_json(&body)
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST,
            "body: {}",
            body
        );
    }
    assert_eq!(ctx.store.task_count(), 0);

    let req = test::TestRequest::post()
        .uri("/todos")
        .insert_header(bearer(&token))
        .set_json(json!({ "title": " Buy milk " }))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(created["title"], "Buy milk");

    let req = test::TestRequest::put()
        .uri(&format!("/todos/{}", created["id"]))
        .insert_header(bearer(&token))
        .set_json(json!({ "title": "  " }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );
}

#[actix_rt::test]
async fn test_malformed_requests() {
    let ctx = context();
    let app = test::init_service(create_app(ctx.state.clone(), Key::generate(), false)).await;
    let token = sign_up(&app, "alice@example.com", "alice").await;

    let req = test::TestRequest::post()
        .uri("/todos")
        .insert_header(bearer(&token))
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"title\": ")
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::BAD_REQUEST
    );

    let req = test::TestRequest::put()
        .uri("/todos/abc")
        .insert_header(bearer(&token))
        .set_json(json!({ "completed": true }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );

    let req = test::TestRequest::delete()
        .uri("/todos/999")
        .insert_header(bearer(&token))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_rt::test]
async fn test_token_for_deleted_account_cannot_create() {
    let ctx = context();
    let app = test::init_service(create_app(ctx.state.clone(), Key::generate(), false)).await;
    let token = sign_up(&app, "alice@example.com", "alice").await;
    let user_id: i32 = ctx.tokens.verify(&token).unwrap().sub.parse().unwrap();

    assert!(ctx.store.delete_user(user_id).await.unwrap());

    let req = test::TestRequest::post()
        .uri("/todos")
        .insert_header(bearer(&token))
        .set_json(json!({ "title": "orphan" }))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(ctx.store.task_count(), 0);
}
