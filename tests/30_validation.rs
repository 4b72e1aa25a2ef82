mod common;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::json;

use common::{json_request, response_json, test_app};

#[tokio::test]
async fn register_rejects_empty_password_before_touching_store() -> Result<()> {
    let app = test_app();

    let res = app
        .send(json_request(
            Method::POST,
            "/id/register",
            None,
            Some(json!({ "email": "a@b.c", "password": "", "name": "Ana" })),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = response_json(res).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["error"].as_str().unwrap().contains("password"));
    assert!(app.sink.event_types().is_empty());
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_invalid_json() -> Result<()> {
    let app = test_app();

    let req = Request::builder()
        .method(Method::POST)
        .uri("/id/register")
        .header("content-type", "application/json")
        .body(Body::from("{\"email\": "))?;
    let res = app.send(req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = response_json(res).await;
    assert_eq!(body["code"], "INVALID_JSON");
    Ok(())
}

#[tokio::test]
async fn missing_content_type_is_bad_request() -> Result<()> {
    let app = test_app();

    let req = Request::builder()
        .method(Method::POST)
        .uri("/id/login")
        .body(Body::from("{}"))?;
    let res = app.send(req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = response_json(res).await;
    assert_eq!(body["code"], "BAD_REQUEST");
    Ok(())
}

#[tokio::test]
async fn level_create_lists_missing_fields() -> Result<()> {
    let app = test_app();
    let token = app.token_for(9);

    let res = app
        .send(json_request(
            Method::POST,
            "/levels",
            Some(&token),
            Some(json!({ "name": "Dunes", "difficulty": 2 })),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = response_json(res).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"].get("description").is_some());
    Ok(())
}

#[tokio::test]
async fn non_positive_ids_are_bad_requests() -> Result<()> {
    let app = test_app();
    let token = app.token_for(9);

    for uri in ["/levels/0", "/drafts/-4", "/collections/x", "/stats/levels/abc/starts"] {
        let res = app.send(json_request(Method::GET, uri, Some(&token), None)).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{}", uri);
    }
    Ok(())
}

#[tokio::test]
async fn unreachable_store_maps_to_service_unavailable() -> Result<()> {
    let app = test_app();
    let token = app.token_for(9);

    let res = app.send(json_request(Method::GET, "/levels/7", Some(&token), None)).await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = response_json(res).await;
    assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
    Ok(())
}

#[tokio::test]
async fn level_delete_is_not_implemented() -> Result<()> {
    let app = test_app();
    let token = app.token_for(9);

    let res = app.send(json_request(Method::DELETE, "/levels/7", Some(&token), None)).await;
    assert_eq!(res.status(), StatusCode::NOT_IMPLEMENTED);
    Ok(())
}

#[tokio::test]
async fn telemetry_takes_uid_from_token() -> Result<()> {
    let app = test_app();
    let token = app.token_for(42);

    let res = app
        .send(json_request(
            Method::POST,
            "/t",
            Some(&token),
            Some(json!({ "eventType": "game_start", "levelId": 3, "uid": 1 })),
        ))
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let events = app.sink.events.lock().unwrap().clone();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event_type, "game_start");
    assert_eq!(events[0].level_id, Some(3));
    assert_eq!(events[0].uid, Some(42));
    Ok(())
}
