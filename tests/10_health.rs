mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};

use common::{json_request, response_json, test_app};

#[tokio::test]
async fn root_describes_service() -> Result<()> {
    let app = test_app();

    let res = app.send(json_request(Method::GET, "/", None, None)).await;
    assert_eq!(res.status(), StatusCode::OK);

    let body = response_json(res).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["name"], "maker-api");
    Ok(())
}

#[tokio::test]
async fn health_reports_unreachable_database() -> Result<()> {
    let app = test_app();

    let res = app.send(json_request(Method::GET, "/health", None, None)).await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = response_json(res).await;
    assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
    Ok(())
}

#[tokio::test]
async fn unknown_route_is_not_found() -> Result<()> {
    let app = test_app();

    let res = app.send(json_request(Method::GET, "/nope", None, None)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}
