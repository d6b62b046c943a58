//! Pages and endpoints that need no session.

use axum::body::Body;
use axum::http::{Request, StatusCode};

use bazaar_integration_tests::{TestApp, TestResult, body_text};

#[tokio::test]
async fn health_reports_ok() -> TestResult<()> {
    let app = TestApp::new()?;
    let response = app.get("/health", None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await?, "ok");
    Ok(())
}

#[tokio::test]
async fn responses_carry_a_request_id() -> TestResult<()> {
    let app = TestApp::new()?;
    let response = app.get("/health", None).await?;
    assert!(response.headers().contains_key("x-request-id"));
    Ok(())
}

#[tokio::test]
async fn upstream_request_id_is_echoed() -> TestResult<()> {
    let app = TestApp::new()?;
    let request = Request::get("/health")
        .header("x-request-id", "edge-7f3a")
        .body(Body::empty())?;
    let response = app.send(request).await?;
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("edge-7f3a")
    );
    Ok(())
}

#[tokio::test]
async fn login_page_keeps_local_next_target() -> TestResult<()> {
    let app = TestApp::new()?;
    let response = app.get("/auth/login?next=/vendor/orders", None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await?;
    assert!(html.contains("<title>"));
    assert!(html.contains(r#"name="next""#));
    Ok(())
}

#[tokio::test]
async fn login_page_drops_offsite_next_target() -> TestResult<()> {
    let app = TestApp::new()?;
    let response = app.get("/auth/login?next=//evil.example", None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await?;
    assert!(!html.contains(r#"name="next""#));
    assert!(!html.contains("evil.example"));
    Ok(())
}

#[tokio::test]
async fn login_page_shows_flash_message() -> TestResult<()> {
    let app = TestApp::new()?;
    let response = app.get("/auth/login?error=credentials", None).await?;
    let html = body_text(response).await?;
    assert!(html.contains("Invalid email or password."));
    Ok(())
}

#[tokio::test]
async fn register_page_renders() -> TestResult<()> {
    let app = TestApp::new()?;
    let response = app.get("/auth/register", None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await?.contains("Create an account"));
    Ok(())
}

#[tokio::test]
async fn unknown_path_is_not_found() -> TestResult<()> {
    let app = TestApp::new()?;
    let response = app.get("/no-such-page", None).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}
