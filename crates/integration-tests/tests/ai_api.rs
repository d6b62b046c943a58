//! The AI suggestion API answers with status codes, never redirects.

use axum::http::StatusCode;
use serde_json::json;

use bazaar_core::Role;
use bazaar_integration_tests::{TestApp, TestResult, body_text, location};

#[tokio::test]
async fn guests_get_unauthorized() -> TestResult<()> {
    let app = TestApp::new()?;
    for path in [
        "/api/ai/product-description",
        "/api/ai/product-tags",
        "/api/ai/price-suggestion",
    ] {
        let response = app.post_json(path, &json!({"name": "Mug"}), None).await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{path}");
        assert_eq!(location(&response), None, "{path}");
    }
    Ok(())
}

#[tokio::test]
async fn customers_and_salespeople_are_forbidden() -> TestResult<()> {
    let app = TestApp::new()?;
    for role in [Role::Customer, Role::Salesperson] {
        let cookie = app.sign_in(role).await?;
        let response = app
            .post_json("/api/ai/product-tags", &json!({"name": "Mug"}), Some(&cookie))
            .await?;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{role}");
    }
    Ok(())
}

#[tokio::test]
async fn disabled_assistant_is_unavailable() -> TestResult<()> {
    let app = TestApp::new()?;
    let cookie = app.sign_in(Role::Vendor).await?;
    let response = app
        .post_json("/api/ai/product-tags", &json!({"name": "Mug"}), Some(&cookie))
        .await?;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(body_text(response).await?.contains("\"error\""));
    Ok(())
}

#[tokio::test]
async fn blank_product_name_is_rejected() -> TestResult<()> {
    let app = TestApp::new()?;
    let cookie = app.sign_in(Role::Admin).await?;
    let response = app
        .post_json(
            "/api/ai/product-description",
            &json!({"name": "   "}),
            Some(&cookie),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn exhausted_budget_is_too_many_requests() -> TestResult<()> {
    let app = TestApp::with_ai_budget(0)?;
    let cookie = app.sign_in(Role::Vendor).await?;
    let response = app
        .post_json(
            "/api/ai/product-tags",
            &json!({"name": "Mug", "description": "Stoneware"}),
            Some(&cookie),
        )
        .await?;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    Ok(())
}
