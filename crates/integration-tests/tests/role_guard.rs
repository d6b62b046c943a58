//! Protected areas redirect guests to sign-in and wrong roles to their home.

use axum::http::StatusCode;

use bazaar_core::Role;
use bazaar_integration_tests::{TestApp, TestResult, body_text, location};

#[tokio::test]
async fn guests_are_sent_to_login_with_next() -> TestResult<()> {
    let app = TestApp::new()?;
    for path in [
        "/account",
        "/vendor",
        "/vendor/products",
        "/salesperson",
        "/admin/users",
        "/pos",
    ] {
        let response = app.get(path, None).await?;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        let expected = format!("/auth/login?next={}", path.replace('/', "%2F"));
        assert_eq!(location(&response), Some(expected.as_str()), "{path}");
    }
    Ok(())
}

#[tokio::test]
async fn customers_are_sent_home_from_staff_areas() -> TestResult<()> {
    let app = TestApp::new()?;
    let cookie = app.sign_in(Role::Customer).await?;
    for path in ["/vendor", "/salesperson", "/admin", "/pos"] {
        let response = app.get(path, Some(&cookie)).await?;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&response), Some("/account"), "{path}");
    }
    Ok(())
}

#[tokio::test]
async fn vendors_cannot_enter_admin_or_pos() -> TestResult<()> {
    let app = TestApp::new()?;
    let cookie = app.sign_in(Role::Vendor).await?;
    for path in ["/admin", "/admin/orders", "/pos", "/salesperson"] {
        let response = app.get(path, Some(&cookie)).await?;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&response), Some("/vendor"), "{path}");
    }
    Ok(())
}

#[tokio::test]
async fn salespeople_cannot_enter_vendor_or_admin() -> TestResult<()> {
    let app = TestApp::new()?;
    let cookie = app.sign_in(Role::Salesperson).await?;
    for path in ["/vendor", "/admin/vendors"] {
        let response = app.get(path, Some(&cookie)).await?;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&response), Some("/salesperson"), "{path}");
    }
    Ok(())
}

#[tokio::test]
async fn unknown_session_cookie_counts_as_guest() -> TestResult<()> {
    let app = TestApp::new()?;
    let response = app
        .get("/vendor", Some("bazaar_session=not-a-real-session"))
        .await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/auth/login?next=%2Fvendor"));
    Ok(())
}

#[tokio::test]
async fn login_redirect_round_trips_filters() -> TestResult<()> {
    let app = TestApp::new()?;
    let response = app.get("/admin/orders?status=pending", None).await?;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let target = location(&response).unwrap_or_default().to_owned();
    assert_eq!(target, "/auth/login?next=%2Fadmin%2Forders%3Fstatus%3Dpending");

    // The login page decodes it back into the hidden form field.
    let html = body_text(app.get(&target, None).await?).await?;
    assert!(html.contains("/admin/orders?status=pending"));
    Ok(())
}
