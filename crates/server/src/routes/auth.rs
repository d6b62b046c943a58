//! Authentication route handlers.
//!
//! Password sign-in and customer self-registration. Vendor, salesperson and
//! admin accounts are created by admins or the CLI.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::{AppError, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{clear_current_user, login_url, set_current_user};
use crate::models::CurrentUser;
use crate::routes::{Layout, MessageQuery, redirect_error, redirect_success, safe_next};
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub next: Option<String>,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Login page query: flash codes plus where to go afterwards.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub error: Option<String>,
    pub success: Option<String>,
    pub next: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub error: Option<String>,
    pub success: Option<String>,
    pub next: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub layout: Layout,
    pub error: Option<String>,
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(layout: Layout, Query(query): Query<LoginQuery>) -> impl IntoResponse {
    let messages = MessageQuery {
        error: query.error,
        success: query.success,
    };
    LoginTemplate {
        layout,
        error: messages.error_message(),
        success: messages.success_message(),
        next: safe_next(query.next.as_deref()).map(String::from),
    }
}

/// Handle login form submission.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let next = safe_next(form.next.as_deref()).map(String::from);

    let user = match AuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await
    {
        Ok(user) => user,
        Err(AuthError::InvalidCredentials | AuthError::InvalidEmail(_)) => {
            tracing::info!("Login failed");
            let path = next.map_or_else(|| "/auth/login".to_owned(), |n| login_url(&n));
            return Ok(redirect_error(&path, "credentials").into_response());
        }
        Err(e) => return Err(e.into()),
    };

    let current = CurrentUser::from(&user);
    if let Err(e) = set_current_user(&session, &current).await {
        tracing::error!(error = %e, "Failed to set session");
        return Ok(redirect_error("/auth/login", "session").into_response());
    }
    set_sentry_user(user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, role = %user.role, "User signed in");

    let target = next.unwrap_or_else(|| user.role.home_path().to_owned());
    Ok(Redirect::to(&target).into_response())
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(layout: Layout, Query(query): Query<MessageQuery>) -> impl IntoResponse {
    RegisterTemplate {
        layout,
        error: query.error_message(),
    }
}

/// Handle registration form submission. New accounts are customers.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    if form.password != form.password_confirm {
        return Ok(redirect_error("/auth/register", "password_mismatch").into_response());
    }

    let user = match AuthService::new(state.pool())
        .register(&form.email, &form.name, &form.password)
        .await
    {
        Ok(user) => user,
        Err(e) => match e.form_code() {
            Some(code) => return Ok(redirect_error("/auth/register", code).into_response()),
            None => return Err(e.into()),
        },
    };

    set_current_user(&session, &CurrentUser::from(&user)).await?;
    set_sentry_user(user.id, Some(user.email.as_str()));
    tracing::info!(user_id = %user.id, "Customer registered");

    Ok(redirect_success("/", "registered").into_response())
}

// =============================================================================
// Logout
// =============================================================================

/// Sign out and drop the whole session.
pub async fn logout(session: Session) -> Result<Redirect, AppError> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(redirect_success("/auth/login", "logged_out"))
}
