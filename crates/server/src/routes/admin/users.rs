//! Admin account management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use bazaar_core::{Role, UserId};

use crate::db::{RepositoryError, SalespersonRepository, UserRepository};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{AdminArea, RequireArea};
use crate::models::User;
use crate::routes::{Layout, MessageQuery, redirect_error, redirect_success};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Users page query.
#[derive(Debug, Default, Deserialize)]
pub struct UsersQuery {
    pub role: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Users page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/users.html")]
pub struct UsersTemplate {
    pub layout: Layout,
    pub users: Vec<User>,
    pub roles: &'static [Role],
    pub selected_role: Option<Role>,
    pub error: Option<String>,
    pub success: Option<String>,
}

impl UsersTemplate {
    fn is_role(&self, role: &Role) -> bool {
        self.selected_role == Some(*role)
    }
}

/// Account creation form.
#[derive(Debug, Deserialize)]
pub struct CreateUserForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

/// Role change form.
#[derive(Debug, Deserialize)]
pub struct RoleForm {
    pub role: String,
}

/// List accounts, optionally filtered by role.
pub async fn index(
    State(state): State<AppState>,
    _area: RequireArea<AdminArea>,
    layout: Layout,
    Query(query): Query<UsersQuery>,
) -> Result<Response, AppError> {
    let selected_role = query.role.as_deref().and_then(|r| r.parse().ok());
    let users = UserRepository::new(state.pool()).list(selected_role).await?;
    let messages = MessageQuery {
        error: query.error,
        success: query.success,
    };

    Ok(UsersTemplate {
        layout,
        users,
        roles: Role::ALL,
        selected_role,
        error: messages.error_message(),
        success: messages.success_message(),
    }
    .into_response())
}

/// Create an account with any role.
pub async fn create(
    State(state): State<AppState>,
    area: RequireArea<AdminArea>,
    Form(form): Form<CreateUserForm>,
) -> Result<Redirect, AppError> {
    let Ok(role) = form.role.parse::<Role>() else {
        return Ok(redirect_error("/admin/users", "invalid"));
    };

    let user = match AuthService::new(state.pool())
        .create_account(&form.email, &form.name, role, &form.password)
        .await
    {
        Ok(user) => user,
        Err(e) => match e.form_code() {
            Some(code) => return Ok(redirect_error("/admin/users", code)),
            None => return Err(e.into()),
        },
    };

    if role == Role::Salesperson {
        ensure_salesperson_profile(&state, user.id).await?;
    }
    tracing::info!(admin_id = %area.0.id, user_id = %user.id, role = %role, "Account created by admin");
    Ok(redirect_success("/admin/users", "created"))
}

/// Change an account's role. Admins cannot change their own.
pub async fn set_role(
    State(state): State<AppState>,
    area: RequireArea<AdminArea>,
    Path(id): Path<UserId>,
    Form(form): Form<RoleForm>,
) -> Result<Redirect, AppError> {
    let admin = area.into_user();
    if admin.id == id {
        return Ok(redirect_error("/admin/users", "own_role"));
    }
    let Ok(role) = form.role.parse::<Role>() else {
        return Ok(redirect_error("/admin/users", "invalid"));
    };

    match UserRepository::new(state.pool()).set_role(id, role).await {
        Ok(_) => {}
        Err(RepositoryError::NotFound) => return Ok(redirect_error("/admin/users", "not_found")),
        Err(e) => return Err(e.into()),
    }
    if role == Role::Salesperson {
        ensure_salesperson_profile(&state, id).await?;
    }

    tracing::info!(admin_id = %admin.id, user_id = %id, role = %role, "Role changed");
    Ok(redirect_success("/admin/users", "saved"))
}

/// Give a new salesperson the default commission rate unless they already
/// have a profile.
async fn ensure_salesperson_profile(state: &AppState, user_id: UserId) -> Result<(), AppError> {
    let repo = SalespersonRepository::new(state.pool());
    if repo.get_by_user(user_id).await?.is_none() {
        repo.upsert(user_id, state.commerce().default_sales_commission, None)
            .await?;
    }
    Ok(())
}
