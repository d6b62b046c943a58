//! Admin salesperson settings.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use bazaar_core::{Percent, Role, UserId};

use crate::db::{RepositoryError, SalespersonRepository, UserRepository};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{AdminArea, RequireArea};
use crate::models::{SalespersonProfile, User};
use crate::routes::{Layout, MessageQuery, non_empty, redirect_error, redirect_success};
use crate::state::AppState;

const BACK: &str = "/admin/salespeople";

/// Salespeople page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/salespeople.html")]
pub struct SalespeopleTemplate {
    pub layout: Layout,
    pub profiles: Vec<SalespersonProfile>,
    /// Salesperson accounts that have no profile yet.
    pub unconfigured: Vec<User>,
    pub default_rate: Percent,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Commission settings form.
#[derive(Debug, Deserialize)]
pub struct SalespersonForm {
    pub commission_rate: String,
    pub region: Option<String>,
}

/// List salespeople and their commission settings.
pub async fn index(
    State(state): State<AppState>,
    _area: RequireArea<AdminArea>,
    layout: Layout,
    Query(message): Query<MessageQuery>,
) -> Result<Response, AppError> {
    let profiles = SalespersonRepository::new(state.pool()).list().await?;
    let unconfigured = UserRepository::new(state.pool())
        .list(Some(Role::Salesperson))
        .await?
        .into_iter()
        .filter(|u| profiles.iter().all(|p| p.user_id != u.id))
        .collect();

    Ok(SalespeopleTemplate {
        layout,
        profiles,
        unconfigured,
        default_rate: state.commerce().default_sales_commission,
        error: message.error_message(),
        success: message.success_message(),
    }
    .into_response())
}

/// Set a salesperson's commission rate and region.
pub async fn upsert(
    State(state): State<AppState>,
    _area: RequireArea<AdminArea>,
    Path(user_id): Path<UserId>,
    Form(form): Form<SalespersonForm>,
) -> Result<Redirect, AppError> {
    let Ok(rate) = form.commission_rate.parse::<Percent>() else {
        return Ok(redirect_error(BACK, "invalid"));
    };
    let region = non_empty(form.region);

    match SalespersonRepository::new(state.pool())
        .upsert(user_id, rate, region.as_deref())
        .await
    {
        Ok(profile) => {
            tracing::info!(user_id = %profile.user_id, rate = %profile.commission_rate, "Salesperson updated");
            Ok(redirect_success(BACK, "saved"))
        }
        Err(RepositoryError::NotFound) => Ok(redirect_error(BACK, "not_found")),
        Err(e) => Err(e.into()),
    }
}
