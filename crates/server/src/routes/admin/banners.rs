//! Admin homepage banners.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use bazaar_core::BannerId;

use crate::db::{BannerRepository, RepositoryError};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{AdminArea, RequireArea};
use crate::models::Banner;
use crate::routes::{Layout, MessageQuery, non_empty, redirect_error, redirect_success};
use crate::state::AppState;

const BACK: &str = "/admin/banners";

/// Banners page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/banners.html")]
pub struct BannersTemplate {
    pub layout: Layout,
    pub banners: Vec<Banner>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// New banner form.
#[derive(Debug, Deserialize)]
pub struct BannerForm {
    pub title: String,
    pub image_url: String,
    pub link_url: Option<String>,
    #[serde(default)]
    pub position: i32,
}

/// List all banners, shown and hidden.
pub async fn index(
    State(state): State<AppState>,
    _area: RequireArea<AdminArea>,
    layout: Layout,
    Query(message): Query<MessageQuery>,
) -> Result<Response, AppError> {
    let banners = BannerRepository::new(state.pool()).list_all().await?;
    Ok(BannersTemplate {
        layout,
        banners,
        error: message.error_message(),
        success: message.success_message(),
    }
    .into_response())
}

/// Add a banner.
pub async fn create(
    State(state): State<AppState>,
    _area: RequireArea<AdminArea>,
    Form(form): Form<BannerForm>,
) -> Result<Redirect, AppError> {
    let title = form.title.trim();
    let image_url = form.image_url.trim();
    if title.is_empty() || image_url.is_empty() {
        return Ok(redirect_error(BACK, "invalid"));
    }
    let link_url = non_empty(form.link_url);

    let banner = BannerRepository::new(state.pool())
        .create(title, image_url, link_url.as_deref(), form.position)
        .await?;
    state.invalidate_banners().await;
    tracing::info!(banner_id = %banner.id, "Banner created");
    Ok(redirect_success(BACK, "created"))
}

/// Show or hide a banner.
pub async fn toggle(
    State(state): State<AppState>,
    _area: RequireArea<AdminArea>,
    Path(id): Path<BannerId>,
) -> Result<Redirect, AppError> {
    match BannerRepository::new(state.pool()).toggle(id).await {
        Ok(banner) => {
            state.invalidate_banners().await;
            tracing::info!(banner_id = %banner.id, active = banner.active, "Banner toggled");
            Ok(redirect_success(BACK, "saved"))
        }
        Err(RepositoryError::NotFound) => Ok(redirect_error(BACK, "not_found")),
        Err(e) => Err(e.into()),
    }
}

/// Remove a banner.
pub async fn delete(
    State(state): State<AppState>,
    _area: RequireArea<AdminArea>,
    Path(id): Path<BannerId>,
) -> Result<Redirect, AppError> {
    match BannerRepository::new(state.pool()).delete(id).await {
        Ok(()) => {
            state.invalidate_banners().await;
            Ok(redirect_success(BACK, "deleted"))
        }
        Err(RepositoryError::NotFound) => Ok(redirect_error(BACK, "not_found")),
        Err(e) => Err(e.into()),
    }
}
