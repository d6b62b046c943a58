//! Admin store management: approval and platform fee.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use bazaar_core::{Percent, VendorId, VendorStatus};

use crate::db::{RepositoryError, VendorRepository};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{AdminArea, RequireArea};
use crate::models::VendorProfile;
use crate::routes::{Layout, MessageQuery, redirect_error, redirect_success};
use crate::state::AppState;

const BACK: &str = "/admin/vendors";

/// Vendors page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/vendors.html")]
pub struct VendorsTemplate {
    pub layout: Layout,
    pub vendors: Vec<VendorProfile>,
    pub statuses: &'static [VendorStatus],
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Store status form.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// Platform fee form; a percentage such as `12.5`.
#[derive(Debug, Deserialize)]
pub struct CommissionForm {
    pub commission_rate: String,
}

/// List every store.
pub async fn index(
    State(state): State<AppState>,
    _area: RequireArea<AdminArea>,
    layout: Layout,
    Query(message): Query<MessageQuery>,
) -> Result<Response, AppError> {
    let vendors = VendorRepository::new(state.pool()).list().await?;
    Ok(VendorsTemplate {
        layout,
        vendors,
        statuses: VendorStatus::ALL,
        error: message.error_message(),
        success: message.success_message(),
    }
    .into_response())
}

/// Approve, suspend or reset a store.
pub async fn set_status(
    State(state): State<AppState>,
    _area: RequireArea<AdminArea>,
    Path(id): Path<VendorId>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect, AppError> {
    let Ok(status) = form.status.parse::<VendorStatus>() else {
        return Ok(redirect_error(BACK, "invalid"));
    };
    let result = VendorRepository::new(state.pool())
        .set_status(id, status)
        .await;
    saved(result.map(|v| {
        tracing::info!(vendor_id = %v.id, status = %v.status, "Vendor status changed");
    }))
}

/// Change a store's platform fee.
pub async fn set_commission(
    State(state): State<AppState>,
    _area: RequireArea<AdminArea>,
    Path(id): Path<VendorId>,
    Form(form): Form<CommissionForm>,
) -> Result<Redirect, AppError> {
    let Ok(rate) = form.commission_rate.parse::<Percent>() else {
        return Ok(redirect_error(BACK, "invalid"));
    };
    let result = VendorRepository::new(state.pool())
        .set_commission(id, rate)
        .await;
    saved(result.map(|v| {
        tracing::info!(vendor_id = %v.id, rate = %v.commission_rate, "Vendor commission changed");
    }))
}

fn saved(result: Result<(), RepositoryError>) -> Result<Redirect, AppError> {
    match result {
        Ok(()) => Ok(redirect_success(BACK, "saved")),
        Err(RepositoryError::NotFound) => Ok(redirect_error(BACK, "not_found")),
        Err(e) => Err(e.into()),
    }
}
