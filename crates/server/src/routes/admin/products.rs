//! Admin product moderation.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use bazaar_core::{ProductId, ProductStatus};

use crate::db::{ProductRepository, RepositoryError};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{AdminArea, RequireArea};
use crate::models::Product;
use crate::routes::{Layout, MessageQuery, redirect_error, redirect_success};
use crate::state::AppState;

const BACK: &str = "/admin/products";

/// Products page query.
#[derive(Debug, Default, Deserialize)]
pub struct ProductsQuery {
    pub status: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Products page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products.html")]
pub struct ProductsTemplate {
    pub layout: Layout,
    pub products: Vec<Product>,
    pub statuses: &'static [ProductStatus],
    pub selected_status: Option<ProductStatus>,
    pub error: Option<String>,
    pub success: Option<String>,
}

impl ProductsTemplate {
    fn is_status(&self, status: &ProductStatus) -> bool {
        self.selected_status == Some(*status)
    }
}

/// Product status form.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// List every product, optionally one status only.
pub async fn index(
    State(state): State<AppState>,
    _area: RequireArea<AdminArea>,
    layout: Layout,
    Query(query): Query<ProductsQuery>,
) -> Result<Response, AppError> {
    let selected_status = query.status.as_deref().and_then(|s| s.parse().ok());
    let products = ProductRepository::new(state.pool())
        .list_all(selected_status)
        .await?;
    let messages = MessageQuery {
        error: query.error,
        success: query.success,
    };

    Ok(ProductsTemplate {
        layout,
        products,
        statuses: ProductStatus::ALL,
        selected_status,
        error: messages.error_message(),
        success: messages.success_message(),
    }
    .into_response())
}

/// Publish, unpublish or archive any product.
pub async fn set_status(
    State(state): State<AppState>,
    area: RequireArea<AdminArea>,
    Path(id): Path<ProductId>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect, AppError> {
    let Ok(status) = form.status.parse::<ProductStatus>() else {
        return Ok(redirect_error(BACK, "invalid"));
    };

    match ProductRepository::new(state.pool()).set_status(id, status).await {
        Ok(()) => {
            tracing::info!(admin_id = %area.0.id, product_id = %id, status = %status, "Product status changed");
            Ok(redirect_success(BACK, "saved"))
        }
        Err(RepositoryError::NotFound) => Ok(redirect_error(BACK, "not_found")),
        Err(e) => Err(e.into()),
    }
}
