//! Vendor storefront route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};

use crate::db::{ProductQuery, ProductRepository, RepositoryError, VendorRepository};
use crate::error::AppError;
use crate::filters;
use crate::models::{Product, VendorProfile};
use crate::routes::Layout;
use crate::routes::products::{CatalogQuery, Pagination};
use crate::state::AppState;

/// Vendor storefront template.
#[derive(Template, WebTemplate)]
#[template(path = "stores/show.html")]
pub struct StoreTemplate {
    pub layout: Layout,
    pub vendor: VendorProfile,
    pub products: Vec<Product>,
    pub pagination: Pagination,
}

/// Display an approved vendor's listed products.
pub async fn show(
    State(state): State<AppState>,
    layout: Layout,
    Path(slug): Path<String>,
    Query(query): Query<CatalogQuery>,
) -> Result<Response, AppError> {
    let vendor = VendorRepository::new(state.pool())
        .get_by_slug(&slug)
        .await?
        .filter(|v| v.status.can_sell())
        .ok_or(AppError::Database(RepositoryError::NotFound))?;

    let page = query.page.unwrap_or(1).max(1);
    let product_query = ProductQuery {
        vendor_id: Some(vendor.id),
        page,
        ..ProductQuery::default()
    };
    let (products, total) = ProductRepository::new(state.pool())
        .list_active(&product_query)
        .await?;

    Ok(StoreTemplate {
        layout,
        vendor,
        products,
        pagination: Pagination::new(page, total, ProductQuery::DEFAULT_PER_PAGE, &[]),
    }
    .into_response())
}
