//! AI suggestion endpoints for the product editor.
//!
//! Vendors and admins only. Each call spends one request of the shared
//! per-minute budget.

use axum::{Json, extract::State};
use serde::Deserialize;

use bazaar_core::{CategoryId, ProductId};

use super::ApiError;
use crate::ai::{
    DescriptionRequest, PriceRequest, PriceSuggestion, ProductDescription, ProductTags,
    TagsRequest,
};
use crate::db::ProductRepository;
use crate::error::AppError;
use crate::middleware::{RequireArea, VendorArea};
use crate::state::AppState;

/// Similar listed prices sent along with a price request.
const COMPARABLE_PRICES: i64 = 20;

/// Price suggestion body: the request plus what to compare against.
#[derive(Debug, Deserialize)]
pub struct PriceSuggestionBody {
    #[serde(flatten)]
    pub request: PriceRequest,
    /// Compare with listed products in this category.
    pub category_id: Option<CategoryId>,
    /// The product being edited, left out of the comparison.
    pub product_id: Option<ProductId>,
}

/// Suggest a product description.
pub async fn product_description(
    State(state): State<AppState>,
    _area: RequireArea<VendorArea>,
    Json(request): Json<DescriptionRequest>,
) -> Result<Json<ProductDescription>, ApiError> {
    require_name(&request.name)?;
    let description = state.ai().product_description(&request).await?;
    Ok(Json(description))
}

/// Suggest search tags.
pub async fn product_tags(
    State(state): State<AppState>,
    _area: RequireArea<VendorArea>,
    Json(request): Json<TagsRequest>,
) -> Result<Json<ProductTags>, ApiError> {
    require_name(&request.name)?;
    let tags = state.ai().product_tags(&request).await?;
    Ok(Json(tags))
}

/// Suggest a price range, informed by similar products' prices.
pub async fn price_suggestion(
    State(state): State<AppState>,
    _area: RequireArea<VendorArea>,
    Json(body): Json<PriceSuggestionBody>,
) -> Result<Json<PriceSuggestion>, ApiError> {
    let mut request = body.request;
    require_name(&request.name)?;

    if let Some(category_id) = body.category_id {
        if request.category.is_none() {
            request.category = state
                .categories()
                .await?
                .iter()
                .find(|c| c.id == category_id)
                .map(|c| c.name.clone());
        }
        request.comparable_prices = ProductRepository::new(state.pool())
            .comparable_prices(category_id, body.product_id, COMPARABLE_PRICES)
            .await?;
    }

    let suggestion = state.ai().price_suggestion(&request).await?;
    Ok(Json(suggestion))
}

fn require_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(AppError::BadRequest("product name is required".to_owned()).into());
    }
    Ok(())
}
