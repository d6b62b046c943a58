//! Vendor dashboard route handlers.
//!
//! Everything here is scoped to the signed-in user's store. Pages other than
//! the store profile need the store to exist first.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;

use bazaar_core::analytics::{self, CommissionSummary, ItemSale, MonthBucket};
use bazaar_core::{CategoryId, Money, ProductId, ProductStatus, is_valid_slug, slugify};

use crate::ai::normalize_tags;
use crate::db::{
    OrderRepository, ProductRepository, RepositoryError, SaleScope, StoreDetails, VendorRepository,
};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{RequireArea, VendorArea};
use crate::models::{
    Category, CurrentUser, OrderItem, OrderWithItems, Product, ProductInput, VendorProfile,
};
use crate::routes::{Layout, MessageQuery, non_empty, redirect_error, redirect_success};
use crate::state::AppState;

/// Months shown on the earnings chart.
const CHART_MONTHS: u32 = 6;

/// Best sellers shown on the dashboard.
const TOP_PRODUCTS: usize = 5;

/// Stock at or below this is flagged on the dashboard.
const LOW_STOCK: i32 = 5;

// =============================================================================
// Templates
// =============================================================================

/// Vendor dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "vendor/dashboard.html")]
pub struct DashboardTemplate {
    pub layout: Layout,
    pub vendor: VendorProfile,
    pub summary: CommissionSummary,
    pub average_order: Money,
    pub months: Vec<MonthBucket>,
    pub top_products: Vec<ItemSale>,
    pub low_stock: Vec<Product>,
    pub product_count: usize,
}

/// Own catalog template.
#[derive(Template, WebTemplate)]
#[template(path = "vendor/products.html")]
pub struct ProductsTemplate {
    pub layout: Layout,
    pub products: Vec<Product>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// New/edit product form template.
#[derive(Template, WebTemplate)]
#[template(path = "vendor/product_form.html")]
pub struct ProductFormTemplate {
    pub layout: Layout,
    /// `None` when creating.
    pub product_id: Option<ProductId>,
    pub form: ProductForm,
    pub categories: Arc<Vec<Category>>,
    pub statuses: &'static [ProductStatus],
    pub ai_enabled: bool,
    pub error: Option<String>,
}

impl ProductFormTemplate {
    fn is_status(&self, status: &ProductStatus) -> bool {
        self.form.status == status.as_str()
            || (self.form.status.is_empty() && *status == ProductStatus::Draft)
    }

    fn action(&self) -> String {
        self.product_id.map_or_else(
            || "/vendor/products/new".to_owned(),
            |id| format!("/vendor/products/{id}/edit"),
        )
    }
}

/// Vendor orders template.
#[derive(Template, WebTemplate)]
#[template(path = "vendor/orders.html")]
pub struct OrdersTemplate {
    pub layout: Layout,
    pub vendor: VendorProfile,
    pub orders: Vec<OrderWithItems>,
}

impl OrdersTemplate {
    /// This store's lines of an order.
    fn own_items<'a>(&self, order: &'a OrderWithItems) -> Vec<&'a OrderItem> {
        order
            .items
            .iter()
            .filter(|i| i.vendor_id == self.vendor.id)
            .collect()
    }

    fn share(&self, order: &OrderWithItems) -> Money {
        order.vendor_subtotal(self.vendor.id)
    }
}

/// Store profile template.
#[derive(Template, WebTemplate)]
#[template(path = "vendor/profile.html")]
pub struct ProfileTemplate {
    pub layout: Layout,
    pub vendor: Option<VendorProfile>,
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Forms
// =============================================================================

/// Product editor fields as typed. Kept as text so the form can be shown
/// again unchanged when validation fails.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub compare_at_price: String,
    #[serde(default)]
    pub stock: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub tags: String,
}

impl ProductForm {
    fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            slug: product.slug.clone(),
            description: product.description.clone(),
            price: product.price.amount().to_string(),
            compare_at_price: product
                .compare_at_price
                .map(|p| p.amount().to_string())
                .unwrap_or_default(),
            stock: product.stock.to_string(),
            image_url: product.image_url.clone().unwrap_or_default(),
            category_id: product
                .category_id
                .map(|id| id.to_string())
                .unwrap_or_default(),
            status: product.status.to_string(),
            tags: product.tags.join(", "),
        }
    }

    /// Whether `category` is the selected one, for the `<select>`.
    #[must_use]
    pub fn is_category(&self, category: &Category) -> bool {
        self.category_id == category.id.to_string()
    }

    /// Validate into repository input.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn parse(&self) -> Result<ProductInput, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("Name is required.".to_owned());
        }

        let slug = match self.slug.trim() {
            "" => slugify(name),
            s => s.to_owned(),
        };
        if !is_valid_slug(&slug) {
            return Err("Slug may only contain lowercase letters, digits and single hyphens.".to_owned());
        }

        let price: Money = self
            .price
            .trim()
            .parse()
            .map_err(|_| "Price must be an amount like 12.50.".to_owned())?;
        if price.is_zero() {
            return Err("Price must be greater than zero.".to_owned());
        }

        let compare_at_price = match self.compare_at_price.trim() {
            "" => None,
            s => Some(
                s.parse::<Money>()
                    .map_err(|_| "Compare-at price must be an amount like 15.00.".to_owned())?,
            ),
        };

        let stock = match self.stock.trim() {
            "" => 0,
            s => s
                .parse::<i32>()
                .ok()
                .filter(|n| *n >= 0)
                .ok_or_else(|| "Stock must be a whole number, 0 or more.".to_owned())?,
        };

        let category_id = match self.category_id.trim() {
            "" => None,
            s => Some(CategoryId::new(
                s.parse::<i32>()
                    .map_err(|_| "Unknown category.".to_owned())?,
            )),
        };

        let status = match self.status.trim() {
            "" => ProductStatus::Draft,
            s => s
                .parse::<ProductStatus>()
                .map_err(|_| "Unknown status.".to_owned())?,
        };

        let tags = normalize_tags(self.tags.split(',').map(String::from)).unwrap_or_default();

        Ok(ProductInput {
            category_id,
            name: name.to_owned(),
            slug,
            description: self.description.trim().to_owned(),
            price,
            compare_at_price,
            stock,
            image_url: non_empty(Some(self.image_url.clone())),
            status,
            tags,
        })
    }
}

/// Store profile form data.
#[derive(Debug, Deserialize)]
pub struct ProfileForm {
    pub store_name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
}

// =============================================================================
// Helpers
// =============================================================================

/// The user's store, or a redirect to the profile page to create one.
async fn require_store(state: &AppState, user: &CurrentUser) -> Result<Result<VendorProfile, Redirect>, AppError> {
    let vendor = VendorRepository::new(state.pool())
        .get_by_user(user.id)
        .await?;
    Ok(vendor.ok_or_else(|| redirect_error("/vendor/profile", "store_required")))
}

/// A product of this store, or 404.
async fn own_product(
    state: &AppState,
    vendor: &VendorProfile,
    id: ProductId,
) -> Result<Product, AppError> {
    ProductRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .filter(|p| p.vendor_id == vendor.id)
        .ok_or(AppError::Database(RepositoryError::NotFound))
}

// =============================================================================
// Dashboard
// =============================================================================

/// Display earnings, best sellers and low-stock products.
pub async fn dashboard(
    State(state): State<AppState>,
    area: RequireArea<VendorArea>,
    layout: Layout,
) -> Result<Response, AppError> {
    let user = area.into_user();
    let vendor = match require_store(&state, &user).await? {
        Ok(vendor) => vendor,
        Err(redirect) => return Ok(redirect.into_response()),
    };

    let orders = OrderRepository::new(state.pool());
    let records = orders.sale_records(SaleScope::Vendor(vendor.id)).await?;
    let items = orders.item_sales(Some(vendor.id)).await?;
    let products = ProductRepository::new(state.pool())
        .list_by_vendor(vendor.id)
        .await?;

    let summary = analytics::commission_summary(&records, vendor.commission_rate);
    let product_count = products.len();
    let low_stock = products
        .into_iter()
        .filter(|p| p.status == ProductStatus::Active && p.stock <= LOW_STOCK)
        .collect();

    Ok(DashboardTemplate {
        layout,
        average_order: analytics::average_order_value(&records),
        months: analytics::trailing_months(&records, Utc::now(), CHART_MONTHS),
        top_products: analytics::top_products(&items, TOP_PRODUCTS),
        summary,
        vendor,
        low_stock,
        product_count,
    }
    .into_response())
}

// =============================================================================
// Products
// =============================================================================

/// Display the store's products, whatever their status.
pub async fn products(
    State(state): State<AppState>,
    area: RequireArea<VendorArea>,
    layout: Layout,
    Query(message): Query<MessageQuery>,
) -> Result<Response, AppError> {
    let user = area.into_user();
    let vendor = match require_store(&state, &user).await? {
        Ok(vendor) => vendor,
        Err(redirect) => return Ok(redirect.into_response()),
    };
    let products = ProductRepository::new(state.pool())
        .list_by_vendor(vendor.id)
        .await?;

    Ok(ProductsTemplate {
        layout,
        products,
        error: message.error_message(),
        success: message.success_message(),
    }
    .into_response())
}

/// Display the new product form.
pub async fn new_product(
    State(state): State<AppState>,
    area: RequireArea<VendorArea>,
    layout: Layout,
) -> Result<Response, AppError> {
    let user = area.into_user();
    if let Err(redirect) = require_store(&state, &user).await? {
        return Ok(redirect.into_response());
    }

    Ok(ProductFormTemplate {
        layout,
        product_id: None,
        form: ProductForm {
            stock: "0".to_owned(),
            status: ProductStatus::Draft.to_string(),
            ..ProductForm::default()
        },
        categories: state.categories().await?,
        statuses: ProductStatus::ALL,
        ai_enabled: state.ai().is_enabled(),
        error: None,
    }
    .into_response())
}

/// Handle the new product form.
pub async fn create_product(
    State(state): State<AppState>,
    area: RequireArea<VendorArea>,
    layout: Layout,
    Form(form): Form<ProductForm>,
) -> Result<Response, AppError> {
    let user = area.into_user();
    let vendor = match require_store(&state, &user).await? {
        Ok(vendor) => vendor,
        Err(redirect) => return Ok(redirect.into_response()),
    };

    let error = match form.parse() {
        Ok(input) => match ProductRepository::new(state.pool()).create(vendor.id, &input).await {
            Ok(product) => {
                tracing::info!(product_id = %product.id, vendor_id = %vendor.id, "Product created");
                return Ok(redirect_success("/vendor/products", "created").into_response());
            }
            Err(RepositoryError::Conflict(msg)) => msg,
            Err(e) => return Err(e.into()),
        },
        Err(msg) => msg,
    };

    Ok(ProductFormTemplate {
        layout,
        product_id: None,
        form,
        categories: state.categories().await?,
        statuses: ProductStatus::ALL,
        ai_enabled: state.ai().is_enabled(),
        error: Some(error),
    }
    .into_response())
}

/// Display the edit form for one of the store's products.
pub async fn edit_product(
    State(state): State<AppState>,
    area: RequireArea<VendorArea>,
    layout: Layout,
    Path(id): Path<ProductId>,
) -> Result<Response, AppError> {
    let user = area.into_user();
    let vendor = match require_store(&state, &user).await? {
        Ok(vendor) => vendor,
        Err(redirect) => return Ok(redirect.into_response()),
    };
    let product = own_product(&state, &vendor, id).await?;

    Ok(ProductFormTemplate {
        layout,
        product_id: Some(product.id),
        form: ProductForm::from_product(&product),
        categories: state.categories().await?,
        statuses: ProductStatus::ALL,
        ai_enabled: state.ai().is_enabled(),
        error: None,
    }
    .into_response())
}

/// Handle the edit form.
pub async fn update_product(
    State(state): State<AppState>,
    area: RequireArea<VendorArea>,
    layout: Layout,
    Path(id): Path<ProductId>,
    Form(form): Form<ProductForm>,
) -> Result<Response, AppError> {
    let user = area.into_user();
    let vendor = match require_store(&state, &user).await? {
        Ok(vendor) => vendor,
        Err(redirect) => return Ok(redirect.into_response()),
    };

    let error = match form.parse() {
        Ok(input) => match ProductRepository::new(state.pool())
            .update(vendor.id, id, &input)
            .await
        {
            Ok(product) => {
                tracing::info!(product_id = %product.id, vendor_id = %vendor.id, "Product updated");
                return Ok(redirect_success("/vendor/products", "saved").into_response());
            }
            Err(RepositoryError::Conflict(msg)) => msg,
            Err(e) => return Err(e.into()),
        },
        Err(msg) => msg,
    };

    Ok(ProductFormTemplate {
        layout,
        product_id: Some(id),
        form,
        categories: state.categories().await?,
        statuses: ProductStatus::ALL,
        ai_enabled: state.ai().is_enabled(),
        error: Some(error),
    }
    .into_response())
}

/// Delete one of the store's products. Products that were ordered stay;
/// the vendor is asked to archive them instead.
pub async fn delete_product(
    State(state): State<AppState>,
    area: RequireArea<VendorArea>,
    Path(id): Path<ProductId>,
) -> Result<Response, AppError> {
    let user = area.into_user();
    let vendor = match require_store(&state, &user).await? {
        Ok(vendor) => vendor,
        Err(redirect) => return Ok(redirect.into_response()),
    };

    match ProductRepository::new(state.pool()).delete(vendor.id, id).await {
        Ok(()) => {
            tracing::info!(product_id = %id, vendor_id = %vendor.id, "Product deleted");
            Ok(redirect_success("/vendor/products", "deleted").into_response())
        }
        Err(RepositoryError::Conflict(_)) => {
            Ok(redirect_error("/vendor/products", "in_use").into_response())
        }
        Err(RepositoryError::NotFound) => {
            Ok(redirect_error("/vendor/products", "not_found").into_response())
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Orders
// =============================================================================

/// Display orders containing the store's products, with only its own lines.
pub async fn orders(
    State(state): State<AppState>,
    area: RequireArea<VendorArea>,
    layout: Layout,
) -> Result<Response, AppError> {
    let user = area.into_user();
    let vendor = match require_store(&state, &user).await? {
        Ok(vendor) => vendor,
        Err(redirect) => return Ok(redirect.into_response()),
    };
    let orders = OrderRepository::new(state.pool())
        .list_for_vendor(vendor.id)
        .await?;

    Ok(OrdersTemplate {
        layout,
        vendor,
        orders,
    }
    .into_response())
}

// =============================================================================
// Profile
// =============================================================================

/// Display the store profile form.
pub async fn profile(
    State(state): State<AppState>,
    area: RequireArea<VendorArea>,
    layout: Layout,
    Query(message): Query<MessageQuery>,
) -> Result<Response, AppError> {
    let user = area.into_user();
    let vendor = VendorRepository::new(state.pool())
        .get_by_user(user.id)
        .await?;

    Ok(ProfileTemplate {
        layout,
        vendor,
        error: message.error_message(),
        success: message.success_message(),
    }
    .into_response())
}

/// Create or update the store profile. New stores start pending approval.
pub async fn update_profile(
    State(state): State<AppState>,
    area: RequireArea<VendorArea>,
    Form(form): Form<ProfileForm>,
) -> Result<Redirect, AppError> {
    let user = area.into_user();
    let store_name = form.store_name.trim();
    if store_name.is_empty() {
        return Ok(redirect_error("/vendor/profile", "invalid"));
    }
    let slug = match form.slug.trim() {
        "" => slugify(store_name),
        s => s.to_owned(),
    };
    if !is_valid_slug(&slug) {
        return Ok(redirect_error("/vendor/profile", "invalid"));
    }

    let details = StoreDetails {
        store_name: store_name.to_owned(),
        slug,
        description: form.description.trim().to_owned(),
    };
    match VendorRepository::new(state.pool())
        .upsert(user.id, &details, state.commerce().default_vendor_commission)
        .await
    {
        Ok(vendor) => {
            tracing::info!(vendor_id = %vendor.id, user_id = %user.id, "Store profile saved");
            Ok(redirect_success("/vendor/profile", "saved"))
        }
        Err(RepositoryError::Conflict(_)) => Ok(redirect_error("/vendor/profile", "duplicate")),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> ProductForm {
        ProductForm {
            name: "Blue Mug".to_owned(),
            price: "12.50".to_owned(),
            stock: "3".to_owned(),
            tags: "Kitchen, mug, kitchen".to_owned(),
            ..ProductForm::default()
        }
    }

    #[test]
    fn test_parse_fills_defaults() {
        let input = form().parse().expect("valid");
        assert_eq!(input.slug, "blue-mug");
        assert_eq!(input.status, ProductStatus::Draft);
        assert_eq!(input.tags, vec!["kitchen".to_owned(), "mug".to_owned()]);
        assert_eq!(input.category_id, None);
        assert_eq!(input.image_url, None);
        assert_eq!(input.stock, 3);
    }

    #[test]
    fn test_parse_rejects_bad_fields() {
        let cases = [
            ProductForm {
                name: " ".to_owned(),
                ..form()
            },
            ProductForm {
                price: "0".to_owned(),
                ..form()
            },
            ProductForm {
                price: "abc".to_owned(),
                ..form()
            },
            ProductForm {
                stock: "-1".to_owned(),
                ..form()
            },
            ProductForm {
                slug: "Not A Slug".to_owned(),
                ..form()
            },
            ProductForm {
                status: "sold".to_owned(),
                ..form()
            },
        ];
        for case in cases {
            assert!(case.parse().is_err(), "accepted {case:?}");
        }
    }

    #[test]
    fn test_form_round_trips_product() {
        let product = crate::models::catalog::fixtures::product(4, "9.99", 7);
        let form = ProductForm::from_product(&product);
        let input = form.parse().expect("valid");
        assert_eq!(input.price, product.price);
        assert_eq!(input.slug, product.slug);
        assert_eq!(input.stock, 7);
        assert_eq!(input.status, product.status);
    }
}
