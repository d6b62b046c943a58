//! Admin dashboard: platform-wide metrics.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use bazaar_core::analytics::{self, ItemSale, MonthBucket};
use bazaar_core::{Money, OrderStatus, ProductStatus, Role};

use crate::db::{OrderRepository, ProductRepository, SaleScope, UserRepository};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{AdminArea, RequireArea};
use crate::routes::Layout;
use crate::state::AppState;

/// Months shown on the revenue chart.
const CHART_MONTHS: u32 = 12;

/// Best sellers shown.
const TOP_PRODUCTS: usize = 10;

/// Admin dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub layout: Layout,
    pub revenue: Money,
    pub order_count: usize,
    pub average_order: Money,
    pub months: Vec<MonthBucket>,
    pub top_products: Vec<ItemSale>,
    pub users_by_role: Vec<(Role, i64)>,
    pub products_by_status: Vec<(ProductStatus, i64)>,
    pub orders_by_status: Vec<(OrderStatus, i64)>,
}

/// Display platform metrics.
pub async fn dashboard(
    State(state): State<AppState>,
    _area: RequireArea<AdminArea>,
    layout: Layout,
) -> Result<Response, AppError> {
    let orders = OrderRepository::new(state.pool());
    let records = orders.sale_records(SaleScope::Platform).await?;
    let items = orders.item_sales(None).await?;

    Ok(DashboardTemplate {
        layout,
        revenue: analytics::total_revenue(&records),
        order_count: records.len(),
        average_order: analytics::average_order_value(&records),
        months: analytics::trailing_months(&records, Utc::now(), CHART_MONTHS),
        top_products: analytics::top_products(&items, TOP_PRODUCTS),
        users_by_role: UserRepository::new(state.pool()).count_by_role().await?,
        products_by_status: ProductRepository::new(state.pool())
            .count_by_status()
            .await?,
        orders_by_status: orders.count_by_status().await?,
    }
    .into_response())
}
