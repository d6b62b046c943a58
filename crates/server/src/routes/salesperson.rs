//! Salesperson dashboard route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use bazaar_core::pricing;
use bazaar_core::{Money, Percent};
use bazaar_core::analytics::{self, CommissionSummary, MonthBucket};

use crate::db::{OrderRepository, SaleScope, SalespersonRepository};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{RequireArea, SalespersonArea};
use crate::models::Order;
use crate::routes::Layout;
use crate::state::AppState;

/// Months shown on the commission chart.
const CHART_MONTHS: u32 = 6;

/// Orders shown on the dashboard.
const RECENT_ORDERS: usize = 10;

/// Salesperson dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "salesperson/dashboard.html")]
pub struct DashboardTemplate {
    pub layout: Layout,
    pub rate: Percent,
    pub region: Option<String>,
    pub summary: CommissionSummary,
    pub months: Vec<MonthBucket>,
    pub recent_orders: Vec<Order>,
}

/// Attributed orders template.
#[derive(Template, WebTemplate)]
#[template(path = "salesperson/orders.html")]
pub struct OrdersTemplate {
    pub layout: Layout,
    pub orders: Vec<Order>,
    pub rate: Percent,
}

impl OrdersTemplate {
    /// Commission earned on one order; nothing for cancelled orders.
    fn commission(&self, order: &Order) -> Money {
        if order.status.counts_as_sale() {
            pricing::commission(order.total, self.rate)
        } else {
            Money::ZERO
        }
    }
}

/// Commission rate and region; the configured default when no profile exists.
async fn rate_and_region(
    state: &AppState,
    user_id: bazaar_core::UserId,
) -> Result<(Percent, Option<String>), AppError> {
    let profile = SalespersonRepository::new(state.pool())
        .get_by_user(user_id)
        .await?;
    Ok(profile.map_or_else(
        || (state.commerce().default_sales_commission, None),
        |p| (p.commission_rate, p.region),
    ))
}

/// Display commission earned on attributed sales.
pub async fn dashboard(
    State(state): State<AppState>,
    area: RequireArea<SalespersonArea>,
    layout: Layout,
) -> Result<Response, AppError> {
    let user = area.into_user();
    let (rate, region) = rate_and_region(&state, user.id).await?;

    let orders = OrderRepository::new(state.pool());
    let records = orders.sale_records(SaleScope::Salesperson(user.id)).await?;
    let mut recent_orders = orders.list_for_salesperson(user.id).await?;
    recent_orders.truncate(RECENT_ORDERS);

    Ok(DashboardTemplate {
        layout,
        rate,
        region,
        summary: analytics::commission_summary(&records, rate),
        months: analytics::trailing_months(&records, Utc::now(), CHART_MONTHS),
        recent_orders,
    }
    .into_response())
}

/// Display every attributed order.
pub async fn orders(
    State(state): State<AppState>,
    area: RequireArea<SalespersonArea>,
    layout: Layout,
) -> Result<Response, AppError> {
    let user = area.into_user();
    let (rate, _) = rate_and_region(&state, user.id).await?;
    let orders = OrderRepository::new(state.pool())
        .list_for_salesperson(user.id)
        .await?;

    Ok(OrdersTemplate {
        layout,
        orders,
        rate,
    }
    .into_response())
}
