//! Account route handlers.
//!
//! Every role has an account area; it shows the orders the user placed.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};

use bazaar_core::{OrderId, OrderStatus, Role};

use crate::db::{OrderRepository, RepositoryError};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{AccountArea, RequireArea};
use crate::models::{Order, OrderWithItems};
use crate::routes::{Layout, MessageQuery};
use crate::state::AppState;

/// Orders shown on the account overview.
const RECENT_ORDERS: usize = 5;

/// Account overview template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountIndexTemplate {
    pub layout: Layout,
    pub recent_orders: Vec<Order>,
    pub order_count: usize,
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "account/orders.html")]
pub struct OrdersTemplate {
    pub layout: Layout,
    pub orders: Vec<Order>,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "account/order.html")]
pub struct OrderTemplate {
    pub layout: Layout,
    pub order: OrderWithItems,
    /// Statuses an admin may move the order to; empty for everyone else.
    pub next_statuses: Vec<OrderStatus>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Display the account overview.
pub async fn index(
    State(state): State<AppState>,
    area: RequireArea<AccountArea>,
    layout: Layout,
) -> Result<Response, AppError> {
    let user = area.into_user();
    let mut orders = OrderRepository::new(state.pool())
        .list_for_customer(user.id)
        .await?;
    let order_count = orders.len();
    orders.truncate(RECENT_ORDERS);

    Ok(AccountIndexTemplate {
        layout,
        recent_orders: orders,
        order_count,
    }
    .into_response())
}

/// Display the order history.
pub async fn orders(
    State(state): State<AppState>,
    area: RequireArea<AccountArea>,
    layout: Layout,
) -> Result<Response, AppError> {
    let user = area.into_user();
    let orders = OrderRepository::new(state.pool())
        .list_for_customer(user.id)
        .await?;

    Ok(OrdersTemplate { layout, orders }.into_response())
}

/// Display one order. Visible to its customer, its salesperson and admins.
pub async fn order(
    State(state): State<AppState>,
    area: RequireArea<AccountArea>,
    layout: Layout,
    Path(id): Path<OrderId>,
    Query(message): Query<MessageQuery>,
) -> Result<Response, AppError> {
    let user = area.into_user();
    let order = OrderRepository::new(state.pool())
        .get_with_items(id)
        .await?
        .ok_or(RepositoryError::NotFound)?;

    let is_admin = user.role == Role::Admin;
    let visible = is_admin
        || order.order.customer_id == Some(user.id)
        || order.order.salesperson_id == Some(user.id);
    if !visible {
        // Don't reveal that the order exists.
        return Err(RepositoryError::NotFound.into());
    }

    let next_statuses = if is_admin {
        order.order.status.next_statuses()
    } else {
        Vec::new()
    };

    Ok(OrderTemplate {
        layout,
        order,
        next_statuses,
        error: message.error_message(),
        success: message.success_message(),
    }
    .into_response())
}
