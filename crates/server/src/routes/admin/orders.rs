//! Admin order management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use bazaar_core::{OrderId, OrderStatus, SalesChannel};

use crate::db::{OrderFilter, OrderRepository, RepositoryError};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{AdminArea, RequireArea};
use crate::models::Order;
use crate::routes::{Layout, MessageQuery, redirect_error, redirect_success};
use crate::state::AppState;

/// Orders page query.
#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<String>,
    pub channel: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
}

impl OrdersQuery {
    /// The filter, ignoring unknown values.
    #[must_use]
    pub fn filter(&self) -> OrderFilter {
        OrderFilter {
            status: self.status.as_deref().and_then(|s| s.parse().ok()),
            channel: self.channel.as_deref().and_then(|c| c.parse().ok()),
        }
    }
}

/// Orders page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/orders.html")]
pub struct OrdersTemplate {
    pub layout: Layout,
    pub orders: Vec<Order>,
    pub statuses: &'static [OrderStatus],
    pub channels: &'static [SalesChannel],
    pub filter: OrderFilter,
    pub error: Option<String>,
    pub success: Option<String>,
}

impl OrdersTemplate {
    fn is_status(&self, status: &OrderStatus) -> bool {
        self.filter.status == Some(*status)
    }

    fn is_channel(&self, channel: &SalesChannel) -> bool {
        self.filter.channel == Some(*channel)
    }
}

/// Order status form.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

/// List every order, filtered by status and channel.
pub async fn index(
    State(state): State<AppState>,
    _area: RequireArea<AdminArea>,
    layout: Layout,
    Query(query): Query<OrdersQuery>,
) -> Result<Response, AppError> {
    let filter = query.filter();
    let orders = OrderRepository::new(state.pool()).list_all(filter).await?;
    let messages = MessageQuery {
        error: query.error,
        success: query.success,
    };

    Ok(OrdersTemplate {
        layout,
        orders,
        statuses: OrderStatus::ALL,
        channels: SalesChannel::ALL,
        filter,
        error: messages.error_message(),
        success: messages.success_message(),
    }
    .into_response())
}

/// Move an order along its lifecycle.
pub async fn set_status(
    State(state): State<AppState>,
    area: RequireArea<AdminArea>,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect, AppError> {
    let back = format!("/account/orders/{id}");
    let Ok(next) = form.status.parse::<OrderStatus>() else {
        return Ok(redirect_error(&back, "invalid"));
    };

    match OrderRepository::new(state.pool()).update_status(id, next).await {
        Ok(order) => {
            tracing::info!(admin_id = %area.0.id, order_id = %order.id, status = %order.status, "Order updated by admin");
            Ok(redirect_success(&back, "saved"))
        }
        Err(RepositoryError::Conflict(_)) => Ok(redirect_error(&back, "transition")),
        Err(RepositoryError::NotFound) => Ok(redirect_error("/admin/orders", "not_found")),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_ignores_unknown_values() {
        let query = OrdersQuery {
            status: Some("shipped".to_owned()),
            channel: Some("carrier-pigeon".to_owned()),
            ..OrdersQuery::default()
        };
        let filter = query.filter();
        assert_eq!(filter.status, Some(OrderStatus::Shipped));
        assert_eq!(filter.channel, None);
    }
}
