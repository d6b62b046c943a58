//! Point-of-sale route handlers.

use std::collections::HashMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use bazaar_core::ProductId;

use crate::db::{ProductQuery, ProductRepository, RepositoryError};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{PosArea, RequireArea};
use crate::models::Product;
use crate::routes::{Layout, non_empty, redirect_error, redirect_success};
use crate::services::checkout::CheckoutError;
use crate::services::pos::{PosEntry, WALK_IN_CUSTOMER, record_sale};
use crate::state::AppState;

/// Products listed on the till at once.
const TILL_PAGE_SIZE: u32 = 200;

/// Form field prefix carrying a product's quantity, e.g. `qty_42=2`.
const QUANTITY_PREFIX: &str = "qty_";

/// POS page template.
#[derive(Template, WebTemplate)]
#[template(path = "pos/index.html")]
pub struct PosTemplate {
    pub layout: Layout,
    pub products: Vec<Product>,
    pub search: String,
    pub walk_in: &'static str,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// POS page query.
#[derive(Debug, Default, Deserialize)]
pub struct PosQuery {
    pub q: Option<String>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Display the till: listed products with a quantity box each.
pub async fn index(
    State(state): State<AppState>,
    _area: RequireArea<PosArea>,
    layout: Layout,
    Query(query): Query<PosQuery>,
) -> Result<Response, AppError> {
    let search = query.q.clone().unwrap_or_default();
    let product_query = ProductQuery {
        search: Some(search.clone()),
        page: 1,
        per_page: TILL_PAGE_SIZE,
        ..ProductQuery::default()
    };
    let (products, _) = ProductRepository::new(state.pool())
        .list_active(&product_query)
        .await?;

    let messages = super::MessageQuery {
        error: query.error,
        success: query.success,
    };
    Ok(PosTemplate {
        layout,
        products,
        search,
        walk_in: WALK_IN_CUSTOMER,
        error: messages.error_message(),
        success: messages.success_message(),
    }
    .into_response())
}

/// Till entries from the posted form. Blank, zero and malformed quantities
/// are skipped.
#[must_use]
pub fn parse_entries(fields: &HashMap<String, String>) -> Vec<PosEntry> {
    let mut entries: Vec<PosEntry> = fields
        .iter()
        .filter_map(|(key, value)| {
            let id = key.strip_prefix(QUANTITY_PREFIX)?.parse::<i32>().ok()?;
            let quantity = value.trim().parse::<u32>().ok().filter(|q| *q > 0)?;
            Some(PosEntry {
                product_id: ProductId::new(id),
                quantity,
            })
        })
        .collect();
    entries.sort_by_key(|e| e.product_id.as_i32());
    entries
}

/// Record an in-store sale attributed to the signed-in user.
pub async fn create_order(
    State(state): State<AppState>,
    area: RequireArea<PosArea>,
    Form(fields): Form<HashMap<String, String>>,
) -> Result<Redirect, AppError> {
    let user = area.into_user();
    let entries = parse_entries(&fields);
    let customer_name = non_empty(fields.get("customer_name").cloned())
        .unwrap_or_else(|| WALK_IN_CUSTOMER.to_owned());

    match record_sale(
        state.pool(),
        state.commerce().tax_rate,
        &user,
        &customer_name,
        &entries,
    )
    .await
    {
        Ok(placed) => {
            tracing::info!(
                order_id = %placed.order.id,
                salesperson_id = %user.id,
                total = %placed.order.total,
                "POS sale recorded"
            );
            Ok(redirect_success(
                &format!("/account/orders/{}", placed.order.id),
                "sale_recorded",
            ))
        }
        Err(e) => {
            tracing::info!(salesperson_id = %user.id, error = %e, "POS sale refused");
            let code = match e {
                CheckoutError::EmptyCart => "empty_cart",
                CheckoutError::OutOfStock(_) => "out_of_stock",
                CheckoutError::UnknownProduct(_) | CheckoutError::Unavailable => "unknown_product",
                CheckoutError::MissingAddress => "address",
                CheckoutError::Repository(RepositoryError::Conflict(_)) => "stock_changed",
                CheckoutError::Repository(e) => return Err(e.into()),
            };
            Ok(redirect_error("/pos", code))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entries() {
        let fields: HashMap<String, String> = [
            ("qty_3", "2"),
            ("qty_1", " 1 "),
            ("qty_2", "0"),
            ("qty_4", ""),
            ("qty_x", "5"),
            ("qty_5", "-1"),
            ("customer_name", "Ada"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();

        let entries = parse_entries(&fields);
        assert_eq!(
            entries,
            vec![
                PosEntry {
                    product_id: ProductId::new(1),
                    quantity: 1
                },
                PosEntry {
                    product_id: ProductId::new(3),
                    quantity: 2
                },
            ]
        );
    }
}
