//! Checkout route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::db::RepositoryError;
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAuth;
use crate::routes::{Layout, MessageQuery, redirect_error, redirect_success};
use crate::services::cart::{self, Cart, PricedCart};
use crate::services::checkout::{CheckoutError, ShippingDetails, place_online_order};
use crate::state::AppState;

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub layout: Layout,
    pub cart: PricedCart,
    pub name: String,
    pub error: Option<String>,
}

/// Checkout form data.
#[derive(Debug, Deserialize)]
pub struct CheckoutForm {
    pub name: String,
    pub address: String,
}

/// Display the order summary and shipping form.
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    layout: Layout,
    Query(message): Query<MessageQuery>,
) -> Result<Response, AppError> {
    let stored = Cart::load(&session).await?;
    if stored.is_empty() {
        return Ok(redirect_error("/cart", "empty_cart").into_response());
    }
    let priced = cart::load_priced(state.pool(), &stored, state.commerce()).await?;
    if !priced.dropped.is_empty() {
        // The cart page prunes and explains.
        return Ok(redirect_error("/cart", "unavailable").into_response());
    }

    Ok(CheckoutTemplate {
        layout,
        cart: priced,
        name: user.name,
        error: message.error_message(),
    }
    .into_response())
}

/// Place the order and empty the cart.
pub async fn place(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Form(form): Form<CheckoutForm>,
) -> Result<Redirect, AppError> {
    let mut stored = Cart::load(&session).await?;
    let priced = cart::load_priced(state.pool(), &stored, state.commerce()).await?;
    let shipping = ShippingDetails {
        name: form.name,
        address: form.address,
    };

    match place_online_order(state.pool(), &user, &priced, &shipping).await {
        Ok(placed) => {
            stored.clear();
            stored.save(&session).await?;
            tracing::info!(
                order_id = %placed.order.id,
                customer_id = %user.id,
                total = %placed.order.total,
                "Order placed"
            );
            Ok(redirect_success(
                &format!("/account/orders/{}", placed.order.id),
                "order_placed",
            ))
        }
        Err(e) => {
            tracing::info!(customer_id = %user.id, error = %e, "Checkout refused");
            let (path, code) = match e {
                CheckoutError::EmptyCart => ("/cart", "empty_cart"),
                CheckoutError::Unavailable => ("/cart", "unavailable"),
                CheckoutError::OutOfStock(_) => ("/cart", "out_of_stock"),
                CheckoutError::MissingAddress => ("/checkout", "address"),
                CheckoutError::UnknownProduct(_) => ("/cart", "unknown_product"),
                CheckoutError::Repository(RepositoryError::Conflict(_)) => {
                    ("/cart", "stock_changed")
                }
                CheckoutError::Repository(e) => return Err(e.into()),
            };
            Ok(redirect_error(path, code))
        }
    }
}
