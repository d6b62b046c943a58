//! Cart route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use bazaar_core::ProductId;

use crate::db::ProductRepository;
use crate::error::AppError;
use crate::filters;
use crate::routes::{Layout, MessageQuery, redirect_error, redirect_success, safe_next};
use crate::services::cart::{self, Cart, PricedCart};
use crate::state::AppState;

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartTemplate {
    pub layout: Layout,
    pub cart: PricedCart,
    pub removed_count: usize,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddForm {
    pub product_id: ProductId,
    #[serde(default = "one")]
    pub quantity: u32,
    /// Page to return to.
    pub return_to: Option<String>,
}

const fn one() -> u32 {
    1
}

/// Update quantity form data.
#[derive(Debug, Deserialize)]
pub struct UpdateForm {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Remove form data.
#[derive(Debug, Deserialize)]
pub struct RemoveForm {
    pub product_id: ProductId,
}

/// Display the cart. Lines for products that are no longer on sale are
/// removed from the session cart here.
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    layout: Layout,
    Query(message): Query<MessageQuery>,
) -> Result<Response, AppError> {
    let mut stored = Cart::load(&session).await?;
    let priced = cart::load_priced(state.pool(), &stored, state.commerce()).await?;

    let removed_count = priced.dropped.len();
    if removed_count > 0 {
        stored.prune(&priced.dropped);
        stored.save(&session).await?;
        tracing::debug!(removed = removed_count, "Dropped unavailable cart lines");
    }

    let mut layout = layout;
    layout.cart_count = stored.item_count();

    Ok(CartTemplate {
        layout,
        cart: priced,
        removed_count,
        error: message.error_message(),
        success: message.success_message(),
    }
    .into_response())
}

/// Add a product to the cart.
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddForm>,
) -> Result<Redirect, AppError> {
    let back = safe_next(form.return_to.as_deref()).unwrap_or("/cart");

    let product = ProductRepository::new(state.pool())
        .get_by_id(form.product_id)
        .await?;
    let Some(product) = product.filter(|p| p.is_purchasable()) else {
        return Ok(redirect_error(back, "unavailable"));
    };

    let mut cart = Cart::load(&session).await?;
    cart.add(product.id, form.quantity);
    cart.save(&session).await?;

    Ok(redirect_success(back, "added"))
}

/// Change a line's quantity; zero removes it.
pub async fn update(session: Session, Form(form): Form<UpdateForm>) -> Result<Redirect, AppError> {
    let mut cart = Cart::load(&session).await?;
    cart.update(form.product_id, form.quantity);
    cart.save(&session).await?;
    Ok(Redirect::to("/cart"))
}

/// Remove a line.
pub async fn remove(session: Session, Form(form): Form<RemoveForm>) -> Result<Redirect, AppError> {
    let mut cart = Cart::load(&session).await?;
    cart.remove(form.product_id);
    cart.save(&session).await?;
    Ok(Redirect::to("/cart"))
}

/// Empty the cart.
pub async fn clear(session: Session) -> Result<Redirect, AppError> {
    let mut cart = Cart::load(&session).await?;
    cart.clear();
    cart.save(&session).await?;
    Ok(Redirect::to("/cart"))
}
