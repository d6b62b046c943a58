//! Wishlist route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use bazaar_core::ProductId;

use crate::db::ProductRepository;
use crate::error::AppError;
use crate::filters;
use crate::models::Product;
use crate::routes::{Layout, redirect_success, safe_next};
use crate::services::wishlist::Wishlist;
use crate::state::AppState;

/// Wishlist page template.
#[derive(Template, WebTemplate)]
#[template(path = "wishlist/show.html")]
pub struct WishlistTemplate {
    pub layout: Layout,
    pub products: Vec<Product>,
}

/// Wishlist form data.
#[derive(Debug, Deserialize)]
pub struct WishlistForm {
    pub product_id: ProductId,
    pub return_to: Option<String>,
}

/// Display saved products that are still listed, in the order saved.
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    layout: Layout,
) -> Result<Response, AppError> {
    let wishlist = Wishlist::load(&session).await?;
    let mut products = ProductRepository::new(state.pool())
        .list_by_ids(wishlist.product_ids())
        .await?;
    products.retain(Product::is_on_sale);
    products.sort_by_key(|p| {
        wishlist
            .product_ids()
            .iter()
            .position(|id| *id == p.id)
            .unwrap_or(usize::MAX)
    });

    Ok(WishlistTemplate { layout, products }.into_response())
}

/// Save a product.
pub async fn add(session: Session, Form(form): Form<WishlistForm>) -> Result<Redirect, AppError> {
    let mut wishlist = Wishlist::load(&session).await?;
    wishlist.add(form.product_id);
    wishlist.save(&session).await?;

    let back = safe_next(form.return_to.as_deref()).unwrap_or("/wishlist");
    Ok(redirect_success(back, "wishlisted"))
}

/// Forget a saved product.
pub async fn remove(session: Session, Form(form): Form<WishlistForm>) -> Result<Redirect, AppError> {
    let mut wishlist = Wishlist::load(&session).await?;
    wishlist.remove(form.product_id);
    wishlist.save(&session).await?;

    let back = safe_next(form.return_to.as_deref()).unwrap_or("/wishlist");
    Ok(Redirect::to(back))
}
