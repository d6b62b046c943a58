//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health, /health/ready           - Liveness and readiness
//!
//! # Storefront
//! GET  /                                - Banners and newest products
//! GET  /products?category=&q=&page=     - Catalog
//! GET  /products/{slug}                 - Product detail with reviews
//! POST /products/{slug}/reviews         - Add a review (signed in)
//! GET  /categories/{slug}               - Category listing
//! GET  /stores/{slug}                   - Vendor storefront
//! GET  /cart                            - Cart page
//! POST /cart/add|update|remove|clear    - Cart changes
//! GET  /wishlist                        - Wishlist page
//! POST /wishlist/add|remove             - Wishlist changes
//! GET  /checkout, POST /checkout        - Checkout (signed in)
//!
//! # Auth
//! GET|POST /auth/login, /auth/register; POST /auth/logout
//!
//! # Account area (any role)
//! GET  /account, /account/orders, /account/orders/{id}
//!
//! # Vendor area (vendor, admin)
//! GET  /vendor                          - Earnings dashboard
//! GET  /vendor/products                 - Own catalog
//! GET|POST /vendor/products/new
//! GET|POST /vendor/products/{id}/edit
//! POST /vendor/products/{id}/delete
//! GET  /vendor/orders                   - Orders containing own products
//! GET|POST /vendor/profile              - Store profile
//!
//! # Salesperson area (salesperson, admin)
//! GET  /salesperson, /salesperson/orders
//!
//! # Admin area (admin)
//! see [`admin`]
//!
//! # POS area (salesperson, admin)
//! GET  /pos, POST /pos/orders
//!
//! # AI API (vendor, admin; JSON)
//! POST /api/ai/product-description|product-tags|price-suggestion
//! ```

pub mod account;
pub mod admin;
pub mod api;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod health;
pub mod home;
pub mod pos;
pub mod products;
pub mod salesperson;
pub mod stores;
pub mod vendor;
pub mod wishlist;

use axum::{
    Router,
    extract::FromRequestParts,
    http::request::Parts,
    response::Redirect,
    routing::{get, post},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::middleware::auth_rate_limiter;
use crate::models::{CurrentUser, session_keys};
use crate::services::cart::Cart;
use crate::services::wishlist::Wishlist;
use crate::state::AppState;

// =============================================================================
// Shared page context
// =============================================================================

/// What the base layout needs on every page: who is signed in and the
/// cart/wishlist badges.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub user: Option<CurrentUser>,
    pub cart_count: u32,
    pub wishlist_count: usize,
}

impl Layout {
    /// Home page of the signed-in user's role, for the header link.
    #[must_use]
    pub fn dashboard_path(&self) -> Option<&'static str> {
        self.user.as_ref().map(|u| u.role.home_path())
    }
}

impl<S> FromRequestParts<S> for Layout
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(session) = parts.extensions.get::<Session>() else {
            return Ok(Self::default());
        };
        let user = session
            .get::<CurrentUser>(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten();
        let cart_count = Cart::load(session)
            .await
            .map(|c| c.item_count())
            .unwrap_or_default();
        let wishlist_count = Wishlist::load(session)
            .await
            .map(|w| w.len())
            .unwrap_or_default();
        Ok(Self {
            user,
            cart_count,
            wishlist_count,
        })
    }
}

// =============================================================================
// Flash messages
// =============================================================================

/// `?error=` / `?success=` codes set by form redirects.
#[derive(Debug, Default, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

impl MessageQuery {
    /// Text for the error code, if any.
    #[must_use]
    pub fn error_message(&self) -> Option<String> {
        self.error.as_deref().map(message_for)
    }

    /// Text for the success code, if any.
    #[must_use]
    pub fn success_message(&self) -> Option<String> {
        self.success.as_deref().map(message_for)
    }
}

fn message_for(code: &str) -> String {
    let text = match code {
        "credentials" => "Invalid email or password.",
        "session" => "Your session could not be saved. Please try again.",
        "exists" => "An account with that email already exists.",
        "email" => "Please enter a valid email address.",
        "password" => "Passwords must be at least 8 characters.",
        "password_mismatch" => "Passwords do not match.",
        "name" => "Please enter your name.",
        "empty_cart" => "Your cart is empty.",
        "out_of_stock" => "Some items in your cart are out of stock.",
        "unavailable" => "Some items in your cart are no longer available.",
        "address" => "A shipping address is required.",
        "stock_changed" => "Stock changed while you were checking out. Please review your cart.",
        "invalid" => "Some fields were not valid. Please check the form.",
        "duplicate" => "That name or slug is already taken.",
        "in_use" => "That item is still in use and can't be deleted.",
        "not_found" => "That item no longer exists.",
        "transition" => "That status change isn't allowed.",
        "reviewed" => "You have already reviewed this product.",
        "store_required" => "Set up your store profile first.",
        "own_role" => "You can't change your own role.",
        "unknown_product" => "One of the products could not be found.",
        "failed" => "Something went wrong. Please try again.",
        "created" => "Created.",
        "saved" => "Saved.",
        "deleted" => "Deleted.",
        "added" => "Added to your cart.",
        "wishlisted" => "Added to your wishlist.",
        "review_added" => "Thanks for your review!",
        "order_placed" => "Thanks! Your order has been placed.",
        "sale_recorded" => "Sale recorded.",
        "registered" => "Welcome to Bazaar!",
        "logged_out" => "You have been signed out.",
        _ => "Something went wrong.",
    };
    text.to_owned()
}

/// Redirect to `path` with `?error=code`.
#[must_use]
pub fn redirect_error(path: &str, code: &str) -> Redirect {
    Redirect::to(&with_query(path, "error", code))
}

/// Redirect to `path` with `?success=code`.
#[must_use]
pub fn redirect_success(path: &str, code: &str) -> Redirect {
    Redirect::to(&with_query(path, "success", code))
}

fn with_query(path: &str, key: &str, code: &str) -> String {
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{path}{separator}{key}={code}")
}

/// Accept a post-login redirect target only if it is a local path.
#[must_use]
pub fn safe_next(next: Option<&str>) -> Option<&str> {
    next.filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
}

/// Treat blank form fields as absent.
#[must_use]
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Routers
// =============================================================================

/// Create the auth routes router. Form posts are rate limited per client IP.
pub fn auth_routes() -> Router<AppState> {
    let limited = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .layer(auth_rate_limiter());

    Router::new()
        .route("/login", get(auth::login_page))
        .route("/register", get(auth::register_page))
        .route("/logout", post(auth::logout))
        .merge(limited)
}

/// Create the catalog routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{slug}", get(products::show))
        .route("/{slug}/reviews", post(products::add_review))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show))
        .route("/add", post(wishlist::add))
        .route("/remove", post(wishlist::remove))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(account::index))
        .route("/orders", get(account::orders))
        .route("/orders/{id}", get(account::order))
}

/// Create the vendor routes router.
pub fn vendor_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(vendor::dashboard))
        .route("/products", get(vendor::products))
        .route(
            "/products/new",
            get(vendor::new_product).post(vendor::create_product),
        )
        .route(
            "/products/{id}/edit",
            get(vendor::edit_product).post(vendor::update_product),
        )
        .route("/products/{id}/delete", post(vendor::delete_product))
        .route("/orders", get(vendor::orders))
        .route(
            "/profile",
            get(vendor::profile).post(vendor::update_profile),
        )
}

/// Create the salesperson routes router.
pub fn salesperson_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(salesperson::dashboard))
        .route("/orders", get(salesperson::orders))
}

/// Create the POS routes router.
pub fn pos_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pos::index))
        .route("/orders", post(pos::create_order))
}

/// Create the JSON API routes router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/ai/product-description",
            post(api::ai::product_description),
        )
        .route("/ai/product-tags", post(api::ai::product_tags))
        .route("/ai/price-suggestion", post(api::ai::price_suggestion))
}

/// Create all page and API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/", get(home::home))
        .nest("/products", product_routes())
        .route("/categories/{slug}", get(products::category))
        .route("/stores/{slug}", get(stores::show))
        .nest("/cart", cart_routes())
        .nest("/wishlist", wishlist_routes())
        .route("/checkout", get(checkout::show).post(checkout::place))
        .nest("/auth", auth_routes())
        .nest("/account", account_routes())
        .nest("/vendor", vendor_routes())
        .nest("/salesperson", salesperson_routes())
        .nest("/admin", admin::routes())
        .nest("/pos", pos_routes())
        .nest("/api", api_routes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next() {
        assert_eq!(safe_next(Some("/vendor/orders")), Some("/vendor/orders"));
        assert_eq!(safe_next(Some("//evil.example")), None);
        assert_eq!(safe_next(Some("https://evil.example")), None);
        assert_eq!(safe_next(Some("/\\evil.example")), None);
        assert_eq!(safe_next(None), None);
    }

    #[test]
    fn test_with_query() {
        assert_eq!(with_query("/cart", "error", "empty_cart"), "/cart?error=empty_cart");
        assert_eq!(
            with_query("/admin/orders?status=pending", "success", "saved"),
            "/admin/orders?status=pending&success=saved"
        );
    }

    #[test]
    fn test_messages() {
        let query = MessageQuery {
            error: Some("credentials".to_owned()),
            success: None,
        };
        assert_eq!(
            query.error_message().as_deref(),
            Some("Invalid email or password.")
        );
        assert_eq!(query.success_message(), None);
        assert_eq!(message_for("???"), "Something went wrong.");
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("  ".to_owned())), None);
        assert_eq!(non_empty(Some(" a ".to_owned())), Some("a".to_owned()));
        assert_eq!(non_empty(None), None);
    }
}
