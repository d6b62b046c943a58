//! Admin route handlers.
//!
//! ```text
//! GET  /admin                                  - Platform metrics
//! GET  /admin/users?role=                      - Accounts
//! POST /admin/users                            - Create an account with any role
//! POST /admin/users/{id}/role                  - Change a role
//! GET  /admin/vendors                          - Stores
//! POST /admin/vendors/{id}/status              - Approve or suspend a store
//! POST /admin/vendors/{id}/commission          - Change a store's platform fee
//! GET  /admin/salespeople                      - Salespeople
//! POST /admin/salespeople/{user_id}            - Set commission rate and region
//! GET  /admin/products?status=                 - Every product
//! POST /admin/products/{id}/status             - Publish, unpublish or archive
//! GET  /admin/orders?status=&channel=          - Every order
//! POST /admin/orders/{id}/status               - Advance or cancel an order
//! GET|POST /admin/categories                   - List and create
//! POST /admin/categories/{id}                  - Rename
//! POST /admin/categories/{id}/delete
//! GET|POST /admin/banners                      - List and create
//! POST /admin/banners/{id}/toggle|delete
//! ```

pub mod banners;
pub mod categories;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod salespeople;
pub mod users;
pub mod vendors;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the admin routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::dashboard))
        .route("/users", get(users::index).post(users::create))
        .route("/users/{id}/role", post(users::set_role))
        .route("/vendors", get(vendors::index))
        .route("/vendors/{id}/status", post(vendors::set_status))
        .route("/vendors/{id}/commission", post(vendors::set_commission))
        .route("/salespeople", get(salespeople::index))
        .route("/salespeople/{user_id}", post(salespeople::upsert))
        .route("/products", get(products::index))
        .route("/products/{id}/status", post(products::set_status))
        .route("/orders", get(orders::index))
        .route("/orders/{id}/status", post(orders::set_status))
        .route(
            "/categories",
            get(categories::index).post(categories::create),
        )
        .route("/categories/{id}", post(categories::update))
        .route("/categories/{id}/delete", post(categories::delete))
        .route("/banners", get(banners::index).post(banners::create))
        .route("/banners/{id}/toggle", post(banners::toggle))
        .route("/banners/{id}/delete", post(banners::delete))
}
