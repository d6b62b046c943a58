//! Domain models for the marketplace.
//!
//! These are validated domain objects, separate from the internal row types
//! used by the repositories in [`crate::db`].

pub mod catalog;
pub mod order;
pub mod session;
pub mod user;

pub use catalog::{Banner, Category, Product, ProductInput, ProductReview};
pub use order::{NewOrder, NewOrderLine, Order, OrderItem, OrderWithItems};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{SalespersonProfile, User, VendorProfile};
