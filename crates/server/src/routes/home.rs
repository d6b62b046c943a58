//! Home page route handler.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};

use crate::db::{ProductQuery, ProductRepository};
use crate::error::AppError;
use crate::filters;
use crate::models::{Banner, Category, Product};
use crate::routes::{Layout, MessageQuery};
use crate::state::AppState;

/// Newest products shown on the home page.
const FEATURED_COUNT: u32 = 8;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub banners: Arc<Vec<Banner>>,
    pub categories: Arc<Vec<Category>>,
    pub products: Vec<Product>,
    pub success: Option<String>,
}

/// Display the home page.
pub async fn home(
    State(state): State<AppState>,
    layout: Layout,
    Query(message): Query<MessageQuery>,
) -> Result<Response, AppError> {
    let query = ProductQuery {
        page: 1,
        per_page: FEATURED_COUNT,
        ..ProductQuery::default()
    };
    let (products, _) = ProductRepository::new(state.pool())
        .list_active(&query)
        .await?;

    Ok(HomeTemplate {
        layout,
        banners: state.active_banners().await?,
        categories: state.categories().await?,
        products,
        success: message.success_message(),
    }
    .into_response())
}
