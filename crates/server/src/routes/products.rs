//! Catalog route handlers.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::db::{
    ProductQuery, ProductRepository, RepositoryError, ReviewRepository,
};
use crate::error::AppError;
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::{Category, Product, ProductReview};
use crate::routes::{Layout, MessageQuery, redirect_error, redirect_success};
use crate::state::AppState;

/// Catalog query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
    pub q: Option<String>,
    pub page: Option<u32>,
}

/// Page links for a result list.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub page: u32,
    pub total_pages: u32,
    /// Query string without `page`, ending in `&` when non-empty.
    base_query: String,
}

impl Pagination {
    #[must_use]
    pub fn new(page: u32, total: i64, per_page: u32, params: &[(&str, &str)]) -> Self {
        let per_page = i64::from(per_page.max(1));
        let total_pages = u32::try_from((total + per_page - 1) / per_page)
            .unwrap_or(u32::MAX)
            .max(1);
        let base_query = params
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| {
                let v: String = url::form_urlencoded::byte_serialize(v.as_bytes()).collect();
                format!("{k}={v}&")
            })
            .collect();
        Self {
            page: page.max(1),
            total_pages,
            base_query,
        }
    }

    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    /// Query string (with leading `?`) for page `n`.
    #[must_use]
    pub fn link(&self, n: u32) -> String {
        format!("?{}page={n}", self.base_query)
    }

    #[must_use]
    pub fn prev_link(&self) -> String {
        self.link(self.page.saturating_sub(1).max(1))
    }

    #[must_use]
    pub fn next_link(&self) -> String {
        self.link(self.page.saturating_add(1))
    }
}

/// Catalog listing template, shared by `/products` and `/categories/{slug}`.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsIndexTemplate {
    pub layout: Layout,
    pub heading: String,
    pub products: Vec<Product>,
    pub categories: Arc<Vec<Category>>,
    pub selected_category: Option<String>,
    pub search: String,
    pub total: i64,
    pub pagination: Pagination,
}

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub layout: Layout,
    pub product: Product,
    pub reviews: Vec<ProductReview>,
    pub average_rating: Option<String>,
    pub review_count: i64,
    pub can_review: bool,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Display the catalog.
pub async fn index(
    State(state): State<AppState>,
    layout: Layout,
    Query(query): Query<CatalogQuery>,
) -> Result<Response, AppError> {
    let categories = state.categories().await?;
    let selected = query
        .category
        .as_deref()
        .and_then(|slug| categories.iter().find(|c| c.slug == slug));
    let heading = selected.map_or_else(|| "All products".to_owned(), |c| c.name.clone());
    let category_id = selected.map(|c| c.id);
    let selected_category = selected.map(|c| c.slug.clone());

    render_catalog(
        &state,
        layout,
        heading,
        category_id,
        selected_category,
        query,
    )
    .await
}

/// Display one category's products.
pub async fn category(
    State(state): State<AppState>,
    layout: Layout,
    Path(slug): Path<String>,
    Query(query): Query<CatalogQuery>,
) -> Result<Response, AppError> {
    let categories = state.categories().await?;
    let category = categories
        .iter()
        .find(|c| c.slug == slug)
        .ok_or_else(|| AppError::NotFound(format!("category {slug}")))?;
    let heading = category.name.clone();
    let category_id = Some(category.id);

    render_catalog(&state, layout, heading, category_id, Some(slug), query).await
}

async fn render_catalog(
    state: &AppState,
    layout: Layout,
    heading: String,
    category_id: Option<bazaar_core::CategoryId>,
    selected_category: Option<String>,
    query: CatalogQuery,
) -> Result<Response, AppError> {
    let page = query.page.unwrap_or(1).max(1);
    let search = query.q.unwrap_or_default();
    let product_query = ProductQuery {
        category_id,
        search: Some(search.clone()),
        page,
        ..ProductQuery::default()
    };
    let (products, total) = ProductRepository::new(state.pool())
        .list_active(&product_query)
        .await?;

    let pagination = Pagination::new(
        page,
        total,
        ProductQuery::DEFAULT_PER_PAGE,
        &[
            ("category", selected_category.as_deref().unwrap_or_default()),
            ("q", &search),
        ],
    );

    Ok(ProductsIndexTemplate {
        layout,
        heading,
        products,
        categories: state.categories().await?,
        selected_category,
        search,
        total,
        pagination,
    }
    .into_response())
}

/// Load a product the storefront may show: active and from an approved vendor.
pub(crate) async fn load_listed(state: &AppState, slug: &str) -> Result<Product, AppError> {
    let product = ProductRepository::new(state.pool())
        .get_by_slug(slug)
        .await?
        .filter(Product::is_on_sale)
        .ok_or(AppError::Database(RepositoryError::NotFound))?;

    Ok(product)
}

/// Display a product with its reviews.
pub async fn show(
    State(state): State<AppState>,
    layout: Layout,
    Path(slug): Path<String>,
    Query(message): Query<MessageQuery>,
) -> Result<Response, AppError> {
    let product = load_listed(&state, &slug).await?;

    let reviews_repo = ReviewRepository::new(state.pool());
    let reviews = reviews_repo.list_for_product(product.id).await?;
    let rating = reviews_repo.average_rating(product.id).await?;

    let can_review = layout
        .user
        .as_ref()
        .is_some_and(|u| reviews.iter().all(|r| r.user_id != u.id));

    Ok(ProductShowTemplate {
        layout,
        average_rating: rating.map(|(avg, _)| format!("{avg:.1}")),
        review_count: rating.map_or(0, |(_, count)| count),
        product,
        reviews,
        can_review,
        error: message.error_message(),
        success: message.success_message(),
    }
    .into_response())
}

/// Review form data.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub rating: i16,
    #[serde(default)]
    pub comment: String,
}

/// Handle a review submission.
pub async fn add_review(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(slug): Path<String>,
    Form(form): Form<ReviewForm>,
) -> Result<Redirect, AppError> {
    let back = format!("/products/{slug}");
    let Some(user) = user else {
        return Ok(Redirect::to(&format!("/auth/login?next={back}")));
    };
    if !(1..=5).contains(&form.rating) {
        return Ok(redirect_error(&back, "invalid"));
    }

    let product = load_listed(&state, &slug).await?;
    match ReviewRepository::new(state.pool())
        .add(product.id, user.id, form.rating, form.comment.trim())
        .await
    {
        Ok(()) => {
            tracing::info!(product_id = %product.id, user_id = %user.id, "Review added");
            Ok(redirect_success(&back, "review_added"))
        }
        Err(RepositoryError::Conflict(_)) => Ok(redirect_error(&back, "reviewed")),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_pages() {
        let p = Pagination::new(1, 0, 24, &[]);
        assert_eq!(p.total_pages, 1);
        assert!(!p.has_prev());
        assert!(!p.has_next());

        let p = Pagination::new(2, 49, 24, &[]);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_prev());
        assert!(p.has_next());
        assert_eq!(p.prev_link(), "?page=1");
        assert_eq!(p.next_link(), "?page=3");
    }

    #[test]
    fn test_pagination_keeps_filters() {
        let p = Pagination::new(1, 100, 24, &[("category", "mugs"), ("q", "blue glaze")]);
        assert_eq!(p.link(2), "?category=mugs&q=blue+glaze&page=2");

        let p = Pagination::new(1, 100, 24, &[("category", ""), ("q", "x")]);
        assert_eq!(p.link(2), "?q=x&page=2");
    }
}
