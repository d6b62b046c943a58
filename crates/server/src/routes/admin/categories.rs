//! Admin category management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use bazaar_core::{CategoryId, is_valid_slug, slugify};

use crate::db::{CategoryRepository, RepositoryError};
use crate::error::AppError;
use crate::filters;
use crate::middleware::{AdminArea, RequireArea};
use crate::models::Category;
use crate::routes::{Layout, MessageQuery, non_empty, redirect_error, redirect_success};
use crate::state::AppState;

const BACK: &str = "/admin/categories";

/// Categories page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/categories.html")]
pub struct CategoriesTemplate {
    pub layout: Layout,
    pub categories: Vec<Category>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Category form, used for both create and update. A blank slug is
/// derived from the name.
#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    pub name: String,
    #[serde(default)]
    pub slug: String,
    pub description: Option<String>,
}

/// A validated category form.
#[derive(Debug, PartialEq, Eq)]
pub struct CategoryFields {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

impl CategoryForm {
    /// Validate the form. `None` if the name is blank or the slug is malformed.
    #[must_use]
    pub fn parse(self) -> Option<CategoryFields> {
        let name = self.name.trim().to_owned();
        if name.is_empty() {
            return None;
        }
        let slug = match self.slug.trim() {
            "" => slugify(&name),
            given => given.to_owned(),
        };
        is_valid_slug(&slug).then(|| CategoryFields {
            name,
            slug,
            description: non_empty(self.description),
        })
    }
}

/// List categories (uncached, so edits show immediately).
pub async fn index(
    State(state): State<AppState>,
    _area: RequireArea<AdminArea>,
    layout: Layout,
    Query(message): Query<MessageQuery>,
) -> Result<Response, AppError> {
    let categories = CategoryRepository::new(state.pool()).list().await?;
    Ok(CategoriesTemplate {
        layout,
        categories,
        error: message.error_message(),
        success: message.success_message(),
    }
    .into_response())
}

/// Create a category.
pub async fn create(
    State(state): State<AppState>,
    _area: RequireArea<AdminArea>,
    Form(form): Form<CategoryForm>,
) -> Result<Redirect, AppError> {
    let Some(fields) = form.parse() else {
        return Ok(redirect_error(BACK, "invalid"));
    };
    let result = CategoryRepository::new(state.pool())
        .create(&fields.name, &fields.slug, fields.description.as_deref())
        .await
        .map(|c| tracing::info!(category_id = %c.id, slug = %c.slug, "Category created"));
    finish(&state, result, "created").await
}

/// Rename a category.
pub async fn update(
    State(state): State<AppState>,
    _area: RequireArea<AdminArea>,
    Path(id): Path<CategoryId>,
    Form(form): Form<CategoryForm>,
) -> Result<Redirect, AppError> {
    let Some(fields) = form.parse() else {
        return Ok(redirect_error(BACK, "invalid"));
    };
    let result = CategoryRepository::new(state.pool())
        .update(id, &fields.name, &fields.slug, fields.description.as_deref())
        .await
        .map(|c| tracing::info!(category_id = %c.id, slug = %c.slug, "Category updated"));
    finish(&state, result, "saved").await
}

/// Delete a category. Its products become uncategorized.
pub async fn delete(
    State(state): State<AppState>,
    _area: RequireArea<AdminArea>,
    Path(id): Path<CategoryId>,
) -> Result<Redirect, AppError> {
    let result = CategoryRepository::new(state.pool())
        .delete(id)
        .await
        .map(|()| tracing::info!(category_id = %id, "Category deleted"));
    finish(&state, result, "deleted").await
}

async fn finish(
    state: &AppState,
    result: Result<(), RepositoryError>,
    success: &str,
) -> Result<Redirect, AppError> {
    match result {
        Ok(()) => {
            state.invalidate_categories().await;
            Ok(redirect_success(BACK, success))
        }
        Err(RepositoryError::Conflict(_)) => Ok(redirect_error(BACK, "duplicate")),
        Err(RepositoryError::NotFound) => Ok(redirect_error(BACK, "not_found")),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(name: &str, slug: &str) -> CategoryForm {
        CategoryForm {
            name: name.to_owned(),
            slug: slug.to_owned(),
            description: Some("  ".to_owned()),
        }
    }

    #[test]
    fn test_blank_slug_derived_from_name() {
        let fields = form("Home & Garden", "").parse().unwrap();
        assert_eq!(fields.slug, "home-garden");
        assert_eq!(fields.description, None);
    }

    #[test]
    fn test_rejects_blank_name_and_bad_slug() {
        assert!(form("   ", "mugs").parse().is_none());
        assert!(form("Mugs", "Not A Slug").parse().is_none());
    }
}
