//! Load categories and homepage banners from a YAML file.
//!
//! ```yaml
//! categories:
//!   - name: Ceramics
//!     description: Mugs, bowls and planters
//!   - name: Prints
//!     slug: art-prints
//! banners:
//!   - title: Spring sale
//!     image_url: https://cdn.example.com/spring.jpg
//!     link_url: /categories/ceramics
//! ```
//!
//! Categories whose slug already exists are skipped, so the file can be
//! loaded again after adding entries.

use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use bazaar_core::{is_valid_slug, slugify};
use bazaar_server::db::{BannerRepository, CategoryRepository, RepositoryError};

/// Seed file contents.
#[derive(Debug, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub categories: Vec<SeedCategory>,
    #[serde(default)]
    pub banners: Vec<SeedBanner>,
}

#[derive(Debug, Deserialize)]
pub struct SeedCategory {
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
}

impl SeedCategory {
    fn slug(&self) -> String {
        self.slug.clone().unwrap_or_else(|| slugify(&self.name))
    }
}

#[derive(Debug, Deserialize)]
pub struct SeedBanner {
    pub title: String,
    pub image_url: String,
    pub link_url: Option<String>,
    pub position: Option<i32>,
}

/// Problems found before touching the database.
fn validate(seed: &SeedFile) -> Vec<String> {
    let mut errors = Vec::new();
    for category in &seed.categories {
        if category.name.trim().is_empty() {
            errors.push("category with a blank name".to_owned());
        } else if !is_valid_slug(&category.slug()) {
            errors.push(format!("category {:?} has an invalid slug", category.name));
        }
    }
    for banner in &seed.banners {
        if banner.title.trim().is_empty() || banner.image_url.trim().is_empty() {
            errors.push(format!("banner {:?} needs a title and image_url", banner.title));
        }
    }
    errors
}

/// Seed from `file_path`.
///
/// # Errors
///
/// Returns an error if the file can't be read or parsed, fails validation,
/// or the database fails.
pub async fn run(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading seed data");
    let content = tokio::fs::read_to_string(path).await?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;

    let errors = validate(&seed);
    if !errors.is_empty() {
        for err in &errors {
            warn!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let pool = super::connect().await?;

    let categories = CategoryRepository::new(&pool);
    let (mut inserted, mut skipped) = (0, 0);
    for category in &seed.categories {
        match categories
            .create(category.name.trim(), &category.slug(), category.description.as_deref())
            .await
        {
            Ok(_) => inserted += 1,
            Err(RepositoryError::Conflict(_)) => skipped += 1,
            Err(e) => return Err(e.into()),
        }
    }

    let banners = BannerRepository::new(&pool);
    for (index, banner) in seed.banners.iter().enumerate() {
        let position = banner
            .position
            .unwrap_or_else(|| i32::try_from(index).unwrap_or(i32::MAX));
        banners
            .create(
                banner.title.trim(),
                banner.image_url.trim(),
                banner.link_url.as_deref(),
                position,
            )
            .await?;
    }

    info!("Seeding complete!");
    info!("  Categories inserted: {inserted}");
    info!("  Categories skipped (already exist): {skipped}");
    info!("  Banners inserted: {}", seed.banners.len());
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_validate() {
        let seed: SeedFile = serde_yaml::from_str(
            "categories:\n  - name: Home & Garden\n  - name: Prints\n    slug: Bad Slug\nbanners:\n  - title: Sale\n    image_url: ''\n",
        )
        .unwrap();
        assert_eq!(seed.categories.first().unwrap().slug(), "home-garden");
        assert_eq!(validate(&seed).len(), 2);
    }

    #[test]
    fn test_empty_file_is_valid() {
        let seed: SeedFile = serde_yaml::from_str("{}").unwrap();
        assert!(validate(&seed).is_empty());
    }
}
