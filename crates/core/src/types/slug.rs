//! URL slugs for products, categories and stores.

/// Lowercase ASCII letters and digits separated by single hyphens.
///
/// ```
/// use bazaar_core::slugify;
///
/// assert_eq!(slugify("  Hand-Thrown Mug (Blue) "), "hand-thrown-mug-blue");
/// ```
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

/// Whether `slug` is already in the form [`slugify`] produces.
#[must_use]
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && slugify(slug) == slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Ceramic Mug"), "ceramic-mug");
        assert_eq!(slugify("--a__b--"), "a-b");
        assert_eq!(slugify("Café 2000"), "caf-2000");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn test_is_valid_slug() {
        assert!(is_valid_slug("ceramic-mug"));
        assert!(!is_valid_slug("Ceramic-Mug"));
        assert!(!is_valid_slug("a--b"));
        assert!(!is_valid_slug(""));
    }
}
