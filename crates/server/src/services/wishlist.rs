//! Session-held wishlist.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use bazaar_core::ProductId;

use crate::models::session_keys;

/// Product IDs the visitor saved for later, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wishlist {
    product_ids: Vec<ProductId>,
}

impl Wishlist {
    /// Load the wishlist from the session; missing means empty.
    ///
    /// # Errors
    ///
    /// Returns the session store error.
    pub async fn load(session: &Session) -> Result<Self, tower_sessions::session::Error> {
        Ok(session
            .get::<Self>(session_keys::WISHLIST)
            .await?
            .unwrap_or_default())
    }

    /// Write the wishlist back to the session.
    ///
    /// # Errors
    ///
    /// Returns the session store error.
    pub async fn save(&self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.insert(session_keys::WISHLIST, self).await
    }

    #[must_use]
    pub fn product_ids(&self) -> &[ProductId] {
        &self.product_ids
    }

    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.product_ids.contains(&product_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.product_ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.product_ids.is_empty()
    }

    /// Save a product. Adding twice is a no-op.
    pub fn add(&mut self, product_id: ProductId) {
        if !self.contains(product_id) {
            self.product_ids.push(product_id);
        }
    }

    pub fn remove(&mut self, product_id: ProductId) {
        self.product_ids.retain(|id| *id != product_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent() {
        let mut wishlist = Wishlist::default();
        wishlist.add(ProductId::new(3));
        wishlist.add(ProductId::new(1));
        wishlist.add(ProductId::new(3));
        assert_eq!(wishlist.product_ids(), &[ProductId::new(3), ProductId::new(1)]);
    }

    #[test]
    fn test_remove() {
        let mut wishlist = Wishlist::default();
        wishlist.add(ProductId::new(3));
        wishlist.remove(ProductId::new(3));
        wishlist.remove(ProductId::new(4));
        assert!(wishlist.is_empty());
        assert!(!wishlist.contains(ProductId::new(3)));
    }

    #[test]
    fn test_serde_shape() {
        let mut wishlist = Wishlist::default();
        wishlist.add(ProductId::new(7));
        let json = serde_json::to_string(&wishlist).expect("serialize");
        assert_eq!(json, r#"{"product_ids":[7]}"#);
    }
}
