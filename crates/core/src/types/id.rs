//! Typed row IDs.
//!
//! Every table keyed by a `SERIAL` gets its own wrapper so a `ProductId` can't
//! be passed where an `OrderId` is expected. All of them serialize as bare
//! integers, which is also how they appear in URLs and form fields.

macro_rules! entity_ids {
    ($($(#[$meta:meta])* $name:ident;)+) => {$(
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
            ::serde::Serialize, ::serde::Deserialize,
        )]
        #[cfg_attr(feature = "postgres", derive(::sqlx::Type))]
        #[cfg_attr(feature = "postgres", sqlx(transparent))]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            #[must_use]
            pub const fn as_i32(self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    )+};
}

entity_ids! {
    /// An account of any role.
    UserId;
    /// A vendor's store profile.
    VendorId;
    /// A salesperson's commission profile.
    SalespersonId;
    CategoryId;
    ProductId;
    OrderId;
    OrderItemId;
    ReviewId;
    /// A home page banner.
    BannerId;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_bare_integers_on_the_wire() {
        assert_eq!(serde_json::to_string(&UserId::new(3)).unwrap(), "3");
        let parsed: ProductId = serde_json::from_str("42").unwrap();
        assert_eq!(parsed, ProductId::new(42));
        assert_eq!(OrderId::new(7).to_string(), "7");
    }

    #[test]
    fn test_parse_from_form_text() {
        assert_eq!(" 12 ".parse::<CategoryId>().unwrap(), CategoryId::new(12));
        assert!("twelve".parse::<CategoryId>().is_err());
        assert_eq!(i32::from(BannerId::new(5)), 5);
    }

    #[test]
    fn test_ids_order_numerically() {
        let mut ids = vec![OrderId::new(10), OrderId::new(2), OrderId::new(7)];
        ids.sort();
        assert_eq!(ids, vec![OrderId::new(2), OrderId::new(7), OrderId::new(10)]);
    }
}
