//! Roles, protected areas, and the role guard.
//!
//! Every signed-in account has exactly one [`Role`]. Pages are grouped into
//! [`Area`]s, each with an allow-list of roles. [`guard`] decides whether a
//! session may enter an area and where to send it otherwise.

use serde::{Deserialize, Serialize};

use crate::types::status::{StatusParseError, string_enum};

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "bazaar.user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Shops in the storefront.
    #[default]
    Customer,
    /// Sells their own catalog.
    Vendor,
    /// Records in-store sales and earns commission on them.
    Salesperson,
    /// Runs the marketplace.
    Admin,
}

string_enum!(Role, "role", {
    Customer => "customer",
    Vendor => "vendor",
    Salesperson => "salesperson",
    Admin => "admin",
});

impl Role {
    /// Landing page after sign-in, and the redirect target when this role
    /// hits an area it may not enter.
    #[must_use]
    pub const fn home_path(self) -> &'static str {
        match self {
            Self::Customer => "/account",
            Self::Vendor => "/vendor",
            Self::Salesperson => "/salesperson",
            Self::Admin => "/admin",
        }
    }

    /// The area [`Role::home_path`] points into.
    #[must_use]
    pub const fn home_area(self) -> Area {
        match self {
            Self::Customer => Area::Account,
            Self::Vendor => Area::Vendor,
            Self::Salesperson => Area::Salesperson,
            Self::Admin => Area::Admin,
        }
    }
}

/// A role-scoped page tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Area {
    /// `/account` - order history for any signed-in user.
    Account,
    /// `/vendor` - catalog and order management.
    Vendor,
    /// `/salesperson` - attributed orders and commission.
    Salesperson,
    /// `/admin` - marketplace administration.
    Admin,
    /// `/pos` - in-store order entry.
    Pos,
}

impl Area {
    /// Roles allowed to enter this area.
    #[must_use]
    pub const fn allowed_roles(self) -> &'static [Role] {
        match self {
            Self::Account => &[Role::Customer, Role::Vendor, Role::Salesperson, Role::Admin],
            Self::Vendor => &[Role::Vendor, Role::Admin],
            Self::Salesperson | Self::Pos => &[Role::Salesperson, Role::Admin],
            Self::Admin => &[Role::Admin],
        }
    }

    /// Whether `role` is on this area's allow-list.
    #[must_use]
    pub fn allows(self, role: Role) -> bool {
        self.allowed_roles().contains(&role)
    }
}

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Render the page.
    Allow,
    /// No session: send to the login page.
    RedirectToLogin,
    /// Signed in with the wrong role: send to this path instead.
    RedirectTo(&'static str),
}

/// Decide whether a session with `role` may enter `area`.
///
/// ```
/// use bazaar_core::{Area, GuardDecision, Role, guard};
///
/// assert_eq!(guard(Some(Role::Admin), Area::Vendor), GuardDecision::Allow);
/// assert_eq!(guard(None, Area::Vendor), GuardDecision::RedirectToLogin);
/// assert_eq!(
///     guard(Some(Role::Customer), Area::Vendor),
///     GuardDecision::RedirectTo("/account"),
/// );
/// ```
#[must_use]
pub fn guard(role: Option<Role>, area: Area) -> GuardDecision {
    match role {
        None => GuardDecision::RedirectToLogin,
        Some(role) if area.allows(role) => GuardDecision::Allow,
        Some(role) => GuardDecision::RedirectTo(role.home_path()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const AREAS: [Area; 5] = [
        Area::Account,
        Area::Vendor,
        Area::Salesperson,
        Area::Admin,
        Area::Pos,
    ];

    #[test]
    fn test_admin_enters_everything() {
        for area in AREAS {
            assert_eq!(guard(Some(Role::Admin), area), GuardDecision::Allow);
        }
    }

    #[test]
    fn test_anonymous_goes_to_login() {
        for area in AREAS {
            assert_eq!(guard(None, area), GuardDecision::RedirectToLogin);
        }
    }

    #[test]
    fn test_role_home_is_always_allowed() {
        for role in Role::ALL {
            assert!(role.home_area().allows(*role), "{role} locked out of home");
            assert_eq!(guard(Some(*role), role.home_area()), GuardDecision::Allow);
        }
    }

    #[test]
    fn test_redirect_target_is_never_forbidden() {
        for role in Role::ALL {
            for area in AREAS {
                if let GuardDecision::RedirectTo(path) = guard(Some(*role), area) {
                    assert_eq!(path, role.home_path());
                    assert_eq!(guard(Some(*role), role.home_area()), GuardDecision::Allow);
                }
            }
        }
    }

    #[test]
    fn test_specific_allow_lists() {
        assert!(!Area::Vendor.allows(Role::Salesperson));
        assert!(!Area::Pos.allows(Role::Vendor));
        assert!(Area::Pos.allows(Role::Salesperson));
        assert!(!Area::Admin.allows(Role::Vendor));
        assert!(Area::Account.allows(Role::Customer));
        assert_eq!(
            guard(Some(Role::Vendor), Area::Salesperson),
            GuardDecision::RedirectTo("/vendor")
        );
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("salesperson".parse::<Role>().unwrap(), Role::Salesperson);
        assert!("root".parse::<Role>().is_err());
        assert_eq!(Role::Admin.to_string(), "admin");
    }
}
