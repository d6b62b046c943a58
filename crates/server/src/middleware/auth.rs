//! Authentication and role-guard extractors.
//!
//! `RequireArea<A>` runs [`bazaar_core::guard`] for area `A` on every request:
//! guests are sent to the login page, signed-in users whose role isn't on
//! the area's allow-list are sent to their own home page. Requests under
//! `/api/` get a bare 401 or 403 instead of a redirect.

use std::marker::PhantomData;

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use bazaar_core::{Area, GuardDecision, guard};

use crate::models::{CurrentUser, session_keys};

/// Why a protected page was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRejection {
    /// Redirect to the login page, coming back to `next` (path and query)
    /// afterwards.
    RedirectToLogin { next: String },
    /// Signed in with the wrong role; redirect home.
    RedirectTo(&'static str),
    /// Not signed in (API requests).
    Unauthorized,
    /// Wrong role (API requests).
    Forbidden,
}

impl AuthRejection {
    fn from_decision(decision: GuardDecision, parts: &Parts) -> Option<Self> {
        // Nested routers strip their prefix from `parts.uri`.
        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map_or(&parts.uri, |OriginalUri(uri)| uri);
        let path = uri.path();
        let is_api = path.starts_with("/api/");
        match decision {
            GuardDecision::Allow => None,
            GuardDecision::RedirectToLogin if is_api => Some(Self::Unauthorized),
            GuardDecision::RedirectToLogin => Some(Self::RedirectToLogin {
                next: uri
                    .path_and_query()
                    .map_or(path, |pq| pq.as_str())
                    .to_owned(),
            }),
            GuardDecision::RedirectTo(_) if is_api => Some(Self::Forbidden),
            GuardDecision::RedirectTo(path) => Some(Self::RedirectTo(path)),
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin { next } => Redirect::to(&login_url(&next)).into_response(),
            Self::RedirectTo(path) => Redirect::to(path).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            Self::Forbidden => StatusCode::FORBIDDEN.into_response(),
        }
    }
}

/// The login page, returning to `next` once signed in.
#[must_use]
pub fn login_url(next: &str) -> String {
    let next: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
    format!("/auth/login?next={next}")
}

async fn session_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Extractor that requires a signed-in user of any role.
///
/// ```rust,ignore
/// async fn handler(RequireAuth(user): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match session_user(parts).await {
            Some(user) => Ok(Self(user)),
            None => Err(AuthRejection::from_decision(GuardDecision::RedirectToLogin, parts)
                .unwrap_or(AuthRejection::Unauthorized)),
        }
    }
}

/// Extractor that optionally gets the current user.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_user(parts).await))
    }
}

/// A protected page tree, named at the type level.
pub trait AreaMarker: Send + Sync + 'static {
    const AREA: Area;
}

macro_rules! area_marker {
    ($name:ident, $area:expr, $doc:literal) => {
        #[doc = $doc]
        pub struct $name;

        impl AreaMarker for $name {
            const AREA: Area = $area;
        }
    };
}

area_marker!(AccountArea, Area::Account, "`/account`: any signed-in user.");
area_marker!(VendorArea, Area::Vendor, "`/vendor` and the AI API: vendors and admins.");
area_marker!(SalespersonArea, Area::Salesperson, "`/salesperson`: salespeople and admins.");
area_marker!(AdminArea, Area::Admin, "`/admin`: admins only.");
area_marker!(PosArea, Area::Pos, "`/pos`: salespeople and admins.");

/// Extractor that admits only users whose role may enter area `A`.
///
/// ```rust,ignore
/// async fn dashboard(RequireArea(user, ..): RequireArea<VendorArea>) -> impl IntoResponse {
///     format!("Welcome back, {}", user.name)
/// }
/// ```
pub struct RequireArea<A: AreaMarker>(pub CurrentUser, pub PhantomData<A>);

impl<A: AreaMarker> RequireArea<A> {
    /// The admitted user.
    #[must_use]
    pub fn into_user(self) -> CurrentUser {
        self.0
    }
}

impl<S, A> FromRequestParts<S> for RequireArea<A>
where
    S: Send + Sync,
    A: AreaMarker,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = session_user(parts).await;
        let decision = guard(user.as_ref().map(|u| u.role), A::AREA);
        if let Some(rejection) = AuthRejection::from_decision(decision, parts) {
            if let Some(user) = &user {
                tracing::debug!(user_id = %user.id, role = %user.role, area = ?A::AREA, "area refused");
            }
            return Err(rejection);
        }
        // Allow implies a session user exists.
        user.map(|u| Self(u, PhantomData))
            .ok_or(AuthRejection::Unauthorized)
    }
}

/// Store the signed-in user in the session, rotating the session ID.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Remove the signed-in user from the session (logout). Cart and wishlist
/// are cleared with it.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(path: &str) -> Parts {
        Request::builder()
            .uri(path)
            .body(())
            .expect("request")
            .into_parts()
            .0
    }

    #[test]
    fn test_html_rejections_redirect() {
        let p = parts("/vendor/products");
        assert_eq!(
            AuthRejection::from_decision(GuardDecision::RedirectToLogin, &p),
            Some(AuthRejection::RedirectToLogin {
                next: "/vendor/products".to_owned()
            })
        );
        assert_eq!(
            AuthRejection::from_decision(GuardDecision::RedirectTo("/account"), &p),
            Some(AuthRejection::RedirectTo("/account"))
        );
        assert_eq!(AuthRejection::from_decision(GuardDecision::Allow, &p), None);
    }

    #[test]
    fn test_login_redirect_keeps_query() {
        let p = parts("/admin/orders?status=pending&channel=pos");
        let rejection = AuthRejection::from_decision(GuardDecision::RedirectToLogin, &p);
        assert_eq!(
            rejection,
            Some(AuthRejection::RedirectToLogin {
                next: "/admin/orders?status=pending&channel=pos".to_owned()
            })
        );

        let response = rejection.expect("rejection").into_response();
        assert_eq!(
            response.headers().get("location").and_then(|v| v.to_str().ok()),
            Some("/auth/login?next=%2Fadmin%2Forders%3Fstatus%3Dpending%26channel%3Dpos")
        );
    }

    #[test]
    fn test_api_rejections_are_status_codes() {
        let p = parts("/api/ai/product-tags");
        assert_eq!(
            AuthRejection::from_decision(GuardDecision::RedirectToLogin, &p),
            Some(AuthRejection::Unauthorized)
        );
        assert_eq!(
            AuthRejection::from_decision(GuardDecision::RedirectTo("/account"), &p),
            Some(AuthRejection::Forbidden)
        );
    }

    #[test]
    fn test_nested_routes_use_original_path() {
        let mut p = parts("/ai/product-tags");
        p.extensions
            .insert(OriginalUri("/api/ai/product-tags".parse().expect("uri")));
        assert_eq!(
            AuthRejection::from_decision(GuardDecision::RedirectToLogin, &p),
            Some(AuthRejection::Unauthorized)
        );

        let mut p = parts("/orders");
        p.extensions
            .insert(OriginalUri("/vendor/orders".parse().expect("uri")));
        assert_eq!(
            AuthRejection::from_decision(GuardDecision::RedirectToLogin, &p),
            Some(AuthRejection::RedirectToLogin {
                next: "/vendor/orders".to_owned()
            })
        );
    }

    #[test]
    fn test_rejection_responses() {
        let response = AuthRejection::RedirectToLogin {
            next: "/admin".to_owned(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            response.headers().get("location").and_then(|v| v.to_str().ok()),
            Some("/auth/login?next=%2Fadmin")
        );
        assert_eq!(
            AuthRejection::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }

    #[tokio::test]
    async fn test_require_area_without_session_layer() {
        let mut p = parts("/admin");
        let rejection = RequireArea::<AdminArea>::from_request_parts(&mut p, &())
            .await
            .err();
        assert_eq!(
            rejection,
            Some(AuthRejection::RedirectToLogin {
                next: "/admin".to_owned()
            })
        );
    }
}
