//! Account management commands.
//!
//! The web app only lets customers register themselves, so the first admin
//! is created here.

use thiserror::Error;

use bazaar_core::{Email, Role, VendorStatus, slugify};
use bazaar_server::config::CommerceConfig;
use bazaar_server::db::{SalespersonRepository, StoreDetails, UserRepository, VendorRepository};
use bazaar_server::services::auth::AuthService;

/// Errors from account commands.
#[derive(Debug, Error)]
pub enum UserError {
    /// Unknown role name.
    #[error("Invalid role: {0}. Valid roles: customer, vendor, salesperson, admin")]
    InvalidRole(String),

    /// No account has this email.
    #[error("No account with email: {0}")]
    NotFound(String),

    /// `--store` given for a role that has no store.
    #[error("--store is only valid for vendors")]
    StoreWithoutVendor,
}

fn parse_role(role: &str) -> Result<Role, UserError> {
    role.parse()
        .map_err(|_| UserError::InvalidRole(role.to_owned()))
}

/// Create an account. Salespeople get the default commission rate; vendors
/// given `store` get an approved store.
///
/// # Errors
///
/// Returns an error if the input is invalid, the email is taken, or the
/// database fails.
pub async fn create(
    email: &str,
    name: &str,
    role: &str,
    password: &str,
    store: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let role = parse_role(role)?;
    if store.is_some() && role != Role::Vendor {
        return Err(UserError::StoreWithoutVendor.into());
    }

    let pool = super::connect().await?;
    let commerce = CommerceConfig::from_env()?;

    let user = AuthService::new(&pool)
        .create_account(email, name, role, password)
        .await?;

    match role {
        Role::Salesperson => {
            SalespersonRepository::new(&pool)
                .upsert(user.id, commerce.default_sales_commission, None)
                .await?;
        }
        Role::Vendor => {
            if let Some(store_name) = store {
                let vendors = VendorRepository::new(&pool);
                let details = StoreDetails {
                    store_name: store_name.to_owned(),
                    slug: slugify(store_name),
                    description: String::new(),
                };
                let vendor = vendors
                    .upsert(user.id, &details, commerce.default_vendor_commission)
                    .await?;
                vendors.set_status(vendor.id, VendorStatus::Approved).await?;
                tracing::info!(vendor_id = %vendor.id, slug = %vendor.slug, "Store created");
            }
        }
        Role::Customer | Role::Admin => {}
    }

    tracing::info!(
        "Account created! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );
    Ok(())
}

/// Change the role of the account with `email`.
///
/// # Errors
///
/// Returns an error if the role or email is invalid, or the database fails.
pub async fn set_role(email: &str, role: &str) -> Result<(), Box<dyn std::error::Error>> {
    let role = parse_role(role)?;
    let email = Email::parse(email)?;

    let pool = super::connect().await?;
    let users = UserRepository::new(&pool);
    let user = users
        .get_by_email(&email)
        .await?
        .ok_or_else(|| UserError::NotFound(email.to_string()))?;

    let user = users.set_role(user.id, role).await?;
    if role == Role::Salesperson {
        let salespeople = SalespersonRepository::new(&pool);
        if salespeople.get_by_user(user.id).await?.is_none() {
            let commerce = CommerceConfig::from_env()?;
            salespeople
                .upsert(user.id, commerce.default_sales_commission, None)
                .await?;
        }
    }

    tracing::info!(user_id = %user.id, role = %user.role, "Role changed; takes effect at next sign-in");
    Ok(())
}

/// Replace the password of the account with `email`.
///
/// # Errors
///
/// Returns an error if the email is unknown, the password is too short, or
/// the database fails.
pub async fn set_password(email: &str, password: &str) -> Result<(), Box<dyn std::error::Error>> {
    let email = Email::parse(email)?;

    let pool = super::connect().await?;
    let user = UserRepository::new(&pool)
        .get_by_email(&email)
        .await?
        .ok_or_else(|| UserError::NotFound(email.to_string()))?;

    AuthService::new(&pool).set_password(user.id, password).await?;

    tracing::info!(user_id = %user.id, "Password replaced");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role("vendor").ok(), Some(Role::Vendor));
        assert!(matches!(parse_role("root"), Err(UserError::InvalidRole(_))));
    }
}
