//! Domain value types shared by the server and CLI.

pub mod email;
pub mod id;
pub mod money;
pub mod slug;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{Money, MoneyError, Percent};
pub use slug::{is_valid_slug, slugify};
pub use status::*;
