//! AI suggestion flows for product listings.
//!
//! Vendors and admins can ask for a description, search tags or a price
//! range while editing a product. Requests go to the Anthropic Messages API
//! and are capped by a process-wide [`FixedWindowLimiter`].

pub mod client;
pub mod error;
pub mod flows;
pub mod limiter;
pub mod types;

pub use client::LlmClient;
pub use error::AiError;
pub use flows::{
    AiAssistant, DescriptionRequest, PriceRequest, PriceSuggestion, ProductDescription,
    ProductTags, TagsRequest, normalize_tags,
};
pub use limiter::FixedWindowLimiter;
