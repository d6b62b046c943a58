//! Product suggestion flows.
//!
//! Each flow builds a prompt, asks for a JSON-only reply, pulls the JSON
//! object out of the reply text and validates it into a typed suggestion.

use std::collections::BTreeSet;
use std::time::Instant;

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use bazaar_core::Money;

use super::client::LlmClient;
use super::error::AiError;
use super::limiter::FixedWindowLimiter;

const SYSTEM_PROMPT: &str = "You help independent sellers on an online marketplace write \
product listings. Reply with a single JSON object and nothing else: no prose, no code fences.";

/// Most tags a product may carry.
pub const MAX_TAGS: usize = 10;

/// Input to [`AiAssistant::product_description`].
#[derive(Debug, Clone, Deserialize)]
pub struct DescriptionRequest {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// A suggested product description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDescription {
    pub description: String,
    #[serde(default)]
    pub highlights: Vec<String>,
}

/// Input to [`AiAssistant::product_tags`].
#[derive(Debug, Clone, Deserialize)]
pub struct TagsRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Suggested search tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductTags {
    pub tags: Vec<String>,
}

/// Input to [`AiAssistant::price_suggestion`].
#[derive(Debug, Clone, Deserialize)]
pub struct PriceRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    /// Prices of similar listed products. Filled in by the server.
    #[serde(skip)]
    pub comparable_prices: Vec<Money>,
}

/// A suggested price range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceSuggestion {
    pub suggested_price: Money,
    pub min_price: Money,
    pub max_price: Money,
    pub rationale: String,
}

#[derive(Debug, Deserialize)]
struct RawPriceSuggestion {
    suggested_price: Decimal,
    min_price: Decimal,
    max_price: Decimal,
    #[serde(default)]
    rationale: String,
}

/// Entry point for the AI flows: optional client plus the shared limiter.
#[derive(Debug)]
pub struct AiAssistant {
    client: Option<LlmClient>,
    limiter: FixedWindowLimiter,
}

impl AiAssistant {
    #[must_use]
    pub const fn new(client: Option<LlmClient>, limiter: FixedWindowLimiter) -> Self {
        Self { client, limiter }
    }

    /// Whether an API key is configured.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    /// Requests allowed per window; zero when disabled.
    #[must_use]
    pub const fn per_minute(&self) -> u32 {
        self.limiter.limit()
    }

    /// Suggest a description and a few highlights.
    ///
    /// # Errors
    ///
    /// Returns `AiError::Disabled` without a client, `AiError::LimitReached`
    /// over budget, or the client/parse/validation error.
    pub async fn product_description(
        &self,
        request: &DescriptionRequest,
    ) -> Result<ProductDescription, AiError> {
        let reply = self.ask(&description_prompt(request)).await?;
        parse_description(&reply)
    }

    /// Suggest up to ten lowercase search tags.
    ///
    /// # Errors
    ///
    /// See [`AiAssistant::product_description`].
    pub async fn product_tags(&self, request: &TagsRequest) -> Result<ProductTags, AiError> {
        let reply = self.ask(&tags_prompt(request)).await?;
        parse_tags(&reply)
    }

    /// Suggest a price and a sensible range.
    ///
    /// # Errors
    ///
    /// See [`AiAssistant::product_description`].
    pub async fn price_suggestion(
        &self,
        request: &PriceRequest,
    ) -> Result<PriceSuggestion, AiError> {
        let reply = self.ask(&price_prompt(request)).await?;
        parse_price(&reply)
    }

    async fn ask(&self, prompt: &str) -> Result<String, AiError> {
        let client = self.client.as_ref().ok_or(AiError::Disabled)?;
        self.limiter
            .try_acquire(Instant::now())
            .map_err(AiError::LimitReached)?;
        client.complete(SYSTEM_PROMPT, prompt).await
    }
}

fn description_prompt(request: &DescriptionRequest) -> String {
    let mut prompt = format!("Write a product description for \"{}\".", request.name.trim());
    if let Some(category) = request.category.as_deref().filter(|c| !c.trim().is_empty()) {
        prompt.push_str(&format!("\nCategory: {}", category.trim()));
    }
    if !request.keywords.is_empty() {
        prompt.push_str(&format!("\nWork in these keywords: {}", request.keywords.join(", ")));
    }
    prompt.push_str(
        "\n\nRespond as {\"description\": string (2-4 sentences), \
         \"highlights\": [string] (3-5 short bullet points)}.",
    );
    prompt
}

fn tags_prompt(request: &TagsRequest) -> String {
    format!(
        "Suggest search tags for the product \"{}\".\nDescription: {}\n\n\
         Respond as {{\"tags\": [string]}} with at most {MAX_TAGS} short lowercase tags.",
        request.name.trim(),
        request.description.trim()
    )
}

fn price_prompt(request: &PriceRequest) -> String {
    let mut prompt = format!(
        "Suggest a retail price in US dollars for \"{}\".\nDescription: {}",
        request.name.trim(),
        request.description.trim()
    );
    if let Some(category) = request.category.as_deref().filter(|c| !c.trim().is_empty()) {
        prompt.push_str(&format!("\nCategory: {}", category.trim()));
    }
    if !request.comparable_prices.is_empty() {
        let prices: Vec<String> = request
            .comparable_prices
            .iter()
            .map(ToString::to_string)
            .collect();
        prompt.push_str(&format!(
            "\nSimilar products in this marketplace sell for: {}",
            prices.join(", ")
        ));
    }
    prompt.push_str(
        "\n\nRespond as {\"suggested_price\": number, \"min_price\": number, \
         \"max_price\": number, \"rationale\": string}.",
    );
    prompt
}

/// The outermost `{...}` in `text`, ignoring any surrounding prose or fences.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn parse_json<T: DeserializeOwned>(reply: &str) -> Result<T, AiError> {
    let json = extract_json_object(reply)
        .ok_or_else(|| AiError::Parse("reply contains no JSON object".to_owned()))?;
    serde_json::from_str(json).map_err(|e| AiError::Parse(e.to_string()))
}

fn parse_description(reply: &str) -> Result<ProductDescription, AiError> {
    let raw: ProductDescription = parse_json(reply)?;
    let description = raw.description.trim().to_owned();
    if description.is_empty() {
        return Err(AiError::Invalid("description is empty".to_owned()));
    }
    let highlights = raw
        .highlights
        .into_iter()
        .map(|h| h.trim().to_owned())
        .filter(|h| !h.is_empty())
        .collect();
    Ok(ProductDescription {
        description,
        highlights,
    })
}

fn parse_tags(reply: &str) -> Result<ProductTags, AiError> {
    let raw: ProductTags = parse_json(reply)?;
    Ok(ProductTags {
        tags: normalize_tags(raw.tags)?,
    })
}

/// Lowercase, trim, drop blanks and duplicates (keeping first-seen order),
/// and cap at [`MAX_TAGS`].
///
/// # Errors
///
/// Returns `AiError::Invalid` when nothing usable remains.
pub fn normalize_tags<I>(tags: I) -> Result<Vec<String>, AiError>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = BTreeSet::new();
    let tags: Vec<String> = tags
        .into_iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .take(MAX_TAGS)
        .collect();
    if tags.is_empty() {
        return Err(AiError::Invalid("no tags suggested".to_owned()));
    }
    Ok(tags)
}

fn parse_price(reply: &str) -> Result<PriceSuggestion, AiError> {
    let raw: RawPriceSuggestion = parse_json(reply)?;
    let money = |d: Decimal| {
        Money::new(d)
            .map(Money::round_cents)
            .map_err(|e| AiError::Invalid(e.to_string()))
    };
    let suggestion = PriceSuggestion {
        suggested_price: money(raw.suggested_price)?,
        min_price: money(raw.min_price)?,
        max_price: money(raw.max_price)?,
        rationale: raw.rationale.trim().to_owned(),
    };

    if suggestion.min_price.is_zero() {
        return Err(AiError::Invalid("minimum price must be positive".to_owned()));
    }
    if suggestion.min_price > suggestion.suggested_price
        || suggestion.suggested_price > suggestion.max_price
    {
        return Err(AiError::Invalid(format!(
            "price range out of order: {} <= {} <= {}",
            suggestion.min_price, suggestion.suggested_price, suggestion.max_price
        )));
    }
    Ok(suggestion)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_json_ignores_fences_and_prose() {
        let reply = "Sure! ```json\n{\"tags\": [\"a\"]}\n``` Hope that helps.";
        assert_eq!(extract_json_object(reply), Some("{\"tags\": [\"a\"]}"));
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }

    #[test]
    fn test_parse_description() {
        let parsed = parse_description(
            r#"{"description": "  A sturdy mug.  ", "highlights": ["Dishwasher safe", " "]}"#,
        )
        .expect("valid");
        assert_eq!(parsed.description, "A sturdy mug.");
        assert_eq!(parsed.highlights, vec!["Dishwasher safe".to_owned()]);

        assert!(matches!(
            parse_description(r#"{"description": ""}"#),
            Err(AiError::Invalid(_))
        ));
        assert!(matches!(parse_description("nope"), Err(AiError::Parse(_))));
    }

    #[test]
    fn test_tags_are_lowercased_deduplicated_and_capped() {
        let reply = r#"{"tags": ["Mug", "mug", " Coffee ", "", "a", "b", "c", "d", "e", "f", "g", "h", "i"]}"#;
        let tags = parse_tags(reply).expect("valid").tags;
        assert_eq!(tags.len(), MAX_TAGS);
        assert_eq!(tags.first().map(String::as_str), Some("mug"));
        assert_eq!(tags.get(1).map(String::as_str), Some("coffee"));
        assert!(matches!(parse_tags(r#"{"tags": [" "]}"#), Err(AiError::Invalid(_))));
    }

    #[test]
    fn test_price_suggestion_ordering() {
        let ok = parse_price(
            r#"{"suggested_price": 24.99, "min_price": "19.5", "max_price": 29, "rationale": "Mid-range"}"#,
        )
        .expect("valid");
        assert_eq!(ok.suggested_price, "24.99".parse().expect("money"));
        assert_eq!(ok.min_price, "19.50".parse().expect("money"));

        let unordered =
            r#"{"suggested_price": 10, "min_price": 12, "max_price": 20, "rationale": ""}"#;
        assert!(matches!(parse_price(unordered), Err(AiError::Invalid(_))));

        let zero = r#"{"suggested_price": 0, "min_price": 0, "max_price": 5, "rationale": ""}"#;
        assert!(matches!(parse_price(zero), Err(AiError::Invalid(_))));

        let negative = r#"{"suggested_price": 5, "min_price": -1, "max_price": 5, "rationale": ""}"#;
        assert!(matches!(parse_price(negative), Err(AiError::Invalid(_))));
    }

    #[test]
    fn test_prompts_mention_inputs() {
        let prompt = price_prompt(&PriceRequest {
            name: "Tee".to_owned(),
            description: "Cotton".to_owned(),
            category: Some("Apparel".to_owned()),
            comparable_prices: vec![Money::from_cents(1500)],
        });
        assert!(prompt.contains("\"Tee\""));
        assert!(prompt.contains("Category: Apparel"));
        assert!(prompt.contains("$15.00"));

        let prompt = description_prompt(&DescriptionRequest {
            name: "Mug".to_owned(),
            category: None,
            keywords: vec!["ceramic".to_owned()],
        });
        assert!(prompt.contains("ceramic"));
        assert!(!prompt.contains("Category"));
    }

    #[tokio::test]
    async fn test_disabled_without_client() {
        let assistant = AiAssistant::new(None, FixedWindowLimiter::new(5));
        assert!(!assistant.is_enabled());
        let err = assistant
            .product_tags(&TagsRequest {
                name: "Mug".to_owned(),
                description: String::new(),
            })
            .await
            .expect_err("disabled");
        assert!(matches!(err, AiError::Disabled));
    }
}
