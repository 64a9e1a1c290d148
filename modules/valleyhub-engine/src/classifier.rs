//! Classification seam.
//!
//! The external model call is non-deterministic, so it lives behind one
//! narrow trait. Everything downstream (resolution, dedup, indexing) is
//! deterministic and unit-tests against `testing::FixtureClassifier`.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use valleyhub_common::{Category, Classification, Place};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const HAIKU_MODEL: &str = "claude-haiku-4-5-20251001";

#[async_trait]
pub trait Classifier: Send + Sync {
    /// Best-guess structured metadata for one raw item.
    async fn classify(&self, title: &str, body: &str) -> Result<Classification>;
}

// ---------------------------------------------------------------------------
// Claude implementation
// ---------------------------------------------------------------------------

/// What the model returns. Every field is optional; the mapping below
/// falls back rather than fail on a sparse response.
#[derive(Debug, Deserialize, JsonSchema)]
struct RawClassification {
    /// Exactly two professional sentences.
    summary: Option<String>,
    /// The specific venue (e.g. "PPL Center") or "Various Locations".
    venue: Option<String>,
    /// One of: Allentown, Bethlehem, Easton, Greater Valley.
    location: Option<String>,
    /// Neighborhood or district name, when the text names one.
    neighborhood: Option<String>,
    /// One of: Family, Nightlife, Arts, News, General.
    category: Option<String>,
}

pub struct ClaudeClassifier {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
}

impl ClaudeClassifier {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            http: reqwest::Client::new(),
            base_url: ANTHROPIC_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    fn prompt(title: &str, body: &str) -> String {
        let schema = serde_json::to_string_pretty(&schema_for!(RawClassification))
            .unwrap_or_default();
        let snippet: String = body.chars().take(800).collect();
        format!(
            "Act as a Lehigh Valley regional analyst. Extract structured metadata \
             from this news snippet.\n\
             Rules:\n\
             1. Summary MUST be exactly 2 professional sentences.\n\
             2. Location MUST be one of: Allentown, Bethlehem, Easton, Greater Valley.\n\
             3. Category MUST be one of: Family, Nightlife, Arts, News, General.\n\
             4. Venue should be the specific place (e.g. \"PPL Center\", \"SteelStacks\") \
             or \"Various Locations\".\n\n\
             Input title: {title}\n\
             Input content: {snippet}\n\n\
             Return ONLY a JSON object matching this schema:\n{schema}"
        )
    }
}

#[async_trait]
impl Classifier for ClaudeClassifier {
    async fn classify(&self, title: &str, body: &str) -> Result<Classification> {
        let request = MessagesRequest {
            model: HAIKU_MODEL,
            max_tokens: 512,
            messages: vec![Message {
                role: "user",
                content: Self::prompt(title, body),
            }],
        };

        debug!(model = HAIKU_MODEL, "Classification request");
        let response = self
            .http
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Anthropic API error ({status}): {error_text}"));
        }

        let body: MessagesResponse = response.json().await?;
        let text = body
            .content
            .first()
            .map(|block| block.text.as_str())
            .unwrap_or_default();

        Ok(parse_classification(title, text))
    }
}

/// Map the model's loose output into typed fields. A malformed payload
/// degrades to a generic regional classification rather than failing the
/// item (the original content still carries the title).
fn parse_classification(title: &str, text: &str) -> Classification {
    let stripped = text
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let raw: RawClassification = match serde_json::from_str(stripped) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "Unparseable classification, using fallback");
            return fallback(title);
        }
    };

    Classification {
        summary: raw
            .summary
            .unwrap_or_else(|| format!("Regional update: {title}.")),
        venue: raw.venue.unwrap_or_else(|| "Various Locations".to_string()),
        place: raw
            .location
            .map(|s| Place::from_str_loose(&s))
            .unwrap_or(Place::GreaterValley),
        neighborhood: raw.neighborhood.filter(|n| !n.trim().is_empty()),
        category: raw
            .category
            .map(|s| Category::from_str_loose(&s))
            .unwrap_or(Category::News),
    }
}

fn fallback(title: &str) -> Classification {
    Classification {
        summary: title.to_string(),
        venue: "Various Locations".to_string(),
        place: Place::GreaterValley,
        neighborhood: None,
        category: Category::News,
    }
}

// --- Wire types ---

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_json_response() {
        let text = "```json\n{\"summary\": \"One. Two.\", \"venue\": \"SteelStacks\", \
                    \"location\": \"Bethlehem\", \"category\": \"Arts\"}\n```";
        let c = parse_classification("Show", text);
        assert_eq!(c.venue, "SteelStacks");
        assert_eq!(c.place, Place::Bethlehem);
        assert_eq!(c.category, Category::Arts);
        assert!(c.neighborhood.is_none());
    }

    #[test]
    fn malformed_payload_degrades_to_fallback() {
        let c = parse_classification("Storm closes bridge", "not json at all");
        assert_eq!(c.summary, "Storm closes bridge");
        assert_eq!(c.venue, "Various Locations");
        assert_eq!(c.place, Place::GreaterValley);
        assert_eq!(c.category, Category::News);
    }

    #[test]
    fn unknown_enum_strings_map_loosely() {
        let text = "{\"location\": \"Greater LV\", \"category\": \"Sports\"}";
        let c = parse_classification("Game", text);
        assert_eq!(c.place, Place::GreaterValley);
        assert_eq!(c.category, Category::General);
    }
}
