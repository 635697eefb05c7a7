use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

const MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("api key is not configured (set GEMINI_API_KEY)")]
    MissingKey,
    #[error("invalid API URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server error: {0}")]
    Server(String),
    #[error("the model returned no text")]
    EmptyResponse,
    #[error("malformed draft payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// The structured draft the editor asks for. The parse is fail-closed:
/// missing, extra, or mistyped fields reject the whole payload.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Draft {
    pub excerpt: String,
    pub content: String,
}

// Response envelope of the generateContent endpoint. Only the first
// candidate's first text part is consumed; the envelope itself is
// parsed leniently because its shape is not ours to enforce.
#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

/// One prompt/response round trip to the text-generation API. No retry,
/// no timeout beyond the transport default, no partial results.
#[derive(Clone)]
pub struct DraftClient {
    client: Client,
    base: Url,
    api_key: String,
}

impl DraftClient {
    pub fn new(base: &str, api_key: &str) -> Result<Self, DraftError> {
        let base = Url::parse(base)?;
        let client = Client::builder().user_agent(Self::user_agent()).build()?;
        Ok(DraftClient {
            client,
            base,
            api_key: api_key.to_string(),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("devlog-backend/", env!("CARGO_PKG_VERSION"))
    }

    pub async fn generate_draft(&self, title: &str, notes: &str) -> Result<Draft, DraftError> {
        if self.api_key.is_empty() {
            return Err(DraftError::MissingKey);
        }

        let url = self
            .base
            .join(&format!("/v1beta/models/{}:generateContent", MODEL))?;

        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": build_prompt(title, notes) }] }],
            "generationConfig": { "responseMimeType": "application/json" }
        });

        let resp = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(DraftError::Server(format!("status {status} body {text}")));
        }

        let envelope: GenerateContentResponse = resp.json().await?;
        let text = envelope
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .ok_or(DraftError::EmptyResponse)?;

        parse_draft(&text)
    }
}

fn build_prompt(title: &str, notes: &str) -> String {
    format!(
        "You are a technical editor for a Developer Vlog.\n\
         I will give you a title and some rough notes for a blog post.\n\n\
         Task 1: Write a catchy, 2-sentence excerpt/summary (max 150 chars).\n\
         Task 2: Expand the notes into a professional, engaging 2-paragraph blog post introduction.\n\n\
         Title: {title}\n\
         Notes: {notes}\n\n\
         Output JSON format only:\n\
         {{\n  \"excerpt\": \"...\",\n  \"content\": \"...\"\n}}"
    )
}

/// Parses the model's text payload as the two-field draft record.
pub fn parse_draft(text: &str) -> Result<Draft, DraftError> {
    Ok(serde_json::from_str(text)?)
}
