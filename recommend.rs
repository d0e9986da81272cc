use crate::config::RecommendationConfig;
use crate::error::{Error, Result};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

const PROMPT_HEAD: &str = "다음 식재료로 만들 수 있는 음식을 5개만 추천해 주는데 형식대로 대답해줘 \
(형식: ** 음식1 **\n ** 음식2 **\n ** 음식3 **\n ** 음식4 **\n ** 음식5 **) 식재료 : ";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Client for a Gemini-style `generateContent` endpoint. One request per call,
/// no retry. Replies are split into lines, never checked against the
/// requested `** dish **` shape.
pub struct RecommendationClient {
    client: Client,
    api_url: String,
    api_key: String,
}

impl RecommendationClient {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(client, api_url, api_key))
    }

    pub fn with_client(client: Client, api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Fails when no API key is configured or set in the environment.
    pub fn from_config(config: &RecommendationConfig) -> Result<Self> {
        let api_key = config.resolve_api_key()?;
        Self::new(config.api_url.clone(), api_key)
    }

    pub async fn recommend(&self, ingredient_names: &[String]) -> Result<Vec<String>> {
        let prompt = build_prompt(ingredient_names);
        let body = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: &prompt }],
            }],
        };
        let url = Url::parse_with_params(&self.api_url, &[("key", self.api_key.as_str())])
            .map_err(|e| Error::Config(format!("Invalid recommendation URL: {e}")))?;

        log::debug!("Requesting recommendations for {} ingredients", ingredient_names.len());
        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Recommendation(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| Error::Recommendation(format!("Failed to read response: {e}")))?;
        log::info!("Recommendation API responded with {status}");

        if !status.is_success() {
            log::error!("Recommendation API error ({status}): {response_text}");
            return Err(Error::Recommendation(format!(
                "Recommendation API error ({status})"
            )));
        }

        let text = extract_text(&response_text)?;
        Ok(parse_recommendations(&text))
    }
}

pub fn build_prompt(ingredient_names: &[String]) -> String {
    format!("{PROMPT_HEAD}{}", ingredient_names.join(", "))
}

/// Splits generated text into lines, dropping empty ones and keeping order.
pub fn parse_recommendations(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Pulls `candidates[0].content.parts[0].text` out of a response body.
fn extract_text(body: &str) -> Result<String> {
    let response: GenerateResponse = serde_json::from_str(body).map_err(|e| {
        log::error!("Failed to parse recommendation response: {e}");
        Error::Recommendation(format!("Malformed response: {e}"))
    })?;
    response
        .candidates
        .and_then(|candidates| candidates.into_iter().next())
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts)
        .and_then(|parts| parts.into_iter().next())
        .and_then(|part| part.text)
        .ok_or_else(|| Error::Recommendation("Response has no generated text".into()))
}
