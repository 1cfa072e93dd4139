//! Chat-completion request/response shapes and the YES/NO verdict call.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Route;
use crate::error::ClientError;

pub const PROMPT: &str = "Analyze this screenshot. Is there any pornographic, nude, or sexually \
explicit content visible? Reply with ONLY 'YES' if there is ANY inappropriate content, or 'NO' \
if the content is safe. Do not explain, just answer YES or NO.";

pub const PROXY_TOKEN_HEADER: &str = "X-Proxy-Token";

const CLASSIFY_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_TOKENS: u32 = 10;

/// How far into the answer a YES still counts.
const VERDICT_WINDOW: usize = 20;

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

pub fn build_request(model: &str, jpeg: &[u8]) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        messages: vec![ChatMessage {
            role: "user",
            content: vec![
                ContentPart::Text {
                    text: PROMPT.to_string(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: format!("data:image/jpeg;base64,{}", B64.encode(jpeg)),
                    },
                },
            ],
        }],
        max_tokens: MAX_TOKENS,
    }
}

/// Lenient reading of the model's answer: flagged if it starts with YES or
/// mentions YES within the first few characters.
pub fn is_flagged(answer: &str) -> bool {
    let upper = answer.trim().to_uppercase();
    let window: String = upper.chars().take(VERDICT_WINDOW).collect();
    upper.starts_with("YES") || window.contains("YES")
}

/// Sends classification requests along the configured route.
pub struct Classifier {
    http: reqwest::Client,
    route: Route,
}

impl Classifier {
    pub fn new(route: Route) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder().timeout(CLASSIFY_TIMEOUT);
        builder = match &route {
            Route::Direct { proxy: Some(proxy), .. } => builder.proxy(reqwest::Proxy::all(proxy)?),
            _ => builder.no_proxy(),
        };
        Ok(Self {
            http: builder.build()?,
            route,
        })
    }

    /// Returns the model's raw answer text.
    pub async fn classify(&self, request: &ChatRequest) -> Result<String, ClientError> {
        let pending = match &self.route {
            Route::Relay { url, token } => {
                let mut req = self.http.post(url).json(request);
                if let Some(token) = token {
                    req = req.header(PROXY_TOKEN_HEADER, token);
                }
                req
            }
            Route::Direct { url, api_key, .. } => {
                let api_key = api_key.as_deref().ok_or(ClientError::MissingApiKey)?;
                self.http.post(url).bearer_auth(api_key).json(request)
            }
        };

        let response = pending.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Classification API error: {} - {}", status, body);
            return Err(ClientError::Api(status.as_u16()));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ClientError::MalformedResponse(e.to_string()))?;
        let answer = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::MalformedResponse("no choices in response".into()))?
            .message
            .content
            .unwrap_or_default();

        debug!("Model answered '{}'", answer);
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_heuristic() {
        assert!(is_flagged("YES"));
        assert!(is_flagged("  yes."));
        assert!(is_flagged("Answer: YES"));
        assert!(!is_flagged("NO"));
        assert!(!is_flagged(""));
        // YES beyond the first 20 characters does not count
        assert!(!is_flagged("The answer, honestly, is YES"));
    }

    #[test]
    fn request_shape_matches_chat_completions() {
        let request = build_request("some/model", &[0xFF, 0xD8, 0xFF]);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "some/model");
        assert_eq!(json["max_tokens"], 10);
        let content = &json["messages"][0]["content"];
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(content[0]["type"], "text");
        assert_eq!(content[0]["text"], PROMPT);
        assert_eq!(content[1]["type"], "image_url");
        assert_eq!(content[1]["image_url"]["url"], "data:image/jpeg;base64,/9j/");
    }

    #[test]
    fn response_with_null_content_reads_as_empty() {
        let parsed: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }
}
