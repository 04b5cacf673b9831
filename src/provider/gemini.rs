//! Google Gemini provider implementation.

use super::{CodeGenerator, ProviderError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default completion model when the config names none.
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini code generator.
pub struct GeminiGenerator {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    max_output_tokens: usize,
}

impl GeminiGenerator {
    /// Create a generator with an explicit API key.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        max_output_tokens: usize,
        timeout_secs: u64,
    ) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature,
            max_output_tokens,
        }
    }

    /// Create a generator from the `GEMINI_API_KEY` environment variable.
    ///
    /// Returns `None` when the variable is unset or empty; the caller turns
    /// that into its own "not configured" error with a setup hint.
    pub fn from_env(
        model: impl Into<String>,
        temperature: f32,
        max_output_tokens: usize,
        timeout_secs: u64,
    ) -> Option<Self> {
        let key = std::env::var("GEMINI_API_KEY").ok()?;
        if key.trim().is_empty() {
            return None;
        }
        Some(Self::new(
            key,
            model,
            temperature,
            max_output_tokens,
            timeout_secs,
        ))
    }

    /// Override the API base URL (local proxies, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// The model this generator completes with.
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CodeGenerator for GeminiGenerator {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, system: &str, user: &str) -> Result<String, ProviderError> {
        let request = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: system.to_string(),
                }],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: user.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        };

        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let message = response.text().await.unwrap_or_default();
            if status == 401 || status == 403 {
                return Err(ProviderError::AuthenticationFailed);
            }
            return Err(ProviderError::Api { status, message });
        }

        let api_response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        if let Some(usage) = &api_response.usage_metadata {
            debug!(
                "Gemini call: {} prompt tokens, {} completion tokens",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        let text: String = api_response
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ProviderError::EmptyCompletion);
        }

        Ok(text)
    }
}

// ============================================================================
// Gemini API types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: usize,
    #[serde(default)]
    candidates_token_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serialises_in_camel_case() {
        let request = GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: "sys".into(),
                }],
            },
            contents: vec![Content {
                role: Some("user".into()),
                parts: vec![Part {
                    text: "hello".into(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.2,
                max_output_tokens: 8192,
            },
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"systemInstruction\""));
        assert!(json.contains("\"generationConfig\""));
        assert!(json.contains("\"maxOutputTokens\":8192"));
        // Unset role must be absent, not null.
        assert!(!json.contains("\"role\":null"));
    }

    #[test]
    fn response_parses_candidate_text() {
        let body = r#"{
            "candidates": [
                {"content": {"parts": [{"text": "import pdfplumber\n"}], "role": "model"}}
            ],
            "usageMetadata": {"promptTokenCount": 120, "candidatesTokenCount": 40}
        }"#;
        let parsed: GenerateContentResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(
            parsed.candidates[0].content.parts[0].text,
            "import pdfplumber\n"
        );
        assert_eq!(parsed.usage_metadata.unwrap().prompt_token_count, 120);
    }

    #[test]
    fn response_without_candidates_parses_to_empty() {
        let parsed: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.candidates.is_empty());
    }

    #[test]
    fn from_env_requires_a_nonempty_key() {
        // Scoped env mutation; no other test in this module reads the var.
        std::env::remove_var("GEMINI_API_KEY");
        assert!(GeminiGenerator::from_env(DEFAULT_MODEL, 0.2, 8192, 120).is_none());
    }
}
