use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Client for the external text-generation endpoint: one prompt in, one text
/// completion out. No conversation state is held on either side.
#[derive(Clone)]
pub struct GenerationClient {
    client: Client,
    api_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    text: String,
}

impl GenerationClient {
    pub fn new(api_url: &str, api_key: &str) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub async fn generate(&self, prompt: &str) -> Result<String, String> {
        let request = GenerateRequest {
            prompt,
            max_tokens: 256,
            temperature: 0.8,
        };

        let response = self.client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| format!("generation request failed: {e}"))?;

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("generation API error: {body}"));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| format!("generation response parse failed: {e}"))?;

        if parsed.text.trim().is_empty() {
            return Err("generation API returned empty text".to_string());
        }

        tracing::debug!(prompt_len = prompt.len(), "generation completed");
        Ok(parsed.text)
    }
}
