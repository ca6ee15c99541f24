use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use nafanya_common::Error;

use crate::models::{
    ProviderConfig, SafetySetting, DEEPSEEK_API_BASE, DEFAULT_IMAGE_MODEL, GEMINI_API_BASE,
    OPENAI_API_BASE,
};

/// Uniform chat-completion capability: system prompt + user input -> text.
#[async_trait]
pub trait TextProvider: Send + Sync {
    fn name(&self) -> &str;

    /// One request-response round trip, never retried.
    async fn generate_text(
        &self,
        system_prompt: &str,
        user_input: &str,
        max_tokens: u32,
    ) -> anyhow::Result<String>;
}

/// Optional image-generation capability. Returns a URL to the picture.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn generate_image(&self, prompt: &str) -> anyhow::Result<String>;
}

fn build_http_client(config: &ProviderConfig) -> Result<Client, Error> {
    Ok(Client::builder().timeout(config.timeout).build()?)
}

/// Builds the `/chat/completions` request body.
pub fn chat_completion_payload(model: &str, system_prompt: &str, user_input: &str, max_tokens: u32) -> Value {
    json!({
        "model": model,
        "messages": [
            { "role": "system", "content": system_prompt },
            { "role": "user", "content": user_input },
        ],
        "max_tokens": max_tokens,
    })
}

/// Extracts the first choice's text from a chat-completion response.
pub fn parse_chat_completion(data: &Value) -> anyhow::Result<String> {
    if let Some(error) = data.get("error") {
        tracing::error!("API returned error: {:?}", error);
        let error_message = error.get("message").and_then(|m| m.as_str()).unwrap_or("Unknown error");
        return Err(anyhow::anyhow!("API error: {}", error_message));
    }

    let choices = match data.get("choices").and_then(|c| c.as_array()) {
        Some(choices) => choices,
        None => {
            tracing::error!("Response missing 'choices' array: {:?}", data);
            return Err(anyhow::anyhow!("Response missing 'choices' array"));
        }
    };

    let first = choices.first().ok_or_else(|| {
        tracing::error!("API returned empty choices array");
        anyhow::anyhow!("No completions returned")
    })?;

    let message = first.get("message").ok_or_else(|| {
        tracing::error!("First choice missing 'message': {:?}", first);
        anyhow::anyhow!("Response choice missing 'message'")
    })?;

    let content = message.get("content").and_then(|c| c.as_str()).ok_or_else(|| {
        tracing::error!("Message missing 'content': {:?}", message);
        anyhow::anyhow!("Response message missing 'content'")
    })?;

    Ok(content.to_string())
}

pub fn image_payload(model: &str, prompt: &str) -> Value {
    json!({
        "model": model,
        "prompt": prompt,
        "n": 1,
        "size": "1024x1024",
        "response_format": "url",
        "quality": "hd",
    })
}

pub fn parse_image_response(data: &Value) -> anyhow::Result<String> {
    if let Some(error) = data.get("error") {
        let error_message = error.get("message").and_then(|m| m.as_str()).unwrap_or("Unknown error");
        return Err(anyhow::anyhow!("API error: {}", error_message));
    }
    data.get("data")
        .and_then(|d| d.as_array())
        .and_then(|items| items.first())
        .and_then(|item| item.get("url"))
        .and_then(|u| u.as_str())
        .map(|u| u.to_string())
        .ok_or_else(|| anyhow::anyhow!("Image response missing 'data[0].url'"))
}

async fn post_json(request: reqwest::RequestBuilder, payload: &Value) -> anyhow::Result<Value> {
    let response = request.json(payload).send().await?;

    // Get the raw response text first for better error handling
    let response_text = response.text().await?;
    tracing::debug!("Raw API response: {}", response_text);

    match serde_json::from_str::<Value>(&response_text) {
        Ok(json) => Ok(json),
        Err(e) => {
            tracing::error!("Failed to parse API response as JSON: {:?}", e);
            Err(anyhow::anyhow!("API returned non-JSON response: {}", e))
        }
    }
}

/// OpenAI chat-completions adapter. DeepSeek speaks the same protocol on a
/// different base URL, so it is served by the same type.
pub struct OpenAiCompatibleProvider {
    name: &'static str,
    default_base: &'static str,
    config: ProviderConfig,
    client: Client,
}

impl OpenAiCompatibleProvider {
    pub fn openai(config: ProviderConfig) -> Result<Self, Error> {
        Ok(Self {
            name: "oai",
            default_base: OPENAI_API_BASE,
            client: build_http_client(&config)?,
            config,
        })
    }

    pub fn deepseek(config: ProviderConfig) -> Result<Self, Error> {
        Ok(Self {
            name: "deepseek",
            default_base: DEEPSEEK_API_BASE,
            client: build_http_client(&config)?,
            config,
        })
    }

    fn api_base(&self) -> String {
        self.config.api_base_or(self.default_base)
    }
}

#[async_trait]
impl TextProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        self.name
    }

    async fn generate_text(
        &self,
        system_prompt: &str,
        user_input: &str,
        max_tokens: u32,
    ) -> anyhow::Result<String> {
        let url = format!("{}/chat/completions", self.api_base());
        let payload = chat_completion_payload(&self.config.default_model, system_prompt, user_input, max_tokens);

        tracing::debug!("{}: POST {} (model={}, max_tokens={})", self.name, url, self.config.default_model, max_tokens);

        let request = self.client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key));
        let data = post_json(request, &payload).await?;
        parse_chat_completion(&data)
    }
}

#[async_trait]
impl ImageProvider for OpenAiCompatibleProvider {
    async fn generate_image(&self, prompt: &str) -> anyhow::Result<String> {
        let url = format!("{}/images/generations", self.api_base());
        let payload = image_payload(DEFAULT_IMAGE_MODEL, prompt);

        tracing::debug!("{}: POST {}", self.name, url);

        let request = self.client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.config.api_key));
        let data = post_json(request, &payload).await?;
        parse_image_response(&data)
    }
}

/// Google Gemini `generateContent` adapter.
pub struct GeminiProvider {
    config: ProviderConfig,
    safety_settings: Vec<SafetySetting>,
    client: Client,
}

impl GeminiProvider {
    pub fn new(config: ProviderConfig, safety_settings: Vec<SafetySetting>) -> Result<Self, Error> {
        Ok(Self {
            client: build_http_client(&config)?,
            config,
            safety_settings,
        })
    }
}

pub fn gemini_payload(
    system_prompt: &str,
    user_input: &str,
    max_tokens: u32,
    safety_settings: &[SafetySetting],
) -> Value {
    json!({
        "systemInstruction": { "parts": [{ "text": system_prompt }] },
        "contents": [{ "role": "user", "parts": [{ "text": user_input }] }],
        "safetySettings": safety_settings,
        "generationConfig": { "maxOutputTokens": max_tokens },
    })
}

/// Concatenates every text part of every candidate. An answer without any
/// text (usually a safety block) is an error; the reasons get logged.
pub fn parse_gemini_response(data: &Value) -> anyhow::Result<String> {
    if let Some(error) = data.get("error") {
        tracing::error!("Gemini returned error: {:?}", error);
        let error_message = error.get("message").and_then(|m| m.as_str()).unwrap_or("Unknown error");
        return Err(anyhow::anyhow!("API error: {}", error_message));
    }

    let candidates = data.get("candidates").and_then(|c| c.as_array());
    let mut text = String::new();
    for cand in candidates.into_iter().flatten() {
        let parts = cand.pointer("/content/parts").and_then(|p| p.as_array());
        for part in parts.into_iter().flatten() {
            if let Some(t) = part.get("text").and_then(|t| t.as_str()) {
                text.push_str(t);
            }
        }
    }

    if text.is_empty() {
        for cand in candidates.into_iter().flatten() {
            let reason = cand.get("finishReason").and_then(|r| r.as_str()).unwrap_or("UNKNOWN");
            tracing::warn!("Gemini candidate finish reason: {}", reason);
            let ratings = cand.get("safetyRatings").and_then(|r| r.as_array());
            for rating in ratings.into_iter().flatten() {
                tracing::warn!(
                    "Gemini safety: {} {}",
                    rating.get("category").and_then(|c| c.as_str()).unwrap_or("?"),
                    rating.get("probability").and_then(|p| p.as_str()).unwrap_or("?"),
                );
            }
        }
        if let Some(block) = data.pointer("/promptFeedback/blockReason").and_then(|b| b.as_str()) {
            return Err(anyhow::anyhow!("Prompt blocked: {}", block));
        }
        return Err(anyhow::anyhow!("Gemini returned no text"));
    }

    Ok(text)
}

#[async_trait]
impl TextProvider for GeminiProvider {
    fn name(&self) -> &str {
        "google"
    }

    async fn generate_text(
        &self,
        system_prompt: &str,
        user_input: &str,
        max_tokens: u32,
    ) -> anyhow::Result<String> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.api_base_or(GEMINI_API_BASE),
            self.config.default_model
        );
        let payload = gemini_payload(system_prompt, user_input, max_tokens, &self.safety_settings);

        tracing::debug!("google: POST {} (max_tokens={})", url, max_tokens);

        let request = self.client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key);
        let data = post_json(request, &payload).await?;
        parse_gemini_response(&data)
    }
}
