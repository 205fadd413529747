// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Gemini API client.
//!
//! Handles:
//! - Maps-grounded lookups of nearby safety assets
//! - Text generation (briefings, scene analysis)
//! - Speech synthesis
//! - Rate limit detection (HTTP 429 / RESOURCE_EXHAUSTED)

use crate::models::Coordinate;
use serde::{Deserialize, Serialize};

/// Model used for Maps-grounded asset lookups.
pub const GROUNDING_MODEL: &str = "gemini-2.5-flash";
/// Model used for briefings and scene analysis.
pub const TEXT_MODEL: &str = "gemini-3-flash-preview";
/// Model used for speech synthesis.
pub const TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";

const ASSET_PROMPT: &str = "List the nearest hospitals, police stations, and verified safe emergency shelters to this location for rapid public safety response.";

/// Errors from the Gemini API.
#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("Gemini rate limit hit")]
    RateLimited,

    #[error("Gemini API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Gemini request failed: {0}")]
    Http(String),

    #[error("Gemini response parse error: {0}")]
    Parse(String),
}

impl GeminiError {
    /// Whether the error is a quota/rate-limit failure worth retrying.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            GeminiError::RateLimited => true,
            GeminiError::Api { status, body } => {
                *status == 429 || body.contains("RESOURCE_EXHAUSTED")
            }
            _ => false,
        }
    }
}

/// A place cited in the grounding metadata of a Maps-grounded response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GroundingPlace {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
}

// ─── Wire types ─────────────────────────────────────────────────────────────

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_config: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Default, Deserialize)]
struct GroundingChunk {
    #[serde(default)]
    maps: Option<GroundingPlace>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    fn inline(mime_type: &str, data: impl Into<String>) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.to_string(),
                data: data.into(),
            }),
        }
    }
}

impl Content {
    fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts,
        }
    }
}

impl GenerateContentResponse {
    fn first_candidate(&self) -> Option<&Candidate> {
        self.candidates.first()
    }

    /// Concatenated text of the first candidate.
    fn text(&self) -> Option<String> {
        let content = self.first_candidate()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }

    /// Places cited by Maps grounding. Missing metadata means no places.
    fn places(self) -> Vec<GroundingPlace> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.grounding_metadata)
            .map(|m| m.grounding_chunks)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|chunk| chunk.maps)
            .collect()
    }

    fn inline_data(&self) -> Option<String> {
        self.first_candidate()?
            .content
            .as_ref()?
            .parts
            .iter()
            .find_map(|p| p.inline_data.as_ref().map(|d| d.data.clone()))
    }
}

/// Optional media attached to a prompt.
#[derive(Debug, Clone, Default)]
pub struct Attachments<'a> {
    /// Base64 JPEG, with or without a `data:` URL prefix
    pub image: Option<&'a str>,
    /// Base64 WebM audio, with or without a `data:` URL prefix
    pub audio: Option<&'a str>,
}

/// Strip a `data:<mime>;base64,` prefix if present.
pub fn strip_data_url(data: &str) -> &str {
    match data.split_once(',') {
        Some((prefix, payload)) if prefix.starts_with("data:") => payload,
        _ => data,
    }
}

/// Gemini REST client.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiClient {
    /// Create a client for the given API base URL.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Ask Maps grounding for hospitals, police and shelters near `position`.
    pub async fn nearby_places(&self, position: Coordinate) -> Result<Vec<GroundingPlace>, GeminiError> {
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::text(ASSET_PROMPT)])],
            tools: vec![serde_json::json!({ "googleMaps": {} })],
            tool_config: Some(serde_json::json!({
                "retrievalConfig": {
                    "latLng": { "latitude": position.lat, "longitude": position.lng }
                }
            })),
            ..Default::default()
        };

        let response = self.generate(GROUNDING_MODEL, &request).await?;
        Ok(response.places())
    }

    /// Generate text from a prompt with an optional system instruction.
    pub async fn generate_text(
        &self,
        prompt: &str,
        system_instruction: Option<&str>,
        attachments: Attachments<'_>,
    ) -> Result<Option<String>, GeminiError> {
        let mut parts = vec![Part::text(prompt)];
        if let Some(image) = attachments.image {
            parts.push(Part::inline("image/jpeg", strip_data_url(image)));
        }
        if let Some(audio) = attachments.audio {
            parts.push(Part::inline("audio/webm", strip_data_url(audio)));
        }

        let request = GenerateContentRequest {
            contents: vec![Content::user(parts)],
            system_instruction: system_instruction.map(|s| Content {
                role: None,
                parts: vec![Part::text(s)],
            }),
            ..Default::default()
        };

        let response = self.generate(TEXT_MODEL, &request).await?;
        Ok(response.text())
    }

    /// Synthesize speech; returns base64 audio if the model produced any.
    pub async fn synthesize_speech(&self, text: &str, voice: &str) -> Result<Option<String>, GeminiError> {
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::text(text)])],
            generation_config: Some(serde_json::json!({
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": voice } }
                }
            })),
            ..Default::default()
        };

        let response = self.generate(TTS_MODEL, &request).await?;
        Ok(response.inline_data())
    }

    /// POST `models/{model}:generateContent`.
    async fn generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, model);

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| GeminiError::Http(e.to_string()))?;

        self.check_response_json(response).await
    }

    /// Check response status and parse the JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, GeminiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 || body.contains("RESOURCE_EXHAUSTED") {
                tracing::warn!(status = status.as_u16(), "Gemini rate limit hit");
                return Err(GeminiError::RateLimited);
            }

            return Err(GeminiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| GeminiError::Parse(e.to_string()))
    }
}
