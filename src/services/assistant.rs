// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tactical assistant: briefings, scene analysis and spoken replies.
//!
//! Every operation degrades to a fixed message instead of failing, so
//! callers can always show something.

use crate::models::Coordinate;
use crate::services::gemini::{Attachments, GeminiClient, GeminiError};
use crate::services::retry::RetryPolicy;

pub const BRIEFING_EMPTY: &str = "Situational awareness recommended in current sector.";
pub const BRIEFING_FAILED: &str = "Tactical link degraded. Exercise standard safety protocols.";
pub const ANALYSIS_RATE_LIMITED: &str = "RSA Sentinel limit reached. Please wait a few moments.";
pub const ANALYSIS_FAILED: &str = "Analysis node failed. Re-establishing secure link...";

/// Prebuilt voice used for spoken replies.
pub const SPEECH_VOICE: &str = "Kore";

const BRIEFING_INSTRUCTION: &str =
    "You are the RSA Sentinel AI. Provide concise, professional tactical advice (max 20 words).";

const OUT_OF_SCOPE: &str = "TACTICAL ERROR: Input data outside operational scope. RSA Sentinel is restricted to security, tactical suitability, and situational awareness. Please provide data relevant to your personal safety or environment.";

/// Prompt for a one-sentence briefing at `position`.
pub fn briefing_prompt(position: Coordinate) -> String {
    format!(
        "Provide a short, one-sentence tactical safety briefing for someone at coordinates {}, {}. \
         Focus on situational awareness and safety protocols.",
        position.lat, position.lng
    )
}

/// Scene analysis prompt wrapping the user's request.
pub fn analysis_prompt(request: &str) -> String {
    format!(
        "You are the RSA Sentinel AI Assistant.\n\
         \n\
         CORE MANDATE: Analyze input ONLY related to safety, situational awareness, security, and tactical environments.\n\
         \n\
         RELEVANCE PROTOCOL:\n\
         - If the user provides images or text queries regarding food, abstract charts/graphs, generic scenic photos, \
         decorative architecture/plain houses (with no visible safety hazard), or general lifestyle items, you MUST REJECT the analysis.\n\
         - REJECTION MESSAGE: \"{OUT_OF_SCOPE}\"\n\
         \n\
         OPERATIONAL DIRECTIVES:\n\
         1. MULTIMODAL SCAN: Analyze provided text, images (attire/environment), and audio (distress, ambient noise, verbal info).\n\
         2. TACTICAL SUITABILITY: Rate the person-environment suitability (OPTIMAL, SUB-OPTIMAL, HIGH RISK).\n\
         3. SOUND ANALYSIS: If audio is provided, identify distress signals, aggressive tones, or relevant environmental sounds (sirens, traffic).\n\
         4. RESPONSE: Professional, sharp, tactical advice. Addressing user: \"{request}\""
    )
}

pub struct SafetyAssistant {
    client: GeminiClient,
    policy: RetryPolicy,
}

impl SafetyAssistant {
    pub fn new(client: GeminiClient, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// One-sentence tactical briefing for `position`.
    pub async fn briefing(&self, position: Coordinate) -> String {
        let prompt = briefing_prompt(position);
        let result = self
            .policy
            .run(
                || {
                    self.client
                        .generate_text(&prompt, Some(BRIEFING_INSTRUCTION), Attachments::default())
                },
                GeminiError::is_rate_limited,
            )
            .await;

        match result {
            Ok(Some(text)) if !text.trim().is_empty() => text,
            Ok(_) => BRIEFING_EMPTY.to_string(),
            Err(e) => {
                tracing::error!(error = %e, "Safety briefing failed");
                BRIEFING_FAILED.to_string()
            }
        }
    }

    /// Analyze a text request with optional base64 image and audio.
    pub async fn analyze(&self, request: &str, image: Option<&str>, audio: Option<&str>) -> String {
        let prompt = analysis_prompt(request);
        let result = self
            .policy
            .run(
                || {
                    self.client
                        .generate_text(&prompt, None, Attachments { image, audio })
                },
                GeminiError::is_rate_limited,
            )
            .await;

        match result {
            Ok(Some(text)) if !text.trim().is_empty() => text,
            Ok(_) => {
                tracing::warn!("Scene analysis returned no text");
                ANALYSIS_FAILED.to_string()
            }
            Err(e) if e.is_rate_limited() => ANALYSIS_RATE_LIMITED.to_string(),
            Err(e) => {
                tracing::error!(error = %e, "Scene analysis failed");
                ANALYSIS_FAILED.to_string()
            }
        }
    }

    /// Speak an acknowledgement of `text`. Returns base64 audio, if any.
    pub async fn speak(&self, text: &str) -> Option<String> {
        let utterance = format!("Acknowledge: {text}");
        let result = self
            .policy
            .run(
                || self.client.synthesize_speech(&utterance, SPEECH_VOICE),
                GeminiError::is_rate_limited,
            )
            .await;

        match result {
            Ok(audio) => audio,
            Err(e) => {
                tracing::warn!(error = %e, "Speech synthesis failed");
                None
            }
        }
    }
}
