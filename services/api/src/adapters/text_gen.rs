//! services/api/src/adapters/text_gen.rs
//!
//! This module contains the adapter for the proofreading LLM.
//! It implements the `TextGenerationService` port from the `core` crate using
//! the OpenAI Responses API.

use async_openai::{
    config::OpenAIConfig, error::OpenAIError, types::responses::CreateResponseArgs, Client,
};
use async_trait::async_trait;
use mooproof_core::ports::{
    GenerationOutcome, GenerationRequest, PortError, PortResult, TextGenerationService,
};
use tracing::{debug, warn};

const SYSTEM_INSTRUCTIONS: &str = "You are an assistant that helps students improve their own writing. \
Follow the instructions in the input exactly and never rewrite the student's paper for them.";

const EMPTY_RESPONSE: &str = "The AI service returned an empty response";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `TextGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiTextAdapter {
    client: Client<OpenAIConfig>,
    model: String,
    max_output_tokens: u32,
}

impl OpenAiTextAdapter {
    /// Creates a new `OpenAiTextAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String, max_output_tokens: u32) -> Self {
        Self {
            client,
            model,
            max_output_tokens,
        }
    }
}

//=========================================================================================
// `TextGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl TextGenerationService for OpenAiTextAdapter {
    async fn generate(&self, request: GenerationRequest) -> PortResult<GenerationOutcome> {
        debug!(
            "Generating text for resource {} ({} prompt chars)",
            request.resource_id,
            request.prompt.chars().count()
        );

        let args = CreateResponseArgs::default()
            .model(&self.model)
            .instructions(SYSTEM_INSTRUCTIONS)
            .input(request.prompt)
            .temperature(request.temperature)
            .max_output_tokens(self.max_output_tokens)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = match self.client.responses().create(args).await {
            Ok(response) => response,
            // The provider answered with an error body: a handled failure.
            Err(OpenAIError::ApiError(api_error)) => {
                warn!("OpenAI rejected the request: {}", api_error.message);
                return Ok(GenerationOutcome::failed(api_error.message));
            }
            Err(e) => return Err(PortError::Unexpected(e.to_string())),
        };

        match response.output_text() {
            Some(text) if !text.trim().is_empty() => Ok(GenerationOutcome::generated(text)),
            _ => Ok(GenerationOutcome::failed(EMPTY_RESPONSE)),
        }
    }
}
