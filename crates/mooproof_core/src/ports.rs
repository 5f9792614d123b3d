//! crates/mooproof_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the hosting platform's database, permissions and AI provider.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{NewSubmission, ResourceConfig, SubmissionRecord, UsageRecord};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Text Generation
//=========================================================================================

/// A single prompt sent to the AI provider.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// The resource the prompt is generated for.
    pub resource_id: Uuid,
    /// The user the prompt is generated on behalf of.
    pub user_id: Uuid,
    pub prompt: String,
    pub temperature: f32,
}

/// The provider's answer. `success == false` is a handled failure reported by the
/// provider; an `Err` from the port is an exception while talking to it.
#[derive(Debug, Clone, Default)]
pub struct GenerationOutcome {
    pub success: bool,
    pub generated_text: String,
    pub error_message: String,
}

impl GenerationOutcome {
    pub fn generated(text: impl Into<String>) -> Self {
        Self {
            success: true,
            generated_text: text.into(),
            error_message: String::new(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            generated_text: String::new(),
            error_message: message.into(),
        }
    }
}

#[async_trait]
pub trait TextGenerationService: Send + Sync {
    /// Generates text for a prompt. Retries and timeouts belong to the implementation.
    async fn generate(&self, request: GenerationRequest) -> PortResult<GenerationOutcome>;
}

//=========================================================================================
// Persistence
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Resources ---
    async fn get_resource(&self, resource_id: Uuid) -> PortResult<ResourceConfig>;

    // --- Usage Records ---
    async fn get_usage(&self, resource_id: Uuid, user_id: Uuid) -> PortResult<Option<UsageRecord>>;

    /// Deletes every usage row whose last submission is older than `cutoff`.
    async fn delete_usage_inactive_since(&self, cutoff: DateTime<Utc>) -> PortResult<u64>;

    // --- Submission Records ---
    /// Stores an accepted submission together with its updated usage row.
    ///
    /// Both writes land or neither does. `usage`, when present, replaces the row
    /// for its (resource, user) pair.
    async fn record_submission(
        &self,
        submission: NewSubmission,
        usage: Option<UsageRecord>,
    ) -> PortResult<SubmissionRecord>;

    // --- Auth Sessions ---
    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;
}

//=========================================================================================
// Authorization
//=========================================================================================

#[async_trait]
pub trait AuthorizationService: Send + Sync {
    /// Whether the user holds the capability to submit papers to the resource.
    async fn can_submit(&self, resource_id: Uuid, user_id: Uuid) -> PortResult<bool>;
}
