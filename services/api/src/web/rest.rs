//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the proofreading endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::Json,
};
use mooproof_core::chat::ChatQuestion;
use mooproof_core::domain::Caller;
use mooproof_core::error::ProofError;
use mooproof_core::submission::PaperSubmission;
use mooproof_core::ui::{ChatReply, SubmitReply};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, warn};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        submit_paper_handler,
        send_chat_message_handler,
    ),
    components(
        schemas(SubmitPaperRequest, SubmitPaperResponse, ChatMessageRequest, ChatMessageResponse)
    ),
    tags(
        (name = "MooProof API", description = "Proofreading feedback and follow-up chat for student papers.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// A paper to proofread. With a `filename`, `papertext` holds the file content.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubmitPaperRequest {
    pub papertext: String,
    #[serde(default)]
    pub filename: String,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct SubmitPaperResponse {
    pub success: bool,
    pub error: String,
    pub feedback: String,
    /// Submissions left; `-1` when unlimited.
    pub remaining: i64,
    pub wordcount: u32,
    /// The text that was proofread, after any file extraction.
    pub papertext: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatMessageRequest {
    pub message: String,
    pub papertext: String,
    pub feedback: String,
    /// JSON array of prior `{role, content}` turns.
    #[serde(default)]
    pub chathistory: String,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ChatMessageResponse {
    pub success: bool,
    pub error: String,
    pub reply: String,
    pub remaining: i64,
}

impl From<SubmitPaperResponse> for SubmitReply {
    fn from(response: SubmitPaperResponse) -> Self {
        SubmitReply {
            success: response.success,
            error: response.error,
            feedback: response.feedback,
            remaining: response.remaining,
            word_count: response.wordcount,
            paper_text: response.papertext,
        }
    }
}

impl From<ChatMessageResponse> for ChatReply {
    fn from(response: ChatMessageResponse) -> Self {
        ChatReply {
            success: response.success,
            error: response.error,
            reply: response.reply,
            remaining: response.remaining,
        }
    }
}

/// Errors about the resource itself are HTTP errors; everything else is a
/// `success: false` body the page can show.
fn reject_access_errors(err: ProofError) -> Result<ProofError, (StatusCode, String)> {
    match err {
        ProofError::ResourceNotFound => Err((StatusCode::NOT_FOUND, err.to_string())),
        ProofError::NotPermitted => Err((StatusCode::FORBIDDEN, err.to_string())),
        other => Ok(other),
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Submit a paper for proofreading feedback.
#[utoipa::path(
    post,
    path = "/mooproof/{resource_id}/submit",
    request_body = SubmitPaperRequest,
    responses(
        (status = 200, description = "Feedback, or a handled failure with `success: false`", body = SubmitPaperResponse),
        (status = 401, description = "Missing or invalid session"),
        (status = 403, description = "Caller may not submit to this resource"),
        (status = 404, description = "Resource not found")
    ),
    params(
        ("resource_id" = Uuid, Path, description = "The proofreading resource.")
    )
)]
pub async fn submit_paper_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(resource_id): Path<Uuid>,
    Json(body): Json<SubmitPaperRequest>,
) -> Result<Json<SubmitPaperResponse>, (StatusCode, String)> {
    let submission = PaperSubmission {
        resource_id,
        payload: body.papertext,
        filename: Some(body.filename).filter(|name| !name.is_empty()),
    };

    match app_state.submissions.submit(caller, submission).await {
        Ok(outcome) => Ok(Json(SubmitPaperResponse {
            success: true,
            error: String::new(),
            feedback: outcome.feedback,
            remaining: outcome.remaining.map(i64::from).unwrap_or(-1),
            wordcount: outcome.word_count,
            papertext: outcome.paper_text,
        })),
        Err(err) => {
            let err = reject_access_errors(err)?;
            if matches!(err, ProofError::Storage(_) | ProofError::ProviderException(_)) {
                error!("Submission failed for user {}: {:?}", caller.user_id, err);
            } else {
                warn!("Submission refused for user {}: {}", caller.user_id, err);
            }
            Ok(Json(SubmitPaperResponse {
                success: false,
                error: err.to_string(),
                remaining: err.remaining_hint(),
                wordcount: err.word_count_hint(),
                ..SubmitPaperResponse::default()
            }))
        }
    }
}

/// Ask a follow-up question about returned feedback.
#[utoipa::path(
    post,
    path = "/mooproof/{resource_id}/chat",
    request_body = ChatMessageRequest,
    responses(
        (status = 200, description = "The tutor's reply, or a handled failure with `success: false`", body = ChatMessageResponse),
        (status = 401, description = "Missing or invalid session"),
        (status = 403, description = "Caller may not use this resource"),
        (status = 404, description = "Resource not found")
    ),
    params(
        ("resource_id" = Uuid, Path, description = "The proofreading resource.")
    )
)]
pub async fn send_chat_message_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(resource_id): Path<Uuid>,
    Json(body): Json<ChatMessageRequest>,
) -> Result<Json<ChatMessageResponse>, (StatusCode, String)> {
    let question = ChatQuestion {
        resource_id,
        message: body.message,
        paper_text: body.papertext,
        feedback: body.feedback,
        history_json: body.chathistory,
    };

    match app_state.chat.send_chat_message(caller, question).await {
        Ok(answer) => Ok(Json(ChatMessageResponse {
            success: true,
            error: String::new(),
            reply: answer.reply,
            remaining: i64::from(answer.remaining),
        })),
        Err(err) => {
            let err = reject_access_errors(err)?;
            warn!("Chat message failed for user {}: {:?}", caller.user_id, err);
            Ok(Json(ChatMessageResponse {
                success: false,
                error: err.to_string(),
                reply: String::new(),
                remaining: 0,
            }))
        }
    }
}
