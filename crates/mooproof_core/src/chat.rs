//! crates/mooproof_core/src/chat.rs
//!
//! Follow-up questions about feedback that was already returned.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::chat_session::ChatSession;
use crate::domain::Caller;
use crate::error::ProofResult;
use crate::ports::{AuthorizationService, DatabaseService, GenerationRequest, TextGenerationService};
use crate::prompt;
use crate::workflow::{generate_text, load_authorized_resource};

/// One follow-up question with the context the client holds.
#[derive(Debug, Clone)]
pub struct ChatQuestion {
    pub resource_id: Uuid,
    pub message: String,
    pub paper_text: String,
    pub feedback: String,
    /// The prior conversation as a JSON array of `{role, content}` turns.
    pub history_json: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatAnswer {
    pub reply: String,
    /// Questions left once this one is counted.
    pub remaining: u32,
}

pub struct ChatService {
    db: Arc<dyn DatabaseService>,
    authz: Arc<dyn AuthorizationService>,
    generator: Arc<dyn TextGenerationService>,
}

impl ChatService {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        authz: Arc<dyn AuthorizationService>,
        generator: Arc<dyn TextGenerationService>,
    ) -> Self {
        Self {
            db,
            authz,
            generator,
        }
    }

    /// Answers a question. Nothing is persisted.
    pub async fn send_chat_message(
        &self,
        caller: Caller,
        question: ChatQuestion,
    ) -> ProofResult<ChatAnswer> {
        let resource = load_authorized_resource(
            self.db.as_ref(),
            self.authz.as_ref(),
            question.resource_id,
            caller,
        )
        .await?;

        let mut session = ChatSession::from_json(resource.chat_message_limit, &question.history_json);
        let prompt = prompt::chat_prompt(
            &resource,
            &question.paper_text,
            &question.feedback,
            session.history(),
            &question.message,
        );
        session.begin_turn(question.message)?;

        let request = GenerationRequest {
            resource_id: resource.id,
            user_id: caller.user_id,
            prompt,
            temperature: resource.temperature,
        };
        let reply = generate_text(self.generator.as_ref(), request).await?;
        let reply = reply.trim().to_string();
        let remaining = session.complete_turn(reply.clone());

        info!(
            "Answered chat question for user {} on resource {} ({} left)",
            caller.user_id, resource.id, remaining
        );

        Ok(ChatAnswer { reply, remaining })
    }
}
