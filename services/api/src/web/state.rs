//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use mooproof_core::chat::ChatService;
use mooproof_core::ports::{AuthorizationService, DatabaseService, TextGenerationService};
use mooproof_core::submission::SubmissionService;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub submissions: Arc<SubmissionService>,
    pub chat: Arc<ChatService>,
}

impl AppState {
    /// Wires both workflows to the same set of adapters.
    pub fn new(
        config: Arc<Config>,
        db: Arc<dyn DatabaseService>,
        authz: Arc<dyn AuthorizationService>,
        generator: Arc<dyn TextGenerationService>,
    ) -> Self {
        let submissions = Arc::new(SubmissionService::new(
            db.clone(),
            authz.clone(),
            generator.clone(),
            config.submission_settings(),
        ));
        let chat = Arc::new(ChatService::new(db.clone(), authz, generator));

        Self {
            db,
            config,
            submissions,
            chat,
        }
    }
}
