pub mod chat;
pub mod chat_session;
pub mod domain;
pub mod error;
pub mod extract;
pub mod ports;
pub mod prompt;
pub mod rate_limit;
pub mod submission;
pub mod ui;
pub mod word_count;

mod workflow;

#[cfg(test)]
pub(crate) mod testing;

pub use chat::{ChatAnswer, ChatQuestion, ChatService};
pub use chat_session::ChatSession;
pub use domain::{Caller, ChatRole, ChatTurn, NewSubmission, RatePeriod, ResourceConfig, SubmissionRecord, UsageRecord};
pub use error::{ExtractError, ProofError, ProofResult};
pub use extract::ExtractOptions;
pub use ports::{AuthorizationService, DatabaseService, GenerationOutcome, GenerationRequest, PortError, PortResult,
    TextGenerationService};
pub use submission::{PaperSubmission, SubmissionOutcome, SubmissionService, SubmissionSettings};
