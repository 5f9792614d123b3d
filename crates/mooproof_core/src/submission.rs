//! crates/mooproof_core/src/submission.rs
//!
//! The submission workflow: extract, sweep, gate, generate, persist.
//!
//! A submission runs in a single pass with no retries. Usage and submission
//! rows are only written once the provider has returned feedback, so every
//! early exit leaves the store exactly as it found it.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{Caller, NewSubmission};
use crate::error::{ProofError, ProofResult};
use crate::extract::{self, ExtractOptions, FileKind};
use crate::ports::{AuthorizationService, DatabaseService, GenerationRequest, TextGenerationService};
use crate::prompt;
use crate::rate_limit::{self, RateDecision};
use crate::word_count::{self, WordCheck};
use crate::workflow::{generate_text, load_authorized_resource};

/// Tunables for the submission workflow.
#[derive(Debug, Clone)]
pub struct SubmissionSettings {
    /// Usage rows idle for longer than this are swept before each submission.
    pub usage_retention: Duration,
    pub extract_options: ExtractOptions,
    /// Hold a per-(resource, user) lock from the quota check until the usage row is saved.
    ///
    /// Off by default: concurrent submissions from one user may then read the
    /// same usage snapshot and overrun the limit by the number in flight.
    pub serialize_per_user: bool,
}

impl Default for SubmissionSettings {
    fn default() -> Self {
        Self {
            usage_retention: Duration::days(7),
            extract_options: ExtractOptions::default(),
            serialize_per_user: false,
        }
    }
}

/// A paper as it arrives from the client.
#[derive(Debug, Clone)]
pub struct PaperSubmission {
    pub resource_id: Uuid,
    /// The pasted text, or the uploaded file's content when `filename` is set.
    pub payload: String,
    pub filename: Option<String>,
}

/// What an accepted submission hands back.
#[derive(Debug, Clone)]
pub struct SubmissionOutcome {
    pub submission_id: Uuid,
    pub feedback: String,
    pub word_count: u32,
    /// Quota left after this submission; `None` when rate limiting is off.
    pub remaining: Option<u32>,
    /// The text that was actually proofread.
    pub paper_text: String,
}

pub struct SubmissionService {
    db: Arc<dyn DatabaseService>,
    authz: Arc<dyn AuthorizationService>,
    generator: Arc<dyn TextGenerationService>,
    settings: SubmissionSettings,
    locks: UserLocks,
}

impl SubmissionService {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        authz: Arc<dyn AuthorizationService>,
        generator: Arc<dyn TextGenerationService>,
        settings: SubmissionSettings,
    ) -> Self {
        Self {
            db,
            authz,
            generator,
            settings,
            locks: UserLocks::default(),
        }
    }

    pub async fn submit(
        &self,
        caller: Caller,
        submission: PaperSubmission,
    ) -> ProofResult<SubmissionOutcome> {
        self.submit_at(caller, submission, Utc::now()).await
    }

    /// Runs the workflow as of `now`.
    pub async fn submit_at(
        &self,
        caller: Caller,
        submission: PaperSubmission,
        now: DateTime<Utc>,
    ) -> ProofResult<SubmissionOutcome> {
        let resource = load_authorized_resource(
            self.db.as_ref(),
            self.authz.as_ref(),
            submission.resource_id,
            caller,
        )
        .await?;

        // --- 1. Extraction ---
        let filename = submission.filename.filter(|name| !name.trim().is_empty());
        let paper_text = match &filename {
            Some(name) => {
                // The format is settled before the payload is touched.
                FileKind::from_filename(name)?;
                let bytes = extract::decode_upload(&submission.payload, name)?;
                extract::extract_with(&bytes, name, self.settings.extract_options)?
            }
            None => submission.payload,
        };

        // --- 2. Stale usage sweep ---
        self.sweep_stale_usage(now).await;

        // --- 3. Rate limit ---
        let _guard = if self.settings.serialize_per_user && resource.rate_limit_enabled {
            Some(self.locks.acquire(resource.id, caller.user_id).await)
        } else {
            None
        };

        let usage = if resource.rate_limit_enabled {
            self.db.get_usage(resource.id, caller.user_id).await?
        } else {
            None
        };

        let pending_usage = match rate_limit::check_and_reserve(&resource, caller.user_id, usage, now) {
            RateDecision::Deny { limit, period } => {
                info!(
                    "Rate limit reached for user {} on resource {} ({} {})",
                    caller.user_id,
                    resource.id,
                    limit,
                    period.label()
                );
                return Err(ProofError::RateLimitReached { limit, period });
            }
            RateDecision::Allow { pending } => pending,
        };

        // --- 4. Word limit ---
        let word_count = match word_count::check(&paper_text, resource.max_words) {
            WordCheck::Ok(count) => count,
            WordCheck::Exceeded { count, max } => {
                return Err(ProofError::WordLimitExceeded { count, max });
            }
        };

        // --- 5. Generation ---
        let request = GenerationRequest {
            resource_id: resource.id,
            user_id: caller.user_id,
            prompt: prompt::proofing_prompt(&resource, &paper_text),
            temperature: resource.temperature,
        };
        let feedback = generate_text(self.generator.as_ref(), request).await?;

        // --- 6. Persistence ---
        let (usage, remaining) = match pending_usage {
            Some(mut usage) => {
                let left = rate_limit::commit(&mut usage, resource.rate_limit_count, now);
                (Some(usage), Some(left))
            }
            None => (None, None),
        };

        let record = self
            .db
            .record_submission(
                NewSubmission {
                    resource_id: resource.id,
                    user_id: caller.user_id,
                    paper_text: paper_text.clone(),
                    feedback: feedback.clone(),
                    filename,
                    word_count,
                    grade_level: resource.grade_level,
                    created_at: now,
                },
                usage,
            )
            .await
            .map_err(ProofError::Storage)?;

        info!(
            "Accepted submission {} ({} words) for user {} on resource {}",
            record.id, word_count, caller.user_id, resource.id
        );

        Ok(SubmissionOutcome {
            submission_id: record.id,
            feedback: feedback.trim().to_string(),
            word_count,
            remaining,
            paper_text,
        })
    }

    /// Maintenance only: a failing sweep never blocks the submission.
    async fn sweep_stale_usage(&self, now: DateTime<Utc>) {
        let cutoff = now - self.settings.usage_retention;
        match self.db.delete_usage_inactive_since(cutoff).await {
            Ok(0) => {}
            Ok(swept) => info!("Swept {} stale usage record(s)", swept),
            Err(e) => warn!("Failed to sweep stale usage records: {}", e),
        }
    }
}

/// One async mutex per (resource, user) pair.
#[derive(Default)]
struct UserLocks {
    inner: Mutex<HashMap<(Uuid, Uuid), Arc<Mutex<()>>>>,
}

impl UserLocks {
    async fn acquire(&self, resource_id: Uuid, user_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.inner.lock().await;
            // Entries nobody else holds can go.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry((resource_id, user_id))
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
