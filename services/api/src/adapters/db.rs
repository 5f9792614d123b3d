//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` and `AuthorizationService` ports from the `core` crate.
//! It handles all interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mooproof_core::domain::{
    clamp_grade_level, NewSubmission, RatePeriod, ResourceConfig, SubmissionRecord, UsageRecord,
};
use mooproof_core::ports::{AuthorizationService, DatabaseService, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the persistence and authorization ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// Postgres has no unsigned integers; negative counts read back as zero.
fn non_negative(value: i32) -> u32 {
    value.max(0) as u32
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct ResourceRecord {
    id: Uuid,
    name: String,
    grade_level: i32,
    proof_instructions: String,
    rate_limit_enabled: bool,
    rate_limit_period: String,
    rate_limit_count: i32,
    max_words: i32,
    chat_message_limit: i32,
    temperature: f32,
}
impl ResourceRecord {
    fn to_domain(self) -> ResourceConfig {
        ResourceConfig {
            id: self.id,
            name: self.name,
            grade_level: clamp_grade_level(self.grade_level),
            proof_instructions: self.proof_instructions,
            rate_limit_enabled: self.rate_limit_enabled,
            rate_limit_period: RatePeriod::from_db(&self.rate_limit_period),
            rate_limit_count: non_negative(self.rate_limit_count),
            max_words: non_negative(self.max_words),
            chat_message_limit: non_negative(self.chat_message_limit),
            temperature: self.temperature,
        }
    }
}

#[derive(FromRow)]
struct UsageRow {
    resource_id: Uuid,
    user_id: Uuid,
    submission_count: i32,
    first_submission: DateTime<Utc>,
    last_submission: DateTime<Utc>,
}
impl UsageRow {
    fn to_domain(self) -> UsageRecord {
        UsageRecord {
            resource_id: self.resource_id,
            user_id: self.user_id,
            submission_count: non_negative(self.submission_count),
            first_submission: self.first_submission,
            last_submission: self.last_submission,
        }
    }
}

#[derive(FromRow)]
struct SubmissionRow {
    id: Uuid,
    resource_id: Uuid,
    user_id: Uuid,
    paper_text: String,
    feedback: String,
    filename: Option<String>,
    word_count: i32,
    grade_level: i32,
    created_at: DateTime<Utc>,
}
impl SubmissionRow {
    fn to_domain(self) -> SubmissionRecord {
        SubmissionRecord {
            id: self.id,
            resource_id: self.resource_id,
            user_id: self.user_id,
            paper_text: self.paper_text,
            feedback: self.feedback,
            filename: self.filename,
            word_count: non_negative(self.word_count),
            grade_level: clamp_grade_level(self.grade_level),
            created_at: self.created_at,
        }
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn get_resource(&self, resource_id: Uuid) -> PortResult<ResourceConfig> {
        let record = sqlx::query_as::<_, ResourceRecord>(
            "SELECT id, name, grade_level, proof_instructions, rate_limit_enabled, \
             rate_limit_period, rate_limit_count, max_words, chat_message_limit, temperature \
             FROM resources WHERE id = $1",
        )
        .bind(resource_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Resource {} not found", resource_id)))?;

        Ok(record.to_domain())
    }

    async fn get_usage(&self, resource_id: Uuid, user_id: Uuid) -> PortResult<Option<UsageRecord>> {
        let record = sqlx::query_as::<_, UsageRow>(
            "SELECT resource_id, user_id, submission_count, first_submission, last_submission \
             FROM mooproof_usage WHERE resource_id = $1 AND user_id = $2",
        )
        .bind(resource_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record.map(UsageRow::to_domain))
    }

    async fn delete_usage_inactive_since(&self, cutoff: DateTime<Utc>) -> PortResult<u64> {
        let result = sqlx::query("DELETE FROM mooproof_usage WHERE last_submission < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected())
    }

    async fn record_submission(
        &self,
        submission: NewSubmission,
        usage: Option<UsageRecord>,
    ) -> PortResult<SubmissionRecord> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        let record = sqlx::query_as::<_, SubmissionRow>(
            "INSERT INTO mooproof_submissions \
             (id, resource_id, user_id, paper_text, feedback, filename, word_count, grade_level, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING id, resource_id, user_id, paper_text, feedback, filename, word_count, grade_level, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(submission.resource_id)
        .bind(submission.user_id)
        .bind(submission.paper_text)
        .bind(submission.feedback)
        .bind(submission.filename)
        .bind(submission.word_count as i32)
        .bind(i32::from(submission.grade_level))
        .bind(submission.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(unexpected)?;

        if let Some(usage) = usage {
            sqlx::query(
                "INSERT INTO mooproof_usage \
                 (resource_id, user_id, submission_count, first_submission, last_submission) \
                 VALUES ($1, $2, $3, $4, $5) \
                 ON CONFLICT (resource_id, user_id) DO UPDATE SET \
                 submission_count = EXCLUDED.submission_count, \
                 first_submission = EXCLUDED.first_submission, \
                 last_submission = EXCLUDED.last_submission",
            )
            .bind(usage.resource_id)
            .bind(usage.user_id)
            .bind(usage.submission_count as i32)
            .bind(usage.first_submission)
            .bind(usage.last_submission)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        }

        // Dropping `tx` on an early return rolls both writes back.
        tx.commit().await.map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        let user_id: Option<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        user_id.ok_or(PortError::Unauthorized)
    }
}

//=========================================================================================
// `AuthorizationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl AuthorizationService for DbAdapter {
    async fn can_submit(&self, resource_id: Uuid, user_id: Uuid) -> PortResult<bool> {
        let allowed: Option<bool> = sqlx::query_scalar(
            "SELECT can_submit FROM resource_members WHERE resource_id = $1 AND user_id = $2",
        )
        .bind(resource_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(allowed.unwrap_or(false))
    }
}
