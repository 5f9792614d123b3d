//! crates/mooproof_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or transport format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Instructions used when a resource has no custom proofing instructions.
pub const DEFAULT_INSTRUCTIONS: &str = "Proof this paper for grade {gradelevel}. Provide the student appropriate feedback for this grade level, focusing on grammar, spelling, punctuation, and clarity. Do not rewrite the paper - instead, point out areas that need improvement and explain why.";

/// The range of grade levels an instructor can pick from.
pub const MIN_GRADE_LEVEL: u8 = 3;
pub const MAX_GRADE_LEVEL: u8 = 12;

/// The rolling window a rate limit is counted over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RatePeriod {
    Hour,
    Day,
}

impl RatePeriod {
    pub fn seconds(self) -> i64 {
        match self {
            RatePeriod::Hour => 3600,
            RatePeriod::Day => 86400,
        }
    }

    /// The human readable label used in "limit reached" messages.
    pub fn label(self) -> &'static str {
        match self {
            RatePeriod::Hour => "per hour",
            RatePeriod::Day => "per day",
        }
    }

    /// Parses the stored column value. Anything that is not `hour` counts as a day,
    /// the same way the instructor form treats unknown values.
    pub fn from_db(value: &str) -> Self {
        if value.eq_ignore_ascii_case("hour") {
            RatePeriod::Hour
        } else {
            RatePeriod::Day
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RatePeriod::Hour => "hour",
            RatePeriod::Day => "day",
        }
    }
}

/// One configured instance of the proofreading activity.
///
/// Owned by the hosting course and read-only for the duration of a request.
#[derive(Debug, Clone)]
pub struct ResourceConfig {
    pub id: Uuid,
    pub name: String,
    pub grade_level: u8,
    /// May contain a `{gradelevel}` placeholder.
    pub proof_instructions: String,
    pub rate_limit_enabled: bool,
    pub rate_limit_period: RatePeriod,
    pub rate_limit_count: u32,
    /// `0` disables the word limit.
    pub max_words: u32,
    pub chat_message_limit: u32,
    pub temperature: f32,
}

impl ResourceConfig {
    /// A resource carrying the same defaults the instructor form starts from.
    pub fn with_defaults(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            grade_level: 9,
            proof_instructions: DEFAULT_INSTRUCTIONS.to_string(),
            rate_limit_enabled: true,
            rate_limit_period: RatePeriod::Day,
            rate_limit_count: 5,
            max_words: 5000,
            chat_message_limit: 10,
            temperature: 0.5,
        }
    }

    /// The instructions template, falling back to the default when left blank.
    pub fn instructions_template(&self) -> &str {
        if self.proof_instructions.trim().is_empty() {
            DEFAULT_INSTRUCTIONS
        } else {
            &self.proof_instructions
        }
    }
}

/// Clamps a stored grade level into the supported range.
pub fn clamp_grade_level(value: i32) -> u8 {
    value.clamp(MIN_GRADE_LEVEL as i32, MAX_GRADE_LEVEL as i32) as u8
}

/// Rolling rate-limit counter state for one (resource, user) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageRecord {
    pub resource_id: Uuid,
    pub user_id: Uuid,
    pub submission_count: u32,
    /// Anchors the current rate-limit window.
    pub first_submission: DateTime<Utc>,
    pub last_submission: DateTime<Utc>,
}

impl UsageRecord {
    pub fn fresh(resource_id: Uuid, user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            resource_id,
            user_id,
            submission_count: 0,
            first_submission: now,
            last_submission: now,
        }
    }
}

/// The fields of a submission before the store assigns it an id.
#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub resource_id: Uuid,
    pub user_id: Uuid,
    pub paper_text: String,
    pub feedback: String,
    pub filename: Option<String>,
    pub word_count: u32,
    pub grade_level: u8,
    pub created_at: DateTime<Utc>,
}

/// A persisted record of one accepted paper and its feedback.
#[derive(Debug, Clone)]
pub struct SubmissionRecord {
    pub id: Uuid,
    pub resource_id: Uuid,
    pub user_id: Uuid,
    pub paper_text: String,
    pub feedback: String,
    pub filename: Option<String>,
    pub word_count: u32,
    pub grade_level: u8,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    /// Any role the client sent that we do not recognise. Ignored by the chat logic.
    #[serde(other)]
    Other,
}

/// One role-tagged message in a client-held follow-up conversation. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    #[serde(default)]
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// The authenticated user a request is made on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
}
