//! In-memory fakes and fixtures for unit tests.

use std::collections::{HashMap, VecDeque};
use std::io::{Cursor, Write};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::domain::{NewSubmission, ResourceConfig, SubmissionRecord, UsageRecord};
use crate::ports::{
    AuthorizationService, DatabaseService, GenerationOutcome, GenerationRequest, PortError,
    PortResult, TextGenerationService,
};

//=========================================================================================
// Zip fixtures
//=========================================================================================

pub(crate) fn zip_with_entries(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, content) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

pub(crate) fn docx_with_document_xml(xml: &str) -> Vec<u8> {
    zip_with_entries(&[
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"/>"#,
        ),
        ("word/document.xml", xml),
    ])
}

//=========================================================================================
// Port fakes
//=========================================================================================

#[derive(Default)]
struct DbState {
    resources: HashMap<Uuid, ResourceConfig>,
    usage: HashMap<(Uuid, Uuid), UsageRecord>,
    submissions: Vec<SubmissionRecord>,
    sweeps: u32,
    fail_writes: bool,
}

#[derive(Default)]
pub(crate) struct InMemoryDb {
    state: Mutex<DbState>,
}

impl InMemoryDb {
    pub(crate) fn put_resource(&self, resource: ResourceConfig) {
        self.state.lock().unwrap().resources.insert(resource.id, resource);
    }

    pub(crate) fn put_usage(&self, usage: UsageRecord) {
        self.state
            .lock()
            .unwrap()
            .usage
            .insert((usage.resource_id, usage.user_id), usage);
    }

    pub(crate) fn usage(&self, resource_id: Uuid, user_id: Uuid) -> Option<UsageRecord> {
        self.state
            .lock()
            .unwrap()
            .usage
            .get(&(resource_id, user_id))
            .cloned()
    }

    pub(crate) fn submissions(&self) -> Vec<SubmissionRecord> {
        self.state.lock().unwrap().submissions.clone()
    }

    pub(crate) fn sweeps(&self) -> u32 {
        self.state.lock().unwrap().sweeps
    }

    /// Makes every later `record_submission` fail without writing anything.
    pub(crate) fn fail_writes(&self) {
        self.state.lock().unwrap().fail_writes = true;
    }
}

#[async_trait]
impl DatabaseService for InMemoryDb {
    async fn get_resource(&self, resource_id: Uuid) -> PortResult<ResourceConfig> {
        self.state
            .lock()
            .unwrap()
            .resources
            .get(&resource_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("resource {}", resource_id)))
    }

    async fn get_usage(&self, resource_id: Uuid, user_id: Uuid) -> PortResult<Option<UsageRecord>> {
        Ok(self.usage(resource_id, user_id))
    }

    async fn delete_usage_inactive_since(&self, cutoff: DateTime<Utc>) -> PortResult<u64> {
        let mut state = self.state.lock().unwrap();
        state.sweeps += 1;
        let before = state.usage.len();
        state.usage.retain(|_, usage| usage.last_submission >= cutoff);
        Ok((before - state.usage.len()) as u64)
    }

    async fn record_submission(
        &self,
        submission: NewSubmission,
        usage: Option<UsageRecord>,
    ) -> PortResult<SubmissionRecord> {
        let mut state = self.state.lock().unwrap();
        if state.fail_writes {
            return Err(PortError::Unexpected("connection to server was lost".to_string()));
        }

        let record = SubmissionRecord {
            id: Uuid::new_v4(),
            resource_id: submission.resource_id,
            user_id: submission.user_id,
            paper_text: submission.paper_text,
            feedback: submission.feedback,
            filename: submission.filename,
            word_count: submission.word_count,
            grade_level: submission.grade_level,
            created_at: submission.created_at,
        };
        state.submissions.push(record.clone());
        if let Some(usage) = usage {
            state.usage.insert((usage.resource_id, usage.user_id), usage);
        }
        Ok(record)
    }

    async fn validate_auth_session(&self, _session_id: &str) -> PortResult<Uuid> {
        Err(PortError::Unauthorized)
    }
}

/// Replays queued outcomes in order and records every prompt it was given.
#[derive(Default)]
pub(crate) struct ScriptedGenerator {
    script: Mutex<VecDeque<PortResult<GenerationOutcome>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub(crate) fn push(&self, outcome: GenerationOutcome) {
        self.script.lock().unwrap().push_back(Ok(outcome));
    }

    pub(crate) fn push_error(&self, message: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(PortError::Unexpected(message.to_string())));
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerationService for ScriptedGenerator {
    async fn generate(&self, request: GenerationRequest) -> PortResult<GenerationOutcome> {
        self.prompts.lock().unwrap().push(request.prompt);
        // Yield so concurrent callers interleave the way real network calls would.
        tokio::task::yield_now().await;
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(GenerationOutcome::failed("script exhausted")))
    }
}

pub(crate) struct StaticAuthz(pub bool);

#[async_trait]
impl AuthorizationService for StaticAuthz {
    async fn can_submit(&self, _resource_id: Uuid, _user_id: Uuid) -> PortResult<bool> {
        Ok(self.0)
    }
}
