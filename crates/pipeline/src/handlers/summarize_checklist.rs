//! Two-stage job: summarize a text, then derive an action checklist from the
//! summary.
//!
//! Both stages call the structured-generation service and validate its raw
//! output before anything downstream consumes it. The combined result is
//! persisted to the result store.

use std::sync::Arc;

use async_trait::async_trait;
use jobq_core::schema::{FieldSchema, SchemaDescriptor};
use jobq_core::types::JobId;
use serde::{Deserialize, Serialize};

use crate::error::JobError;
use crate::llm::StructuredGenerator;
use crate::registry::JobHandler;
use crate::stage::validate_stage;

const SUMMARY_STAGE: &str = "summary";
const CHECKLIST_STAGE: &str = "checklist";

const SUMMARY_INSTRUCTIONS: &str = "You summarize documents. Reply with a JSON object \
     of the form {\"summary\": string} and nothing else.";

const CHECKLIST_INSTRUCTIONS: &str = "You turn summaries into action checklists. Reply with \
     a JSON object of the form {\"checklist\": [{\"task\": string, \"is_complete\": boolean}]} \
     containing at least one item, and nothing else.";

#[derive(Debug, Deserialize)]
struct SummaryOutput {
    summary: String,
}

/// One actionable item of the generated checklist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub task: String,
    pub is_complete: bool,
}

#[derive(Debug, Deserialize)]
struct ChecklistOutput {
    checklist: Vec<ChecklistItem>,
}

#[derive(Debug, Serialize)]
struct FinalResult {
    summary: String,
    checklist: Vec<ChecklistItem>,
}

fn summary_schema() -> SchemaDescriptor {
    SchemaDescriptor::object([FieldSchema::required("summary", SchemaDescriptor::String)])
}

fn checklist_schema() -> SchemaDescriptor {
    SchemaDescriptor::object([FieldSchema::required(
        "checklist",
        SchemaDescriptor::non_empty_array_of(SchemaDescriptor::object([
            FieldSchema::required("task", SchemaDescriptor::String),
            FieldSchema::required("is_complete", SchemaDescriptor::Bool),
        ])),
    )])
}

/// Payload: `{ "text": string }`.
pub struct SummarizeChecklistJob {
    generator: Arc<dyn StructuredGenerator>,
}

impl SummarizeChecklistJob {
    pub const NAME: &'static str = "summarize_checklist";

    pub fn new(generator: Arc<dyn StructuredGenerator>) -> Self {
        Self { generator }
    }

    async fn generate(&self, instructions: &str, prompt: &str) -> Result<String, JobError> {
        self.generator
            .generate(instructions, prompt)
            .await
            .map_err(|e| JobError::execution(&e))
    }
}

#[async_trait]
impl JobHandler for SummarizeChecklistJob {
    fn persists_result(&self) -> bool {
        true
    }

    async fn run(
        &self,
        job_id: JobId,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value, JobError> {
        let text = payload
            .get("text")
            .and_then(serde_json::Value::as_str)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| JobError::invalid_payload("`text` must be a non-empty string"))?;

        let raw = self.generate(SUMMARY_INSTRUCTIONS, text).await?;
        let summary: SummaryOutput = validate_stage(SUMMARY_STAGE, &raw, &summary_schema())?;
        tracing::debug!(%job_id, stage = SUMMARY_STAGE, "Stage output validated");

        let prompt = format!(
            "Create a checklist of concrete tasks from this summary:\n\n{}",
            summary.summary
        );
        let raw = self.generate(CHECKLIST_INSTRUCTIONS, &prompt).await?;
        let checklist: ChecklistOutput =
            validate_stage(CHECKLIST_STAGE, &raw, &checklist_schema())?;
        tracing::debug!(
            %job_id,
            stage = CHECKLIST_STAGE,
            items = checklist.checklist.len(),
            "Stage output validated",
        );

        let result = FinalResult {
            summary: summary.summary,
            checklist: checklist.checklist,
        };
        serde_json::to_value(&result).map_err(|e| JobError::execution(&e))
    }
}
