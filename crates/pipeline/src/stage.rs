//! Validation gate between sequential stages.

use jobq_core::schema::{self, SchemaDescriptor};
use serde::de::DeserializeOwned;

use crate::error::JobError;

/// Parse and validate raw stage output, then decode it into `T`.
///
/// Any failure is reported as [`JobError::Validation`] tagged with `stage`,
/// so the next stage never sees unvalidated data.
pub fn validate_stage<T: DeserializeOwned>(
    stage: &'static str,
    raw: &str,
    shape: &SchemaDescriptor,
) -> Result<T, JobError> {
    schema::validate_str(raw, shape)
        .and_then(|validated| validated.deserialize())
        .map_err(|violation| JobError::Validation { stage, violation })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use jobq_core::schema::{FieldSchema, SchemaViolation};
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Out {
        summary: String,
    }

    fn shape() -> SchemaDescriptor {
        SchemaDescriptor::object([FieldSchema::required("summary", SchemaDescriptor::String)])
    }

    #[test]
    fn valid_output_is_decoded() {
        let out: Out = validate_stage("summary", r#"{"summary":"ok"}"#, &shape()).unwrap();
        assert_eq!(out.summary, "ok");
    }

    #[test]
    fn invalid_output_names_the_stage() {
        let err = validate_stage::<Out>("summary", r#"{"title":"x"}"#, &shape()).unwrap_err();
        assert_matches!(
            err,
            JobError::Validation {
                stage: "summary",
                violation: SchemaViolation::MissingField { .. }
            }
        );
    }
}
