/// Broker-assigned job identifier.
pub type JobId = uuid::Uuid;

/// UTC timestamp used for every persisted time column.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Parse a caller-supplied job identifier.
///
/// Returns `None` for anything that is not a well-formed UUID; callers treat
/// that the same as an identifier the broker has never seen.
pub fn parse_job_id(raw: &str) -> Option<JobId> {
    uuid::Uuid::parse_str(raw.trim()).ok()
}
