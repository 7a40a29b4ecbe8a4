use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of the case (process instance) an event belongs to.
pub type CaseId = String;

/// A single case-scoped activity occurrence from an event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub case_id: CaseId,
    pub activity: String,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new(
        case_id: impl Into<CaseId>,
        activity: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            case_id: case_id.into(),
            activity: activity.into(),
            timestamp,
        }
    }
}
