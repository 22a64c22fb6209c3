use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{RecordId, labeled_enum};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityType {
    Call,
    Email,
    Meeting,
    #[default]
    Task,
    Note,
}

labeled_enum!(ActivityType, "activity type", {
    Call => "Call",
    Email => "Email",
    Meeting => "Meeting",
    Task => "Task",
    Note => "Note",
});

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: RecordId,
    pub subject: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: ActivityType,
    pub due_date: DateTime<Utc>,
    pub completed: bool,
    pub contact_id: Option<RecordId>,
    pub deal_id: Option<RecordId>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ActivityDraft {
    pub subject: String,
    pub description: String,
    pub kind: ActivityType,
    pub due_date: DateTime<Utc>,
    pub completed: bool,
    pub contact_id: Option<RecordId>,
    pub deal_id: Option<RecordId>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActivityPatch {
    pub subject: Option<String>,
    pub description: Option<String>,
    pub kind: Option<ActivityType>,
    pub due_date: Option<DateTime<Utc>>,
    pub completed: Option<bool>,
    pub contact_id: Option<Option<RecordId>>,
    pub deal_id: Option<Option<RecordId>>,
}

impl From<ActivityDraft> for ActivityPatch {
    fn from(draft: ActivityDraft) -> Self {
        Self {
            subject: Some(draft.subject),
            description: Some(draft.description),
            kind: Some(draft.kind),
            due_date: Some(draft.due_date),
            completed: Some(draft.completed),
            contact_id: Some(draft.contact_id),
            deal_id: Some(draft.deal_id),
        }
    }
}
