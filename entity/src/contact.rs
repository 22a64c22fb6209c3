use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{RecordId, labeled_enum};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContactStatus {
    #[default]
    Active,
    Inactive,
}

labeled_enum!(ContactStatus, "contact status", {
    Active => "Active",
    Inactive => "Inactive",
});

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub title: Option<String>,
    pub company_id: Option<RecordId>,
    pub notes: Option<String>,
    pub status: ContactStatus,
    pub tags: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Contact {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ContactDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub title: Option<String>,
    pub company_id: Option<RecordId>,
    pub notes: Option<String>,
}

/// Partial contact update.
///
/// `tags` replaces the stored list; `add_tags` merges into it, keeping the
/// existing order and skipping tags already present. When both are given the
/// replacement is applied first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContactPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<Option<String>>,
    pub title: Option<Option<String>>,
    pub company_id: Option<Option<RecordId>>,
    pub notes: Option<Option<String>>,
    pub status: Option<ContactStatus>,
    pub tags: Option<Vec<String>>,
    pub add_tags: Vec<String>,
}

impl ContactPatch {
    pub fn status(status: ContactStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn with_added_tags<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            add_tags: tags.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// True when applying the patch needs the stored tag list.
    pub fn merges_tags(&self) -> bool {
        !self.add_tags.is_empty()
    }

    /// Resulting tag list for a contact currently tagged `current`, or `None`
    /// when the patch does not touch tags.
    pub fn resolve_tags(&self, current: &[String]) -> Option<Vec<String>> {
        if self.tags.is_none() && self.add_tags.is_empty() {
            return None;
        }
        let mut tags = self.tags.clone().unwrap_or_else(|| current.to_vec());
        for tag in &self.add_tags {
            if !tags.iter().any(|existing| existing == tag) {
                tags.push(tag.clone());
            }
        }
        Some(tags)
    }
}

impl From<ContactDraft> for ContactPatch {
    fn from(draft: ContactDraft) -> Self {
        Self {
            first_name: Some(draft.first_name),
            last_name: Some(draft.last_name),
            email: Some(draft.email),
            phone: Some(draft.phone),
            title: Some(draft.title),
            company_id: Some(draft.company_id),
            notes: Some(draft.notes),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn add_tags_merges_without_duplicates() {
        let patch = ContactPatch::with_added_tags(["VIP", "Partner"]);
        let merged = patch.resolve_tags(&tags(&["Partner", "Newsletter"]));
        assert_eq!(merged, Some(tags(&["Partner", "Newsletter", "VIP"])));
    }

    #[test]
    fn replacement_applies_before_merge() {
        let patch = ContactPatch {
            tags: Some(tags(&["Lead"])),
            add_tags: tags(&["VIP"]),
            ..ContactPatch::default()
        };
        assert_eq!(patch.resolve_tags(&tags(&["Old"])), Some(tags(&["Lead", "VIP"])));
    }

    #[test]
    fn untouched_tags_resolve_to_none() {
        let patch = ContactPatch::status(ContactStatus::Inactive);
        assert!(!patch.merges_tags());
        assert_eq!(patch.resolve_tags(&tags(&["VIP"])), None);
    }
}
