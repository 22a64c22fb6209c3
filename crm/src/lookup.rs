//! Client-side resolution of record references against fetched collections.

use std::collections::HashMap;

use entity::RecordId;
use entity::company::Company;
use entity::contact::Contact;
use entity::deal::Deal;

pub const UNKNOWN_CONTACT: &str = "Unknown Contact";
pub const UNKNOWN_COMPANY: &str = "Unknown Company";
pub const UNKNOWN_DEAL: &str = "Unknown Deal";
/// Shown for an activity that references no contact.
pub const GENERAL_ACTIVITY: &str = "General Activity";

/// Display names keyed by record id.
#[derive(Clone, Debug, Default)]
pub struct NameIndex {
    names: HashMap<RecordId, String>,
    fallback: &'static str,
}

impl NameIndex {
    pub fn contacts(contacts: &[Contact]) -> Self {
        Self::build(contacts.iter().map(|c| (c.id, c.full_name())), UNKNOWN_CONTACT)
    }

    pub fn companies(companies: &[Company]) -> Self {
        Self::build(companies.iter().map(|c| (c.id, c.name.clone())), UNKNOWN_COMPANY)
    }

    pub fn deals(deals: &[Deal]) -> Self {
        Self::build(deals.iter().map(|d| (d.id, d.title.clone())), UNKNOWN_DEAL)
    }

    fn build(entries: impl Iterator<Item = (RecordId, String)>, fallback: &'static str) -> Self {
        Self {
            names: entries.collect(),
            fallback,
        }
    }

    /// Name for `id`, or the fallback when the id is absent or dangling.
    pub fn name(&self, id: Option<RecordId>) -> String {
        self.get(id).unwrap_or(self.fallback).to_string()
    }

    pub fn get(&self, id: Option<RecordId>) -> Option<&str> {
        id.and_then(|id| self.names.get(&id)).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entity::company::{CompanySize, Industry};

    #[test]
    fn dangling_references_use_fallback() {
        let companies = vec![Company {
            id: 1,
            name: "Acme".into(),
            industry: Industry::Technology,
            size: CompanySize::Small,
            website: None,
            address: None,
            notes: None,
            created_at: None,
        }];
        let index = NameIndex::companies(&companies);
        assert_eq!(index.name(Some(1)), "Acme");
        assert_eq!(index.name(Some(2)), UNKNOWN_COMPANY);
        assert_eq!(index.name(None), UNKNOWN_COMPANY);
        assert_eq!(index.get(Some(2)), None);
    }
}
