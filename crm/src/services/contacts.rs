use std::sync::Arc;

use chrono::Utc;
use entity::RecordId;
use entity::contact::{Contact, ContactDraft, ContactPatch};
use platform_gateway::{Condition, FetchParams, RecordGateway, WhereGroup};
use tracing::{Instrument, info, info_span};

use super::{BulkOutcome, RecordStore, map_all};
use crate::error::{CrmError, CrmResult};
use crate::mapping::{self, CONTACT, contact_fields as f, contact_from_record, contact_record};

#[derive(Clone)]
pub struct ContactService {
    store: RecordStore,
}

impl ContactService {
    pub fn new(gateway: Arc<dyn RecordGateway>) -> Self {
        Self {
            store: RecordStore::new(gateway, CONTACT),
        }
    }

    pub async fn get_all(&self) -> CrmResult<Vec<Contact>> {
        map_all(self.store.fetch_all(FetchParams::new()).await?, contact_from_record)
    }

    pub async fn get_by_id(&self, id: RecordId) -> CrmResult<Option<Contact>> {
        self.store
            .fetch_one(id)
            .await?
            .map(contact_from_record)
            .transpose()
    }

    pub async fn create(&self, draft: ContactDraft) -> CrmResult<Contact> {
        let patch = ContactPatch::from(draft);
        let mut record = contact_record(&patch, Some(Vec::new()));
        record.insert(f::STATUS.to_string(), patch.status.unwrap_or_default().as_str().into());
        let now = Utc::now();
        mapping::stamp(&mut record, f::CREATED_AT, now);
        mapping::stamp(&mut record, f::UPDATED_AT, now);
        contact_from_record(self.store.create(record).await?)
    }

    /// Applies `patch`. Tag merges read the stored contact first.
    pub async fn update(&self, id: RecordId, patch: ContactPatch) -> CrmResult<Contact> {
        let tags = if patch.merges_tags() {
            let current = self
                .get_by_id(id)
                .await?
                .ok_or(CrmError::NotFound { entity: CONTACT, id })?;
            patch.resolve_tags(&current.tags)
        } else {
            patch.resolve_tags(&[])
        };
        let mut record = contact_record(&patch, tags);
        mapping::stamp(&mut record, f::UPDATED_AT, Utc::now());
        contact_from_record(self.store.update(id, record).await?)
    }

    pub async fn delete(&self, id: RecordId) -> CrmResult<()> {
        self.store.delete(id).await
    }

    /// Case-insensitive match on first name, last name, email or title. A
    /// blank query returns every contact.
    pub async fn search(&self, query: &str) -> CrmResult<Vec<Contact>> {
        let query = query.trim();
        if query.is_empty() {
            return self.get_all().await;
        }
        let params = FetchParams::new().group(WhereGroup::any(
            [f::FIRST_NAME, f::LAST_NAME, f::EMAIL, f::TITLE]
                .into_iter()
                .map(|field| Condition::contains(field, query))
                .collect(),
        ));
        map_all(self.store.fetch_all(params).await?, contact_from_record)
    }

    pub async fn by_company(&self, company_id: RecordId) -> CrmResult<Vec<Contact>> {
        let params = FetchParams::new().filter(Condition::eq(f::COMPANY_ID, company_id));
        map_all(self.store.fetch_all(params).await?, contact_from_record)
    }

    /// Applies the same patch to each id in turn. A failing id is recorded
    /// and the rest still run.
    pub async fn bulk_update(
        &self,
        ids: &[RecordId],
        patch: ContactPatch,
    ) -> BulkOutcome<Contact> {
        let span = info_span!("crm.contacts.bulk_update", count = ids.len());
        async {
            let mut outcome = BulkOutcome::default();
            for &id in ids {
                outcome.record(id, self.update(id, patch.clone()).await);
            }
            info!(
                succeeded = outcome.success_count,
                failed = outcome.error_count,
                "bulk contact update finished"
            );
            outcome
        }
        .instrument(span)
        .await
    }

    pub async fn bulk_delete(&self, ids: &[RecordId]) -> BulkOutcome<RecordId> {
        let span = info_span!("crm.contacts.bulk_delete", count = ids.len());
        async {
            let mut outcome = BulkOutcome::default();
            for &id in ids {
                outcome.record(id, self.delete(id).await.map(|()| id));
            }
            info!(
                succeeded = outcome.success_count,
                failed = outcome.error_count,
                "bulk contact delete finished"
            );
            outcome
        }
        .instrument(span)
        .await
    }
}
