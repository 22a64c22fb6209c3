use std::sync::Arc;

use chrono::Utc;
use entity::RecordId;
use entity::deal::{Deal, DealDraft, DealPatch, Stage};
use platform_gateway::{Condition, FetchParams, RecordGateway};

use super::{RecordStore, map_all};
use crate::error::{CrmResult, ValidationErrors};
use crate::mapping::{self, DEAL, deal_fields as f, deal_from_record, deal_record};

#[derive(Clone)]
pub struct DealService {
    store: RecordStore,
}

impl DealService {
    pub fn new(gateway: Arc<dyn RecordGateway>) -> Self {
        Self {
            store: RecordStore::new(gateway, DEAL),
        }
    }

    pub async fn get_all(&self) -> CrmResult<Vec<Deal>> {
        map_all(self.store.fetch_all(FetchParams::new()).await?, deal_from_record)
    }

    pub async fn get_by_id(&self, id: RecordId) -> CrmResult<Option<Deal>> {
        self.store
            .fetch_one(id)
            .await?
            .map(deal_from_record)
            .transpose()
    }

    pub async fn create(&self, draft: DealDraft) -> CrmResult<Deal> {
        check_value(Some(draft.value))?;
        let mut record = deal_record(&DealPatch::from(draft.normalized()));
        mapping::stamp(&mut record, f::CREATED_AT, Utc::now());
        deal_from_record(self.store.create(record).await?)
    }

    pub async fn update(&self, id: RecordId, patch: DealPatch) -> CrmResult<Deal> {
        check_value(patch.value)?;
        deal_from_record(self.store.update(id, deal_record(&patch)).await?)
    }

    pub async fn delete(&self, id: RecordId) -> CrmResult<()> {
        self.store.delete(id).await
    }

    /// Writes the stage, plus the probability a terminal stage forces. Other
    /// fields are not sent.
    pub async fn update_stage(&self, id: RecordId, stage: Stage) -> CrmResult<Deal> {
        self.update(id, DealPatch::stage_move(stage)).await
    }

    pub async fn by_contact(&self, contact_id: RecordId) -> CrmResult<Vec<Deal>> {
        let params = FetchParams::new().filter(Condition::eq(f::CONTACT_ID, contact_id));
        map_all(self.store.fetch_all(params).await?, deal_from_record)
    }

    pub async fn by_company(&self, company_id: RecordId) -> CrmResult<Vec<Deal>> {
        let params = FetchParams::new().filter(Condition::eq(f::COMPANY_ID, company_id));
        map_all(self.store.fetch_all(params).await?, deal_from_record)
    }

    pub fn stages(&self) -> &'static [Stage] {
        Stage::ALL
    }
}

/// Deal values are finite and never negative.
fn check_value(value: Option<f64>) -> CrmResult<()> {
    match value {
        Some(value) if !value.is_finite() || value < 0.0 => {
            let mut errors = ValidationErrors::new();
            errors.add("value", "Please enter a valid deal value");
            Err(errors.into())
        }
        _ => Ok(()),
    }
}
