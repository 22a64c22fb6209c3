use std::sync::Arc;

use chrono::Utc;
use entity::RecordId;
use entity::company::{Company, CompanyDraft, CompanyPatch};
use platform_gateway::{Condition, FetchParams, RecordGateway, WhereGroup};

use super::{RecordStore, map_all};
use crate::error::CrmResult;
use crate::mapping::{self, COMPANY, company_fields as f, company_from_record, company_record};

#[derive(Clone)]
pub struct CompanyService {
    store: RecordStore,
}

impl CompanyService {
    pub fn new(gateway: Arc<dyn RecordGateway>) -> Self {
        Self {
            store: RecordStore::new(gateway, COMPANY),
        }
    }

    pub async fn get_all(&self) -> CrmResult<Vec<Company>> {
        map_all(self.store.fetch_all(FetchParams::new()).await?, company_from_record)
    }

    pub async fn get_by_id(&self, id: RecordId) -> CrmResult<Option<Company>> {
        self.store
            .fetch_one(id)
            .await?
            .map(company_from_record)
            .transpose()
    }

    pub async fn create(&self, draft: CompanyDraft) -> CrmResult<Company> {
        let mut record = company_record(&CompanyPatch::from(draft));
        mapping::stamp(&mut record, f::CREATED_AT, Utc::now());
        company_from_record(self.store.create(record).await?)
    }

    pub async fn update(&self, id: RecordId, patch: CompanyPatch) -> CrmResult<Company> {
        company_from_record(self.store.update(id, company_record(&patch)).await?)
    }

    pub async fn delete(&self, id: RecordId) -> CrmResult<()> {
        self.store.delete(id).await
    }

    /// Matches name, industry or size. A blank query returns everything.
    pub async fn search(&self, query: &str) -> CrmResult<Vec<Company>> {
        let query = query.trim();
        if query.is_empty() {
            return self.get_all().await;
        }
        let params = FetchParams::new().group(WhereGroup::any(
            [f::NAME, f::INDUSTRY, f::SIZE]
                .into_iter()
                .map(|field| Condition::contains(field, query))
                .collect(),
        ));
        map_all(self.store.fetch_all(params).await?, company_from_record)
    }
}
