//! Entity services: one adapter per gateway collection.
//!
//! Services translate typed records to gateway records and back. Gateway
//! failures are logged here and returned to the caller as [`CrmError`].

mod activities;
mod companies;
mod contacts;
mod deals;

use std::sync::Arc;

use entity::RecordId;
use platform_gateway::{
    DeleteRequest, FetchParams, MutationRequest, MutationResponse, Record, RecordGateway,
};
use serde::Serialize;
use tracing::warn;

use crate::error::{CrmError, CrmResult};

pub use activities::{ActivityService, DEFAULT_UPCOMING_LIMIT};
pub use companies::CompanyService;
pub use contacts::ContactService;
pub use deals::DealService;

/// Records requested per gateway page by `get_all` and searches.
pub const PAGE_SIZE: usize = 100;

/// The four entity services over one shared gateway.
#[derive(Clone)]
pub struct CrmServices {
    pub contacts: ContactService,
    pub companies: CompanyService,
    pub deals: DealService,
    pub activities: ActivityService,
}

impl CrmServices {
    pub fn new(gateway: Arc<dyn RecordGateway>) -> Self {
        Self {
            contacts: ContactService::new(gateway.clone()),
            companies: CompanyService::new(gateway.clone()),
            deals: DealService::new(gateway.clone()),
            activities: ActivityService::new(gateway),
        }
    }
}

/// Result of applying one operation to many ids. Ids fail independently.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOutcome<T> {
    pub succeeded: Vec<T>,
    pub failed: Vec<BulkFailure>,
    pub success_count: usize,
    pub error_count: usize,
}

impl<T> Default for BulkOutcome<T> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
            success_count: 0,
            error_count: 0,
        }
    }
}

impl<T> BulkOutcome<T> {
    pub(crate) fn record(&mut self, id: RecordId, result: CrmResult<T>) {
        match result {
            Ok(value) => {
                self.succeeded.push(value);
                self.success_count += 1;
            }
            Err(err) => {
                self.failed.push(BulkFailure {
                    id,
                    error: err.to_string(),
                });
                self.error_count += 1;
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BulkFailure {
    pub id: RecordId,
    pub error: String,
}

/// Gateway access for one collection, shared by the typed services.
#[derive(Clone)]
pub(crate) struct RecordStore {
    gateway: Arc<dyn RecordGateway>,
    entity: &'static str,
}

impl RecordStore {
    pub(crate) fn new(gateway: Arc<dyn RecordGateway>, entity: &'static str) -> Self {
        Self { gateway, entity }
    }

    /// Fetches every matching record, following pages of [`PAGE_SIZE`].
    pub(crate) async fn fetch_all(&self, params: FetchParams) -> CrmResult<Vec<Record>> {
        let mut records = Vec::new();
        let mut offset = 0;
        loop {
            let page = params.clone().page(PAGE_SIZE, offset);
            let response = self
                .gateway
                .fetch_records(self.entity, &page)
                .await
                .inspect_err(|err| warn!(entity = self.entity, error = %err, "fetch failed"))?;
            if !response.success {
                return Err(self.rejected(response.message, "fetch failed"));
            }
            let received = response.data.len();
            records.extend(response.data);
            offset += received;
            let exhausted = response.total.is_some_and(|total| offset >= total);
            if received < PAGE_SIZE || exhausted {
                return Ok(records);
            }
        }
    }

    /// `Ok(None)` when the gateway has no record with this id. A lookup the
    /// gateway reports as failed is `Rejected`.
    pub(crate) async fn fetch_one(&self, id: RecordId) -> CrmResult<Option<Record>> {
        let response = self
            .gateway
            .get_record_by_id(self.entity, id, &[])
            .await
            .inspect_err(|err| warn!(entity = self.entity, id, error = %err, "get failed"))?;
        if !response.success {
            let err = self.rejected(response.message, "get failed");
            warn!(entity = self.entity, id, error = %err, "get rejected");
            return Err(err);
        }
        Ok(response.data)
    }

    pub(crate) async fn create(&self, record: Record) -> CrmResult<Record> {
        let response = self
            .gateway
            .create_record(self.entity, MutationRequest::single(record))
            .await
            .inspect_err(|err| warn!(entity = self.entity, error = %err, "create failed"))?;
        self.single_result(response)
            .inspect_err(|err| warn!(entity = self.entity, error = %err, "create rejected"))
    }

    pub(crate) async fn update(&self, id: RecordId, mut record: Record) -> CrmResult<Record> {
        record.insert(platform_gateway::ID_FIELD.to_string(), id.into());
        let response = self
            .gateway
            .update_record(self.entity, MutationRequest::single(record))
            .await
            .inspect_err(|err| warn!(entity = self.entity, id, error = %err, "update failed"))?;
        self.single_result(response)
            .inspect_err(|err| warn!(entity = self.entity, id, error = %err, "update rejected"))
    }

    pub(crate) async fn delete(&self, id: RecordId) -> CrmResult<()> {
        let response = self
            .gateway
            .delete_record(self.entity, DeleteRequest::single(id))
            .await
            .inspect_err(|err| warn!(entity = self.entity, id, error = %err, "delete failed"))?;
        self.single_result(response)
            .map(|_| ())
            .inspect_err(|err| warn!(entity = self.entity, id, error = %err, "delete rejected"))
    }

    fn single_result(&self, response: MutationResponse) -> CrmResult<Record> {
        if !response.success {
            return Err(self.rejected(response.message, "request failed"));
        }
        let Some(result) = response.results.into_iter().next() else {
            return Err(self.rejected(None, "empty response"));
        };
        if !result.success {
            return Err(CrmError::Rejected {
                entity: self.entity,
                message: result.failure_reason(),
            });
        }
        Ok(result.data.unwrap_or_default())
    }

    fn rejected(&self, message: Option<String>, fallback: &str) -> CrmError {
        CrmError::Rejected {
            entity: self.entity,
            message: message.unwrap_or_else(|| fallback.to_string()),
        }
    }
}

/// Applies `map` to every record, failing on the first one that cannot be
/// typed.
pub(crate) fn map_all<T>(
    records: Vec<Record>,
    map: impl Fn(Record) -> CrmResult<T>,
) -> CrmResult<Vec<T>> {
    records.into_iter().map(map).collect()
}
