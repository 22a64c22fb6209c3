//! In-memory record gateway. Each instance owns its collections; build one
//! per test or per server run.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use crate::query::project;
use crate::{
    DeleteRequest, FetchParams, FetchResponse, FieldError, FieldRef, GatewayError, GatewayResult,
    GetResponse, ID_FIELD, MutationRequest, MutationResponse, Record, RecordGateway, RecordId,
    RecordResult, id_from_value,
};

const NOT_FOUND: &str = "Record not found";

struct Collection {
    fields: HashSet<String>,
    records: Vec<Record>,
    next_id: RecordId,
}

impl Collection {
    fn new(fields: &[&str]) -> Self {
        Self {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            records: Vec::new(),
            next_id: 1,
        }
    }

    fn position(&self, id: RecordId) -> Option<usize> {
        self.records
            .iter()
            .position(|r| r.get(ID_FIELD).and_then(id_from_value) == Some(id))
    }

    fn unknown_fields(&self, record: &Record) -> Vec<FieldError> {
        record
            .keys()
            .filter(|key| key.as_str() != ID_FIELD && !self.fields.contains(key.as_str()))
            .map(|key| FieldError {
                field_label: key.clone(),
                message: "Unknown field".to_string(),
            })
            .collect()
    }

    fn take_id(&mut self) -> RecordId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

#[derive(Default)]
pub struct MemoryGateway {
    collections: RwLock<HashMap<String, Collection>>,
    fail_on_fetch: AtomicBool,
    fail_on_mutation: AtomicBool,
    fetch_calls: AtomicUsize,
    mutation_calls: AtomicUsize,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a collection with its fixed field schema.
    pub fn with_collection(mut self, entity: &str, fields: &[&str]) -> Self {
        self.collections
            .get_mut()
            .insert(entity.to_string(), Collection::new(fields));
        self
    }

    /// Stores a record as-is, bypassing the field schema. Used to load
    /// fixtures in older record shapes. Assigns an id when none is present.
    pub async fn insert_raw(&self, entity: &str, mut record: Record) -> GatewayResult<RecordId> {
        let mut collections = self.collections.write().await;
        let collection = collections
            .get_mut(entity)
            .ok_or_else(|| GatewayError::UnknownEntity(entity.to_string()))?;
        let id = match record.get(ID_FIELD).and_then(id_from_value) {
            Some(id) => {
                collection.next_id = collection.next_id.max(id + 1);
                id
            }
            None => collection.take_id(),
        };
        record.insert(ID_FIELD.to_string(), Value::from(id));
        collection.records.push(record);
        Ok(id)
    }

    /// Snapshot of a collection in storage order.
    pub async fn records(&self, entity: &str) -> Vec<Record> {
        self.collections
            .read()
            .await
            .get(entity)
            .map(|c| c.records.clone())
            .unwrap_or_default()
    }

    pub fn set_fail_on_fetch(&self, fail: bool) {
        self.fail_on_fetch.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_on_mutation(&self, fail: bool) {
        self.fail_on_mutation.store(fail, Ordering::SeqCst);
    }

    /// Number of fetch/get calls received.
    pub fn fetch_count(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Number of create/update/delete calls received.
    pub fn mutation_count(&self) -> usize {
        self.mutation_calls.load(Ordering::SeqCst)
    }

    fn begin_fetch(&self) -> GatewayResult<()> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on_fetch.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable);
        }
        Ok(())
    }

    fn begin_mutation(&self) -> GatewayResult<()> {
        self.mutation_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on_mutation.load(Ordering::SeqCst) {
            return Err(GatewayError::Unavailable);
        }
        Ok(())
    }
}

fn processed(results: Vec<RecordResult>) -> MutationResponse {
    MutationResponse {
        success: true,
        message: None,
        results,
    }
}

#[async_trait]
impl RecordGateway for MemoryGateway {
    async fn fetch_records(
        &self,
        entity: &str,
        params: &FetchParams,
    ) -> GatewayResult<FetchResponse> {
        self.begin_fetch()?;
        let collections = self.collections.read().await;
        let collection = collections
            .get(entity)
            .ok_or_else(|| GatewayError::UnknownEntity(entity.to_string()))?;
        let mut matched: Vec<Record> = collection
            .records
            .iter()
            .filter(|record| params.matches(record))
            .cloned()
            .collect();
        params.sort(&mut matched);
        let total = matched.len();
        let page: Vec<Record> = match params.paging_info {
            Some(paging) => matched
                .into_iter()
                .skip(paging.offset)
                .take(paging.limit)
                .collect(),
            None => matched,
        };
        debug!(entity, total, returned = page.len(), "memory gateway fetch");
        Ok(FetchResponse {
            success: true,
            data: page.iter().map(|r| params.project(r)).collect(),
            total: Some(total),
            message: None,
        })
    }

    async fn get_record_by_id(
        &self,
        entity: &str,
        id: RecordId,
        fields: &[FieldRef],
    ) -> GatewayResult<GetResponse> {
        self.begin_fetch()?;
        let collections = self.collections.read().await;
        let collection = collections
            .get(entity)
            .ok_or_else(|| GatewayError::UnknownEntity(entity.to_string()))?;
        Ok(GetResponse {
            success: true,
            data: collection
                .position(id)
                .map(|index| project(&collection.records[index], fields)),
            message: None,
        })
    }

    async fn create_record(
        &self,
        entity: &str,
        request: MutationRequest,
    ) -> GatewayResult<MutationResponse> {
        self.begin_mutation()?;
        let mut collections = self.collections.write().await;
        let collection = collections
            .get_mut(entity)
            .ok_or_else(|| GatewayError::UnknownEntity(entity.to_string()))?;
        let mut results = Vec::with_capacity(request.records.len());
        for mut record in request.records {
            let errors = collection.unknown_fields(&record);
            if !errors.is_empty() {
                results.push(RecordResult {
                    success: false,
                    data: None,
                    message: Some("Invalid fields".to_string()),
                    errors,
                });
                continue;
            }
            let id = collection.take_id();
            record.insert(ID_FIELD.to_string(), Value::from(id));
            collection.records.push(record.clone());
            results.push(RecordResult::ok(Some(record)));
        }
        Ok(processed(results))
    }

    async fn update_record(
        &self,
        entity: &str,
        request: MutationRequest,
    ) -> GatewayResult<MutationResponse> {
        self.begin_mutation()?;
        let mut collections = self.collections.write().await;
        let collection = collections
            .get_mut(entity)
            .ok_or_else(|| GatewayError::UnknownEntity(entity.to_string()))?;
        let mut results = Vec::with_capacity(request.records.len());
        for record in request.records {
            let Some(id) = record.get(ID_FIELD).and_then(id_from_value) else {
                results.push(RecordResult::failed("Id is required"));
                continue;
            };
            let errors = collection.unknown_fields(&record);
            if !errors.is_empty() {
                results.push(RecordResult {
                    success: false,
                    data: None,
                    message: Some("Invalid fields".to_string()),
                    errors,
                });
                continue;
            }
            let Some(index) = collection.position(id) else {
                results.push(RecordResult::failed(NOT_FOUND));
                continue;
            };
            let stored = &mut collection.records[index];
            for (key, value) in record {
                if key != ID_FIELD {
                    stored.insert(key, value);
                }
            }
            results.push(RecordResult::ok(Some(stored.clone())));
        }
        Ok(processed(results))
    }

    async fn delete_record(
        &self,
        entity: &str,
        request: DeleteRequest,
    ) -> GatewayResult<MutationResponse> {
        self.begin_mutation()?;
        let mut collections = self.collections.write().await;
        let collection = collections
            .get_mut(entity)
            .ok_or_else(|| GatewayError::UnknownEntity(entity.to_string()))?;
        let results = request
            .record_ids
            .into_iter()
            .map(|id| match collection.position(id) {
                Some(index) => {
                    collection.records.remove(index);
                    RecordResult::ok(None)
                }
                None => RecordResult::failed(NOT_FOUND),
            })
            .collect();
        Ok(processed(results))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Condition, SortType};
    use serde_json::json;

    fn gateway() -> MemoryGateway {
        MemoryGateway::new().with_collection("company", &["name_c", "size_c"])
    }

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    async fn create(gw: &MemoryGateway, name: &str) -> RecordId {
        let resp = gw
            .create_record(
                "company",
                MutationRequest::single(record(json!({"name_c": name, "size_c": "Small"}))),
            )
            .await
            .unwrap();
        resp.results[0]
            .data
            .as_ref()
            .and_then(|d| d.get(ID_FIELD))
            .and_then(id_from_value)
            .unwrap()
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids() {
        let gw = gateway();
        assert_eq!(create(&gw, "Acme").await, 1);
        assert_eq!(create(&gw, "Globex").await, 2);
        assert_eq!(gw.records("company").await.len(), 2);
        assert_eq!(gw.mutation_count(), 2);
    }

    #[tokio::test]
    async fn unknown_fields_fail_per_record() {
        let gw = gateway();
        let resp = gw
            .create_record(
                "company",
                MutationRequest {
                    records: vec![
                        record(json!({"name_c": "Acme"})),
                        record(json!({"name_c": "Initech", "ceo_c": "Bill"})),
                    ],
                },
            )
            .await
            .unwrap();
        assert!(resp.success);
        assert!(resp.results[0].success);
        assert!(!resp.results[1].success);
        assert_eq!(resp.results[1].errors[0].field_label, "ceo_c");
        assert_eq!(gw.records("company").await.len(), 1);
    }

    #[tokio::test]
    async fn update_merges_fields_and_reports_missing_ids() {
        let gw = gateway();
        let id = create(&gw, "Acme").await;
        let resp = gw
            .update_record(
                "company",
                MutationRequest {
                    records: vec![
                        record(json!({"Id": id, "size_c": "Large"})),
                        record(json!({"Id": 99, "size_c": "Large"})),
                    ],
                },
            )
            .await
            .unwrap();
        let updated = resp.results[0].data.as_ref().unwrap();
        assert_eq!(updated["name_c"], "Acme");
        assert_eq!(updated["size_c"], "Large");
        assert_eq!(resp.results[1].message.as_deref(), Some(NOT_FOUND));
    }

    #[tokio::test]
    async fn delete_reports_each_id() {
        let gw = gateway();
        let first = create(&gw, "Acme").await;
        let second = create(&gw, "Globex").await;
        let resp = gw
            .delete_record(
                "company",
                DeleteRequest {
                    record_ids: vec![first, 42],
                },
            )
            .await
            .unwrap();
        assert!(resp.results[0].success);
        assert!(!resp.results[1].success);
        let remaining = gw.records("company").await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0][ID_FIELD], json!(second));
    }

    #[tokio::test]
    async fn fetch_filters_sorts_pages_and_projects() {
        let gw = gateway();
        for name in ["Globex", "Acme", "Initech", "Umbrella"] {
            create(&gw, name).await;
        }
        let params = FetchParams::new()
            .fields(&["name_c"])
            .filter(Condition::new("name_c", crate::Operator::NotEqualTo, "Umbrella"))
            .order_by("name_c", SortType::Asc)
            .page(2, 1);
        let resp = gw.fetch_records("company", &params).await.unwrap();
        assert_eq!(resp.total, Some(3));
        let names: Vec<&str> = resp
            .data
            .iter()
            .map(|r| r["name_c"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Globex", "Initech"]);
        assert!(resp.data.iter().all(|r| !r.contains_key("size_c")));
    }

    #[tokio::test]
    async fn injected_failures_surface_as_errors() {
        let gw = gateway();
        gw.set_fail_on_fetch(true);
        let err = gw
            .fetch_records("company", &FetchParams::new())
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::Unavailable);
        gw.set_fail_on_mutation(true);
        assert!(
            gw.delete_record("company", DeleteRequest::single(1))
                .await
                .is_err()
        );
        assert!(matches!(
            gw.get_record_by_id("nope", 1, &[]).await,
            Err(GatewayError::Unavailable)
        ));
    }

    #[tokio::test]
    async fn unknown_entity_is_an_error() {
        let gw = gateway();
        let err = gw
            .fetch_records("invoice", &FetchParams::new())
            .await
            .unwrap_err();
        assert_eq!(err, GatewayError::UnknownEntity("invoice".into()));
    }

    #[tokio::test]
    async fn raw_inserts_keep_explicit_ids() {
        let gw = gateway();
        let id = gw
            .insert_raw("company", record(json!({"Id": 10, "name": "Legacy Co"})))
            .await
            .unwrap();
        assert_eq!(id, 10);
        assert_eq!(create(&gw, "Next").await, 11);
        let found = gw.get_record_by_id("company", 10, &[]).await.unwrap();
        assert_eq!(found.data.unwrap()["name"], "Legacy Co");

        let missing = gw.get_record_by_id("company", 12, &[]).await.unwrap();
        assert!(missing.success);
        assert!(missing.data.is_none());
    }
}
