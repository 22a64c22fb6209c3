//! Contract of the hosted records API: generic CRUD and query over named
//! entity collections with a fixed field schema.
//!
//! Entity services are written strictly against [`RecordGateway`]; the
//! [`MemoryGateway`] implementation backs tests and the demo server.

mod memory;
mod query;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub use memory::MemoryGateway;
pub use query::{
    Condition, FetchParams, FieldName, FieldRef, GroupOperator, Operator, OrderBy, PagingInfo,
    SortType, WhereGroup,
};

/// Gateway-assigned record identifier.
pub type RecordId = i64;

/// A record as it travels over the wire: field name to JSON value.
pub type Record = Map<String, Value>;

/// Key holding the record identifier in every collection.
pub const ID_FIELD: &str = "Id";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("unknown entity `{0}`")]
    UnknownEntity(String),
    #[error("gateway request failed: {0}")]
    Request(String),
    #[error("gateway unavailable")]
    Unavailable,
}

pub type GatewayResult<T> = Result<T, GatewayError>;

#[async_trait]
pub trait RecordGateway: Send + Sync {
    async fn fetch_records(&self, entity: &str, params: &FetchParams)
    -> GatewayResult<FetchResponse>;

    /// `fields` restricts the returned columns; empty means all.
    async fn get_record_by_id(
        &self,
        entity: &str,
        id: RecordId,
        fields: &[FieldRef],
    ) -> GatewayResult<GetResponse>;

    async fn create_record(
        &self,
        entity: &str,
        request: MutationRequest,
    ) -> GatewayResult<MutationResponse>;

    /// Every record must carry [`ID_FIELD`]; only the fields present are
    /// written.
    async fn update_record(
        &self,
        entity: &str,
        request: MutationRequest,
    ) -> GatewayResult<MutationResponse>;

    async fn delete_record(
        &self,
        entity: &str,
        request: DeleteRequest,
    ) -> GatewayResult<MutationResponse>;
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Vec<Record>,
    /// Matching records across all pages, when the gateway reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A missing record is `success: true` with no `data`; `success: false`
/// means the lookup itself failed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GetResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MutationRequest {
    pub records: Vec<Record>,
}

impl MutationRequest {
    pub fn single(record: Record) -> Self {
        Self {
            records: vec![record],
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteRequest {
    #[serde(rename = "RecordIds")]
    pub record_ids: Vec<RecordId>,
}

impl DeleteRequest {
    pub fn single(id: RecordId) -> Self {
        Self {
            record_ids: vec![id],
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MutationResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub results: Vec<RecordResult>,
}

/// Outcome for one record of a create/update/delete request.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl RecordResult {
    pub fn ok(data: Option<Record>) -> Self {
        Self {
            success: true,
            data,
            ..Self::default()
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Human-readable reason for a failed record: the message followed by
    /// each field error.
    pub fn failure_reason(&self) -> String {
        let mut parts: Vec<String> = self.message.iter().cloned().collect();
        parts.extend(
            self.errors
                .iter()
                .map(|err| format!("{}: {}", err.field_label, err.message)),
        );
        if parts.is_empty() {
            "record rejected".to_string()
        } else {
            parts.join("; ")
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field_label: String,
    pub message: String,
}

/// Reads a record id from a JSON value: an integer, a numeric string, or a
/// lookup object carrying `Id`.
pub fn id_from_value(value: &Value) -> Option<RecordId> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Object(map) => map.get(ID_FIELD).and_then(id_from_value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ids_read_from_lookup_objects_and_strings() {
        assert_eq!(id_from_value(&json!(7)), Some(7));
        assert_eq!(id_from_value(&json!("12")), Some(12));
        assert_eq!(id_from_value(&json!({"Id": 3, "Name": "Acme"})), Some(3));
        assert_eq!(id_from_value(&json!(null)), None);
        assert_eq!(id_from_value(&json!("abc")), None);
    }

    #[test]
    fn delete_request_uses_wire_key() {
        let body = serde_json::to_value(DeleteRequest::single(4)).unwrap();
        assert_eq!(body, json!({"RecordIds": [4]}));
    }

    #[test]
    fn failure_reason_joins_message_and_field_errors() {
        let result = RecordResult {
            success: false,
            data: None,
            message: Some("Validation failed".into()),
            errors: vec![FieldError {
                field_label: "email_c".into(),
                message: "Unknown field".into(),
            }],
        };
        assert_eq!(
            result.failure_reason(),
            "Validation failed; email_c: Unknown field"
        );
        assert_eq!(RecordResult::default().failure_reason(), "record rejected");
    }
}
