//! Query half of the wire contract: field selection, where clauses and
//! groups, ordering and paging.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ID_FIELD, Record, id_from_value};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchParams {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldRef>,
    #[serde(default, rename = "where", skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub where_groups: Vec<WhereGroup>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paging_info: Option<PagingInfo>,
}

impl FetchParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields(mut self, names: &[&str]) -> Self {
        self.fields = names.iter().map(|name| FieldRef::named(name)).collect();
        self
    }

    pub fn filter(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn group(mut self, group: WhereGroup) -> Self {
        self.where_groups.push(group);
        self
    }

    pub fn order_by(mut self, field: &str, sort: SortType) -> Self {
        self.order_by.push(OrderBy {
            field_name: field.to_string(),
            sorttype: sort,
        });
        self
    }

    pub fn page(mut self, limit: usize, offset: usize) -> Self {
        self.paging_info = Some(PagingInfo { limit, offset });
        self
    }
}

/// Column selector, `{ "field": { "Name": … } }` on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRef {
    pub field: FieldName,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldName {
    #[serde(rename = "Name")]
    pub name: String,
}

impl FieldRef {
    pub fn named(name: &str) -> Self {
        Self {
            field: FieldName {
                name: name.to_string(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.field.name
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    EqualTo,
    NotEqualTo,
    Contains,
    LessThan,
    LessThanOrEqualTo,
    GreaterThan,
    GreaterThanOrEqualTo,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Condition {
    pub field_name: String,
    pub operator: Operator,
    pub values: Vec<Value>,
}

impl Condition {
    pub fn new(field: &str, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field_name: field.to_string(),
            operator,
            values: vec![value.into()],
        }
    }

    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::EqualTo, value)
    }

    pub fn contains(field: &str, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Contains, value)
    }

    /// A condition holds when any of its values satisfies the operator;
    /// `NotEqualTo` holds when none is equal.
    pub(crate) fn matches(&self, record: &Record) -> bool {
        let actual = field_value(record, &self.field_name);
        match self.operator {
            Operator::EqualTo => self.values.iter().any(|v| values_equal(&actual, v)),
            Operator::NotEqualTo => !self.values.iter().any(|v| values_equal(&actual, v)),
            Operator::Contains => self.values.iter().any(|v| text_contains(&actual, v)),
            Operator::LessThan => self.any_ordering(&actual, |o| o == Ordering::Less),
            Operator::LessThanOrEqualTo => self.any_ordering(&actual, |o| o != Ordering::Greater),
            Operator::GreaterThan => self.any_ordering(&actual, |o| o == Ordering::Greater),
            Operator::GreaterThanOrEqualTo => self.any_ordering(&actual, |o| o != Ordering::Less),
        }
    }

    fn any_ordering(&self, actual: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
        self.values
            .iter()
            .filter_map(|expected| compare_values(actual, expected))
            .any(accept)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupOperator {
    #[serde(rename = "AND")]
    And,
    #[serde(rename = "OR")]
    Or,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WhereGroup {
    pub operator: GroupOperator,
    pub conditions: Vec<Condition>,
}

impl WhereGroup {
    pub fn any(conditions: Vec<Condition>) -> Self {
        Self {
            operator: GroupOperator::Or,
            conditions,
        }
    }

    pub fn all(conditions: Vec<Condition>) -> Self {
        Self {
            operator: GroupOperator::And,
            conditions,
        }
    }

    pub(crate) fn matches(&self, record: &Record) -> bool {
        match self.operator {
            GroupOperator::And => self.conditions.iter().all(|c| c.matches(record)),
            GroupOperator::Or => self.conditions.iter().any(|c| c.matches(record)),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortType {
    #[serde(rename = "ASC")]
    Asc,
    #[serde(rename = "DESC")]
    Desc,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBy {
    pub field_name: String,
    pub sorttype: SortType,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingInfo {
    pub limit: usize,
    pub offset: usize,
}

impl FetchParams {
    pub(crate) fn matches(&self, record: &Record) -> bool {
        self.conditions.iter().all(|c| c.matches(record))
            && self.where_groups.iter().all(|g| g.matches(record))
    }

    /// Orders records by each `orderBy` entry in turn. Null sorts first
    /// ascending; the sort is stable.
    pub(crate) fn sort(&self, records: &mut [Record]) {
        if self.order_by.is_empty() {
            return;
        }
        records.sort_by(|a, b| {
            for order in &self.order_by {
                let left = field_value(a, &order.field_name);
                let right = field_value(b, &order.field_name);
                let ordering = compare_for_sort(&left, &right);
                let ordering = match order.sorttype {
                    SortType::Asc => ordering,
                    SortType::Desc => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });
    }

    pub(crate) fn project(&self, record: &Record) -> Record {
        project(record, &self.fields)
    }
}

pub(crate) fn project(record: &Record, fields: &[FieldRef]) -> Record {
    if fields.is_empty() {
        return record.clone();
    }
    record
        .iter()
        .filter(|(key, _)| key.as_str() == ID_FIELD || fields.iter().any(|f| f.name() == *key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Lookup objects compare by their id.
fn field_value(record: &Record, field: &str) -> Value {
    match record.get(field) {
        Some(Value::Object(map)) => map
            .get(ID_FIELD)
            .cloned()
            .unwrap_or(Value::Null),
        Some(value) => value.clone(),
        None => Value::Null,
    }
}

fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        (Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => {
            match (id_from_value(actual), id_from_value(expected)) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            }
        }
        _ => actual == expected,
    }
}

fn text_contains(actual: &Value, needle: &Value) -> bool {
    let haystack = match actual {
        Value::String(s) => s.to_lowercase(),
        Value::Null => return false,
        other => other.to_string().to_lowercase(),
    };
    match needle {
        Value::String(s) => haystack.contains(&s.to_lowercase()),
        other => haystack.contains(&other.to_string().to_lowercase()),
    }
}

fn compare_values(actual: &Value, expected: &Value) -> Option<Ordering> {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn compare_for_sort(left: &Value, right: &Value) -> Ordering {
    match (left.is_null(), right.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => compare_values(left, right).unwrap_or(Ordering::Equal),
    }
}
