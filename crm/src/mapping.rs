//! Versioned field schema of the records gateway.
//!
//! The current schema suffixes every custom field with `_c`. Older records
//! carry the same names without the suffix; [`migrate_legacy`] upgrades them
//! so only the current shape reaches the typed readers below.

use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use entity::RecordId;
use entity::activity::{Activity, ActivityPatch};
use entity::company::{Company, CompanyPatch};
use entity::contact::{Contact, ContactPatch};
use entity::deal::{Deal, DealPatch, StageValue};
use platform_gateway::{ID_FIELD, Record, id_from_value};
use serde_json::Value;

use crate::error::{CrmError, CrmResult};

pub const CONTACT: &str = "contact";
pub const COMPANY: &str = "company";
pub const DEAL: &str = "deal";
pub const ACTIVITY: &str = "activity";

const CURRENT_SUFFIX: &str = "_c";

pub mod contact_fields {
    pub const FIRST_NAME: &str = "firstName_c";
    pub const LAST_NAME: &str = "lastName_c";
    pub const EMAIL: &str = "email_c";
    pub const PHONE: &str = "phone_c";
    pub const TITLE: &str = "title_c";
    pub const COMPANY_ID: &str = "companyId_c";
    pub const NOTES: &str = "notes_c";
    pub const STATUS: &str = "status_c";
    pub const TAGS: &str = "tags_c";
    pub const CREATED_AT: &str = "createdAt_c";
    pub const UPDATED_AT: &str = "updatedAt_c";

    pub const ALL: &[&str] = &[
        FIRST_NAME, LAST_NAME, EMAIL, PHONE, TITLE, COMPANY_ID, NOTES, STATUS, TAGS, CREATED_AT,
        UPDATED_AT,
    ];
}

pub mod company_fields {
    pub const NAME: &str = "name_c";
    pub const INDUSTRY: &str = "industry_c";
    pub const SIZE: &str = "size_c";
    pub const WEBSITE: &str = "website_c";
    pub const ADDRESS: &str = "address_c";
    pub const NOTES: &str = "notes_c";
    pub const CREATED_AT: &str = "createdAt_c";

    pub const ALL: &[&str] = &[NAME, INDUSTRY, SIZE, WEBSITE, ADDRESS, NOTES, CREATED_AT];
}

pub mod deal_fields {
    pub const TITLE: &str = "title_c";
    pub const VALUE: &str = "value_c";
    pub const STAGE: &str = "stage_c";
    pub const PROBABILITY: &str = "probability_c";
    pub const CONTACT_ID: &str = "contactId_c";
    pub const COMPANY_ID: &str = "companyId_c";
    pub const CLOSE_DATE: &str = "closeDate_c";
    pub const NOTES: &str = "notes_c";
    pub const CREATED_AT: &str = "createdAt_c";

    pub const ALL: &[&str] = &[
        TITLE, VALUE, STAGE, PROBABILITY, CONTACT_ID, COMPANY_ID, CLOSE_DATE, NOTES, CREATED_AT,
    ];
}

pub mod activity_fields {
    pub const SUBJECT: &str = "subject_c";
    pub const DESCRIPTION: &str = "description_c";
    pub const TYPE: &str = "type_c";
    pub const DUE_DATE: &str = "dueDate_c";
    pub const COMPLETED: &str = "completed_c";
    pub const CONTACT_ID: &str = "contactId_c";
    pub const DEAL_ID: &str = "dealId_c";
    pub const CREATED_AT: &str = "createdAt_c";

    pub const ALL: &[&str] = &[
        SUBJECT, DESCRIPTION, TYPE, DUE_DATE, COMPLETED, CONTACT_ID, DEAL_ID, CREATED_AT,
    ];
}

/// Current field schema of a collection.
pub fn fields_of(entity: &str) -> Option<&'static [&'static str]> {
    match entity {
        CONTACT => Some(contact_fields::ALL),
        COMPANY => Some(company_fields::ALL),
        DEAL => Some(deal_fields::ALL),
        ACTIVITY => Some(activity_fields::ALL),
        _ => None,
    }
}

/// Renames legacy (unsuffixed) keys to their current names. A current key
/// already present wins over its legacy twin. Unknown keys pass through.
pub fn migrate_legacy(entity: &str, mut record: Record) -> Record {
    let Some(fields) = fields_of(entity) else {
        return record;
    };
    for field in fields {
        let Some(legacy) = field.strip_suffix(CURRENT_SUFFIX) else {
            continue;
        };
        if let Some(value) = record.remove(legacy) {
            record.entry(field.to_string()).or_insert(value);
        }
    }
    record
}

/// Canonical wire format for timestamps: RFC 3339, UTC, whole seconds.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Accepts RFC 3339, a form `datetime-local` value (`YYYY-MM-DDTHH:MM`,
/// optionally with seconds) or a bare date. Offset-less values are UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Typed view over one gateway record.
struct FieldReader<'a> {
    entity: &'static str,
    record: &'a Record,
}

impl<'a> FieldReader<'a> {
    fn new(entity: &'static str, record: &'a Record) -> Self {
        Self { entity, record }
    }

    fn raw(&self, field: &str) -> Option<&'a Value> {
        self.record.get(field).filter(|value| !value.is_null())
    }

    fn id(&self) -> CrmResult<RecordId> {
        self.record
            .get(ID_FIELD)
            .and_then(id_from_value)
            .ok_or_else(|| CrmError::mapping(self.entity, ID_FIELD, "missing record id"))
    }

    fn text(&self, field: &str) -> String {
        match self.raw(field) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    }

    fn optional_text(&self, field: &str) -> Option<String> {
        let text = self.text(field);
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    fn number(&self, field: &str) -> CrmResult<f64> {
        match self.raw(field) {
            None => Ok(0.0),
            Some(Value::Number(n)) => n
                .as_f64()
                .ok_or_else(|| CrmError::mapping(self.entity, field, "number out of range")),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(0.0),
            Some(Value::String(s)) => s
                .trim()
                .parse()
                .map_err(|_| CrmError::mapping(self.entity, field, format!("`{s}` is not a number"))),
            Some(other) => Err(CrmError::mapping(
                self.entity,
                field,
                format!("expected a number, got {other}"),
            )),
        }
    }

    fn percentage(&self, field: &str) -> CrmResult<u8> {
        let value = self.number(field)?;
        Ok(value.round().clamp(0.0, 100.0) as u8)
    }

    fn flag(&self, field: &str) -> bool {
        match self.raw(field) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => matches!(s.trim(), "true" | "1"),
            Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
            _ => false,
        }
    }

    fn reference(&self, field: &str) -> Option<RecordId> {
        self.raw(field).and_then(id_from_value)
    }

    fn timestamp(&self, field: &str) -> CrmResult<Option<DateTime<Utc>>> {
        let Some(raw) = self.optional_text(field) else {
            return Ok(None);
        };
        parse_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| CrmError::mapping(self.entity, field, format!("`{raw}` is not a timestamp")))
    }

    fn required_timestamp(&self, field: &str) -> CrmResult<DateTime<Utc>> {
        self.timestamp(field)?
            .ok_or_else(|| CrmError::mapping(self.entity, field, "missing timestamp"))
    }

    fn parsed<T>(&self, field: &str) -> CrmResult<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.text(field)
            .parse()
            .map_err(|err: T::Err| CrmError::mapping(self.entity, field, err.to_string()))
    }

    /// Parses the field, falling back to `T::default()` when it is blank.
    fn parsed_or_default<T>(&self, field: &str) -> CrmResult<T>
    where
        T: FromStr + Default,
        T::Err: Display,
    {
        if self.optional_text(field).is_none() {
            return Ok(T::default());
        }
        self.parsed(field)
    }

    /// Tags arrive as a JSON array or a comma separated string.
    fn tags(&self, field: &str) -> Vec<String> {
        match self.raw(field) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| item.as_str())
                .map(str::to_string)
                .collect(),
            Some(Value::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }
}

pub fn contact_from_record(record: Record) -> CrmResult<Contact> {
    use contact_fields::*;
    let record = migrate_legacy(CONTACT, record);
    let r = FieldReader::new(CONTACT, &record);
    Ok(Contact {
        id: r.id()?,
        first_name: r.text(FIRST_NAME),
        last_name: r.text(LAST_NAME),
        email: r.text(EMAIL),
        phone: r.optional_text(PHONE),
        title: r.optional_text(TITLE),
        company_id: r.reference(COMPANY_ID),
        notes: r.optional_text(NOTES),
        status: r.parsed_or_default(STATUS)?,
        tags: r.tags(TAGS),
        created_at: r.timestamp(CREATED_AT)?,
        updated_at: r.timestamp(UPDATED_AT)?,
    })
}

pub fn company_from_record(record: Record) -> CrmResult<Company> {
    use company_fields::*;
    let record = migrate_legacy(COMPANY, record);
    let r = FieldReader::new(COMPANY, &record);
    Ok(Company {
        id: r.id()?,
        name: r.text(NAME),
        industry: r.parsed(INDUSTRY)?,
        size: r.parsed(SIZE)?,
        website: r.optional_text(WEBSITE),
        address: r.optional_text(ADDRESS),
        notes: r.optional_text(NOTES),
        created_at: r.timestamp(CREATED_AT)?,
    })
}

pub fn deal_from_record(record: Record) -> CrmResult<Deal> {
    use deal_fields::*;
    let record = migrate_legacy(DEAL, record);
    let r = FieldReader::new(DEAL, &record);
    Ok(Deal {
        id: r.id()?,
        title: r.text(TITLE),
        value: r.number(VALUE)?,
        stage: StageValue::parse(&r.text(STAGE)),
        probability: r.percentage(PROBABILITY)?,
        contact_id: r.reference(CONTACT_ID),
        company_id: r.reference(COMPANY_ID),
        close_date: r.timestamp(CLOSE_DATE)?,
        notes: r.text(NOTES),
        created_at: r.timestamp(CREATED_AT)?,
    })
}

pub fn activity_from_record(record: Record) -> CrmResult<Activity> {
    use activity_fields::*;
    let record = migrate_legacy(ACTIVITY, record);
    let r = FieldReader::new(ACTIVITY, &record);
    Ok(Activity {
        id: r.id()?,
        subject: r.text(SUBJECT),
        description: r.text(DESCRIPTION),
        kind: r.parsed_or_default(TYPE)?,
        due_date: r.required_timestamp(DUE_DATE)?,
        completed: r.flag(COMPLETED),
        contact_id: r.reference(CONTACT_ID),
        deal_id: r.reference(DEAL_ID),
        created_at: r.timestamp(CREATED_AT)?,
    })
}

fn put(record: &mut Record, field: &str, value: impl Into<Value>) {
    record.insert(field.to_string(), value.into());
}

fn put_some<T: Into<Value>>(record: &mut Record, field: &str, value: Option<T>) {
    if let Some(value) = value {
        put(record, field, value);
    }
}

/// `Some(None)` clears the field on the gateway.
fn put_nullable<T: Into<Value>>(record: &mut Record, field: &str, value: Option<Option<T>>) {
    if let Some(value) = value {
        put(record, field, value.map_or(Value::Null, Into::into));
    }
}

fn timestamp_value(at: DateTime<Utc>) -> Value {
    Value::String(format_timestamp(at))
}

/// Gateway fields written by a contact patch. `tags` is the resolved tag
/// list, see [`ContactPatch::resolve_tags`].
pub fn contact_record(patch: &ContactPatch, tags: Option<Vec<String>>) -> Record {
    use contact_fields::*;
    let mut record = Record::new();
    put_some(&mut record, FIRST_NAME, patch.first_name.clone());
    put_some(&mut record, LAST_NAME, patch.last_name.clone());
    put_some(&mut record, EMAIL, patch.email.clone());
    put_nullable(&mut record, PHONE, patch.phone.clone());
    put_nullable(&mut record, TITLE, patch.title.clone());
    put_nullable(&mut record, COMPANY_ID, patch.company_id);
    put_nullable(&mut record, NOTES, patch.notes.clone());
    put_some(&mut record, STATUS, patch.status.map(|s| s.as_str()));
    put_some(&mut record, TAGS, tags);
    record
}

pub fn company_record(patch: &CompanyPatch) -> Record {
    use company_fields::*;
    let mut record = Record::new();
    put_some(&mut record, NAME, patch.name.clone());
    put_some(&mut record, INDUSTRY, patch.industry.map(|i| i.as_str()));
    put_some(&mut record, SIZE, patch.size.map(|s| s.as_str()));
    put_nullable(&mut record, WEBSITE, patch.website.clone());
    put_nullable(&mut record, ADDRESS, patch.address.clone());
    put_nullable(&mut record, NOTES, patch.notes.clone());
    record
}

/// A patch carrying a terminal stage always writes the forced probability.
pub fn deal_record(patch: &DealPatch) -> Record {
    use deal_fields::*;
    let patch = patch.clone().normalized();
    let mut record = Record::new();
    put_some(&mut record, TITLE, patch.title);
    put_some(&mut record, VALUE, patch.value);
    put_some(&mut record, STAGE, patch.stage.map(|s| s.as_str()));
    put_some(&mut record, PROBABILITY, patch.probability);
    put_nullable(&mut record, CONTACT_ID, patch.contact_id);
    put_nullable(&mut record, COMPANY_ID, patch.company_id);
    put_nullable(&mut record, CLOSE_DATE, patch.close_date.map(|d| d.map(timestamp_value)));
    put_some(&mut record, NOTES, patch.notes);
    record
}

pub fn activity_record(patch: &ActivityPatch) -> Record {
    use activity_fields::*;
    let mut record = Record::new();
    put_some(&mut record, SUBJECT, patch.subject.clone());
    put_some(&mut record, DESCRIPTION, patch.description.clone());
    put_some(&mut record, TYPE, patch.kind.map(|k| k.as_str()));
    put_some(&mut record, DUE_DATE, patch.due_date.map(timestamp_value));
    put_some(&mut record, COMPLETED, patch.completed);
    put_nullable(&mut record, CONTACT_ID, patch.contact_id);
    put_nullable(&mut record, DEAL_ID, patch.deal_id);
    record
}

/// Stamps a creation (and optionally update) time onto an outgoing record.
pub(crate) fn stamp(record: &mut Record, field: &str, at: DateTime<Utc>) {
    put(record, field, timestamp_value(at));
}
