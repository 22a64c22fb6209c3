//! Create/edit forms. A form holds raw text input and validates into a
//! service draft; every failing field is reported at once.

use entity::RecordId;
use entity::activity::{Activity, ActivityDraft, ActivityType};
use entity::company::{Company, CompanyDraft, CompanySize, Industry};
use entity::contact::{Contact, ContactDraft};
use entity::deal::{Deal, DealDraft, Stage};
use serde::Deserialize;
use tracing::{Instrument, info_span};

use crate::error::{CrmResult, ValidationErrors};
use crate::mapping::parse_timestamp;
use crate::services::{ActivityService, CompanyService, ContactService, DealService};

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// `local@domain` with no whitespace and a single `@`, where the domain has
/// a `.` with at least one character on each side. Trailing dots pass.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(at, c)| c == '.' && at > 0 && at + 1 < domain.len())
}

pub fn is_valid_website(url: &str) -> bool {
    let url = url.trim();
    url.starts_with("http://") || url.starts_with("https://")
}

/// Reads an id select; blank means no selection.
fn reference(
    errors: &mut ValidationErrors,
    field: &'static str,
    raw: &str,
    required: Option<&str>,
) -> Option<RecordId> {
    if blank(raw) {
        if let Some(message) = required {
            errors.add(field, message);
        }
        return None;
    }
    match raw.trim().parse() {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(field, "Please select a valid option");
            None
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub company_id: String,
    pub title: String,
    pub notes: String,
}

impl ContactForm {
    pub fn from_contact(contact: &Contact) -> Self {
        Self {
            first_name: contact.first_name.clone(),
            last_name: contact.last_name.clone(),
            email: contact.email.clone(),
            phone: contact.phone.clone().unwrap_or_default(),
            company_id: contact.company_id.map(|id| id.to_string()).unwrap_or_default(),
            title: contact.title.clone().unwrap_or_default(),
            notes: contact.notes.clone().unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<ContactDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if blank(&self.first_name) {
            errors.add("firstName", "First name is required");
        }
        if blank(&self.last_name) {
            errors.add("lastName", "Last name is required");
        }
        if blank(&self.email) {
            errors.add("email", "Email is required");
        } else if !is_valid_email(self.email.trim()) {
            errors.add("email", "Please enter a valid email");
        }
        if blank(&self.phone) {
            errors.add("phone", "Phone number is required");
        }
        let company_id = reference(
            &mut errors,
            "companyId",
            &self.company_id,
            Some("Company is required"),
        );
        if blank(&self.title) {
            errors.add("title", "Job title is required");
        }
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(ContactDraft {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: optional(&self.phone),
            title: optional(&self.title),
            company_id,
            notes: optional(&self.notes),
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompanyForm {
    pub name: String,
    pub industry: String,
    pub size: String,
    pub website: String,
    pub address: String,
    pub notes: String,
}

impl CompanyForm {
    pub fn from_company(company: &Company) -> Self {
        Self {
            name: company.name.clone(),
            industry: company.industry.to_string(),
            size: company.size.to_string(),
            website: company.website.clone().unwrap_or_default(),
            address: company.address.clone().unwrap_or_default(),
            notes: company.notes.clone().unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<CompanyDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if blank(&self.name) {
            errors.add("name", "Company name is required");
        }
        let industry = if blank(&self.industry) {
            errors.add("industry", "Industry is required");
            None
        } else {
            self.industry
                .parse::<Industry>()
                .inspect_err(|err| errors.add("industry", err.to_string()))
                .ok()
        };
        let size = if blank(&self.size) {
            errors.add("size", "Company size is required");
            None
        } else {
            self.size
                .parse::<CompanySize>()
                .inspect_err(|err| errors.add("size", err.to_string()))
                .ok()
        };
        if !blank(&self.website) && !is_valid_website(&self.website) {
            errors.add(
                "website",
                "Please enter a valid website URL (starting with http:// or https://)",
            );
        }
        match (industry, size) {
            (Some(industry), Some(size)) if errors.is_empty() => Ok(CompanyDraft {
                name: self.name.trim().to_string(),
                industry,
                size,
                website: optional(&self.website),
                address: optional(&self.address),
                notes: optional(&self.notes),
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DealForm {
    pub title: String,
    pub value: String,
    pub stage: String,
    pub probability: String,
    pub contact_id: String,
    pub company_id: String,
    pub close_date: String,
    pub notes: String,
}

impl DealForm {
    pub fn from_deal(deal: &Deal) -> Self {
        Self {
            title: deal.title.clone(),
            value: deal.value.to_string(),
            stage: deal.stage.as_str().to_string(),
            probability: deal.probability.to_string(),
            contact_id: deal.contact_id.map(|id| id.to_string()).unwrap_or_default(),
            company_id: deal.company_id.map(|id| id.to_string()).unwrap_or_default(),
            close_date: deal
                .close_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            notes: deal.notes.clone(),
        }
    }

    /// A terminal stage overrides the entered probability.
    pub fn validate(&self) -> Result<DealDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if blank(&self.title) {
            errors.add("title", "Deal title is required");
        }
        let value = match self.value.trim().parse::<f64>() {
            Ok(value) if value.is_finite() && value > 0.0 => Some(value),
            _ => {
                errors.add("value", "Please enter a valid deal value");
                None
            }
        };
        let stage = if blank(&self.stage) {
            Some(Stage::default())
        } else {
            self.stage
                .parse::<Stage>()
                .inspect_err(|err| errors.add("stage", err.to_string()))
                .ok()
        };
        let contact_id = reference(
            &mut errors,
            "contactId",
            &self.contact_id,
            Some("Contact is required"),
        );
        let company_id = reference(
            &mut errors,
            "companyId",
            &self.company_id,
            Some("Company is required"),
        );
        let probability = match self.probability.trim().parse::<u8>() {
            Ok(p) if p <= 100 => Some(p),
            _ => {
                errors.add("probability", "Probability must be between 0 and 100");
                None
            }
        };
        let close_date = if blank(&self.close_date) {
            errors.add("closeDate", "Expected close date is required");
            None
        } else {
            let parsed = parse_timestamp(&self.close_date);
            if parsed.is_none() {
                errors.add("closeDate", "Please enter a valid date");
            }
            parsed
        };
        match (value, stage, probability) {
            (Some(value), Some(stage), Some(probability)) if errors.is_empty() => Ok(DealDraft {
                title: self.title.trim().to_string(),
                value,
                stage,
                probability,
                contact_id,
                company_id,
                close_date,
                notes: self.notes.trim().to_string(),
            }
            .normalized()),
            _ => Err(errors),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActivityForm {
    pub subject: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub due_date: String,
    pub completed: bool,
    pub contact_id: String,
    pub deal_id: String,
}

impl ActivityForm {
    pub fn from_activity(activity: &Activity) -> Self {
        Self {
            subject: activity.subject.clone(),
            description: activity.description.clone(),
            kind: activity.kind.to_string(),
            due_date: activity.due_date.format("%Y-%m-%dT%H:%M").to_string(),
            completed: activity.completed,
            contact_id: activity.contact_id.map(|id| id.to_string()).unwrap_or_default(),
            deal_id: activity.deal_id.map(|id| id.to_string()).unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<ActivityDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if blank(&self.subject) {
            errors.add("subject", "Subject is required");
        }
        if blank(&self.description) {
            errors.add("description", "Description is required");
        }
        let due_date = if blank(&self.due_date) {
            errors.add("dueDate", "Due date is required");
            None
        } else {
            let parsed = parse_timestamp(&self.due_date);
            if parsed.is_none() {
                errors.add("dueDate", "Please enter a valid date");
            }
            parsed
        };
        let kind = if blank(&self.kind) {
            errors.add("type", "Activity type is required");
            None
        } else {
            self.kind
                .parse::<ActivityType>()
                .inspect_err(|err| errors.add("type", err.to_string()))
                .ok()
        };
        let contact_id = reference(&mut errors, "contactId", &self.contact_id, None);
        let deal_id = reference(&mut errors, "dealId", &self.deal_id, None);
        match (due_date, kind) {
            (Some(due_date), Some(kind)) if errors.is_empty() => Ok(ActivityDraft {
                subject: self.subject.trim().to_string(),
                description: self.description.trim().to_string(),
                kind,
                due_date,
                completed: self.completed,
                contact_id,
                deal_id,
            }),
            _ => Err(errors),
        }
    }
}

/// Validates, then creates (no id) or updates the contact.
pub async fn submit_contact(
    service: &ContactService,
    id: Option<RecordId>,
    form: &ContactForm,
) -> CrmResult<Contact> {
    let draft = form.validate()?;
    let span = info_span!("crm.forms.submit_contact", id);
    async {
        match id {
            Some(id) => service.update(id, draft.into()).await,
            None => service.create(draft).await,
        }
    }
    .instrument(span)
    .await
}

pub async fn submit_company(
    service: &CompanyService,
    id: Option<RecordId>,
    form: &CompanyForm,
) -> CrmResult<Company> {
    let draft = form.validate()?;
    match id {
        Some(id) => service.update(id, draft.into()).await,
        None => service.create(draft).await,
    }
}

pub async fn submit_deal(
    service: &DealService,
    id: Option<RecordId>,
    form: &DealForm,
) -> CrmResult<Deal> {
    let draft = form.validate()?;
    let span = info_span!("crm.forms.submit_deal", id, stage = draft.stage.as_str());
    async {
        match id {
            Some(id) => service.update(id, draft.into()).await,
            None => service.create(draft).await,
        }
    }
    .instrument(span)
    .await
}

pub async fn submit_activity(
    service: &ActivityService,
    id: Option<RecordId>,
    form: &ActivityForm,
) -> CrmResult<Activity> {
    let draft = form.validate()?;
    match id {
        Some(id) => service.update(id, draft.into()).await,
        None => service.create(draft).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact_form() -> ContactForm {
        ContactForm {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            phone: "555-0100".into(),
            company_id: "3".into(),
            title: "Engineer".into(),
            notes: String::new(),
        }
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("@c.com"));
        assert!(!is_valid_email("a@@c.com"));
        assert!(is_valid_email("a@b.c."));
        assert!(is_valid_email("a@b..c"));
        assert!(!is_valid_email("a@.c"));
        assert!(!is_valid_email("a@b."));
    }

    #[test]
    fn contact_form_reports_every_missing_field() {
        let errors = ContactForm::default().validate().unwrap_err();
        assert_eq!(errors.len(), 6);
        assert_eq!(errors.get("email"), Some("Email is required"));
        assert_eq!(errors.get("companyId"), Some("Company is required"));

        let draft = contact_form().validate().unwrap();
        assert_eq!(draft.company_id, Some(3));
        assert_eq!(draft.notes, None);
    }

    #[test]
    fn company_website_needs_scheme() {
        let form = CompanyForm {
            name: "Acme".into(),
            industry: "SaaS".into(),
            size: "Mid-Market".into(),
            website: "acme.io".into(),
            ..CompanyForm::default()
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.get("website").is_some());
        let ok = CompanyForm {
            website: "https://acme.io".into(),
            ..form
        };
        assert_eq!(ok.validate().unwrap().size, CompanySize::MidMarket);
    }

    #[test]
    fn deal_form_rules() {
        let form = DealForm {
            title: "Expansion".into(),
            value: "0".into(),
            probability: "120".into(),
            contact_id: "1".into(),
            company_id: "2".into(),
            close_date: String::new(),
            ..DealForm::default()
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.get("value").is_some());
        assert!(errors.get("probability").is_some());
        assert!(errors.get("closeDate").is_some());
        assert!(errors.get("stage").is_none());

        let won = DealForm {
            value: "5000".into(),
            probability: "30".into(),
            stage: "Closed Won".into(),
            close_date: "2024-06-30".into(),
            ..form
        };
        let draft = won.validate().unwrap();
        assert_eq!(draft.probability, 100);

        let default_stage = DealForm {
            stage: String::new(),
            ..won
        };
        let draft = default_stage.validate().unwrap();
        assert_eq!(draft.stage, Stage::Lead);
        assert_eq!(draft.probability, 30);
    }

    #[test]
    fn activity_form_accepts_datetime_local() {
        let form = ActivityForm {
            subject: "Demo".into(),
            description: "Product walkthrough".into(),
            kind: "Meeting".into(),
            due_date: "2024-02-01T09:30".into(),
            ..ActivityForm::default()
        };
        let draft = form.validate().unwrap();
        assert_eq!(draft.kind, ActivityType::Meeting);
        assert_eq!(draft.contact_id, None);

        let bad = ActivityForm {
            kind: "Lunch".into(),
            deal_id: "abc".into(),
            ..form
        };
        let errors = bad.validate().unwrap_err();
        assert!(errors.get("type").is_some());
        assert!(errors.get("dealId").is_some());
    }
}
