//! Deterministic demo data, created through the services.

use chrono::{DateTime, Duration, Utc};
use entity::activity::{Activity, ActivityDraft, ActivityType};
use entity::company::{Company, CompanyDraft, CompanySize, Industry};
use entity::contact::{Contact, ContactDraft, ContactPatch};
use entity::deal::{Deal, DealDraft, Stage};
use tracing::info;

use crate::error::CrmResult;
use crate::services::CrmServices;

#[derive(Debug, Clone, Default)]
pub struct SeededCrm {
    pub companies: Vec<Company>,
    pub contacts: Vec<Contact>,
    pub deals: Vec<Deal>,
    pub activities: Vec<Activity>,
}

impl SeededCrm {
    pub fn company_named(&self, name: &str) -> Option<&Company> {
        self.companies.iter().find(|c| c.name == name)
    }

    pub fn contact_email(&self, email: &str) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.email == email)
    }

    pub fn deal_titled(&self, title: &str) -> Option<&Deal> {
        self.deals.iter().find(|d| d.title == title)
    }
}

const COMPANIES: &[(&str, Industry, CompanySize, &str)] = &[
    ("ACME, Inc.", Industry::Manufacturing, CompanySize::Large, "https://acme.test"),
    ("FossRust Labs", Industry::SoftwareDevelopment, CompanySize::Small, "https://fossrust.test"),
    ("NuFlights LLC", Industry::Logistics, CompanySize::MidMarket, "https://nuflights.test"),
];

/// (first, last, email, title, company index)
const CONTACTS: &[(&str, &str, &str, &str, usize)] = &[
    ("Ada", "Lovelace", "ada@acme.test", "Head of Engineering", 0),
    ("Charles", "Babbage", "charles@acme.test", "CFO", 0),
    ("Linus", "Torvalds", "linus@fossrust.test", "Founder", 1),
    ("Grace", "Hopper", "grace@nuflights.test", "Operations Director", 2),
];

/// (title, value, stage, probability, contact index, company index, close in days)
const DEALS: &[(&str, f64, Stage, u8, usize, usize, i64)] = &[
    ("ACME Website Revamp", 12_000.0, Stage::Lead, 10, 0, 0, 60),
    ("ACME Support Plan", 4_800.0, Stage::Qualified, 30, 1, 0, 45),
    ("FossRust Cloud Migration", 25_000.0, Stage::Proposal, 50, 2, 1, 30),
    ("NuFlights Fleet Tracking", 40_000.0, Stage::Negotiation, 75, 3, 2, 14),
    ("FossRust Training", 6_500.0, Stage::ClosedWon, 100, 2, 1, -7),
    ("NuFlights Pilot", 9_000.0, Stage::ClosedLost, 0, 3, 2, -21),
];

/// (subject, type, due offset in hours, completed, contact index, deal index)
const ACTIVITIES: &[(&str, ActivityType, i64, bool, Option<usize>, Option<usize>)] = &[
    ("Discovery call", ActivityType::Call, -48, true, Some(0), Some(0)),
    ("Send proposal", ActivityType::Email, -6, false, Some(2), Some(2)),
    ("Contract review", ActivityType::Meeting, 6, false, Some(3), Some(3)),
    ("Quarterly check-in", ActivityType::Meeting, 72, false, Some(1), Some(1)),
    ("Update CRM notes", ActivityType::Task, 120, false, None, None),
];

/// Creates three companies, four contacts, one deal per stage and a mix of
/// done, overdue, due-soon and pending activities relative to `now`.
pub async fn seed_demo(services: &CrmServices, now: DateTime<Utc>) -> CrmResult<SeededCrm> {
    let mut seeded = SeededCrm::default();

    for (name, industry, size, website) in COMPANIES {
        let company = services
            .companies
            .create(CompanyDraft {
                name: name.to_string(),
                industry: *industry,
                size: *size,
                website: Some(website.to_string()),
                address: None,
                notes: None,
            })
            .await?;
        seeded.companies.push(company);
    }

    for (first, last, email, title, company) in CONTACTS {
        let contact = services
            .contacts
            .create(ContactDraft {
                first_name: first.to_string(),
                last_name: last.to_string(),
                email: email.to_string(),
                phone: Some("+1-555-0100".into()),
                title: Some(title.to_string()),
                company_id: Some(seeded.companies[*company].id),
                notes: None,
            })
            .await?;
        seeded.contacts.push(contact);
    }
    let vip = seeded.contacts[0].id;
    seeded.contacts[0] = services
        .contacts
        .update(vip, ContactPatch::with_added_tags(["VIP"]))
        .await?;

    for (title, value, stage, probability, contact, company, close_in) in DEALS {
        let deal = services
            .deals
            .create(DealDraft {
                title: title.to_string(),
                value: *value,
                stage: *stage,
                probability: *probability,
                contact_id: Some(seeded.contacts[*contact].id),
                company_id: Some(seeded.companies[*company].id),
                close_date: Some(now + Duration::days(*close_in)),
                notes: String::new(),
            })
            .await?;
        seeded.deals.push(deal);
    }

    for (subject, kind, due_in, completed, contact, deal) in ACTIVITIES {
        let activity = services
            .activities
            .create(ActivityDraft {
                subject: subject.to_string(),
                description: format!("{subject} ({})", kind.as_str().to_lowercase()),
                kind: *kind,
                due_date: now + Duration::hours(*due_in),
                completed: *completed,
                contact_id: contact.map(|i| seeded.contacts[i].id),
                deal_id: deal.map(|i| seeded.deals[i].id),
            })
            .await?;
        seeded.activities.push(activity);
    }

    info!(
        companies = seeded.companies.len(),
        contacts = seeded.contacts.len(),
        deals = seeded.deals.len(),
        activities = seeded.activities.len(),
        "seeded demo crm data"
    );
    Ok(seeded)
}
