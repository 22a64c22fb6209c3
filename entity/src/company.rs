use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{RecordId, labeled_enum};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Industry {
    Technology,
    #[serde(rename = "Software Development")]
    SoftwareDevelopment,
    SaaS,
    Retail,
    Healthcare,
    #[serde(rename = "Financial Services")]
    FinancialServices,
    Consulting,
    Manufacturing,
    Education,
    Logistics,
    Other,
}

labeled_enum!(Industry, "industry", {
    Technology => "Technology",
    SoftwareDevelopment => "Software Development",
    SaaS => "SaaS",
    Retail => "Retail",
    Healthcare => "Healthcare",
    FinancialServices => "Financial Services",
    Consulting => "Consulting",
    Manufacturing => "Manufacturing",
    Education => "Education",
    Logistics => "Logistics",
    Other => "Other",
});

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompanySize {
    Small,
    #[serde(rename = "Mid-Market")]
    MidMarket,
    Large,
    Enterprise,
}

labeled_enum!(CompanySize, "company size", {
    Small => "Small",
    MidMarket => "Mid-Market",
    Large => "Large",
    Enterprise => "Enterprise",
});

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: RecordId,
    pub name: String,
    pub industry: Industry,
    pub size: CompanySize,
    pub website: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CompanyDraft {
    pub name: String,
    pub industry: Industry,
    pub size: CompanySize,
    pub website: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub industry: Option<Industry>,
    pub size: Option<CompanySize>,
    pub website: Option<Option<String>>,
    pub address: Option<Option<String>>,
    pub notes: Option<Option<String>>,
}

impl From<CompanyDraft> for CompanyPatch {
    fn from(draft: CompanyDraft) -> Self {
        Self {
            name: Some(draft.name),
            industry: Some(draft.industry),
            size: Some(draft.size),
            website: Some(draft.website),
            address: Some(draft.address),
            notes: Some(draft.notes),
        }
    }
}
