use async_graphql::{Enum, InputObject, SimpleObject};
use chrono::{DateTime, Utc};
use crm::activity_status::{ActivityRow, StatusFilter, status_of};
use crm::dashboard::{Dashboard, DashboardStats};
use crm::forms::{ActivityForm, CompanyForm, ContactForm, DealForm};
use crm::pipeline::{DealCard, PipelineBoard, PipelineColumn};
use crm::services::{BulkFailure, BulkOutcome};
use entity::RecordId;
use entity::activity::Activity;
use entity::company::Company;
use entity::contact::Contact;
use entity::deal::Deal;

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Contact")]
pub struct ContactNode {
    pub id: RecordId,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub title: Option<String>,
    pub company_id: Option<RecordId>,
    pub notes: Option<String>,
    pub status: String,
    pub tags: Vec<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Contact> for ContactNode {
    fn from(contact: Contact) -> Self {
        Self {
            full_name: contact.full_name(),
            id: contact.id,
            first_name: contact.first_name,
            last_name: contact.last_name,
            email: contact.email,
            phone: contact.phone,
            title: contact.title,
            company_id: contact.company_id,
            notes: contact.notes,
            status: contact.status.as_str().into(),
            tags: contact.tags,
            created_at: contact.created_at,
            updated_at: contact.updated_at,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Company")]
pub struct CompanyNode {
    pub id: RecordId,
    pub name: String,
    pub industry: String,
    pub size: String,
    pub website: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<Company> for CompanyNode {
    fn from(company: Company) -> Self {
        Self {
            id: company.id,
            name: company.name,
            industry: company.industry.as_str().into(),
            size: company.size.as_str().into(),
            website: company.website,
            address: company.address,
            notes: company.notes,
            created_at: company.created_at,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Deal")]
pub struct DealNode {
    pub id: RecordId,
    pub title: String,
    pub value: f64,
    /// Stored stage text; may name no known stage.
    pub stage: String,
    pub probability: u8,
    pub contact_id: Option<RecordId>,
    pub company_id: Option<RecordId>,
    pub close_date: Option<DateTime<Utc>>,
    pub notes: String,
    pub is_open: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<Deal> for DealNode {
    fn from(deal: Deal) -> Self {
        Self {
            is_open: deal.is_open(),
            stage: deal.stage.as_str().to_string(),
            id: deal.id,
            title: deal.title,
            value: deal.value,
            probability: deal.probability,
            contact_id: deal.contact_id,
            company_id: deal.company_id,
            close_date: deal.close_date,
            notes: deal.notes,
            created_at: deal.created_at,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Activity")]
pub struct ActivityNode {
    pub id: RecordId,
    pub subject: String,
    pub description: String,
    #[graphql(name = "type")]
    pub kind: String,
    pub due_date: DateTime<Utc>,
    pub completed: bool,
    pub contact_id: Option<RecordId>,
    pub deal_id: Option<RecordId>,
    pub created_at: Option<DateTime<Utc>>,
    /// Completed, Overdue, Due Soon or Pending at request time.
    pub status: String,
}

impl ActivityNode {
    pub fn new(activity: Activity, now: DateTime<Utc>) -> Self {
        Self {
            status: status_of(&activity, now).label().into(),
            id: activity.id,
            subject: activity.subject,
            description: activity.description,
            kind: activity.kind.as_str().into(),
            due_date: activity.due_date,
            completed: activity.completed,
            contact_id: activity.contact_id,
            deal_id: activity.deal_id,
            created_at: activity.created_at,
        }
    }

    pub fn list(activities: Vec<Activity>, now: DateTime<Utc>) -> Vec<Self> {
        activities
            .into_iter()
            .map(|activity| Self::new(activity, now))
            .collect()
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "ActivityRow")]
pub struct ActivityRowNode {
    pub activity: ActivityNode,
    pub contact_name: String,
    pub deal_title: Option<String>,
}

impl ActivityRowNode {
    pub fn new(row: ActivityRow, now: DateTime<Utc>) -> Self {
        Self {
            activity: ActivityNode::new(row.activity, now),
            contact_name: row.contact_name,
            deal_title: row.deal_title,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Enum)]
pub enum ActivityFilter {
    #[default]
    All,
    Pending,
    Overdue,
    Completed,
}

impl From<ActivityFilter> for StatusFilter {
    fn from(filter: ActivityFilter) -> Self {
        match filter {
            ActivityFilter::All => StatusFilter::All,
            ActivityFilter::Pending => StatusFilter::Pending,
            ActivityFilter::Overdue => StatusFilter::Overdue,
            ActivityFilter::Completed => StatusFilter::Completed,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "DealCard")]
pub struct DealCardNode {
    pub deal: DealNode,
    pub contact_name: String,
    pub company_name: String,
}

impl From<DealCard> for DealCardNode {
    fn from(card: DealCard) -> Self {
        Self {
            deal: card.deal.into(),
            contact_name: card.contact_name,
            company_name: card.company_name,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "PipelineColumn")]
pub struct PipelineColumnNode {
    pub stage: String,
    pub count: usize,
    pub total_value: f64,
    pub cards: Vec<DealCardNode>,
}

impl From<PipelineColumn> for PipelineColumnNode {
    fn from(column: PipelineColumn) -> Self {
        Self {
            stage: column.stage.as_str().into(),
            count: column.count(),
            total_value: column.total_value,
            cards: column.cards.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "PipelineBoard")]
pub struct PipelineBoardNode {
    pub columns: Vec<PipelineColumnNode>,
    /// Deals whose stage is none of the known stages.
    pub unassigned: Vec<DealCardNode>,
    pub total_count: usize,
    pub total_value: f64,
}

impl From<PipelineBoard> for PipelineBoardNode {
    fn from(board: PipelineBoard) -> Self {
        Self {
            columns: board.columns.into_iter().map(Into::into).collect(),
            unassigned: board.unassigned.into_iter().map(Into::into).collect(),
            total_count: board.total_count,
            total_value: board.total_value,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "DashboardStats")]
pub struct DashboardStatsNode {
    pub total_contacts: usize,
    pub total_companies: usize,
    pub active_deals: usize,
    pub won_deals: usize,
    pub total_revenue: f64,
    pub pipeline_value: f64,
}

impl From<DashboardStats> for DashboardStatsNode {
    fn from(stats: DashboardStats) -> Self {
        Self {
            total_contacts: stats.total_contacts,
            total_companies: stats.total_companies,
            active_deals: stats.active_deals,
            won_deals: stats.won_deals,
            total_revenue: stats.total_revenue,
            pipeline_value: stats.pipeline_value,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct StageCount {
    pub stage: String,
    pub count: usize,
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "Dashboard")]
pub struct DashboardNode {
    pub stats: DashboardStatsNode,
    pub deals_by_stage: Vec<StageCount>,
    pub recent_activities: Vec<ActivityNode>,
    pub upcoming_activities: Vec<ActivityNode>,
}

impl DashboardNode {
    pub fn new(dashboard: Dashboard, now: DateTime<Utc>) -> Self {
        Self {
            stats: dashboard.stats.into(),
            deals_by_stage: dashboard
                .deals_by_stage
                .into_iter()
                .map(|(stage, count)| StageCount {
                    stage: stage.as_str().into(),
                    count,
                })
                .collect(),
            recent_activities: ActivityNode::list(dashboard.recent_activities, now),
            upcoming_activities: ActivityNode::list(dashboard.upcoming_activities, now),
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
#[graphql(name = "BulkFailure")]
pub struct BulkFailureNode {
    pub id: RecordId,
    pub error: String,
}

impl From<BulkFailure> for BulkFailureNode {
    fn from(failure: BulkFailure) -> Self {
        Self {
            id: failure.id,
            error: failure.error,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct BulkContactsPayload {
    pub contacts: Vec<ContactNode>,
    pub failures: Vec<BulkFailureNode>,
    pub success_count: usize,
    pub error_count: usize,
}

impl From<BulkOutcome<Contact>> for BulkContactsPayload {
    fn from(outcome: BulkOutcome<Contact>) -> Self {
        Self {
            contacts: outcome.succeeded.into_iter().map(Into::into).collect(),
            failures: outcome.failed.into_iter().map(Into::into).collect(),
            success_count: outcome.success_count,
            error_count: outcome.error_count,
        }
    }
}

#[derive(Clone, Debug, SimpleObject)]
pub struct BulkDeletePayload {
    pub deleted_ids: Vec<RecordId>,
    pub failures: Vec<BulkFailureNode>,
    pub success_count: usize,
    pub error_count: usize,
}

impl From<BulkOutcome<RecordId>> for BulkDeletePayload {
    fn from(outcome: BulkOutcome<RecordId>) -> Self {
        Self {
            deleted_ids: outcome.succeeded,
            failures: outcome.failed.into_iter().map(Into::into).collect(),
            success_count: outcome.success_count,
            error_count: outcome.error_count,
        }
    }
}

fn text(value: Option<String>) -> String {
    value.unwrap_or_default()
}

fn id_text(value: Option<RecordId>) -> String {
    value.map(|id| id.to_string()).unwrap_or_default()
}

/// Contact create/edit input. Every field is optional on the wire so that
/// missing values surface as field-level validation errors.
#[derive(Clone, Debug, Default, InputObject)]
pub struct ContactInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company_id: Option<RecordId>,
    pub title: Option<String>,
    pub notes: Option<String>,
}

impl From<ContactInput> for ContactForm {
    fn from(input: ContactInput) -> Self {
        Self {
            first_name: text(input.first_name),
            last_name: text(input.last_name),
            email: text(input.email),
            phone: text(input.phone),
            company_id: id_text(input.company_id),
            title: text(input.title),
            notes: text(input.notes),
        }
    }
}

#[derive(Clone, Debug, Default, InputObject)]
pub struct CompanyInput {
    pub name: Option<String>,
    pub industry: Option<String>,
    pub size: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

impl From<CompanyInput> for CompanyForm {
    fn from(input: CompanyInput) -> Self {
        Self {
            name: text(input.name),
            industry: text(input.industry),
            size: text(input.size),
            website: text(input.website),
            address: text(input.address),
            notes: text(input.notes),
        }
    }
}

#[derive(Clone, Debug, Default, InputObject)]
pub struct DealInput {
    pub title: Option<String>,
    pub value: Option<f64>,
    /// Defaults to Lead when blank.
    pub stage: Option<String>,
    pub probability: Option<i32>,
    pub contact_id: Option<RecordId>,
    pub company_id: Option<RecordId>,
    /// RFC 3339 timestamp or `YYYY-MM-DD`.
    pub close_date: Option<String>,
    pub notes: Option<String>,
}

impl From<DealInput> for DealForm {
    fn from(input: DealInput) -> Self {
        Self {
            title: text(input.title),
            value: input.value.map(|value| value.to_string()).unwrap_or_default(),
            stage: text(input.stage),
            probability: input
                .probability
                .map(|probability| probability.to_string())
                .unwrap_or_default(),
            contact_id: id_text(input.contact_id),
            company_id: id_text(input.company_id),
            close_date: text(input.close_date),
            notes: text(input.notes),
        }
    }
}

#[derive(Clone, Debug, Default, InputObject)]
pub struct ActivityInput {
    pub subject: Option<String>,
    pub description: Option<String>,
    #[graphql(name = "type")]
    pub kind: Option<String>,
    pub due_date: Option<String>,
    pub completed: Option<bool>,
    pub contact_id: Option<RecordId>,
    pub deal_id: Option<RecordId>,
}

impl From<ActivityInput> for ActivityForm {
    fn from(input: ActivityInput) -> Self {
        Self {
            subject: text(input.subject),
            description: text(input.description),
            kind: text(input.kind),
            due_date: text(input.due_date),
            completed: input.completed.unwrap_or(false),
            contact_id: id_text(input.contact_id),
            deal_id: id_text(input.deal_id),
        }
    }
}

/// Changes applied to every contact of a bulk update.
#[derive(Clone, Debug, Default, InputObject)]
pub struct BulkContactInput {
    /// `Active` or `Inactive`.
    pub status: Option<String>,
    /// Merged into each contact's existing tags.
    #[graphql(default)]
    pub add_tags: Vec<String>,
}
