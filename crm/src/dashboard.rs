//! Dashboard statistics.

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use entity::activity::Activity;
use entity::company::Company;
use entity::contact::Contact;
use entity::deal::{Deal, Stage};
use tracing::instrument;

use crate::error::CrmResult;
use crate::pipeline::group_by_stage;
use crate::services::CrmServices;

/// Length of the recent and upcoming activity lists.
pub const DASHBOARD_LIST_LEN: usize = 5;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DashboardStats {
    pub total_contacts: usize,
    pub total_companies: usize,
    /// Deals not in a terminal stage.
    pub active_deals: usize,
    pub won_deals: usize,
    /// Sum of won deal values.
    pub total_revenue: f64,
    /// Sum of open deal values.
    pub pipeline_value: f64,
}

impl DashboardStats {
    pub fn compute(contacts: &[Contact], companies: &[Company], deals: &[Deal]) -> Self {
        let won: Vec<&Deal> = deals
            .iter()
            .filter(|deal| deal.stage.known() == Some(Stage::ClosedWon))
            .collect();
        let open: Vec<&Deal> = deals.iter().filter(|deal| deal.is_open()).collect();
        Self {
            total_contacts: contacts.len(),
            total_companies: companies.len(),
            active_deals: open.len(),
            won_deals: won.len(),
            total_revenue: won.iter().map(|deal| deal.value).sum(),
            pipeline_value: open.iter().map(|deal| deal.value).sum(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub deals_by_stage: Vec<(Stage, usize)>,
    pub recent_activities: Vec<Activity>,
    pub upcoming_activities: Vec<Activity>,
}

/// Most recently created completed activities, newest first.
pub fn recent_completed(activities: &[Activity], limit: usize) -> Vec<Activity> {
    let mut completed: Vec<Activity> = activities.iter().filter(|a| a.completed).cloned().collect();
    completed.sort_by_key(|activity| Reverse(activity.created_at));
    completed.truncate(limit);
    completed
}

#[instrument(name = "crm.dashboard.load", skip_all)]
pub async fn load_dashboard(services: &CrmServices, now: DateTime<Utc>) -> CrmResult<Dashboard> {
    let (contacts, companies, deals, activities, upcoming) = tokio::try_join!(
        services.contacts.get_all(),
        services.companies.get_all(),
        services.deals.get_all(),
        services.activities.get_all(),
        services.activities.upcoming(DASHBOARD_LIST_LEN, now),
    )?;
    let groups = group_by_stage(&deals);
    Ok(Dashboard {
        stats: DashboardStats::compute(&contacts, &companies, &deals),
        deals_by_stage: groups
            .by_stage
            .iter()
            .map(|(stage, bucket)| (*stage, bucket.len()))
            .collect(),
        recent_activities: recent_completed(&activities, DASHBOARD_LIST_LEN),
        upcoming_activities: upcoming,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use entity::deal::StageValue;

    fn deal(stage: &str, value: f64) -> Deal {
        Deal {
            id: 1,
            title: "d".into(),
            value,
            stage: StageValue::parse(stage),
            probability: 0,
            contact_id: None,
            company_id: None,
            close_date: None,
            notes: String::new(),
            created_at: None,
        }
    }

    #[test]
    fn revenue_and_pipeline_split_on_terminal_stages() {
        let deals = vec![
            deal("Lead", 100.0),
            deal("Negotiation", 50.0),
            deal("Closed Won", 1000.0),
            deal("Closed Won", 500.0),
            deal("Closed Lost", 700.0),
        ];
        let stats = DashboardStats::compute(&[], &[], &deals);
        assert_eq!(stats.active_deals, 2);
        assert_eq!(stats.won_deals, 2);
        assert_eq!(stats.total_revenue, 1500.0);
        assert_eq!(stats.pipeline_value, 150.0);
    }
}
