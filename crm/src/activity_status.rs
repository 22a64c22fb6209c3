//! Activity list state: derived status, filters, search and ordering.

use chrono::{DateTime, Duration, Utc};
use entity::RecordId;
use entity::activity::{Activity, ActivityPatch};
use tracing::{debug, instrument};

use crate::error::{CrmError, CrmResult};
use crate::lookup::{GENERAL_ACTIVITY, NameIndex};
use crate::mapping::ACTIVITY;
use crate::services::{ActivityService, CrmServices};

/// Hours ahead within which an open activity is "Due Soon".
pub const DUE_SOON_HOURS: i64 = 24;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ActivityStatus {
    Completed,
    Overdue,
    DueSoon,
    Pending,
}

impl ActivityStatus {
    pub fn label(self) -> &'static str {
        match self {
            ActivityStatus::Completed => "Completed",
            ActivityStatus::Overdue => "Overdue",
            ActivityStatus::DueSoon => "Due Soon",
            ActivityStatus::Pending => "Pending",
        }
    }
}

/// Completed wins over any date; then overdue, due soon, pending.
pub fn status_of(activity: &Activity, now: DateTime<Utc>) -> ActivityStatus {
    if activity.completed {
        ActivityStatus::Completed
    } else if activity.due_date < now {
        ActivityStatus::Overdue
    } else if activity.due_date < now + Duration::hours(DUE_SOON_HOURS) {
        ActivityStatus::DueSoon
    } else {
        ActivityStatus::Pending
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Overdue,
    Completed,
}

impl StatusFilter {
    pub fn matches(self, activity: &Activity, now: DateTime<Utc>) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Pending => !activity.completed,
            StatusFilter::Overdue => !activity.completed && activity.due_date < now,
            StatusFilter::Completed => activity.completed,
        }
    }
}

/// Case-insensitive substring match on subject, description and type.
pub fn matches_search(activity: &Activity, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    [
        activity.subject.as_str(),
        activity.description.as_str(),
        activity.kind.as_str(),
    ]
    .iter()
    .any(|text| text.to_lowercase().contains(&query))
}

/// Open activities first by due date, completed ones last. Stable.
pub fn sort_for_display(activities: &mut [Activity]) {
    activities.sort_by(|a, b| {
        a.completed
            .cmp(&b.completed)
            .then_with(|| a.due_date.cmp(&b.due_date))
    });
}

/// Flips completion and returns the persisted activity. Reopening only
/// clears the flag.
pub async fn toggle_complete(service: &ActivityService, activity: &Activity) -> CrmResult<Activity> {
    if activity.completed {
        let patch = ActivityPatch {
            completed: Some(false),
            ..ActivityPatch::default()
        };
        service.update(activity.id, patch).await
    } else {
        service.mark_completed(activity.id).await
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ActivityRow {
    pub activity: Activity,
    pub status: ActivityStatus,
    pub contact_name: String,
    pub deal_title: Option<String>,
}

#[derive(Clone)]
pub struct ActivityListViewModel {
    services: CrmServices,
    activities: Vec<Activity>,
    contacts: NameIndex,
    deals: NameIndex,
}

impl ActivityListViewModel {
    pub fn new(services: CrmServices) -> Self {
        Self {
            services,
            activities: Vec::new(),
            contacts: NameIndex::default(),
            deals: NameIndex::default(),
        }
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    #[instrument(name = "crm.activities.load", skip_all)]
    pub async fn load(&mut self) -> CrmResult<()> {
        let (activities, contacts, deals) = tokio::try_join!(
            self.services.activities.get_all(),
            self.services.contacts.get_all(),
            self.services.deals.get_all(),
        )?;
        debug!(count = activities.len(), "activities loaded");
        self.activities = activities;
        self.contacts = NameIndex::contacts(&contacts);
        self.deals = NameIndex::deals(&deals);
        Ok(())
    }

    /// Rows passing `filter` and `query`, in display order.
    pub fn visible(&self, filter: StatusFilter, query: &str, now: DateTime<Utc>) -> Vec<ActivityRow> {
        let mut shown: Vec<Activity> = self
            .activities
            .iter()
            .filter(|activity| filter.matches(activity, now) && matches_search(activity, query))
            .cloned()
            .collect();
        sort_for_display(&mut shown);
        shown
            .into_iter()
            .map(|activity| self.row(activity, now))
            .collect()
    }

    fn row(&self, activity: Activity, now: DateTime<Utc>) -> ActivityRow {
        let contact_name = match activity.contact_id {
            Some(_) => self.contacts.name(activity.contact_id),
            None => GENERAL_ACTIVITY.to_string(),
        };
        let deal_title = activity.deal_id.map(|_| self.deals.name(activity.deal_id));
        ActivityRow {
            status: status_of(&activity, now),
            contact_name,
            deal_title,
            activity,
        }
    }

    /// Toggles a loaded activity and swaps in the persisted copy.
    pub async fn toggle_complete(&mut self, id: RecordId) -> CrmResult<Activity> {
        let index = self.position(id)?;
        let updated = toggle_complete(&self.services.activities, &self.activities[index]).await?;
        self.activities[index] = updated.clone();
        Ok(updated)
    }

    pub async fn delete(&mut self, id: RecordId) -> CrmResult<()> {
        let index = self.position(id)?;
        self.services.activities.delete(id).await?;
        self.activities.remove(index);
        Ok(())
    }

    fn position(&self, id: RecordId) -> CrmResult<usize> {
        self.activities
            .iter()
            .position(|activity| activity.id == id)
            .ok_or(CrmError::NotFound {
                entity: ACTIVITY,
                id,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use entity::activity::ActivityType;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    fn activity(id: RecordId, due: DateTime<Utc>, completed: bool) -> Activity {
        Activity {
            id,
            subject: format!("Follow up {id}"),
            description: "Discuss renewal terms".into(),
            kind: ActivityType::Call,
            due_date: due,
            completed,
            contact_id: None,
            deal_id: None,
            created_at: None,
        }
    }

    #[test]
    fn status_precedence() {
        let now = at(10, 12);
        assert_eq!(status_of(&activity(1, at(1, 0), true), now), ActivityStatus::Completed);
        assert_eq!(status_of(&activity(1, at(10, 11), false), now), ActivityStatus::Overdue);
        assert_eq!(status_of(&activity(1, at(11, 11), false), now), ActivityStatus::DueSoon);
        assert_eq!(status_of(&activity(1, at(11, 12), false), now), ActivityStatus::Pending);
        assert_eq!(status_of(&activity(1, now, false), now), ActivityStatus::DueSoon);
        assert_eq!(ActivityStatus::DueSoon.label(), "Due Soon");
    }

    #[test]
    fn completed_sorts_last_regardless_of_date() {
        let mut list = vec![activity(1, at(2, 0), false), activity(2, at(1, 0), true)];
        sort_for_display(&mut list);
        assert_eq!(list[0].id, 1);

        let mut ties = vec![
            activity(3, at(5, 0), false),
            activity(4, at(5, 0), false),
            activity(5, at(4, 0), false),
        ];
        sort_for_display(&mut ties);
        let order: Vec<RecordId> = ties.iter().map(|a| a.id).collect();
        assert_eq!(order, vec![5, 3, 4]);
    }

    #[test]
    fn filters_and_search() {
        let now = at(10, 0);
        let overdue = activity(1, at(9, 0), false);
        let done = activity(2, at(9, 0), true);
        assert!(StatusFilter::Overdue.matches(&overdue, now));
        assert!(!StatusFilter::Overdue.matches(&done, now));
        assert!(StatusFilter::Completed.matches(&done, now));
        assert!(StatusFilter::Pending.matches(&overdue, now));
        assert!(StatusFilter::All.matches(&done, now));

        assert!(matches_search(&overdue, "RENEWAL"));
        assert!(matches_search(&overdue, "call"));
        assert!(matches_search(&overdue, "  "));
        assert!(!matches_search(&overdue, "invoice"));
    }
}
