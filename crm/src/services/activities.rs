use std::sync::Arc;

use chrono::{DateTime, Utc};
use entity::RecordId;
use entity::activity::{Activity, ActivityDraft, ActivityPatch, ActivityType};
use platform_gateway::{Condition, FetchParams, RecordGateway, WhereGroup};

use super::{RecordStore, map_all};
use crate::error::CrmResult;
use crate::mapping::{self, ACTIVITY, activity_fields as f, activity_from_record, activity_record};

/// Default length of the upcoming list.
pub const DEFAULT_UPCOMING_LIMIT: usize = 10;

#[derive(Clone)]
pub struct ActivityService {
    store: RecordStore,
}

impl ActivityService {
    pub fn new(gateway: Arc<dyn RecordGateway>) -> Self {
        Self {
            store: RecordStore::new(gateway, ACTIVITY),
        }
    }

    pub async fn get_all(&self) -> CrmResult<Vec<Activity>> {
        self.fetch(FetchParams::new()).await
    }

    pub async fn get_by_id(&self, id: RecordId) -> CrmResult<Option<Activity>> {
        self.store
            .fetch_one(id)
            .await?
            .map(activity_from_record)
            .transpose()
    }

    pub async fn create(&self, draft: ActivityDraft) -> CrmResult<Activity> {
        let mut record = activity_record(&ActivityPatch::from(draft));
        mapping::stamp(&mut record, f::CREATED_AT, Utc::now());
        activity_from_record(self.store.create(record).await?)
    }

    pub async fn update(&self, id: RecordId, patch: ActivityPatch) -> CrmResult<Activity> {
        activity_from_record(self.store.update(id, activity_record(&patch)).await?)
    }

    pub async fn delete(&self, id: RecordId) -> CrmResult<()> {
        self.store.delete(id).await
    }

    pub async fn mark_completed(&self, id: RecordId) -> CrmResult<Activity> {
        let patch = ActivityPatch {
            completed: Some(true),
            ..ActivityPatch::default()
        };
        self.update(id, patch).await
    }

    pub async fn by_contact(&self, contact_id: RecordId) -> CrmResult<Vec<Activity>> {
        self.fetch(FetchParams::new().filter(Condition::eq(f::CONTACT_ID, contact_id)))
            .await
    }

    pub async fn by_deal(&self, deal_id: RecordId) -> CrmResult<Vec<Activity>> {
        self.fetch(FetchParams::new().filter(Condition::eq(f::DEAL_ID, deal_id)))
            .await
    }

    /// Open activities due at or after `now`, soonest first, at most `limit`.
    pub async fn upcoming(&self, limit: usize, now: DateTime<Utc>) -> CrmResult<Vec<Activity>> {
        let mut upcoming: Vec<Activity> = self
            .open()
            .await?
            .into_iter()
            .filter(|activity| activity.due_date >= now)
            .collect();
        upcoming.sort_by_key(|activity| activity.due_date);
        upcoming.truncate(limit);
        Ok(upcoming)
    }

    /// Open activities whose due time has passed.
    pub async fn overdue(&self, now: DateTime<Utc>) -> CrmResult<Vec<Activity>> {
        Ok(self
            .open()
            .await?
            .into_iter()
            .filter(|activity| activity.due_date < now)
            .collect())
    }

    /// Matches subject, description or type. A blank query returns
    /// everything.
    pub async fn search(&self, query: &str) -> CrmResult<Vec<Activity>> {
        let query = query.trim();
        if query.is_empty() {
            return self.get_all().await;
        }
        self.fetch(FetchParams::new().group(WhereGroup::any(
            [f::SUBJECT, f::DESCRIPTION, f::TYPE]
                .into_iter()
                .map(|field| Condition::contains(field, query))
                .collect(),
        )))
        .await
    }

    pub fn types(&self) -> &'static [ActivityType] {
        ActivityType::ALL
    }

    async fn open(&self) -> CrmResult<Vec<Activity>> {
        let activities = self.get_all().await?;
        Ok(activities.into_iter().filter(|a| !a.completed).collect())
    }

    async fn fetch(&self, params: FetchParams) -> CrmResult<Vec<Activity>> {
        map_all(self.store.fetch_all(params).await?, activity_from_record)
    }
}
