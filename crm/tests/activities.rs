mod common;

use chrono::Duration;
use common::{CrmTestContext, fixed_now, record};
use crm::activity_status::{ActivityListViewModel, ActivityStatus, StatusFilter, toggle_complete};
use crm::dashboard::load_dashboard;
use crm::mapping::ACTIVITY;
use crm::services::DEFAULT_UPCOMING_LIMIT;
use entity::activity::ActivityType;
use serde_json::json;

#[tokio::test]
async fn upcoming_is_open_future_and_ascending() {
    let (ctx, _seeded) = CrmTestContext::new_seeded().await;
    let upcoming = ctx
        .services
        .activities
        .upcoming(DEFAULT_UPCOMING_LIMIT, fixed_now())
        .await
        .unwrap();
    let subjects: Vec<&str> = upcoming.iter().map(|a| a.subject.as_str()).collect();
    assert_eq!(subjects, vec!["Contract review", "Quarterly check-in", "Update CRM notes"]);

    let first = ctx.services.activities.upcoming(1, fixed_now()).await.unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].subject, "Contract review");
}

#[tokio::test]
async fn overdue_skips_completed() {
    let (ctx, _seeded) = CrmTestContext::new_seeded().await;
    let overdue = ctx.services.activities.overdue(fixed_now()).await.unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].subject, "Send proposal");
}

#[tokio::test]
async fn related_lookups_and_search() {
    let (ctx, seeded) = CrmTestContext::new_seeded().await;
    let activities = &ctx.services.activities;
    let grace = seeded.contact_email("grace@nuflights.test").unwrap();
    let for_grace = activities.by_contact(grace.id).await.unwrap();
    assert_eq!(for_grace.len(), 1);
    assert_eq!(for_grace[0].kind, ActivityType::Meeting);

    let deal = seeded.deal_titled("FossRust Cloud Migration").unwrap();
    assert_eq!(activities.by_deal(deal.id).await.unwrap().len(), 1);

    assert_eq!(activities.search("meeting").await.unwrap().len(), 2);
    assert_eq!(activities.search("PROPOSAL").await.unwrap().len(), 1);
    assert_eq!(activities.types().len(), 5);
}

#[tokio::test]
async fn toggle_complete_round_trips() {
    let (ctx, seeded) = CrmTestContext::new_seeded().await;
    let open = seeded
        .activities
        .iter()
        .find(|a| a.subject == "Send proposal")
        .unwrap();
    let done = toggle_complete(&ctx.services.activities, open).await.unwrap();
    assert!(done.completed);
    assert_eq!(done.due_date, open.due_date);

    let reopened = toggle_complete(&ctx.services.activities, &done).await.unwrap();
    assert!(!reopened.completed);
    assert_eq!(reopened.subject, open.subject);
}

#[tokio::test]
async fn list_view_filters_sorts_and_resolves_names() {
    let (ctx, _seeded) = CrmTestContext::new_seeded().await;
    let now = fixed_now();
    let mut view = ActivityListViewModel::new(ctx.services.clone());
    view.load().await.unwrap();

    let rows = view.visible(StatusFilter::All, "", now);
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0].activity.subject, "Send proposal");
    assert_eq!(rows[0].status, ActivityStatus::Overdue);
    assert_eq!(rows[1].status, ActivityStatus::DueSoon);
    assert_eq!(rows.last().unwrap().status, ActivityStatus::Completed);
    let general = rows
        .iter()
        .find(|r| r.activity.subject == "Update CRM notes")
        .unwrap();
    assert_eq!(general.contact_name, "General Activity");
    assert_eq!(general.deal_title, None);
    assert_eq!(rows[0].contact_name, "Linus Torvalds");
    assert_eq!(rows[0].deal_title.as_deref(), Some("FossRust Cloud Migration"));

    assert_eq!(view.visible(StatusFilter::Overdue, "", now).len(), 1);
    assert_eq!(view.visible(StatusFilter::Pending, "", now).len(), 4);
    assert_eq!(view.visible(StatusFilter::Completed, "", now).len(), 1);
    assert_eq!(view.visible(StatusFilter::Pending, "check-in", now).len(), 1);
}

#[tokio::test]
async fn list_view_toggle_replaces_local_item() {
    let (ctx, seeded) = CrmTestContext::new_seeded().await;
    let mut view = ActivityListViewModel::new(ctx.services.clone());
    view.load().await.unwrap();
    let target = seeded.activities[1].id;

    let updated = view.toggle_complete(target).await.unwrap();
    assert!(updated.completed);
    let local = view.activities().iter().find(|a| a.id == target).unwrap();
    assert!(local.completed);

    view.delete(target).await.unwrap();
    assert!(view.activities().iter().all(|a| a.id != target));
    assert!(ctx.services.activities.get_by_id(target).await.unwrap().is_none());
}

#[tokio::test]
async fn legacy_activity_with_string_flags() {
    let ctx = CrmTestContext::new();
    let due = fixed_now() + Duration::hours(2);
    ctx.gateway
        .insert_raw(
            ACTIVITY,
            record(json!({
                "subject": "Legacy follow-up",
                "type": "Call",
                "dueDate": due.format("%Y-%m-%dT%H:%M").to_string(),
                "completed": "false"
            })),
        )
        .await
        .unwrap();
    let upcoming = ctx.services.activities.upcoming(5, fixed_now()).await.unwrap();
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].due_date, due);
    assert!(!upcoming[0].completed);
}

#[tokio::test]
async fn dashboard_summarises_seed() {
    let (ctx, _seeded) = CrmTestContext::new_seeded().await;
    let dashboard = load_dashboard(&ctx.services, fixed_now()).await.unwrap();
    let stats = &dashboard.stats;
    assert_eq!(stats.total_contacts, 4);
    assert_eq!(stats.total_companies, 3);
    assert_eq!(stats.active_deals, 4);
    assert_eq!(stats.won_deals, 1);
    assert_eq!(stats.total_revenue, 6_500.0);
    assert_eq!(stats.pipeline_value, 81_800.0);
    assert_eq!(dashboard.deals_by_stage.len(), 6);
    assert!(dashboard.deals_by_stage.iter().all(|(_, count)| *count == 1));
    assert_eq!(dashboard.recent_activities.len(), 1);
    assert_eq!(dashboard.upcoming_activities.len(), 3);
}
