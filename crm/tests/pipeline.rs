mod common;

use common::{CrmTestContext, record};
use crm::CrmError;
use crm::mapping::DEAL;
use crm::pipeline::{PipelineViewModel, StageChange, set_stage};
use entity::deal::{DealDraft, DealPatch, Stage, StageValue};
use serde_json::json;

#[tokio::test]
async fn closing_a_deal_forces_probability() {
    let (ctx, seeded) = CrmTestContext::new_seeded().await;
    let deal = seeded.deal_titled("FossRust Cloud Migration").unwrap();
    assert_eq!(deal.probability, 50);

    let lost = set_stage(&ctx.services.deals, deal.id, "Closed Lost").await.unwrap();
    assert_eq!(lost.stage, StageValue::Known(Stage::ClosedLost));
    assert_eq!(lost.probability, 0);

    let won = set_stage(&ctx.services.deals, deal.id, "Closed Won").await.unwrap();
    assert_eq!(won.probability, 100);
}

#[tokio::test]
async fn open_stage_move_leaves_probability_untouched() {
    let (ctx, seeded) = CrmTestContext::new_seeded().await;
    let deal = seeded.deal_titled("NuFlights Fleet Tracking").unwrap();
    let moved = set_stage(&ctx.services.deals, deal.id, "Proposal").await.unwrap();
    assert_eq!(moved.stage, StageValue::Known(Stage::Proposal));
    assert_eq!(moved.probability, 75);
    assert_eq!(moved.title, deal.title);
}

#[tokio::test]
async fn bogus_stage_never_reaches_gateway() {
    let (ctx, seeded) = CrmTestContext::new_seeded().await;
    let before = ctx.gateway.mutation_count();
    let deal = seeded.deal_titled("ACME Website Revamp").unwrap();
    let err = set_stage(&ctx.services.deals, deal.id, "Bogus").await.unwrap_err();
    assert_eq!(err, CrmError::InvalidStage("Bogus".into()));
    assert_eq!(ctx.gateway.mutation_count(), before);
}

#[tokio::test]
async fn board_loads_every_column_with_names() {
    let (ctx, _seeded) = CrmTestContext::new_seeded().await;
    let mut view = PipelineViewModel::new(ctx.services.clone());
    let board = view.load().await.unwrap();
    assert_eq!(board.columns.len(), 6);
    assert_eq!(board.total_count, 6);
    let negotiation = board.column(Stage::Negotiation).unwrap();
    assert_eq!(negotiation.count(), 1);
    assert_eq!(negotiation.total_value, 40_000.0);
    assert_eq!(negotiation.cards[0].contact_name, "Grace Hopper");
    assert_eq!(negotiation.cards[0].company_name, "NuFlights LLC");
    assert!(board.unassigned.is_empty());
}

#[tokio::test]
async fn unknown_stage_deal_lands_in_unassigned() {
    let ctx = CrmTestContext::new();
    ctx.gateway
        .insert_raw(DEAL, record(json!({"title_c": "Mystery", "value_c": 10, "stage_c": "Prospecting"})))
        .await
        .unwrap();
    ctx.gateway
        .insert_raw(DEAL, record(json!({"title_c": "Known", "value_c": 5, "stage_c": "Lead"})))
        .await
        .unwrap();
    let mut view = PipelineViewModel::new(ctx.services.clone());
    let board = view.load().await.unwrap();
    assert_eq!(board.total_count, 1);
    assert_eq!(board.unassigned.len(), 1);
    assert_eq!(board.unassigned[0].deal.stage.as_str(), "Prospecting");
    assert_eq!(board.unassigned[0].contact_name, "Unknown Contact");
}

#[tokio::test]
async fn stage_change_to_current_stage_is_a_no_op() {
    let (ctx, seeded) = CrmTestContext::new_seeded().await;
    let mut view = PipelineViewModel::new(ctx.services.clone());
    view.load().await.unwrap();
    let deal = seeded.deal_titled("ACME Support Plan").unwrap();
    let fetches = ctx.gateway.fetch_count();
    let mutations = ctx.gateway.mutation_count();

    let change = view.request_stage_change(deal.id, "Qualified").await.unwrap();
    assert_eq!(change, StageChange::Unchanged);
    assert_eq!(ctx.gateway.fetch_count(), fetches);
    assert_eq!(ctx.gateway.mutation_count(), mutations);
}

#[tokio::test]
async fn stage_change_persists_then_refetches_board() {
    let (ctx, seeded) = CrmTestContext::new_seeded().await;
    let mut view = PipelineViewModel::new(ctx.services.clone());
    view.load().await.unwrap();
    let deal = seeded.deal_titled("ACME Support Plan").unwrap();
    let fetches = ctx.gateway.fetch_count();

    let change = view.request_stage_change(deal.id, "Closed Won").await.unwrap();
    let StageChange::Moved(moved) = change else {
        panic!("expected a move");
    };
    assert_eq!(moved.probability, 100);
    assert!(ctx.gateway.fetch_count() > fetches);
    let won = view.board().column(Stage::ClosedWon).unwrap();
    assert!(won.cards.iter().any(|card| card.deal.id == deal.id));
    assert!(view.board().column(Stage::Qualified).unwrap().cards.is_empty());
}

#[tokio::test]
async fn stage_change_for_unloaded_deal_is_not_found() {
    let ctx = CrmTestContext::new();
    let mut view = PipelineViewModel::new(ctx.services.clone());
    view.load().await.unwrap();
    let err = view.request_stage_change(42, "Lead").await.unwrap_err();
    assert!(matches!(err, CrmError::NotFound { id: 42, .. }));
    let err = view.request_stage_change(42, "Nope").await.unwrap_err();
    assert!(matches!(err, CrmError::InvalidStage(_)));
}

#[tokio::test]
async fn gateway_outage_is_a_typed_failure() {
    let (ctx, _seeded) = CrmTestContext::new_seeded().await;
    ctx.gateway.set_fail_on_fetch(true);
    let mut view = PipelineViewModel::new(ctx.services.clone());
    let err = view.load().await.unwrap_err();
    assert!(matches!(err, CrmError::Gateway(_)));
}

#[tokio::test]
async fn negative_deal_value_never_reaches_gateway() {
    let (ctx, seeded) = CrmTestContext::new_seeded().await;
    let before = ctx.gateway.mutation_count();
    let draft = DealDraft {
        title: "Refund".into(),
        value: -1.0,
        stage: Stage::Lead,
        probability: 10,
        contact_id: None,
        company_id: None,
        close_date: None,
        notes: String::new(),
    };
    let err = ctx.services.deals.create(draft).await.unwrap_err();
    let CrmError::Validation(errors) = &err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(errors.get("value"), Some("Please enter a valid deal value"));

    let deal = seeded.deal_titled("ACME Website Revamp").unwrap();
    let patch = DealPatch {
        value: Some(f64::NAN),
        ..DealPatch::default()
    };
    let err = ctx.services.deals.update(deal.id, patch).await.unwrap_err();
    assert!(matches!(err, CrmError::Validation(_)));
    assert_eq!(ctx.gateway.mutation_count(), before);

    let zero = DealPatch {
        value: Some(0.0),
        ..DealPatch::default()
    };
    assert_eq!(ctx.services.deals.update(deal.id, zero).await.unwrap().value, 0.0);
}
