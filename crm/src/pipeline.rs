//! Deal pipeline board: stage buckets, column totals and stage moves.

use std::collections::BTreeMap;

use entity::RecordId;
use entity::company::Company;
use entity::contact::Contact;
use entity::deal::{Deal, Stage, StageValue};
use tracing::{Instrument, info, info_span};

use crate::error::{CrmError, CrmResult};
use crate::lookup::NameIndex;
use crate::mapping::DEAL;
use crate::services::{CrmServices, DealService};

/// Deals partitioned by stage. Every stage has a bucket, possibly empty.
#[derive(Clone, Debug, PartialEq)]
pub struct StageGroups {
    pub by_stage: BTreeMap<Stage, Vec<Deal>>,
    /// Deals whose stored stage is none of the six, in fetch order.
    pub unassigned: Vec<Deal>,
}

impl StageGroups {
    pub fn deals(&self, stage: Stage) -> &[Deal] {
        self.by_stage.get(&stage).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Buckets deals by stage, keeping fetch order inside each bucket.
pub fn group_by_stage(deals: &[Deal]) -> StageGroups {
    let mut by_stage: BTreeMap<Stage, Vec<Deal>> =
        Stage::ALL.iter().map(|stage| (*stage, Vec::new())).collect();
    let mut unassigned = Vec::new();
    for deal in deals {
        match deal.stage.known() {
            Some(stage) => by_stage.entry(stage).or_default().push(deal.clone()),
            None => unassigned.push(deal.clone()),
        }
    }
    StageGroups {
        by_stage,
        unassigned,
    }
}

/// Sum of deal values. Display only.
pub fn stage_total(deals: &[Deal]) -> f64 {
    deals.iter().map(|deal| deal.value).sum()
}

/// Moves a deal to `new_stage` and returns the persisted deal. Unknown stage
/// names fail before any gateway call.
pub async fn set_stage(deals: &DealService, deal_id: RecordId, new_stage: &str) -> CrmResult<Deal> {
    let stage: Stage = new_stage
        .parse()
        .map_err(|_| CrmError::InvalidStage(new_stage.to_string()))?;
    let span = info_span!(
        "crm.deals.set_stage",
        deal_id,
        stage = stage.as_str(),
        terminal = stage.is_terminal()
    );
    async {
        let deal = deals.update_stage(deal_id, stage).await?;
        info!(probability = deal.probability, "deal stage updated");
        Ok(deal)
    }
    .instrument(span)
    .await
}

#[derive(Clone, Debug, PartialEq)]
pub struct DealCard {
    pub deal: Deal,
    pub contact_name: String,
    pub company_name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PipelineColumn {
    pub stage: Stage,
    pub cards: Vec<DealCard>,
    pub total_value: f64,
}

impl PipelineColumn {
    pub fn count(&self) -> usize {
        self.cards.len()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PipelineBoard {
    pub columns: Vec<PipelineColumn>,
    pub unassigned: Vec<DealCard>,
    pub total_count: usize,
    pub total_value: f64,
}

impl PipelineBoard {
    pub fn build(deals: &[Deal], contacts: &[Contact], companies: &[Company]) -> Self {
        let contact_names = NameIndex::contacts(contacts);
        let company_names = NameIndex::companies(companies);
        let card = |deal: &Deal| DealCard {
            deal: deal.clone(),
            contact_name: contact_names.name(deal.contact_id),
            company_name: company_names.name(deal.company_id),
        };
        let groups = group_by_stage(deals);
        let columns: Vec<PipelineColumn> = groups
            .by_stage
            .iter()
            .map(|(stage, bucket)| PipelineColumn {
                stage: *stage,
                cards: bucket.iter().map(card).collect(),
                total_value: stage_total(bucket),
            })
            .collect();
        let total_count = columns.iter().map(PipelineColumn::count).sum();
        let total_value = columns.iter().map(|column| column.total_value).sum();
        Self {
            columns,
            unassigned: groups.unassigned.iter().map(card).collect(),
            total_count,
            total_value,
        }
    }

    pub fn column(&self, stage: Stage) -> Option<&PipelineColumn> {
        self.columns.iter().find(|column| column.stage == stage)
    }

    /// Looks a deal up among the columns and the unassigned list.
    pub fn find(&self, deal_id: RecordId) -> Option<&Deal> {
        self.columns
            .iter()
            .flat_map(|column| column.cards.iter())
            .chain(self.unassigned.iter())
            .map(|card| &card.deal)
            .find(|deal| deal.id == deal_id)
    }
}

/// Outcome of [`PipelineViewModel::request_stage_change`].
#[derive(Clone, Debug, PartialEq)]
pub enum StageChange {
    /// The deal already sits in the target stage; nothing was sent.
    Unchanged,
    Moved(Deal),
}

/// Board state for one pipeline view. Changes are reflected only after a
/// full re-fetch.
#[derive(Clone)]
pub struct PipelineViewModel {
    services: CrmServices,
    board: PipelineBoard,
}

impl PipelineViewModel {
    pub fn new(services: CrmServices) -> Self {
        Self {
            services,
            board: PipelineBoard::default(),
        }
    }

    pub fn board(&self) -> &PipelineBoard {
        &self.board
    }

    /// Fetches deals, contacts and companies together and rebuilds the board.
    pub async fn load(&mut self) -> CrmResult<&PipelineBoard> {
        let (deals, contacts, companies) = tokio::try_join!(
            self.services.deals.get_all(),
            self.services.contacts.get_all(),
            self.services.companies.get_all(),
        )?;
        self.board = PipelineBoard::build(&deals, &contacts, &companies);
        Ok(&self.board)
    }

    /// Moves a loaded deal to `target_stage`, then reloads the board. Moving
    /// a deal onto its current stage is a no-op.
    pub async fn request_stage_change(
        &mut self,
        deal_id: RecordId,
        target_stage: &str,
    ) -> CrmResult<StageChange> {
        let target: Stage = target_stage
            .parse()
            .map_err(|_| CrmError::InvalidStage(target_stage.to_string()))?;
        let current = self
            .board
            .find(deal_id)
            .map(|deal| deal.stage.clone())
            .ok_or(CrmError::NotFound {
                entity: DEAL,
                id: deal_id,
            })?;
        if current == StageValue::Known(target) {
            return Ok(StageChange::Unchanged);
        }
        let moved = set_stage(&self.services.deals, deal_id, target.as_str()).await?;
        self.load().await?;
        Ok(StageChange::Moved(moved))
    }
}
