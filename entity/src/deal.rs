use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{RecordId, labeled_enum};

/// Pipeline stage. Declaration order is board order.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Stage {
    #[default]
    Lead,
    Qualified,
    Proposal,
    Negotiation,
    #[serde(rename = "Closed Won")]
    ClosedWon,
    #[serde(rename = "Closed Lost")]
    ClosedLost,
}

labeled_enum!(Stage, "stage", {
    Lead => "Lead",
    Qualified => "Qualified",
    Proposal => "Proposal",
    Negotiation => "Negotiation",
    ClosedWon => "Closed Won",
    ClosedLost => "Closed Lost",
});

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::ClosedWon | Stage::ClosedLost)
    }

    /// Probability a deal must carry in this stage, if the stage dictates one.
    pub fn forced_probability(self) -> Option<u8> {
        match self {
            Stage::ClosedWon => Some(100),
            Stage::ClosedLost => Some(0),
            _ => None,
        }
    }
}

/// Stage as stored on a fetched deal. The gateway does not constrain the
/// column, so values outside the six stages are kept verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StageValue {
    Known(Stage),
    Unrecognized(String),
}

impl StageValue {
    pub fn parse(raw: &str) -> Self {
        raw.parse::<Stage>()
            .map(StageValue::Known)
            .unwrap_or_else(|_| StageValue::Unrecognized(raw.to_string()))
    }

    pub fn known(&self) -> Option<Stage> {
        match self {
            StageValue::Known(stage) => Some(*stage),
            StageValue::Unrecognized(_) => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            StageValue::Known(stage) => stage.as_str(),
            StageValue::Unrecognized(raw) => raw,
        }
    }
}

impl From<Stage> for StageValue {
    fn from(value: Stage) -> Self {
        StageValue::Known(value)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: RecordId,
    pub title: String,
    pub value: f64,
    pub stage: StageValue,
    pub probability: u8,
    pub contact_id: Option<RecordId>,
    pub company_id: Option<RecordId>,
    pub close_date: Option<DateTime<Utc>>,
    pub notes: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl Deal {
    pub fn is_open(&self) -> bool {
        !self.stage.known().is_some_and(Stage::is_terminal)
    }
}

/// Fields for a new deal.
#[derive(Clone, Debug, PartialEq)]
pub struct DealDraft {
    pub title: String,
    pub value: f64,
    pub stage: Stage,
    pub probability: u8,
    pub contact_id: Option<RecordId>,
    pub company_id: Option<RecordId>,
    pub close_date: Option<DateTime<Utc>>,
    pub notes: String,
}

impl DealDraft {
    /// Applies the terminal-stage probability rule.
    pub fn normalized(mut self) -> Self {
        if let Some(forced) = self.stage.forced_probability() {
            self.probability = forced;
        }
        self
    }
}

/// Partial deal update; `None` leaves the stored value untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DealPatch {
    pub title: Option<String>,
    pub value: Option<f64>,
    pub stage: Option<Stage>,
    pub probability: Option<u8>,
    pub contact_id: Option<Option<RecordId>>,
    pub company_id: Option<Option<RecordId>>,
    pub close_date: Option<Option<DateTime<Utc>>>,
    pub notes: Option<String>,
}

impl DealPatch {
    /// Patch for a stage move: the stage plus the probability it forces.
    pub fn stage_move(stage: Stage) -> Self {
        Self {
            stage: Some(stage),
            probability: stage.forced_probability(),
            ..Self::default()
        }
    }

    pub fn normalized(mut self) -> Self {
        if let Some(forced) = self.stage.and_then(Stage::forced_probability) {
            self.probability = Some(forced);
        }
        self
    }
}

impl From<DealDraft> for DealPatch {
    fn from(draft: DealDraft) -> Self {
        Self {
            title: Some(draft.title),
            value: Some(draft.value),
            stage: Some(draft.stage),
            probability: Some(draft.probability),
            contact_id: Some(draft.contact_id),
            company_id: Some(draft.company_id),
            close_date: Some(draft.close_date),
            notes: Some(draft.notes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_parse_from_display_labels() {
        assert_eq!("Closed Won".parse::<Stage>(), Ok(Stage::ClosedWon));
        assert_eq!(" Lead ".parse::<Stage>(), Ok(Stage::Lead));
        let err = "Bogus".parse::<Stage>().unwrap_err();
        assert_eq!(err.value, "Bogus");
        assert_eq!(err.to_string(), "unknown stage value `Bogus`");
    }

    #[test]
    fn only_terminal_stages_force_probability() {
        assert_eq!(Stage::ClosedWon.forced_probability(), Some(100));
        assert_eq!(Stage::ClosedLost.forced_probability(), Some(0));
        for stage in [Stage::Lead, Stage::Qualified, Stage::Proposal, Stage::Negotiation] {
            assert_eq!(stage.forced_probability(), None);
            assert!(!stage.is_terminal());
        }
    }

    #[test]
    fn stage_move_patch_carries_forced_probability() {
        let lost = DealPatch::stage_move(Stage::ClosedLost);
        assert_eq!(lost.probability, Some(0));
        let proposal = DealPatch::stage_move(Stage::Proposal);
        assert_eq!(proposal.probability, None);
    }

    #[test]
    fn unrecognized_stage_is_preserved() {
        let value = StageValue::parse("Prospecting");
        assert_eq!(value.known(), None);
        assert_eq!(value.as_str(), "Prospecting");
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json, serde_json::json!("Prospecting"));
    }
}
