//! Campaign definitions: scenarios, their win/loss rules and award tables.
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type CampaignId = i32;
pub type ScenarioId = i32;
pub type AwardId = i32;

/// How the active scenario is won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioVictoryCondition {
    /// Defeat every opponent.
    #[default]
    Standard,
    CaptureTown,
    DefeatHero,
    ObtainArtifact,
    AccumulateGold,
}

/// How the active scenario is lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioLossCondition {
    /// Lose every hero and town.
    #[default]
    Standard,
    LoseHero,
    LoseAllTowns,
    RunOutOfTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AwardKind {
    Artifact,
    Spell,
    CreatureAlliance,
    CreatureCurse,
    HireableHero,
    DefeatedEnemyHero,
    Resource,
}

/// A persistent unlock granted during a campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignAward {
    pub id: AwardId,
    pub kind: AwardKind,
    #[serde(default)]
    pub subtype: i32,
    #[serde(default)]
    pub amount: i32,
    /// First scenario the award takes effect in.
    #[serde(default)]
    pub start_scenario: ScenarioId,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    pub name: String,
    #[serde(default)]
    pub victory: ScenarioVictoryCondition,
    #[serde(default)]
    pub loss: ScenarioLossCondition,
    #[serde(default)]
    pub awards: Vec<CampaignAward>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignDefinition {
    pub id: CampaignId,
    pub name: String,
    /// Scenarios in play order; a scenario's id is its index here.
    pub scenarios: Vec<ScenarioDefinition>,
    /// Awards tied to the campaign as a whole rather than one scenario.
    #[serde(default)]
    pub extra_awards: Vec<CampaignAward>,
}

impl CampaignDefinition {
    #[must_use]
    pub fn scenario_count(&self) -> usize {
        self.scenarios.len()
    }

    /// Scenario at `id`, or `None` when the id is negative or past the end.
    #[must_use]
    pub fn scenario(&self, id: ScenarioId) -> Option<&ScenarioDefinition> {
        usize::try_from(id).ok().and_then(|idx| self.scenarios.get(idx))
    }

    /// Scenario that follows `after` in play order.
    #[must_use]
    pub fn next_scenario(&self, after: ScenarioId) -> Option<ScenarioId> {
        let next = after.checked_add(1)?;
        self.scenario(next).map(|_| next)
    }

    fn award_ids(&self) -> impl Iterator<Item = AwardId> + '_ {
        self.scenarios
            .iter()
            .flat_map(|scenario| scenario.awards.iter())
            .chain(self.extra_awards.iter())
            .map(|award| award.id)
    }
}

/// Problems found while loading or checking a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("campaign catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("campaign {id} is defined more than once")]
    DuplicateCampaign { id: CampaignId },
    #[error("campaign {campaign} defines award {award} more than once")]
    DuplicateAward { campaign: CampaignId, award: AwardId },
    #[error("campaign {id} has no scenarios")]
    EmptyCampaign { id: CampaignId },
}

/// Every campaign the game knows about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CampaignCatalog {
    pub campaigns: Vec<CampaignDefinition>,
}

const BUNDLED_CATALOG: &str = include_str!("../assets/campaigns.json");

impl CampaignCatalog {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_campaigns(campaigns: Vec<CampaignDefinition>) -> Self {
        Self { campaigns }
    }

    /// Parse and validate a catalog from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or fails [`Self::validate`].
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// The catalog shipped with the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled asset is malformed.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_json(BUNDLED_CATALOG)
    }

    /// Check ids are unique and every campaign has at least one scenario.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for campaign in &self.campaigns {
            if !seen.insert(campaign.id) {
                return Err(CatalogError::DuplicateCampaign { id: campaign.id });
            }
            if campaign.scenarios.is_empty() {
                return Err(CatalogError::EmptyCampaign { id: campaign.id });
            }
            let mut awards = HashSet::new();
            for award in campaign.award_ids() {
                if !awards.insert(award) {
                    return Err(CatalogError::DuplicateAward {
                        campaign: campaign.id,
                        award,
                    });
                }
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn campaign(&self, id: CampaignId) -> Option<&CampaignDefinition> {
        self.campaigns.iter().find(|campaign| campaign.id == id)
    }

    #[must_use]
    pub fn scenario(&self, campaign: CampaignId, scenario: ScenarioId) -> Option<&ScenarioDefinition> {
        self.campaign(campaign)?.scenario(scenario)
    }

    /// Awards tied to one scenario; empty when either id is unknown.
    #[must_use]
    pub fn scenario_awards(&self, campaign: CampaignId, scenario: ScenarioId) -> &[CampaignAward] {
        self.scenario(campaign, scenario)
            .map(|definition| definition.awards.as_slice())
            .unwrap_or_default()
    }

    /// Campaign-wide awards; empty when the campaign is unknown.
    #[must_use]
    pub fn extra_awards(&self, campaign: CampaignId) -> &[CampaignAward] {
        self.campaign(campaign)
            .map(|definition| definition.extra_awards.as_slice())
            .unwrap_or_default()
    }
}
