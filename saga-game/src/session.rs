//! Campaign sessions: one run through a campaign, from the first scenario to the last.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::army::Troops;
use crate::bonus::ScenarioBonus;
use crate::campaign::{
    AwardId, CampaignAward, CampaignCatalog, CampaignDefinition, CampaignId, ScenarioId,
    ScenarioLossCondition, ScenarioVictoryCondition,
};
use crate::conditions::{current_loss_condition, current_victory_condition};
use crate::progress::CampaignProgress;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("campaign {id} is not in the catalog")]
    UnknownCampaign { id: CampaignId },
    #[error("scenario {scenario} is not part of campaign {campaign}")]
    UnknownScenario {
        campaign: CampaignId,
        scenario: ScenarioId,
    },
    #[error("scenario {scenario} was already completed")]
    AlreadyCompleted { scenario: ScenarioId },
}

/// Result of finishing the active scenario.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScenarioOutcome {
    pub days: u32,
    #[serde(default)]
    pub awards_granted: Vec<AwardId>,
    #[serde(default)]
    pub awards_lost: Vec<AwardId>,
    /// Army to carry into the next scenario; `None` keeps the current one.
    #[serde(default)]
    pub troops: Option<Troops>,
}

/// Where the campaign goes after a scenario is completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Advance {
    Next(ScenarioId),
    CampaignComplete,
}

/// Campaign-flow controller owning the progress record for one run.
#[derive(Debug, Clone)]
pub struct CampaignSession {
    progress: CampaignProgress,
    catalog: Arc<CampaignCatalog>,
}

impl CampaignSession {
    /// Begin `campaign` from its first scenario with `bonus` selected.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnknownCampaign`] if the catalog lacks the campaign.
    pub fn start(
        catalog: Arc<CampaignCatalog>,
        campaign: CampaignId,
        bonus: ScenarioBonus,
    ) -> Result<Self, SessionError> {
        if catalog.campaign(campaign).is_none() {
            return Err(SessionError::UnknownCampaign { id: campaign });
        }
        let mut progress = CampaignProgress::new();
        progress.set_campaign_id(campaign);
        progress.set_active_scenario(0);
        progress.set_pending_bonus(bonus);
        log::debug!("starting campaign {campaign} with {} bonus", bonus.kind);
        Ok(Self { progress, catalog })
    }

    /// Resume from a loaded record. The record is not checked against the catalog.
    #[must_use]
    pub const fn from_progress(progress: CampaignProgress, catalog: Arc<CampaignCatalog>) -> Self {
        Self { progress, catalog }
    }

    #[must_use]
    pub const fn progress(&self) -> &CampaignProgress {
        &self.progress
    }

    pub const fn progress_mut(&mut self) -> &mut CampaignProgress {
        &mut self.progress
    }

    /// Apply a closure to the mutable progress record.
    pub fn with_progress_mut<R>(&mut self, f: impl FnOnce(&mut CampaignProgress) -> R) -> R {
        f(&mut self.progress)
    }

    #[must_use]
    pub fn catalog(&self) -> &CampaignCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn campaign(&self) -> Option<&CampaignDefinition> {
        self.catalog.campaign(self.progress.campaign_id())
    }

    #[must_use]
    pub fn into_progress(self) -> CampaignProgress {
        self.progress
    }

    /// Choose the bonus for the active scenario.
    pub fn choose_bonus(&mut self, bonus: ScenarioBonus) {
        self.progress.set_pending_bonus(bonus);
    }

    /// Record the outcome of the active scenario and move to the next one.
    ///
    /// # Errors
    ///
    /// Fails if the campaign or active scenario is unknown, or if the active
    /// scenario was already completed.
    pub fn complete_scenario(&mut self, outcome: ScenarioOutcome) -> Result<Advance, SessionError> {
        let campaign_id = self.progress.campaign_id();
        let scenario = self.progress.active_scenario();
        let campaign = self
            .catalog
            .campaign(campaign_id)
            .ok_or(SessionError::UnknownCampaign { id: campaign_id })?;
        if campaign.scenario(scenario).is_none() {
            return Err(SessionError::UnknownScenario {
                campaign: campaign_id,
                scenario,
            });
        }
        if self.progress.has_completed(scenario) {
            return Err(SessionError::AlreadyCompleted { scenario });
        }

        self.progress.add_days_passed(outcome.days);
        for award in outcome.awards_granted {
            self.progress.add_award(award);
        }
        for award in outcome.awards_lost {
            self.progress.remove_award(award);
        }
        if let Some(troops) = &outcome.troops {
            self.progress.set_carried_troops(troops);
        }
        self.progress.mark_active_scenario_completed();

        let advance = match campaign.next_scenario(scenario) {
            Some(next) => {
                self.progress.set_active_scenario(next);
                self.progress.set_pending_bonus(ScenarioBonus::default());
                Advance::Next(next)
            }
            None => Advance::CampaignComplete,
        };
        log::debug!(
            "campaign {campaign_id}: scenario {scenario} complete after {} days, {advance:?}",
            self.progress.days_passed()
        );
        Ok(advance)
    }

    /// True once the final scenario has been completed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.campaign().is_some_and(|campaign| {
            campaign.next_scenario(self.progress.active_scenario()).is_none()
                && self.progress.has_completed(self.progress.active_scenario())
        })
    }

    /// Start the same campaign over, discarding all progress.
    pub fn restart(&mut self) {
        let campaign = self.progress.campaign_id();
        self.progress.reset();
        self.progress.set_campaign_id(campaign);
        log::debug!("restarting campaign {campaign}");
    }

    #[must_use]
    pub fn victory_condition(&self) -> ScenarioVictoryCondition {
        current_victory_condition(&self.progress, &self.catalog)
    }

    #[must_use]
    pub fn loss_condition(&self) -> ScenarioLossCondition {
        current_loss_condition(&self.progress, &self.catalog)
    }

    #[must_use]
    pub fn obtained_awards(&self) -> Vec<CampaignAward> {
        self.progress.obtained_awards(&self.catalog)
    }
}
