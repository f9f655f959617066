//! Win and loss rules for the scenario currently being played.

use crate::campaign::{
    CampaignCatalog, ScenarioDefinition, ScenarioLossCondition, ScenarioVictoryCondition,
};
use crate::progress::CampaignProgress;

fn active_scenario<'a>(
    progress: &CampaignProgress,
    catalog: &'a CampaignCatalog,
) -> Option<&'a ScenarioDefinition> {
    let scenario = catalog.scenario(progress.campaign_id(), progress.active_scenario());
    if scenario.is_none() {
        log::warn!(
            "scenario {} is not part of campaign {}; using standard conditions",
            progress.active_scenario(),
            progress.campaign_id()
        );
    }
    scenario
}

/// Victory condition of the active scenario, or `Standard` if it cannot be found.
#[must_use]
pub fn current_victory_condition(
    progress: &CampaignProgress,
    catalog: &CampaignCatalog,
) -> ScenarioVictoryCondition {
    active_scenario(progress, catalog).map_or(ScenarioVictoryCondition::Standard, |scenario| {
        scenario.victory
    })
}

/// Loss condition of the active scenario, or `Standard` if it cannot be found.
#[must_use]
pub fn current_loss_condition(
    progress: &CampaignProgress,
    catalog: &CampaignCatalog,
) -> ScenarioLossCondition {
    active_scenario(progress, catalog)
        .map_or(ScenarioLossCondition::Standard, |scenario| scenario.loss)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress_at(campaign: i32, scenario: i32) -> CampaignProgress {
        let mut progress = CampaignProgress::new();
        progress.set_campaign_id(campaign);
        progress.set_active_scenario(scenario);
        progress
    }

    #[test]
    fn conditions_come_from_active_scenario() {
        let catalog = CampaignCatalog::bundled().unwrap();
        let progress = progress_at(0, 2);
        assert_eq!(
            current_victory_condition(&progress, &catalog),
            ScenarioVictoryCondition::DefeatHero
        );
        assert_eq!(
            current_loss_condition(&progress, &catalog),
            ScenarioLossCondition::LoseHero
        );
    }

    #[test]
    fn out_of_range_scenario_falls_back_to_standard() {
        let catalog = CampaignCatalog::bundled().unwrap();
        for progress in [progress_at(0, 99), progress_at(0, -1), progress_at(42, 0)] {
            assert_eq!(
                current_victory_condition(&progress, &catalog),
                ScenarioVictoryCondition::Standard
            );
            assert_eq!(
                current_loss_condition(&progress, &catalog),
                ScenarioLossCondition::Standard
            );
        }
    }
}
