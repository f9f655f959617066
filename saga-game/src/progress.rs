//! Campaign progress record: where the player is in a campaign and what they
//! carry from one scenario into the next.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::army::{Troop, Troops};
use crate::bonus::ScenarioBonus;
use crate::campaign::{AwardId, CampaignAward, CampaignCatalog, CampaignId, ScenarioId};
use crate::stream::{Decode, Encode, StreamError, StreamReader, StreamWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProgressError {
    #[error("no scenario has been completed in this campaign")]
    NoCompletedScenarios,
}

/// Progress through one campaign run.
///
/// Owned by the session driving the campaign; queries borrow it. The save
/// layout written by the [`Encode`] impl is fixed and must not be reordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CampaignProgress {
    active_scenario: ScenarioId,
    pending_bonus: ScenarioBonus,
    completed_scenarios: Vec<ScenarioId>,
    campaign_id: CampaignId,
    days_passed: u32,
    obtained_awards: Vec<AwardId>,
    carried_troops: Vec<Troop>,
}

impl CampaignProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn active_scenario(&self) -> ScenarioId {
        self.active_scenario
    }

    #[must_use]
    pub const fn campaign_id(&self) -> CampaignId {
        self.campaign_id
    }

    #[must_use]
    pub const fn days_passed(&self) -> u32 {
        self.days_passed
    }

    #[must_use]
    pub const fn pending_bonus(&self) -> ScenarioBonus {
        self.pending_bonus
    }

    /// Completed scenarios in completion order.
    #[must_use]
    pub fn completed_scenarios(&self) -> &[ScenarioId] {
        &self.completed_scenarios
    }

    #[must_use]
    pub fn obtained_award_ids(&self) -> &[AwardId] {
        &self.obtained_awards
    }

    #[must_use]
    pub fn carried_troops(&self) -> &[Troop] {
        &self.carried_troops
    }

    /// True until the first scenario is completed.
    #[must_use]
    pub fn is_starting(&self) -> bool {
        self.completed_scenarios.is_empty()
    }

    #[must_use]
    pub fn has_completed(&self, scenario: ScenarioId) -> bool {
        self.completed_scenarios.contains(&scenario)
    }

    /// Record an award. Duplicates are kept.
    pub fn add_award(&mut self, award: AwardId) {
        self.obtained_awards.push(award);
    }

    /// Drop every occurrence of `award`.
    pub fn remove_award(&mut self, award: AwardId) {
        self.obtained_awards.retain(|id| *id != award);
    }

    pub fn set_pending_bonus(&mut self, bonus: ScenarioBonus) {
        self.pending_bonus = bonus;
    }

    pub fn set_active_scenario(&mut self, scenario: ScenarioId) {
        self.active_scenario = scenario;
    }

    pub fn set_campaign_id(&mut self, campaign: CampaignId) {
        self.campaign_id = campaign;
    }

    /// Append the active scenario to the completed list unless it is already there.
    pub fn mark_active_scenario_completed(&mut self) {
        if !self.has_completed(self.active_scenario) {
            self.completed_scenarios.push(self.active_scenario);
        }
    }

    pub fn add_days_passed(&mut self, days: u32) {
        self.days_passed = self.days_passed.checked_add(days).unwrap_or_else(|| {
            log::warn!(
                "campaign day counter overflowed ({} + {days}); clamping",
                self.days_passed
            );
            u32::MAX
        });
    }

    /// Return to the freshly constructed state.
    pub fn reset(&mut self) {
        self.completed_scenarios.clear();
        self.obtained_awards.clear();
        self.carried_troops.clear();
        self.active_scenario = 0;
        self.campaign_id = 0;
        self.days_passed = 0;
        self.pending_bonus = ScenarioBonus::default();
    }

    /// Replace the carried-over army with a copy of every slot in `troops`.
    pub fn set_carried_troops(&mut self, troops: &Troops) {
        self.carried_troops.clear();
        self.carried_troops.extend(troops.iter().copied());
    }

    /// The carried-over troops rebuilt as an army.
    #[must_use]
    pub fn carried_army(&self) -> Troops {
        Troops::from_slots(self.carried_troops.iter().copied())
    }

    /// Most recently completed scenario.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::NoCompletedScenarios`] before the first completion.
    pub fn last_completed_scenario(&self) -> Result<ScenarioId, ProgressError> {
        self.completed_scenarios
            .last()
            .copied()
            .ok_or(ProgressError::NoCompletedScenarios)
    }

    /// Award definitions the player holds.
    ///
    /// Scenario awards come first, grouped by scenario in completion order,
    /// followed by the campaign's extra awards. No deduplication is done
    /// across the two groups.
    #[must_use]
    pub fn obtained_awards(&self, catalog: &CampaignCatalog) -> Vec<CampaignAward> {
        let held = |award: &&CampaignAward| self.obtained_awards.contains(&award.id);

        let scenario_awards = self.completed_scenarios.iter().flat_map(|scenario| {
            catalog
                .scenario_awards(self.campaign_id, *scenario)
                .iter()
                .filter(held)
        });
        let extra_awards = catalog.extra_awards(self.campaign_id).iter().filter(held);

        scenario_awards.chain(extra_awards).cloned().collect()
    }
}

impl Encode for CampaignProgress {
    fn encode<W: Write>(&self, out: &mut StreamWriter<W>) -> Result<(), StreamError> {
        out.write(&self.active_scenario)?
            .write(&self.pending_bonus)?
            .write(&self.completed_scenarios)?
            .write(&self.campaign_id)?
            .write(&self.days_passed)?
            .write(&self.obtained_awards)?
            .write(&self.carried_troops)?;
        Ok(())
    }
}

impl Decode for CampaignProgress {
    fn decode<R: Read>(input: &mut StreamReader<R>) -> Result<Self, StreamError> {
        Ok(Self {
            active_scenario: input.read()?,
            pending_bonus: input.read()?,
            completed_scenarios: input.read()?,
            campaign_id: input.read()?,
            days_passed: input.read()?,
            obtained_awards: input.read()?,
            carried_troops: input.read()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bonus::BonusKind;
    use crate::campaign::{AwardKind, CampaignDefinition, ScenarioDefinition};
    use crate::stream::{ByteOrder, from_bytes, to_bytes};

    fn award(id: AwardId) -> CampaignAward {
        CampaignAward {
            id,
            kind: AwardKind::Spell,
            subtype: id,
            amount: 0,
            start_scenario: 0,
            name: format!("award-{id}"),
        }
    }

    fn scenario(awards: &[AwardId]) -> ScenarioDefinition {
        ScenarioDefinition {
            name: "scenario".into(),
            victory: Default::default(),
            loss: Default::default(),
            awards: awards.iter().copied().map(award).collect(),
        }
    }

    fn award_catalog() -> CampaignCatalog {
        CampaignCatalog::from_campaigns(vec![CampaignDefinition {
            id: 2,
            name: "Awards".into(),
            scenarios: vec![scenario(&[10, 11]), scenario(&[12]), scenario(&[])],
            extra_awards: vec![award(20)],
        }])
    }

    fn populated() -> CampaignProgress {
        let mut progress = CampaignProgress::new();
        progress.set_campaign_id(2);
        progress.set_active_scenario(1);
        progress.set_pending_bonus(ScenarioBonus::new(BonusKind::Troop, 8, 15));
        progress.mark_active_scenario_completed();
        progress.add_days_passed(31);
        progress.add_award(12);
        progress.set_carried_troops(&Troops::from_slots([Troop::new(4, 10)]));
        progress
    }

    #[test]
    fn reset_matches_fresh_record() {
        let mut progress = populated();
        assert_ne!(progress, CampaignProgress::new());
        progress.reset();
        assert_eq!(progress, CampaignProgress::new());
        assert!(progress.is_starting());
        assert_eq!(progress.pending_bonus(), ScenarioBonus::default());
    }

    #[test]
    fn remove_award_drops_every_occurrence() {
        let mut progress = CampaignProgress::new();
        progress.add_award(5);
        progress.add_award(7);
        progress.add_award(5);
        assert_eq!(progress.obtained_award_ids(), &[5, 7, 5]);

        progress.remove_award(5);
        assert_eq!(progress.obtained_award_ids(), &[7]);
        progress.remove_award(5);
        progress.remove_award(99);
        assert_eq!(progress.obtained_award_ids(), &[7]);
    }

    #[test]
    fn completing_same_scenario_twice_records_once() {
        let mut progress = CampaignProgress::new();
        progress.set_active_scenario(3);
        progress.mark_active_scenario_completed();
        progress.mark_active_scenario_completed();
        assert_eq!(progress.completed_scenarios(), &[3]);

        progress.set_active_scenario(1);
        progress.mark_active_scenario_completed();
        assert_eq!(progress.completed_scenarios(), &[3, 1]);
        assert_eq!(progress.last_completed_scenario(), Ok(1));
    }

    #[test]
    fn last_completed_scenario_requires_a_completion() {
        assert_eq!(
            CampaignProgress::new().last_completed_scenario(),
            Err(ProgressError::NoCompletedScenarios)
        );
    }

    #[test]
    fn days_accumulate_and_clamp() {
        let mut progress = CampaignProgress::new();
        progress.add_days_passed(10);
        progress.add_days_passed(5);
        assert_eq!(progress.days_passed(), 15);
        progress.add_days_passed(u32::MAX);
        assert_eq!(progress.days_passed(), u32::MAX);
    }

    #[test]
    fn carried_troops_are_replaced_not_merged() {
        let mut progress = CampaignProgress::new();
        progress.set_carried_troops(&Troops::from_slots([Troop::new(1, 5), Troop::new(2, 6)]));
        progress.set_carried_troops(&Troops::from_slots([Troop::new(3, 7)]));
        assert_eq!(progress.carried_troops().len(), crate::army::ARMY_SLOTS);
        assert_eq!(progress.carried_troops()[0], Troop::new(3, 7));
        assert_eq!(progress.carried_troops()[1], Troop::EMPTY);
        assert_eq!(progress.carried_army().headcount(), 7);
    }

    #[test]
    fn obtained_awards_orders_scenarios_then_extras() {
        let catalog = award_catalog();
        let mut progress = CampaignProgress::new();
        progress.set_campaign_id(2);
        for scenario in [0, 1] {
            progress.set_active_scenario(scenario);
            progress.mark_active_scenario_completed();
        }
        for id in [11, 12, 20] {
            progress.add_award(id);
        }

        let ids: Vec<AwardId> = progress
            .obtained_awards(&catalog)
            .iter()
            .map(|award| award.id)
            .collect();
        assert_eq!(ids, vec![11, 12, 20]);
    }

    #[test]
    fn obtained_awards_repeat_an_award_listed_in_both_groups() {
        let catalog = CampaignCatalog::from_campaigns(vec![CampaignDefinition {
            id: 3,
            name: "Shared".into(),
            scenarios: vec![scenario(&[5])],
            extra_awards: vec![award(5)],
        }]);
        let mut progress = CampaignProgress::new();
        progress.set_campaign_id(3);
        progress.mark_active_scenario_completed();
        progress.add_award(5);
        progress.add_award(5);

        let ids: Vec<AwardId> = progress
            .obtained_awards(&catalog)
            .into_iter()
            .map(|award| award.id)
            .collect();
        assert_eq!(ids, vec![5, 5]);
    }

    #[test]
    fn obtained_awards_follow_completion_order_and_skip_unfinished() {
        let catalog = award_catalog();
        let mut progress = CampaignProgress::new();
        progress.set_campaign_id(2);
        progress.set_active_scenario(1);
        progress.mark_active_scenario_completed();
        progress.set_active_scenario(0);
        progress.mark_active_scenario_completed();
        for id in [10, 11, 12] {
            progress.add_award(id);
        }
        let ids: Vec<AwardId> = progress
            .obtained_awards(&catalog)
            .into_iter()
            .map(|award| award.id)
            .collect();
        assert_eq!(ids, vec![12, 10, 11]);

        progress.set_campaign_id(77);
        assert!(progress.obtained_awards(&catalog).is_empty());
    }

    #[test]
    fn record_layout_matches_save_format() {
        let bytes = to_bytes(&populated(), ByteOrder::Big).unwrap();
        let mut expected = vec![
            0, 0, 0, 1, // active scenario
            0, 0, 0, 2, 0, 0, 0, 8, 0, 0, 0, 15, // bonus
            0, 0, 0, 1, 0, 0, 0, 1, // completed scenarios
            0, 0, 0, 2, // campaign id
            0, 0, 0, 31, // days
            0, 0, 0, 1, 0, 0, 0, 12, // awards
            0, 0, 0, 5, // troop slots
            0, 0, 0, 4, 0, 0, 0, 10,
        ];
        expected.extend(std::iter::repeat_n(0, 4 * 8));
        assert_eq!(bytes, expected);
    }

    #[test]
    fn encode_decode_preserves_record() {
        for order in [ByteOrder::Big, ByteOrder::Little] {
            let original = populated();
            let bytes = to_bytes(&original, order).unwrap();
            assert_eq!(from_bytes::<CampaignProgress>(&bytes, order).unwrap(), original);

            let empty = CampaignProgress::new();
            let bytes = to_bytes(&empty, order).unwrap();
            assert_eq!(bytes.len(), 4 * 9);
            assert_eq!(from_bytes::<CampaignProgress>(&bytes, order).unwrap(), empty);
        }
    }

    #[test]
    fn truncated_record_fails_to_decode() {
        let bytes = to_bytes(&populated(), ByteOrder::Big).unwrap();
        let err = from_bytes::<CampaignProgress>(&bytes[..bytes.len() - 3], ByteOrder::Big)
            .unwrap_err();
        assert!(err.is_truncated());
    }
}
