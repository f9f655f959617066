use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use saga_game::stream::{from_bytes, to_bytes};
use saga_game::{
    Advance, BonusKind, ByteOrder, CampaignCatalog, CampaignId, CampaignProgress,
    CampaignSession, FileStorage, ProgressStorage, ScenarioBonus, ScenarioOutcome, Troop, Troops,
};
use serde::{Deserialize, Serialize};

/// Chance that an award offered by a scenario is taken.
const AWARD_CHANCE: f64 = 0.7;
/// Chance that each campaign-wide award is granted by the end of the run.
const EXTRA_AWARD_CHANCE: f64 = 0.3;
/// Chance that a previously granted award is lost in a later scenario.
const AWARD_LOSS_CHANCE: f64 = 0.1;

/// Summary of one seeded campaign run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaythroughRecord {
    pub seed: u64,
    pub campaign_id: CampaignId,
    pub campaign_name: String,
    pub scenarios_completed: usize,
    pub days_passed: u32,
    pub award_ids: Vec<i32>,
    pub carried_headcount: u64,
    pub save_bytes: usize,
    pub save_path: Option<String>,
    pub failures: Vec<String>,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
}

impl PlaythroughRecord {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    /// Slot name used when the run is written to a save directory.
    #[must_use]
    pub fn slot_name(campaign: CampaignId, seed: u64) -> String {
        format!("campaign{campaign}-seed{seed}")
    }
}

/// Plays campaigns from start to finish with seeded random choices.
pub struct PlaythroughRunner {
    catalog: Arc<CampaignCatalog>,
    storage: Option<FileStorage>,
    order: ByteOrder,
    verbose: bool,
}

impl PlaythroughRunner {
    pub const fn new(
        catalog: Arc<CampaignCatalog>,
        storage: Option<FileStorage>,
        order: ByteOrder,
        verbose: bool,
    ) -> Self {
        Self {
            catalog,
            storage,
            order,
            verbose,
        }
    }

    pub fn run(&self, campaign: CampaignId, seed: u64) -> Result<PlaythroughRecord> {
        let started = Instant::now();
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut session =
            CampaignSession::start(self.catalog.clone(), campaign, random_bonus(&mut rng))
                .with_context(|| format!("starting campaign {campaign}"))?;
        let campaign_name = session
            .campaign()
            .map(|definition| definition.name.clone())
            .unwrap_or_default();
        let mut failures = Vec::new();
        let mut army = Troops::default();

        loop {
            let scenario = session.progress().active_scenario();
            let offered: Vec<i32> = self
                .catalog
                .scenario_awards(campaign, scenario)
                .iter()
                .map(|award| award.id)
                .collect();
            let mut outcome = ScenarioOutcome {
                days: rng.gen_range(7..=60),
                awards_granted: offered
                    .into_iter()
                    .filter(|_| rng.gen_bool(AWARD_CHANCE))
                    .collect(),
                ..ScenarioOutcome::default()
            };
            if let Some(&held) = session.progress().obtained_award_ids().first()
                && rng.gen_bool(AWARD_LOSS_CHANCE)
            {
                outcome.awards_lost.push(held);
            }
            let slot = rng.gen_range(0..saga_game::ARMY_SLOTS);
            army.set(slot, Troop::new(rng.gen_range(1..=60), rng.gen_range(1..=120)));
            outcome.troops = Some(army.clone());

            if self.verbose {
                log::info!(
                    "seed {seed}: scenario {scenario} done in {} days, awards {:?}",
                    outcome.days,
                    outcome.awards_granted
                );
            }

            match session.complete_scenario(outcome)? {
                Advance::Next(next) => {
                    session.choose_bonus(random_bonus(&mut rng));
                    log::debug!("seed {seed}: advancing to scenario {next}");
                }
                Advance::CampaignComplete => break,
            }
        }

        for award in self.catalog.extra_awards(campaign) {
            if rng.gen_bool(EXTRA_AWARD_CHANCE) {
                session.progress_mut().add_award(award.id);
            }
        }

        let progress = session.progress();
        check_invariants(progress, &mut failures);
        let bytes = to_bytes(progress, self.order)?;
        match from_bytes::<CampaignProgress>(&bytes, self.order) {
            Ok(decoded) if decoded == *progress => {}
            Ok(_) => failures.push("save stream did not reproduce the record".to_string()),
            Err(err) => failures.push(format!("save stream failed to decode: {err}")),
        }

        let save_path = match &self.storage {
            Some(storage) => {
                let slot = PlaythroughRecord::slot_name(campaign, seed);
                storage.save_progress(&slot, progress)?;
                Some(storage.slot_path(&slot)?.display().to_string())
            }
            None => None,
        };

        Ok(PlaythroughRecord {
            seed,
            campaign_id: campaign,
            campaign_name,
            scenarios_completed: progress.completed_scenarios().len(),
            days_passed: progress.days_passed(),
            award_ids: session.obtained_awards().iter().map(|award| award.id).collect(),
            carried_headcount: progress.carried_army().headcount(),
            save_bytes: bytes.len(),
            save_path,
            failures,
            duration: started.elapsed(),
        })
    }
}

fn random_bonus(rng: &mut ChaCha20Rng) -> ScenarioBonus {
    let kind = BonusKind::ALL[rng.gen_range(0..BonusKind::ALL.len())];
    ScenarioBonus::new(kind, rng.gen_range(0..16), rng.gen_range(0..=5))
}

fn check_invariants(progress: &CampaignProgress, failures: &mut Vec<String>) {
    let completed = progress.completed_scenarios();
    for (idx, scenario) in completed.iter().enumerate() {
        if completed[..idx].contains(scenario) {
            failures.push(format!("scenario {scenario} completed twice"));
        }
    }
    if progress.last_completed_scenario().is_err() {
        failures.push("campaign finished without completed scenarios".to_string());
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runner() -> PlaythroughRunner {
        let catalog = Arc::new(CampaignCatalog::bundled().unwrap());
        PlaythroughRunner::new(catalog, None, ByteOrder::Big, false)
    }

    #[test]
    fn run_completes_every_scenario() {
        let record = runner().run(0, 1337).unwrap();
        assert!(record.passed(), "failures: {:?}", record.failures);
        assert_eq!(record.scenarios_completed, 4);
        assert!(record.days_passed >= 4 * 7);
        assert!(record.save_path.is_none());
        assert!(record.carried_headcount > 0);
    }

    #[test]
    fn runs_are_deterministic_per_seed() {
        let runner = runner();
        let a = runner.run(1, 42).unwrap();
        let b = runner.run(1, 42).unwrap();
        assert_eq!(a.days_passed, b.days_passed);
        assert_eq!(a.award_ids, b.award_ids);
        assert_eq!(a.save_bytes, b.save_bytes);
    }

    #[test]
    fn unknown_campaign_is_an_error() {
        assert!(runner().run(99, 1).is_err());
    }

    #[test]
    fn slot_names_are_storage_safe() {
        let slot = PlaythroughRecord::slot_name(3, 17);
        assert_eq!(slot, "campaign3-seed17");
        assert!(FileStorage::new("x").slot_path(&slot).is_ok());
    }
}
