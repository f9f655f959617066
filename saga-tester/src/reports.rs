use std::io::Write;

use anyhow::Result;
use colored::Colorize;
use saga_game::{
    CampaignCatalog, CampaignProgress, ScenarioBonus, ScenarioLossCondition,
    ScenarioVictoryCondition, Troop, current_loss_condition, current_victory_condition,
};
use serde::Serialize;

use crate::playthrough::PlaythroughRecord;

/// Human-readable view of a decoded save.
#[derive(Debug, Clone, Serialize)]
pub struct SaveSummary {
    pub campaign_id: i32,
    pub campaign_name: Option<String>,
    pub active_scenario: i32,
    pub scenario_name: Option<String>,
    pub victory: ScenarioVictoryCondition,
    pub loss: ScenarioLossCondition,
    pub pending_bonus: ScenarioBonus,
    pub completed_scenarios: Vec<i32>,
    pub last_completed: Option<i32>,
    pub days_passed: u32,
    pub award_ids: Vec<i32>,
    pub awards: Vec<AwardLine>,
    pub carried_troops: Vec<Troop>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AwardLine {
    pub id: i32,
    pub name: String,
    pub kind: String,
}

impl SaveSummary {
    #[must_use]
    pub fn build(progress: &CampaignProgress, catalog: &CampaignCatalog) -> Self {
        let campaign = catalog.campaign(progress.campaign_id());
        let scenario = catalog.scenario(progress.campaign_id(), progress.active_scenario());
        Self {
            campaign_id: progress.campaign_id(),
            campaign_name: campaign.map(|c| c.name.clone()),
            active_scenario: progress.active_scenario(),
            scenario_name: scenario.map(|s| s.name.clone()),
            victory: current_victory_condition(progress, catalog),
            loss: current_loss_condition(progress, catalog),
            pending_bonus: progress.pending_bonus(),
            completed_scenarios: progress.completed_scenarios().to_vec(),
            last_completed: progress.last_completed_scenario().ok(),
            days_passed: progress.days_passed(),
            award_ids: progress.obtained_award_ids().to_vec(),
            awards: progress
                .obtained_awards(catalog)
                .into_iter()
                .map(|award| AwardLine {
                    id: award.id,
                    name: award.name,
                    kind: format!("{:?}", award.kind),
                })
                .collect(),
            carried_troops: progress.carried_troops().to_vec(),
        }
    }
}

pub fn generate_json_report<T: Serialize + ?Sized>(out: &mut dyn Write, value: &T) -> Result<()> {
    let json_output = serde_json::to_string_pretty(value)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_playthrough_console_report(
    out: &mut dyn Write,
    records: &[PlaythroughRecord],
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Campaign Playthrough Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "===============================".cyan())?;

    let passed = records.iter().filter(|r| r.passed()).count();
    writeln!(out, "Total runs: {}", records.len())?;
    writeln!(out, "Passed: {}", passed.to_string().green())?;
    writeln!(out, "Failed: {}", (records.len() - passed).to_string().red())?;
    writeln!(out)?;

    for record in records {
        let status = if record.passed() {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(
            out,
            "{} {} (campaign {}, seed {})",
            status,
            record.campaign_name.bold(),
            record.campaign_id,
            record.seed
        )?;
        writeln!(
            out,
            "   Scenarios: {}  Days: {}  Awards: {:?}",
            record.scenarios_completed, record.days_passed, record.award_ids
        )?;
        writeln!(
            out,
            "   Carried army: {} creatures  Save size: {} bytes",
            record.carried_headcount, record.save_bytes
        )?;
        if let Some(path) = &record.save_path {
            writeln!(out, "   Saved to: {path}")?;
        }
        for failure in &record.failures {
            writeln!(out, "     • {}", failure.red())?;
        }
    }
    Ok(())
}

pub fn generate_save_console_report(out: &mut dyn Write, summary: &SaveSummary) -> Result<()> {
    writeln!(out, "{}", "💾 Campaign Save".bright_cyan().bold())?;
    writeln!(out, "{}", "================".cyan())?;
    writeln!(
        out,
        "Campaign: {} ({})",
        summary.campaign_id,
        summary.campaign_name.as_deref().unwrap_or("unknown")
    )?;
    writeln!(
        out,
        "Active scenario: {} ({})",
        summary.active_scenario,
        summary.scenario_name.as_deref().unwrap_or("unknown")
    )?;
    writeln!(
        out,
        "Victory: {:?}  Loss: {:?}",
        summary.victory, summary.loss
    )?;
    let bonus = summary.pending_bonus;
    writeln!(
        out,
        "Pending bonus: {} (subtype {}, amount {})",
        bonus.kind, bonus.subtype, bonus.amount
    )?;
    writeln!(out, "Completed: {:?}", summary.completed_scenarios)?;
    writeln!(out, "Days passed: {}", summary.days_passed)?;
    writeln!(out, "Award ids: {:?}", summary.award_ids)?;
    generate_awards_console_report(out, &summary.awards)?;
    writeln!(out, "Carried troops:")?;
    for (slot, troop) in summary.carried_troops.iter().enumerate() {
        if troop.is_empty() {
            writeln!(out, "  [{slot}] -")?;
        } else {
            writeln!(out, "  [{slot}] monster {} x{}", troop.monster, troop.count)?;
        }
    }
    Ok(())
}

pub fn generate_awards_console_report(out: &mut dyn Write, awards: &[AwardLine]) -> Result<()> {
    writeln!(out, "{}", "🏆 Obtained awards".bright_yellow().bold())?;
    if awards.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for award in awards {
        writeln!(out, "  #{} {} [{}]", award.id, award.name.bold(), award.kind)?;
    }
    Ok(())
}

pub fn generate_catalog_listing(out: &mut dyn Write, catalog: &CampaignCatalog) -> Result<()> {
    writeln!(out, "Available campaigns:")?;
    for campaign in &catalog.campaigns {
        writeln!(
            out,
            "  {:3} {:25} - {} scenarios, {} extra awards",
            campaign.id,
            campaign.name,
            campaign.scenario_count(),
            campaign.extra_awards.len()
        )?;
        for (idx, scenario) in campaign.scenarios.iter().enumerate() {
            writeln!(
                out,
                "        {idx}: {} ({:?} / {:?})",
                scenario.name, scenario.victory, scenario.loss
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use saga_game::{BonusKind, Troops};

    fn sample_progress() -> CampaignProgress {
        let mut progress = CampaignProgress::new();
        progress.set_pending_bonus(ScenarioBonus::new(BonusKind::Artifact, 2, 1));
        progress.mark_active_scenario_completed();
        progress.set_active_scenario(1);
        progress.add_award(0);
        progress.add_award(10);
        progress.add_days_passed(21);
        progress.set_carried_troops(&Troops::from_slots([Troop::new(5, 9)]));
        progress
    }

    #[test]
    fn summary_resolves_names_and_awards() {
        let catalog = CampaignCatalog::bundled().unwrap();
        let summary = SaveSummary::build(&sample_progress(), &catalog);
        assert_eq!(summary.campaign_name.as_deref(), Some("The Shattered Crown"));
        assert_eq!(summary.scenario_name.as_deref(), Some("River Crossing"));
        assert_eq!(summary.victory, ScenarioVictoryCondition::CaptureTown);
        assert_eq!(summary.last_completed, Some(0));
        let ids: Vec<_> = summary.awards.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![0, 10]);
    }

    #[test]
    fn console_and_json_reports_render() {
        let catalog = CampaignCatalog::bundled().unwrap();
        let summary = SaveSummary::build(&sample_progress(), &catalog);

        let mut console = Vec::new();
        generate_save_console_report(&mut console, &summary).unwrap();
        let text = String::from_utf8(console).unwrap();
        assert!(text.contains("Days passed: 21"));
        assert!(text.contains("monster 5 x9"));

        let mut json = Vec::new();
        generate_json_report(&mut json, &summary).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert_eq!(value["days_passed"], 21);
        assert_eq!(value["pending_bonus"]["kind"], "artifact");
    }

    #[test]
    fn catalog_listing_names_every_campaign() {
        let catalog = CampaignCatalog::bundled().unwrap();
        let mut out = Vec::new();
        generate_catalog_listing(&mut out, &catalog).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Available campaigns"));
        for campaign in &catalog.campaigns {
            assert!(text.contains(&campaign.name));
        }
    }
}
