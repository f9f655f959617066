mod playthrough;
mod reports;
mod util;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use playthrough::{PlaythroughRecord, PlaythroughRunner};
use reports::SaveSummary;
use saga_game::storage::read_progress_file;
use saga_game::{ByteOrder, CampaignCatalog, FileStorage};
use util::{parse_seeds, split_csv};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ToolMode {
    /// Play seeded campaign runs end to end
    Play,
    /// Decode a save file and describe it
    Inspect,
    /// List the awards a save file holds
    Awards,
    /// List the campaigns in the catalog
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StreamOrder {
    Big,
    Little,
}

impl From<StreamOrder> for ByteOrder {
    fn from(order: StreamOrder) -> Self {
        match order {
            StreamOrder::Big => Self::Big,
            StreamOrder::Little => Self::Little,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "saga-tester", version = "0.1.0")]
#[command(about = "Campaign playthroughs and save inspection for Saga")]
struct Args {
    /// What to do: play, inspect, awards, or list
    #[arg(long, value_enum, default_value_t = ToolMode::Play)]
    mode: ToolMode,

    /// Campaign catalog JSON (defaults to the bundled catalog)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Campaign ids to play (comma-separated, or "all")
    #[arg(long, default_value = "0")]
    campaigns: String,

    /// Seeds to run (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Directory to write playthrough saves into
    #[arg(long)]
    save_dir: Option<PathBuf>,

    /// Save file to read (inspect and awards modes)
    #[arg(long)]
    file: Option<PathBuf>,

    /// Byte order of save streams
    #[arg(long, value_enum, default_value_t = StreamOrder::Big)]
    byte_order: StreamOrder,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "console"])]
    report: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let catalog = Arc::new(load_catalog(&args)?);

    match args.mode {
        ToolMode::List => write_listing(&args, &catalog),
        ToolMode::Inspect | ToolMode::Awards => write_save_report(&args, &catalog),
        ToolMode::Play => {
            announce_banner();
            let records = run_playthroughs(&args, &catalog)?;
            write_playthrough_report(&args, &records)?;
            if records.iter().any(|r| !r.passed()) {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}

fn load_catalog(args: &Args) -> Result<CampaignCatalog> {
    match &args.catalog {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            CampaignCatalog::from_json(&json)
                .with_context(|| format!("invalid campaign catalog {}", path.display()))
        }
        None => Ok(CampaignCatalog::bundled()?),
    }
}

fn announce_banner() {
    println!("{}", "🎮 Saga Campaign Tester".bright_cyan().bold());
    println!("{}", "=======================".cyan());
}

fn resolve_campaigns(args: &Args, catalog: &CampaignCatalog) -> Result<Vec<i32>> {
    let tokens = split_csv(&args.campaigns);
    if tokens.iter().any(|t| t.eq_ignore_ascii_case("all")) {
        return Ok(catalog.campaigns.iter().map(|c| c.id).collect());
    }
    tokens
        .iter()
        .map(|token| {
            token
                .parse::<i32>()
                .with_context(|| format!("invalid campaign id {token:?}"))
        })
        .collect()
}

fn run_playthroughs(args: &Args, catalog: &Arc<CampaignCatalog>) -> Result<Vec<PlaythroughRecord>> {
    let campaigns = resolve_campaigns(args, catalog)?;
    let seeds = parse_seeds(&split_csv(&args.seeds))?;
    let order = ByteOrder::from(args.byte_order);
    let storage = args
        .save_dir
        .as_ref()
        .map(|dir| FileStorage::new(dir).with_byte_order(order));
    let runner = PlaythroughRunner::new(catalog.clone(), storage, order, args.verbose);

    let mut records = Vec::new();
    for &campaign in &campaigns {
        for &seed in &seeds {
            if args.verbose {
                println!(
                    "🧪 Playing campaign {} (seed {seed})",
                    campaign.to_string().bright_white()
                );
            }
            records.push(runner.run(campaign, seed)?);
        }
    }
    Ok(records)
}

fn write_playthrough_report(args: &Args, records: &[PlaythroughRecord]) -> Result<()> {
    emit_report(args, |out| match args.report.as_str() {
        "json" => reports::generate_json_report(out, records),
        _ => reports::generate_playthrough_console_report(out, records),
    })
}

fn write_save_report(args: &Args, catalog: &CampaignCatalog) -> Result<()> {
    let Some(path) = &args.file else {
        bail!("--file is required in {:?} mode", args.mode);
    };
    let progress = read_progress_file(path, args.byte_order.into())
        .with_context(|| format!("failed to read save {}", path.display()))?;
    let summary = SaveSummary::build(&progress, catalog);

    emit_report(args, |out| match (args.mode, args.report.as_str()) {
        (ToolMode::Awards, "json") => reports::generate_json_report(out, &summary.awards),
        (ToolMode::Awards, _) => reports::generate_awards_console_report(out, &summary.awards),
        (_, "json") => reports::generate_json_report(out, &summary),
        _ => reports::generate_save_console_report(out, &summary),
    })
}

fn write_listing(args: &Args, catalog: &CampaignCatalog) -> Result<()> {
    emit_report(args, |out| match args.report.as_str() {
        "json" => reports::generate_json_report(out, catalog),
        _ => reports::generate_catalog_listing(out, catalog),
    })
}

/// Buffered report sink: the `--output` file when given, stdout otherwise.
fn open_report(path: Option<&Path>) -> Result<BufWriter<Box<dyn Write>>> {
    let sink: Box<dyn Write> = match path {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        ),
        None => Box::new(stdout()),
    };
    Ok(BufWriter::new(sink))
}

fn emit_report(args: &Args, render: impl FnOnce(&mut dyn Write) -> Result<()>) -> Result<()> {
    let mut out = open_report(args.output.as_deref())?;
    render(&mut out)?;
    out.flush().context("failed to flush report output")
}
