mod app;
mod simulate;
mod terminal;

use anyhow::{Context, Result, bail};
use app::{App, RunOutcome};
use chrono::Utc;
use clap::Parser;
use simulate::{SimulatedParticipant, run_simulated};
use spanav_core::{Gender, Handedness, ParticipantGroup, ParticipantInfo, TrialRecord};
use spanav_experiment::{
    ExperimentConfig, JsonLinesTransport, LocalIdentity, NullPresenter, NullTransport,
    SessionStateMachine, SessionSummary, Transport, assign_participant_id_or_fallback,
    export_file_name, load_catalog, write_records_csv, write_records_json, write_summary_csv,
};
use spanav_timing::{HighPrecisionTimer, SimulatedTimer};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use terminal::TerminalPresenter;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "spanav")]
#[command(about = "Spatial navigation reaction-time experiment")]
struct Args {
    /// Stimulus catalog (JSON with easy/hard/control pools)
    #[arg(long)]
    catalog: PathBuf,

    /// Experiment configuration (JSON); defaults are used for missing fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Participant group: DF, HF, DNF, HNF or HNS
    #[arg(long, default_value = "HNS")]
    group: ParticipantGroup,

    #[arg(long, default_value_t = 30)]
    age: u8,

    /// male, female, non-binary or prefer-not
    #[arg(long, default_value = "prefer-not")]
    gender: Gender,

    /// right, left or ambidextrous
    #[arg(long, default_value = "right")]
    handedness: Handedness,

    /// Use this id instead of generating one
    #[arg(long)]
    participant_id: Option<String>,

    /// Directory for the CSV and JSON exports
    #[arg(long, default_value = "results")]
    out: PathBuf,

    /// Stream every trial (practice included) to this NDJSON file
    #[arg(long)]
    monitor: Option<PathBuf>,

    /// Run a scripted participant on simulated time
    #[arg(long)]
    simulate: bool,

    #[arg(long, default_value_t = 1)]
    sim_seed: u64,

    /// Probability that the simulated participant answers correctly
    #[arg(long, default_value_t = 0.85)]
    sim_accuracy: f64,

    /// Start even if a scheduled difficulty has no stimuli
    #[arg(long)]
    allow_incomplete: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ExperimentConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ExperimentConfig::default(),
    };
    let catalog = load_catalog(&args.catalog)
        .with_context(|| format!("loading catalog {}", args.catalog.display()))?;

    let participant = ParticipantInfo {
        id: args
            .participant_id
            .clone()
            .unwrap_or_else(|| assign_participant_id_or_fallback(&mut LocalIdentity, args.group)),
        group: args.group,
        age: args.age,
        gender: args.gender,
        handedness: args.handedness,
        device_type: Some(if args.simulate { "simulated" } else { "keyboard" }.to_string()),
        registered_at: Utc::now(),
    };

    let transport: Box<dyn Transport> = match &args.monitor {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("creating monitor file {}", path.display()))?;
            Box::new(JsonLinesTransport::new(BufWriter::new(file)))
        }
        None => Box::new(NullTransport),
    };

    println!("=== SPATIAL NAVIGATION EXPERIMENT ===");
    println!("Participant: {} ({})", participant.id, participant.group.description());

    let (records, summary) = if args.simulate {
        let mut session = SessionStateMachine::new(
            config,
            catalog,
            participant,
            SimulatedTimer::new(),
            transport,
        )?;
        check_pools(&session, args.allow_incomplete)?;
        let mut who = SimulatedParticipant::new(args.sim_seed, args.sim_accuracy);
        run_simulated(&mut session, &mut who, &mut NullPresenter);
        (session.records().to_vec(), session.summary().cloned())
    } else {
        let media_root = args
            .catalog
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let session = SessionStateMachine::new(
            config,
            catalog,
            participant,
            HighPrecisionTimer::new(),
            transport,
        )?;
        check_pools(&session, args.allow_incomplete)?;
        let mut app = App::new(session, TerminalPresenter::new(media_root));
        let outcome = app.run()?;
        let session = app.into_session();
        if outcome == RunOutcome::Aborted {
            println!("Session aborted; exporting completed blocks only.");
        }
        (session.records().to_vec(), session.summary().cloned())
    };

    if records.is_empty() {
        println!("No trials recorded, nothing to export.");
        return Ok(());
    }
    let written = export(&args.out, &records, summary.as_ref())?;
    if let Some(summary) = &summary {
        print_summary(summary);
    }
    for path in written {
        println!("Saved {}", path.display());
    }
    Ok(())
}

fn check_pools<T, X>(session: &SessionStateMachine<T, X>, allow_incomplete: bool) -> Result<()>
where
    T: spanav_timing::Timer<Timestamp = u64>,
    X: Transport,
{
    let missing: Vec<String> = session
        .missing_pools()
        .iter()
        .map(ToString::to_string)
        .collect();
    if missing.is_empty() || allow_incomplete {
        return Ok(());
    }
    bail!(
        "catalog has no stimuli for: {} (pass --allow-incomplete to run anyway)",
        missing.join(", ")
    )
}

fn export(
    out_dir: &Path,
    records: &[TrialRecord],
    summary: Option<&SessionSummary>,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;
    let participant = records.first().map_or("unknown", |r| r.participant_id.as_str());
    let csv_path = out_dir.join(export_file_name(participant, Utc::now()));
    let stem = csv_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut written = Vec::new();
    write_records_csv(records, BufWriter::new(create(&csv_path)?))
        .with_context(|| format!("writing {}", csv_path.display()))?;
    written.push(csv_path);

    let json_path = out_dir.join(format!("{stem}.json"));
    write_records_json(records, summary, BufWriter::new(create(&json_path)?))
        .with_context(|| format!("writing {}", json_path.display()))?;
    written.push(json_path);

    if let Some(summary) = summary {
        let path = out_dir.join(format!("{stem}_summary.csv"));
        write_summary_csv(summary, BufWriter::new(create(&path)?))
            .with_context(|| format!("writing {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

fn create(path: &Path) -> Result<File> {
    File::create(path).with_context(|| format!("creating {}", path.display()))
}

fn print_summary(summary: &SessionSummary) {
    let pct = |v: Option<f64>| v.map_or("-".to_string(), |p| format!("{p:.1}%"));
    println!("\nExperiment completed.");
    println!("  Trials:           {}", summary.total_trials);
    println!(
        "  Regular accuracy: {} ({}/{})",
        pct(summary.regular_accuracy_pct),
        summary.correct_regular,
        summary.regular_trials
    );
    println!(
        "  Catch accuracy:   {} ({}/{})",
        pct(summary.catch_accuracy_pct),
        summary.correct_catch,
        summary.catch_trials
    );
    println!(
        "  Mean RT:          {}",
        summary.mean_rt_ms.map_or("-".to_string(), |m| format!("{m} ms"))
    );
    if !summary.incomplete_blocks.is_empty() {
        println!("  Incomplete blocks: {:?}", summary.incomplete_blocks);
    }
}
