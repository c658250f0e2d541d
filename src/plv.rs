use log::{debug, info, warn};

use party_list::*;
use snafu::prelude::*;

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::plv::config_reader::*;

pub mod config_reader;
mod io_text;

#[derive(Debug, Snafu)]
pub enum PlvError {
    #[snafu(display("Error opening file {path}: {source}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening json file {path}: {source}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing json: {source}"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing the summary to {path}: {source}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error in ballot file {path}: {source}"))]
    ReadingBallots {
        source: ElectionError,
        path: String,
    },
    #[snafu(display("{source}"))]
    Election { source: ElectionError },
    #[snafu(display("No ballot file: pass --input or list ballotFileSources in the configuration"))]
    NoBallotFile {},
    #[snafu(display("The summary differs from the reference summary {path}"))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type PlvResult<T> = Result<T, PlvError>;
pub type BPlvResult<T> = Result<T, Box<PlvError>>;

fn percent(num: u64, denom: u64) -> String {
    if denom == 0 {
        "0.00".to_string()
    } else {
        format!("{:.2}", num as f64 * 100.0 / denom as f64)
    }
}

fn result_stats_to_json(outcome: &ElectionOutcome) -> Vec<JSValue> {
    let election = outcome.election();
    let mut l: Vec<JSValue> = Vec::new();
    for ((party, cands), row) in election
        .parties()
        .iter()
        .zip(election.candidates().iter())
        .zip(outcome.table().rows.iter())
    {
        let candidates: Vec<JSValue> = cands
            .iter()
            .map(|c| {
                json!({
                    "name": c.name,
                    "votes": c.votes.to_string(),
                    "elected": c.seated,
                })
            })
            .collect();
        l.push(json!({
            "party": party.name,
            "independent": party.independent,
            "votes": row.votes.to_string(),
            "firstAllocation": row.first_allocation.to_string(),
            "remainingVotes": row.remainder.to_string(),
            "secondAllocation": row.second_allocation.to_string(),
            "seats": row.total_seats.to_string(),
            "voteShare": percent(row.votes, election.ballot_count()),
            "seatShare": percent(row.total_seats as u64, election.seat_count() as u64),
            "candidates": candidates,
        }));
    }
    l
}

fn build_summary_js(settings: &OutputSettings, outcome: &ElectionOutcome) -> JSValue {
    let election = outcome.election();
    let c = OutputConfig {
        contest: settings.contest_name.clone(),
        date: settings.contest_date.clone(),
        jurisdiction: settings.contest_jurisdiction.clone(),
        office: settings.contest_office.clone(),
        kind: election.kind().label().to_string(),
        seats: election.seat_count().to_string(),
        ballots: election.ballot_count().to_string(),
        parties: election.party_count().to_string(),
        candidates: election.candidate_count().to_string(),
        quota: outcome.table().quota.to_string(),
    };
    let winners: Vec<JSValue> = outcome
        .winners()
        .iter()
        .map(|w| json!({"elected": w.name, "party": w.party}))
        .collect();
    json!({
        "config": c,
        "results": result_stats_to_json(outcome),
        "winners": winners,
    })
}

// Where the summary goes: the --out flag first, then the output directory of the configuration.
fn summary_destination(
    args: &Args,
    settings: &OutputSettings,
    root: &Path,
    kind: ElectionKind,
) -> Option<String> {
    if let Some(out) = args.out.clone() {
        return Some(out);
    }
    settings.output_directory.as_ref().map(|dir| {
        let p: PathBuf = [
            root.to_path_buf(),
            PathBuf::from(dir),
            PathBuf::from(format!("{}_summary.json", kind.label())),
        ]
        .iter()
        .collect();
        p.display().to_string()
    })
}

fn write_summary(dest: &str, pretty_js: &str) -> BPlvResult<()> {
    if dest == "stdout" {
        println!("{}", pretty_js);
        return Ok(());
    }
    if let Some(parent) = Path::new(dest).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context(WritingSummarySnafu { path: dest })?;
        }
    }
    fs::write(dest, pretty_js).context(WritingSummarySnafu { path: dest })?;
    info!("Summary written to {}", dest);
    Ok(())
}

fn check_reference(reference_path: &str, pretty_js_stats: &str) -> BPlvResult<()> {
    let summary_ref = read_summary(reference_path)?;
    debug!("summary: {:?}", summary_ref);
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference summary");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        return Err(Box::new(PlvError::ReferenceMismatch {
            path: reference_path.to_string(),
        }));
    }
    info!("The summary matches the reference {}", reference_path);
    Ok(())
}

pub fn run_election_cli(args: &Args) -> BPlvResult<()> {
    let config: Option<PlvConfig> = match args.config.as_deref() {
        Some(path) => Some(read_config(path)?),
        None => None,
    };
    // Paths in the configuration are relative to the configuration file.
    let root: PathBuf = args
        .config
        .as_deref()
        .and_then(|p| Path::new(p).parent())
        .map(|p| p.to_path_buf())
        .unwrap_or_default();

    let inputs: Vec<String> = if !args.input.is_empty() {
        args.input.clone()
    } else {
        config
            .iter()
            .flat_map(|c| c.ballot_file_sources.iter())
            .map(|source| root.join(&source.file_path).display().to_string())
            .collect()
    };

    let mode = match (args.seed, config.as_ref().and_then(|c| c.rules.as_ref())) {
        (Some(seed), _) => TieBreakMode::Seeded(seed),
        (None, Some(rules)) => rules.tiebreak_mode()?,
        (None, None) => TieBreakMode::DEFAULT,
    };
    info!("tiebreak mode: {:?}", mode);

    let settings: OutputSettings = match config.as_ref() {
        Some(c) => c.output_settings.clone(),
        None => OutputSettings::named(
            &inputs
                .first()
                .map(|p| io_text::simplify_file_name(p))
                .unwrap_or_default(),
        ),
    };

    let election = io_text::read_ballot_files(&inputs)?;
    let mut tiebreaker = Tiebreaker::from_mode(mode);
    let outcome = run_election(election, &mut tiebreaker).context(ElectionSnafu {})?;

    let summary_js = build_summary_js(&settings, &outcome);
    let pretty_js_stats = serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {})?;

    if let Some(dest) = summary_destination(args, &settings, &root, outcome.election().kind()) {
        write_summary(&dest, &pretty_js_stats)?;
    }

    // The reference summary, if provided for comparison
    if let Some(reference_path) = args.reference.as_deref() {
        check_reference(reference_path, &pretty_js_stats)?;
    }

    Ok(())
}

#[cfg(test)]
fn run_election_test(test_name: &str, config_lpath: &str, summary_lpath: &str) -> BPlvResult<()> {
    let test_dir = option_env!("PLV_TEST_DIR")
        .unwrap_or(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data"));
    info!("Running test {}", test_name);
    let args = Args {
        config: Some(format!("{}/{}/{}", test_dir, test_name, config_lpath)),
        reference: Some(format!("{}/{}/{}", test_dir, test_name, summary_lpath)),
        out: None,
        input: vec![],
        seed: None,
        verbose: false,
    };
    run_election_cli(&args)
}

#[cfg(test)]
pub fn test_wrapper(test_name: &str) -> BPlvResult<()> {
    run_election_test(
        test_name,
        format!("{}_config.json", test_name).as_str(),
        format!("{}_expected_summary.json", test_name).as_str(),
    )
}
