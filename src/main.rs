use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use chrono::Utc;
use clap::{ArgAction, Parser, Subcommand};
use seqdrift::analyser::{self, AttackProfile, Direction, DiffStatus, Trace};
use seqdrift::config::DemoConfig;
use seqdrift::ui::output::{self, RunOutput};
use simple_logger::SimpleLogger;

/// seqdrift shows how dropping pre-authentication packets shifts SSH sequence numbers
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Display output as formatted JSON
    #[arg(short = 'j', long, global = true, action = ArgAction::SetTrue)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show sequence numbers for a clean handshake (no attack)
    Baseline {
        /// JSON trace file to analyze
        #[arg(short = 'f', long, visible_alias = "pcap", value_parser)]
        file: PathBuf,
    },

    /// Run the packet-drop attack described by a YAML config
    Attack {
        /// YAML configuration file
        #[arg(short = 'c', long, value_parser)]
        config: PathBuf,

        /// Directory for the before/after JSON logs
        #[arg(short = 'l', long, default_value = "logs", value_parser)]
        log_dir: PathBuf,

        /// Use this profile instead of the one selected by the config
        #[arg(short = 'p', long, value_parser)]
        profile: Option<String>,

        /// Drop these comma-separated indices instead of using a profile
        #[arg(short = 'd', long, value_delimiter = ',', conflicts_with = "profile")]
        drop: Vec<usize>,
    },

    /// Drop random packets and see what shifts
    Explore {
        /// JSON trace file to analyze
        #[arg(short = 'f', long, visible_alias = "pcap", value_parser)]
        file: PathBuf,

        /// Number of packets to drop
        #[arg(short = 'r', long, default_value_t = 1, value_parser)]
        random_drop: usize,

        /// Seed for the drop selection, drawn from the clock if omitted
        #[arg(short = 's', long, value_parser)]
        seed: Option<u64>,

        /// Draw from both directions instead of client packets only
        #[arg(short = 'a', long, action = ArgAction::SetTrue)]
        any_direction: bool,
    },

    /// List the built-in attack profiles
    Profiles,
}

fn clock_seed() -> u64 {
    let now = Utc::now();
    (now.timestamp() as u64).rotate_left(32) ^ u64::from(now.timestamp_subsec_nanos())
}

fn print_baseline(trace: &Trace, json: bool) -> seqdrift::Result<()> {
    let baseline = analyser::assign(trace);
    let rows = output::sequenced(trace, &baseline, &BTreeSet::new());

    if json {
        let diff = analyser::compare(&baseline, &baseline, trace);
        let run = RunOutput {
            mode: "baseline",
            description: "no attack".to_string(),
            drop_indices: Vec::new(),
            fingerprint: trace.fingerprint(),
            baseline: rows.clone(),
            after: rows,
            summary: diff.summary(),
            counter_offsets: diff.counter_offsets(),
            diff,
        };
        println!("{}", output::data_as_json(&run)?);
    } else {
        output::print_packet_table(&rows, "Baseline handshake (no attack)");
    }
    Ok(())
}

fn run_attack(mode: &'static str, trace: &Trace, profile: &AttackProfile, json: bool, log_dir: Option<&Path>) -> seqdrift::Result<()> {
    let baseline = analyser::assign(trace);
    let (mutated, attacked) = analyser::apply(trace, profile)?;
    let diff = analyser::compare(&baseline, &attacked, trace);

    let drops: BTreeSet<usize> = diff
        .entries()
        .iter()
        .filter(|e| e.status == DiffStatus::Dropped)
        .map(|e| e.index)
        .collect();
    let before = output::sequenced(trace, &baseline, &drops);
    let after = output::sequenced(&mutated, &attacked, &BTreeSet::new());

    if let Some(log_dir) = log_dir {
        output::write_run_logs(log_dir, &before, &after)?;
    }

    if json {
        let run = RunOutput {
            mode,
            description: profile.describe(),
            drop_indices: drops.into_iter().collect(),
            fingerprint: trace.fingerprint(),
            baseline: before,
            after,
            summary: diff.summary(),
            counter_offsets: diff.counter_offsets(),
            diff,
        };
        println!("{}", output::data_as_json(&run)?);
        return Ok(());
    }

    println!("Applying {}, dropping packet indices {:?}", profile.describe(), drops);
    output::print_packet_table(&before, "Baseline handshake (no attack)");
    output::print_packet_table(&after, "Post-attack visible handshake");
    output::print_sequence_diff(&diff, "Sequence number diff (baseline vs post-attack)");
    output::print_summary(&diff);
    Ok(())
}

fn run(args: Args) -> seqdrift::Result<()> {
    match args.command {
        Command::Baseline { file } => {
            let trace = analyser::utils::load_file(&file)?;
            print_baseline(&trace, args.json)
        }
        Command::Attack { config, log_dir, profile, drop } => {
            let config = DemoConfig::load(&config)?;
            let trace = analyser::utils::load_file(&config.trace_path()?)?;
            log::info!("Trace fingerprint {}", trace.fingerprint());

            let profile = if !drop.is_empty() {
                AttackProfile::explicit(drop)
            } else if let Some(name) = profile {
                config.select_profile_named(&name)
            } else {
                config.select_profile()
            };
            run_attack("attack", &trace, &profile, args.json, Some(&log_dir))
        }
        Command::Explore { file, random_drop, seed, any_direction } => {
            let trace = analyser::utils::load_file(&file)?;
            let seed = seed.unwrap_or_else(|| {
                let seed = clock_seed();
                log::warn!("No seed given, using {seed}. Pass --seed {seed} to replay this run.");
                seed
            });
            let profile = AttackProfile::Random {
                count: random_drop,
                seed,
                direction: if any_direction { None } else { Some(Direction::ClientToServer) },
            };
            run_attack("explore", &trace, &profile, args.json, None)
        }
        Command::Profiles => {
            output::print_profiles(&analyser::profile::named_profiles());
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    if let Err(e) = SimpleLogger::new().with_level(log::LevelFilter::Info).env().init() {
        eprintln!("Failed to initialise logger: {e}");
    }

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
