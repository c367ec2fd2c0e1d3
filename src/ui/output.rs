use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use ansi_term::Colour;
use chrono::Local;
use serde::Serialize;
use crate::analyser::{
    CounterOffset, DiffReport, DiffStatus, DiffSummary, Direction, SequenceAssignment, Trace,
};

/// One packet with the sequence number it was given, as written to logs and JSON output.
#[derive(Clone, Debug, Serialize)]
pub struct SequencedPacket {
    pub index: usize,
    pub direction: Direction,
    pub msg_type: String,
    pub msg_code: Option<u8>,
    pub payload_len: u32,
    pub seq_no: Option<u32>,
    pub dropped: bool,
}

pub fn sequenced(trace: &Trace, assignment: &SequenceAssignment, drops: &BTreeSet<usize>) -> Vec<SequencedPacket> {
    trace
        .iter()
        .map(|p| SequencedPacket {
            index: p.index,
            direction: p.direction,
            msg_type: p.kind.to_string(),
            msg_code: p.kind.message_code(),
            payload_len: p.payload_len,
            seq_no: assignment.seq_of(p.index),
            dropped: drops.contains(&p.index),
        })
        .collect()
}

/// Everything a single run produced, in the shape the `--json` flag prints.
#[derive(Debug, Serialize)]
pub struct RunOutput {
    pub mode: &'static str,
    pub description: String,
    pub drop_indices: Vec<usize>,
    pub fingerprint: String,
    pub baseline: Vec<SequencedPacket>,
    pub after: Vec<SequencedPacket>,
    pub diff: DiffReport,
    pub summary: DiffSummary,
    pub counter_offsets: Vec<CounterOffset>,
}

fn seq_cell(seq: Option<u32>) -> String {
    seq.map_or("?".to_string(), |s| s.to_string())
}

fn code_cell(code: Option<u8>) -> String {
    code.map_or("-".to_string(), |c| c.to_string())
}

// Pads before painting so escape codes do not count towards the column width.
fn painted(text: &str, width: usize, colour: Colour) -> String {
    colour.paint(format!("{text:>width$}")).to_string()
}

fn painted_left(text: &str, width: usize, colour: Colour) -> String {
    colour.paint(format!("{text:<width$}")).to_string()
}

fn dropped_cell(dropped: bool) -> String {
    if dropped {
        painted("yes", 7, Colour::Red)
    } else {
        painted("no", 7, Colour::Green)
    }
}

fn status_cell(status: DiffStatus) -> String {
    let colour = match status {
        DiffStatus::Unchanged => Colour::Green,
        DiffStatus::Changed => Colour::Yellow,
        DiffStatus::Dropped => Colour::Red,
    };
    painted(&status.to_string(), 9, colour)
}

pub fn print_packet_table(packets: &[SequencedPacket], title: &str) {
    println!("\n\u{250F}\u{2501}\u{2501}\u{2501}\u{2501} {}", Colour::Fixed(226).paint(title));
    println!("\u{2503} {:>3}  {:>4}  {:<16}  {:>4}  {:>5}  {:>5}  {:>7}", "idx", "dir", "type", "code", "len", "seq", "dropped");
    println!("\u{2503} {}", "-".repeat(56));
    for p in packets {
        println!(
            "\u{2503} {:>3}  {:>4}  {:<16}  {:>4}  {:>5}  {:>5}  {}",
            p.index,
            p.direction.as_str(),
            p.msg_type,
            code_cell(p.msg_code),
            p.payload_len,
            seq_cell(p.seq_no),
            dropped_cell(p.dropped)
        );
    }
    println!("\u{2503}");
}

pub fn print_sequence_diff(report: &DiffReport, title: &str) {
    println!("\n\u{250F}\u{2501}\u{2501}\u{2501}\u{2501} {}", Colour::Fixed(226).paint(title));
    println!("\u{2503} {:>3}  {:>4}  {:<16}  {:>10}  {:>10}  {:>9}", "idx", "dir", "type", "seq_before", "seq_after", "status");
    println!("\u{2503} {}", "-".repeat(60));
    for e in report.entries() {
        println!(
            "\u{2503} {:>3}  {:>4}  {:<16}  {:>10}  {:>10}  {}",
            e.index, e.direction.as_str(), e.kind.label(), seq_cell(e.baseline_seq), seq_cell(e.attacked_seq), status_cell(e.status)
        );
    }
    println!("\u{2503}");
}

pub fn print_summary(report: &DiffReport) {
    let summary = report.summary();
    println!("\u{2503} Unchanged : {}", summary.unchanged);
    println!("\u{2503} Changed   : {}", Colour::Yellow.paint(summary.changed.to_string()));
    println!("\u{2503} Dropped   : {}", Colour::Red.paint(summary.dropped.to_string()));
    for offset in report.counter_offsets() {
        println!("\u{2503} {} counter offset : {:+}", offset.direction, offset.offset);
    }
    if report.is_desynchronized() {
        println!("\u{2503} {}", Colour::Red.bold().paint("Peers are out of sync, later packets carry shifted sequence numbers."));
    }
    println!("\u{2503}");
}

pub fn print_profiles(profiles: &[(&str, &str)]) {
    println!("\n\u{250F}\u{2501}\u{2501}\u{2501}\u{2501} Built-in profiles");
    for (name, description) in profiles {
        println!("\u{2503} {} {}", painted_left(name, 22, Colour::Fixed(226)), description);
    }
    println!("\u{2503}");
}

pub fn data_as_json<T: Serialize>(data: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(data)
}

pub fn data_to_file(json: &str, path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json)
}

/// Writes `baseline_trace_<ts>.json` and `post_attack_trace_<ts>.json` into `log_dir`.
pub fn write_run_logs(log_dir: &Path, baseline: &[SequencedPacket], after: &[SequencedPacket]) -> crate::Result<(PathBuf, PathBuf)> {
    let timestamp = Local::now().format("%Y%m%d-%H%M%S");
    let baseline_log = log_dir.join(format!("baseline_trace_{timestamp}.json"));
    let attacked_log = log_dir.join(format!("post_attack_trace_{timestamp}.json"));

    data_to_file(&data_as_json(&baseline)?, &baseline_log)?;
    data_to_file(&data_as_json(&after)?, &attacked_log)?;

    log::info!("Baseline trace written to {}", baseline_log.display());
    log::info!("Post-attack trace written to {}", attacked_log.display());
    Ok((baseline_log, attacked_log))
}
