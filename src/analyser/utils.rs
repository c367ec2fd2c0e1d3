//! Contains utilities for turning raw trace records into a validated [Trace].
use std::fs;
use std::path::Path;
use md5::{Digest, Md5};
use super::containers::{Direction, MessageKind, Packet, RawPacket, Trace};
use super::error::{AnalysisError, Result};
use hex;

/// Kind assigned to records that carry no label at all.
pub const DEFAULT_KIND: &str = "generic";

/// Validates raw records and builds a [Trace].
///
/// Records either all carry an explicit `index` or none do. Without indices, list position is the
/// wire order. With indices, they must cover `0..len` exactly once and the trace is ordered by
/// them. A record with no direction, or one that cannot be parsed, is rejected. `kind` is never
/// validated.
pub fn load(raw: Vec<RawPacket>) -> Result<Trace> {
    log::info!("Loading trace from {} raw records.", raw.len());
    let len = raw.len();

    let explicit = raw.iter().filter(|r| r.index.is_some()).count();
    if explicit != 0 && explicit != len {
        return Err(AnalysisError::MalformedTrace(format!(
            "{explicit} of {len} records carry an index, order is ambiguous"
        )));
    }

    let mut slots: Vec<Option<Packet>> = vec![None; len];

    for (position, record) in raw.into_iter().enumerate() {
        let index = record.index.unwrap_or(position);
        if index >= len {
            return Err(AnalysisError::MalformedTrace(format!(
                "record {position} has index {index}, expected one of 0..{len}"
            )));
        }

        let direction = match record.direction.as_deref() {
            Some(direction) => direction
                .parse::<Direction>()
                .map_err(|e| AnalysisError::MalformedTrace(format!("record {position}: {e}")))?,
            None => {
                return Err(AnalysisError::MalformedTrace(format!(
                    "record {position} has no direction"
                )))
            }
        };

        let kind = match record.msg_type {
            Some(label) => MessageKind::from(label),
            None => MessageKind::from(DEFAULT_KIND),
        };

        let slot = &mut slots[index];
        if slot.is_some() {
            return Err(AnalysisError::MalformedTrace(format!(
                "index {index} appears more than once"
            )));
        }

        log::debug!("Record {position} -> packet {index} {direction} {kind}");
        *slot = Some(Packet {
            index,
            direction,
            kind,
            payload_len: record.payload_len.unwrap_or(0),
        });
    }

    // len records landed in len distinct slots, so every slot is filled.
    Ok(Trace::from_packets(slots.into_iter().flatten().collect()))
}

/// Reads a JSON array of raw records from disk and loads it.
pub fn load_file(path: &Path) -> crate::Result<Trace> {
    log::info!("Reading trace from {}", path.display());
    let content = fs::read_to_string(path)?;
    let raw: Vec<RawPacket> = serde_json::from_str(&content)?;
    Ok(load(raw)?)
}

/// MD5 hex digest, used for HASSH-style trace fingerprints.
pub fn get_md5_hash(string_in: String) -> String {
    let mut hasher = Md5::new();
    hasher.update(string_in);
    let result = hasher.finalize();

    hex::encode(result)
}
