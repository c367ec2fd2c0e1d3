use super::containers::{DiffEntry, DiffReport, DiffStatus, SequenceAssignment, Trace};

/// Compares baseline and attacked sequence numbers packet by packet.
///
/// Entries are joined on the original packet index, never on position, so a packet that moved up
/// one slot after an earlier drop is reported as the same packet with a new sequence number.
pub fn compare(baseline: &SequenceAssignment, attacked: &SequenceAssignment, trace: &Trace) -> DiffReport {
    log::info!("Comparing sequence assignments over {} packets.", trace.len());

    let mut entries: Vec<DiffEntry> = trace
        .iter()
        .map(|packet| {
            let baseline_seq = baseline.seq_of(packet.index);
            let attacked_seq = attacked.seq_of(packet.index);

            let status = match attacked_seq {
                None => DiffStatus::Dropped,
                Some(after) if baseline_seq == Some(after) => DiffStatus::Unchanged,
                Some(_) => DiffStatus::Changed,
            };

            if status == DiffStatus::Changed {
                log::debug!(
                    "Packet {} {} {}: seq {:?} -> {:?}",
                    packet.index, packet.direction, packet.kind, baseline_seq, attacked_seq
                );
            }

            DiffEntry {
                index: packet.index,
                direction: packet.direction,
                kind: packet.kind.clone(),
                baseline_seq,
                attacked_seq,
                status,
            }
        })
        .collect();

    entries.sort_by_key(|e| e.index);
    DiffReport { entries }
}
