use std::collections::BTreeSet;
use super::containers::{Assigned, Direction, SequenceAssignment, Trace};
use super::error::Result;
use super::profile::{self, AttackProfile};

/// Assigns implicit Binary Packet Protocol sequence numbers.
///
/// Each direction has its own counter starting at 0. Packets are numbered in trace order and the
/// counter for their direction advances by one (mod 2^32, like the real uint32 counter).
pub fn assign(trace: &Trace) -> SequenceAssignment {
    log::info!("Assigning sequence numbers to {} packets.", trace.len());
    let mut assignment = SequenceAssignment::default();

    for packet in trace {
        let counter = match packet.direction {
            Direction::ClientToServer => &mut assignment.next_client_to_server,
            Direction::ServerToClient => &mut assignment.next_server_to_client,
        };
        let seq = *counter;
        *counter = counter.wrapping_add(1);

        log::debug!("Packet {} {} {} -> seq {seq}", packet.index, packet.direction, packet.kind);
        assignment.entries.insert(
            packet.index,
            Assigned {
                seq,
                direction: packet.direction,
            },
        );
    }

    assignment
}

/// Builds the trace the receiver actually sees once `drops` are removed from the wire.
///
/// Surviving packets keep their original index and relative order; nothing is put in place of a
/// dropped packet.
pub fn apply_drops(trace: &Trace, drops: &BTreeSet<usize>) -> Trace {
    Trace::from_packets(
        trace
            .iter()
            .filter(|packet| !drops.contains(&packet.index))
            .cloned()
            .collect(),
    )
}

/// Runs an attack profile against a trace and renumbers what is left.
pub fn apply(trace: &Trace, profile: &AttackProfile) -> Result<(Trace, SequenceAssignment)> {
    let drops = profile::resolve(profile, trace)?;
    log::info!("Applying {}, dropping packet indices {:?}", profile.describe(), drops);

    let mutated = apply_drops(trace, &drops);
    let attacked = assign(&mutated);

    Ok((mutated, attacked))
}
