//! The core of the sequence-drift simulation.
//! Number handshake packets per direction, remove what an on-path attacker drops, and compare.
pub mod utils;
pub mod core;
pub mod profile;
pub mod diff;
pub mod containers;
pub mod error;

pub use self::containers::{
    CounterOffset, Direction, DiffEntry, DiffReport, DiffStatus, DiffSummary, MessageKind, Packet,
    RawPacket, SequenceAssignment, Trace,
};
pub use self::core::{apply, apply_drops, assign};
pub use self::diff::compare;
pub use self::error::AnalysisError;
pub use self::profile::{resolve, AttackProfile};
pub use self::utils::load;
