use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Direction a packet travels in. Each direction owns an independent sequence counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "C->S")]
    ClientToServer,
    #[serde(rename = "S->C")]
    ServerToClient,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::ClientToServer, Direction::ServerToClient];

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::ClientToServer => "C->S",
            Direction::ServerToClient => "S->C",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c->s" | "c2s" | "client_to_server" => Ok(Direction::ClientToServer),
            "s->c" | "s2c" | "server_to_client" => Ok(Direction::ServerToClient),
            other => Err(format!("unrecognised direction '{other}'")),
        }
    }
}

/// SSH transport message label. Unknown labels are kept as-is so new packet types load fine.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MessageKind {
    Ignore,
    ServiceRequest,
    ServiceAccept,
    ExtInfo,
    KexInit,
    NewKeys,
    KexEcdhInit,
    KexEcdhReply,
    Other(String),
}

impl MessageKind {
    /// Message number from RFC 4253 / RFC 5656 / RFC 8308, if the label is a known one.
    pub fn message_code(&self) -> Option<u8> {
        match self {
            MessageKind::Ignore => Some(2),
            MessageKind::ServiceRequest => Some(5),
            MessageKind::ServiceAccept => Some(6),
            MessageKind::ExtInfo => Some(7),
            MessageKind::KexInit => Some(20),
            MessageKind::NewKeys => Some(21),
            MessageKind::KexEcdhInit => Some(30),
            MessageKind::KexEcdhReply => Some(31),
            MessageKind::Other(_) => None,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            MessageKind::Ignore => "IGNORE",
            MessageKind::ServiceRequest => "SERVICE_REQUEST",
            MessageKind::ServiceAccept => "SERVICE_ACCEPT",
            MessageKind::ExtInfo => "EXT_INFO",
            MessageKind::KexInit => "KEXINIT",
            MessageKind::NewKeys => "NEWKEYS",
            MessageKind::KexEcdhInit => "KEX_ECDH_INIT",
            MessageKind::KexEcdhReply => "KEX_ECDH_REPLY",
            MessageKind::Other(label) => label,
        }
    }
}

impl From<&str> for MessageKind {
    fn from(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().trim_start_matches("SSH_MSG_") {
            "IGNORE" => MessageKind::Ignore,
            "SERVICE_REQUEST" => MessageKind::ServiceRequest,
            "SERVICE_ACCEPT" => MessageKind::ServiceAccept,
            "EXT_INFO" => MessageKind::ExtInfo,
            "KEXINIT" => MessageKind::KexInit,
            "NEWKEYS" => MessageKind::NewKeys,
            "KEX_ECDH_INIT" => MessageKind::KexEcdhInit,
            "KEX_ECDH_REPLY" => MessageKind::KexEcdhReply,
            _ => MessageKind::Other(label.to_string()),
        }
    }
}

impl From<String> for MessageKind {
    fn from(label: String) -> Self {
        MessageKind::from(label.as_str())
    }
}

impl From<MessageKind> for String {
    fn from(kind: MessageKind) -> Self {
        kind.label().to_string()
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A record as it comes out of a trace file, before validation.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawPacket {
    #[serde(default)]
    pub index: Option<usize>,
    #[serde(default)]
    pub direction: Option<String>,
    #[serde(default, alias = "kind")]
    pub msg_type: Option<String>,
    #[serde(default)]
    pub payload_len: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Packet {
    pub index: usize,
    pub direction: Direction,
    #[serde(rename = "msg_type")]
    pub kind: MessageKind,
    pub payload_len: u32,
}

impl Packet {
    pub fn new(index: usize, direction: Direction, kind: impl Into<MessageKind>) -> Self {
        Self {
            index,
            direction,
            kind: kind.into(),
            payload_len: 0,
        }
    }
}

/// Ordered handshake packets. Wire order is the order sequence numbers are assigned in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Trace {
    packets: Vec<Packet>,
}

impl Trace {
    pub(crate) fn from_packets(packets: Vec<Packet>) -> Self {
        Self { packets }
    }

    pub fn packets(&self) -> &[Packet] {
        &self.packets
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Packet> {
        self.packets.iter()
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// Original indices in wire order.
    pub fn indices(&self) -> Vec<usize> {
        self.packets.iter().map(|p| p.index).collect()
    }

    /// HASSH-style MD5 over the `direction:kind` sequence.
    pub fn fingerprint(&self) -> String {
        let shape = self
            .packets
            .iter()
            .map(|p| format!("{}:{}", p.direction, p.kind))
            .collect::<Vec<_>>()
            .join(",");
        super::utils::get_md5_hash(shape)
    }
}

impl<'a> IntoIterator for &'a Trace {
    type Item = &'a Packet;
    type IntoIter = std::slice::Iter<'a, Packet>;

    fn into_iter(self) -> Self::IntoIter {
        self.packets.iter()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Assigned {
    pub seq: u32,
    pub direction: Direction,
}

/// Packet index -> sequence number, plus where each direction's counter ended up.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SequenceAssignment {
    pub(crate) entries: BTreeMap<usize, Assigned>,
    pub(crate) next_client_to_server: u32,
    pub(crate) next_server_to_client: u32,
}

impl SequenceAssignment {
    pub fn get(&self, index: usize) -> Option<&Assigned> {
        self.entries.get(&index)
    }

    pub fn seq_of(&self, index: usize) -> Option<u32> {
        self.entries.get(&index).map(|a| a.seq)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.entries.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Assigned)> {
        self.entries.iter().map(|(i, a)| (*i, a))
    }

    /// The value the counter for `direction` would hand to the next packet.
    pub fn next_seq(&self, direction: Direction) -> u32 {
        match direction {
            Direction::ClientToServer => self.next_client_to_server,
            Direction::ServerToClient => self.next_server_to_client,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffStatus {
    Unchanged,
    Changed,
    Dropped,
}

impl fmt::Display for DiffStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            DiffStatus::Unchanged => "unchanged",
            DiffStatus::Changed => "changed",
            DiffStatus::Dropped => "dropped",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiffEntry {
    pub index: usize,
    pub direction: Direction,
    #[serde(rename = "msg_type")]
    pub kind: MessageKind,
    #[serde(rename = "seq_before")]
    pub baseline_seq: Option<u32>,
    #[serde(rename = "seq_after")]
    pub attacked_seq: Option<u32>,
    pub status: DiffStatus,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub unchanged: usize,
    pub changed: usize,
    pub dropped: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CounterOffset {
    pub direction: Direction,
    /// Attacked final counter minus baseline final counter. Negative means the receiver lags.
    pub offset: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DiffReport {
    pub(crate) entries: Vec<DiffEntry>,
}

impl DiffReport {
    pub fn entries(&self) -> &[DiffEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&DiffEntry> {
        self.entries
            .binary_search_by_key(&index, |e| e.index)
            .ok()
            .map(|pos| &self.entries[pos])
    }

    pub fn summary(&self) -> DiffSummary {
        let mut summary = DiffSummary::default();
        for entry in &self.entries {
            match entry.status {
                DiffStatus::Unchanged => summary.unchanged += 1,
                DiffStatus::Changed => summary.changed += 1,
                DiffStatus::Dropped => summary.dropped += 1,
            }
        }
        summary
    }

    /// True if any surviving packet now carries a different sequence number.
    pub fn is_desynchronized(&self) -> bool {
        self.entries.iter().any(|e| e.status == DiffStatus::Changed)
    }

    pub fn counter_offsets(&self) -> Vec<CounterOffset> {
        Direction::ALL
            .iter()
            .map(|&direction| {
                let in_direction = self.entries.iter().filter(|e| e.direction == direction);
                let (baseline, attacked) = in_direction.fold((0i64, 0i64), |(b, a), e| {
                    (
                        b + i64::from(e.baseline_seq.is_some()),
                        a + i64::from(e.attacked_seq.is_some()),
                    )
                });
                CounterOffset {
                    direction,
                    offset: attacked - baseline,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_parses_aliases() {
        assert_eq!("C->S".parse::<Direction>(), Ok(Direction::ClientToServer));
        assert_eq!("server_to_client".parse::<Direction>(), Ok(Direction::ServerToClient));
        assert_eq!("s2c".parse::<Direction>(), Ok(Direction::ServerToClient));
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn message_kind_keeps_unknown_labels() {
        assert_eq!(MessageKind::from("KEXINIT"), MessageKind::KexInit);
        assert_eq!(MessageKind::from("SSH_MSG_NEWKEYS"), MessageKind::NewKeys);
        assert_eq!(MessageKind::NewKeys.message_code(), Some(21));

        let odd = MessageKind::from("PING@openssh.com");
        assert_eq!(odd, MessageKind::Other("PING@openssh.com".to_string()));
        assert_eq!(odd.to_string(), "PING@openssh.com");
        assert_eq!(odd.message_code(), None);
    }

    #[test]
    fn packet_serializes_with_wire_labels() {
        let packet = Packet::new(3, Direction::ServerToClient, "EXT_INFO");
        let json = serde_json::to_value(&packet).unwrap();
        assert_eq!(json["direction"], "S->C");
        assert_eq!(json["msg_type"], "EXT_INFO");
        assert_eq!(json["index"], 3);
    }
}
