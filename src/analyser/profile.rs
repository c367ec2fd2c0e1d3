//! Attack profiles: which packets the on-path attacker removes before the receiver counts them.
use std::collections::{BTreeMap, BTreeSet};
use lazy_static::lazy_static;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use super::containers::{Direction, Trace};
use super::error::{AnalysisError, Result};

pub struct NamedProfile {
    pub description: &'static str,
    pub drop_indices: &'static [usize],
}

// Indices refer to data/sample_trace.json. On any other trace these are just literal positions,
// no matching by kind or direction is attempted.
lazy_static! {
    static ref NAMED_PROFILES: BTreeMap<&'static str, NamedProfile> = {
        let mut m = BTreeMap::new();
        m.insert("drop_client_kexinit", NamedProfile {
            description: "Drop the initial client KEXINIT",
            drop_indices: &[0],
        });
        m.insert("drop_ext_info", NamedProfile {
            description: "Drop the client EXT_INFO",
            drop_indices: &[2],
        });
        m.insert("drop_server_ignore", NamedProfile {
            description: "Drop the server IGNORE sent before key exchange",
            drop_indices: &[3],
        });
        m
    };
}

/// Name and description of every built-in profile.
pub fn named_profiles() -> Vec<(&'static str, &'static str)> {
    NAMED_PROFILES
        .iter()
        .map(|(name, profile)| (*name, profile.description))
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttackProfile {
    /// A built-in profile looked up by name.
    Named(String),
    /// Arbitrary indices, with an optional label for display.
    Explicit {
        drop_indices: BTreeSet<usize>,
        description: Option<String>,
    },
    /// `count` distinct packets picked by a ChaCha20 generator seeded with `seed`,
    /// optionally only from one direction.
    Random {
        count: usize,
        seed: u64,
        direction: Option<Direction>,
    },
}

impl AttackProfile {
    pub fn named(name: impl Into<String>) -> Self {
        AttackProfile::Named(name.into())
    }

    pub fn explicit(drop_indices: impl IntoIterator<Item = usize>) -> Self {
        AttackProfile::Explicit {
            drop_indices: drop_indices.into_iter().collect(),
            description: None,
        }
    }

    pub fn random(count: usize, seed: u64) -> Self {
        AttackProfile::Random {
            count,
            seed,
            direction: None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            AttackProfile::Named(name) => match NAMED_PROFILES.get(name.as_str()) {
                Some(profile) => format!("profile '{name}' ({})", profile.description),
                None => format!("profile '{name}'"),
            },
            AttackProfile::Explicit { description: Some(description), .. } => description.clone(),
            AttackProfile::Explicit { description: None, .. } => "explicit drop list".to_string(),
            AttackProfile::Random { count, seed, direction } => {
                let pool = direction.map_or("any direction".to_string(), |d| format!("{d} packets"));
                format!("random drop of {count} from {pool} (seed {seed})")
            }
        }
    }
}

fn check_range(indices: impl IntoIterator<Item = usize>, len: usize) -> Result<BTreeSet<usize>> {
    indices
        .into_iter()
        .map(|index| {
            if index < len {
                Ok(index)
            } else {
                Err(AnalysisError::InvalidDropIndex { index, len })
            }
        })
        .collect()
}

fn draw_random(trace: &Trace, count: usize, seed: u64, direction: Option<Direction>) -> Result<BTreeSet<usize>> {
    let pool: Vec<usize> = trace
        .iter()
        .filter(|p| direction.map_or(true, |d| p.direction == d))
        .map(|p| p.index)
        .collect();

    if count > pool.len() {
        return Err(AnalysisError::InsufficientPackets {
            requested: count,
            available: pool.len(),
        });
    }

    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    Ok(rand::seq::index::sample(&mut rng, pool.len(), count)
        .into_iter()
        .map(|i| pool[i])
        .collect())
}

/// Resolves a profile to the set of packet indices to remove from `trace`.
pub fn resolve(profile: &AttackProfile, trace: &Trace) -> Result<BTreeSet<usize>> {
    match profile {
        AttackProfile::Named(name) => {
            let named = NAMED_PROFILES
                .get(name.as_str())
                .ok_or_else(|| AnalysisError::UnknownProfile(name.clone()))?;
            check_range(named.drop_indices.iter().copied(), trace.len())
        }
        AttackProfile::Explicit { drop_indices, .. } => check_range(drop_indices.iter().copied(), trace.len()),
        AttackProfile::Random { count, seed, direction } => draw_random(trace, *count, *seed, *direction),
    }
}
