//! YAML run configuration for the `attack` subcommand.
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Deserializer};
use crate::analyser::{AttackProfile, Direction};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct ProfileSpec {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub drop_indices: Vec<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RandomSpec {
    pub count: usize,
    pub seed: u64,
    #[serde(default, deserialize_with = "direction_alias")]
    pub direction: Option<Direction>,
}

// Same spellings the trace loader accepts ("C->S", "c2s", "client_to_server", ...).
fn direction_alias<'de, D>(deserializer: D) -> std::result::Result<Option<Direction>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|s| s.parse::<Direction>().map_err(serde::de::Error::custom))
        .transpose()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DemoConfig {
    #[serde(default, alias = "trace_file")]
    pub pcap_file: Option<PathBuf>,
    #[serde(default)]
    pub active_profile: Option<String>,
    #[serde(default)]
    pub profiles: BTreeMap<String, ProfileSpec>,
    #[serde(default)]
    pub drop_indices: Vec<usize>,
    #[serde(default)]
    pub random: Option<RandomSpec>,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl DemoConfig {
    pub fn load(path: &Path) -> Result<Self> {
        log::info!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path)?;
        let mut config: DemoConfig = serde_yaml::from_str(&content)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Trace file named by the config. Relative paths that do not exist from the working
    /// directory are tried next to the config file.
    pub fn trace_path(&self) -> Result<PathBuf> {
        let path = self
            .pcap_file
            .as_ref()
            .ok_or_else(|| Error::Config("missing required key 'pcap_file'".to_string()))?;

        if path.is_absolute() || path.exists() {
            return Ok(path.clone());
        }
        match &self.base_dir {
            Some(base) if base.join(path).exists() => Ok(base.join(path)),
            _ => Ok(path.clone()),
        }
    }

    /// Picks the attack profile this config describes.
    ///
    /// An `active_profile` defined under `profiles` wins, then an `active_profile` naming a
    /// built-in profile, then `random`, then the top-level `drop_indices`.
    pub fn select_profile(&self) -> AttackProfile {
        if let Some(name) = &self.active_profile {
            return self.select_profile_named(name);
        }

        if let Some(random) = &self.random {
            return AttackProfile::Random {
                count: random.count,
                seed: random.seed,
                direction: random.direction,
            };
        }

        if self.drop_indices.is_empty() {
            log::warn!("No profile configured, nothing will be dropped.");
        }
        AttackProfile::Explicit {
            drop_indices: self.drop_indices.iter().copied().collect(),
            description: Some("top-level drop_indices".to_string()),
        }
    }

    /// Profile called `name`: one defined under `profiles`, otherwise a built-in one.
    pub fn select_profile_named(&self, name: &str) -> AttackProfile {
        match self.profiles.get(name) {
            Some(spec) => AttackProfile::Explicit {
                drop_indices: spec.drop_indices.iter().copied().collect(),
                description: Some(
                    spec.description
                        .clone()
                        .unwrap_or_else(|| format!("profile '{name}'")),
                ),
            },
            None => {
                log::debug!("'{name}' not defined in config, treating it as a built-in profile");
                AttackProfile::named(name)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn parse(yaml: &str) -> DemoConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn config_profile_wins() {
        let config = parse(
            r#"
pcap_file: data/sample_trace.json
active_profile: drop_ext_info
profiles:
  drop_ext_info:
    description: "Drop client EXT_INFO"
    drop_indices: [2]
drop_indices: [5]
"#,
        );
        assert_eq!(
            config.select_profile(),
            AttackProfile::Explicit {
                drop_indices: BTreeSet::from([2]),
                description: Some("Drop client EXT_INFO".to_string()),
            }
        );
    }

    #[test]
    fn undefined_active_profile_falls_back_to_builtin() {
        let config = parse("pcap_file: t.json\nactive_profile: drop_client_kexinit\n");
        assert_eq!(config.select_profile(), AttackProfile::named("drop_client_kexinit"));
    }

    #[test]
    fn random_section_is_used_without_active_profile() {
        let config = parse("trace_file: t.json\nrandom:\n  count: 2\n  seed: 9\n  direction: \"C->S\"\n");
        assert_eq!(
            config.select_profile(),
            AttackProfile::Random {
                count: 2,
                seed: 9,
                direction: Some(Direction::ClientToServer),
            }
        );
        assert_eq!(config.pcap_file, Some(PathBuf::from("t.json")));
    }

    #[test]
    fn random_direction_accepts_loader_aliases() {
        for spelling in ["c2s", "client_to_server", "C->S"] {
            let config = parse(&format!("pcap_file: t.json\nrandom:\n  count: 1\n  seed: 0\n  direction: \"{spelling}\"\n"));
            assert_eq!(config.random.unwrap().direction, Some(Direction::ClientToServer), "{spelling}");
        }
        let config = parse("pcap_file: t.json\nrandom:\n  count: 1\n  seed: 0\n  direction: s2c\n");
        assert_eq!(config.random.unwrap().direction, Some(Direction::ServerToClient));

        let config = parse("pcap_file: t.json\nrandom:\n  count: 1\n  seed: 0\n");
        assert_eq!(config.random.unwrap().direction, None);

        let bad = serde_yaml::from_str::<DemoConfig>("random:\n  count: 1\n  seed: 0\n  direction: sideways\n");
        assert!(bad.is_err());
    }

    #[test]
    fn top_level_drop_indices_are_the_last_resort() {
        let config = parse("pcap_file: t.json\ndrop_indices: [1, 4]\n");
        match config.select_profile() {
            AttackProfile::Explicit { drop_indices, .. } => assert_eq!(drop_indices, BTreeSet::from([1, 4])),
            other => panic!("unexpected profile {other:?}"),
        }
    }

    #[test]
    fn missing_trace_path_is_a_config_error() {
        let config = parse("drop_indices: []\n");
        assert!(matches!(config.trace_path(), Err(Error::Config(_))));
    }
}
