//! Configuration loading and the full attack pipeline driven by a config file.

use seqdrift::analyser::{self, AttackProfile, AnalysisError, DiffStatus};
use seqdrift::analyser::utils::load_file;
use seqdrift::config::DemoConfig;
use seqdrift::Error;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

#[test]
fn test_bundled_config_runs_end_to_end() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/demo_config.yaml");
    let config = DemoConfig::load(&path).expect("bundled config should parse");

    let trace = load_file(&config.trace_path().unwrap()).unwrap();
    let profile = config.select_profile();
    assert!(profile.describe().contains("EXT_INFO"));

    let baseline = analyser::assign(&trace);
    let (_, attacked) = analyser::apply(&trace, &profile).unwrap();
    let report = analyser::compare(&baseline, &attacked, &trace);
    assert_eq!(report.get(2).unwrap().status, DiffStatus::Dropped);
    assert!(report.is_desynchronized());
}

#[test]
fn test_trace_path_resolves_next_to_config() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("trace.json"),
        r#"[{"direction": "C->S", "msg_type": "KEXINIT"}, {"direction": "S->C"}]"#,
    )
    .unwrap();
    let config_path = dir.path().join("run.yaml");
    fs::write(&config_path, "trace_file: trace.json\nrandom:\n  count: 1\n  seed: 3\n").unwrap();

    let config = DemoConfig::load(&config_path).unwrap();
    assert_eq!(config.trace_path().unwrap(), dir.path().join("trace.json"));

    let trace = load_file(&config.trace_path().unwrap()).unwrap();
    let drops = analyser::resolve(&config.select_profile(), &trace).unwrap();
    assert_eq!(drops.len(), 1);
}

#[test]
fn test_unknown_builtin_profile_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("run.yaml");
    fs::write(&config_path, "pcap_file: t.json\nactive_profile: drop_everything\n").unwrap();

    let config = DemoConfig::load(&config_path).unwrap();
    let trace = analyser::load(Vec::new()).unwrap();
    let err = analyser::apply(&trace, &config.select_profile()).unwrap_err();
    assert_eq!(err, AnalysisError::UnknownProfile("drop_everything".to_string()));
}

#[test]
fn test_malformed_files_surface_errors() {
    let dir = tempfile::tempdir().unwrap();

    let bad_trace = dir.path().join("bad.json");
    fs::write(&bad_trace, r#"[{"msg_type": "KEXINIT"}]"#).unwrap();
    assert!(matches!(
        load_file(&bad_trace),
        Err(Error::Analysis(AnalysisError::MalformedTrace(_)))
    ));

    let not_json = dir.path().join("not.json");
    fs::write(&not_json, "this is not json").unwrap();
    assert!(matches!(load_file(&not_json), Err(Error::Json(_))));

    let bad_yaml = dir.path().join("bad.yaml");
    fs::write(&bad_yaml, "- just\n- a list\n").unwrap();
    assert!(matches!(DemoConfig::load(&bad_yaml), Err(Error::Yaml(_))));

    assert!(matches!(load_file(&dir.path().join("missing.json")), Err(Error::Io(_))));
}

#[test]
fn test_explicit_profile_from_config_keeps_description() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("run.yaml");
    fs::write(
        &config_path,
        "pcap_file: t.json\nactive_profile: both\nprofiles:\n  both:\n    drop_indices: [0, 2]\n",
    )
    .unwrap();

    let config = DemoConfig::load(&config_path).unwrap();
    assert_eq!(
        config.select_profile(),
        AttackProfile::Explicit {
            drop_indices: BTreeSet::from([0, 2]),
            description: Some("profile 'both'".to_string()),
        }
    );
}

#[test]
fn test_profile_chosen_by_name_prefers_config_definitions() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/demo_config.yaml");
    let config = DemoConfig::load(&path).unwrap();

    // Not a built-in name, only defined in the bundled config.
    let profile = config.select_profile_named("drop_first_two_client");
    assert_eq!(
        profile,
        AttackProfile::Explicit {
            drop_indices: BTreeSet::from([0, 2]),
            description: Some("Drop the client KEXINIT and EXT_INFO".to_string()),
        }
    );

    let trace = load_file(&config.trace_path().unwrap()).unwrap();
    let baseline = analyser::assign(&trace);
    let (_, attacked) = analyser::apply(&trace, &profile).unwrap();
    let report = analyser::compare(&baseline, &attacked, &trace);
    let dropped: Vec<usize> = report
        .entries()
        .iter()
        .filter(|e| e.status == DiffStatus::Dropped)
        .map(|e| e.index)
        .collect();
    assert_eq!(dropped, vec![0, 2]);

    // Names missing from the config still reach the built-in table.
    assert_eq!(
        config.select_profile_named("drop_server_ignore"),
        AttackProfile::named("drop_server_ignore")
    );
}
