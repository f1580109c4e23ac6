//! Integration tests for deployment loading.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use remedy::config::{ConfigSource, DeploymentConfig, load_troubleshooter};
use remedy_core::{Machine, RemedyError, SessionState};
use std::io::Write;

const PLANT: &str = r#"
[deployment]
name = "Plant Power"
fallback = { fixed = ["power_cycle"] }

[[procedures]]
id = "power_cycle"
title = "Power Cycle"
steps = ["Switch off", "Wait 30 seconds", "Switch on"]

[[procedures]]
id = "safety_systems"
title = "Safety Systems"
steps = ["Check the earth bond"]

[[rules]]
category = "Inverter Faults"
procedures = ["power_cycle"]

[[sheets]]
name = "Inverter Faults"
headers = ["Alarms / Reasons", "Reason 1", "Reason 2"]
rows = [
    ["Overvoltage", "Check the DC input", "nan"],
    ["", "", ""],
    ["Issues", "", ""],
    ["Overvoltage", "Duplicate row", ""],
    ["Ground Fault", "", ""],
]

[[sheets]]
name = "States"
headers = ["Alarms / Reasons"]
rows = [["Standby"]]
"#;

fn write_deployment(text: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(text.as_bytes()).unwrap();
    file
}

#[test]
fn test_file_deployment_with_sheets() {
    let file = write_deployment(PLANT);

    let source = ConfigSource::File(file.path().to_path_buf());
    let (troubleshooter, source) = load_troubleshooter(Some(&source)).unwrap();

    assert_eq!(source, ConfigSource::File(file.path().to_path_buf()));
    assert_eq!(troubleshooter.name(), "Plant Power");
    // The States sheet is not a category.
    assert_eq!(troubleshooter.store().list_categories().len(), 1);
    let names: Vec<&str> = troubleshooter
        .store()
        .category("Inverter Faults")
        .unwrap()
        .fault_names()
        .collect();
    assert_eq!(names, vec!["Overvoltage", "Ground Fault"]);
    assert_eq!(
        troubleshooter
            .direct_steps("Inverter Faults", "Overvoltage")
            .unwrap(),
        &["Check the DC input".to_string()]
    );
    assert!(matches!(
        troubleshooter.direct_steps("Inverter Faults", "Ground Fault"),
        Err(RemedyError::EmptyStepSet { .. })
    ));

    let mut session = troubleshooter
        .start_session("Inverter Faults", "Ground Fault")
        .unwrap();
    assert_eq!(session.total(), 4);
    for i in 0..4 {
        session.complete_step(i).unwrap();
    }
    assert_eq!(session.state(), SessionState::AwaitingResolution);
}

#[test]
fn test_unknown_rule_procedure_rejected() {
    let file = write_deployment(
        r#"
[deployment]
name = "Broken"

[[procedures]]
id = "safety_systems"
title = "Safety"
steps = ["Check"]

[[rules]]
keywords = ["pressure"]
procedures = ["pressure_test"]
"#,
    );

    let result = load_troubleshooter(Some(&ConfigSource::File(
        file.path().to_path_buf(),
    )));

    assert!(matches!(
        result,
        Err(RemedyError::ProcedureNotFound(_) | RemedyError::InvalidRule(_))
    ));
}

#[test]
fn test_missing_safety_procedure_rejected() {
    let config = DeploymentConfig::from_toml(
        r#"
[deployment]
name = "No Safety"

[[procedures]]
id = "power_cycle"
title = "Power Cycle"
steps = ["Switch off"]
"#,
    )
    .unwrap();

    assert!(config.build().is_err());
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let result = DeploymentConfig::from_file(&path);

    assert!(matches!(result, Err(RemedyError::Io(_))));
}

#[test]
fn test_directory_is_not_a_deployment() {
    let dir = tempfile::tempdir().unwrap();

    let result = DeploymentConfig::from_file(dir.path());

    assert!(matches!(result, Err(RemedyError::Io(_))));
}

#[test]
fn test_each_builtin_machine_selects_procedures() {
    let cases = [
        (
            Machine::Pms,
            "Power Management System (PMS)",
            "Current & Load-Related Errors",
            "Overload Detection",
            vec!["power_cycle", "system_check", "safety_systems"],
        ),
        (
            Machine::Hemodialysis,
            "Hemodialysis Machine",
            "Blood Circuit Errors",
            "Air Detector Alarm",
            vec!["connections_check", "safety_systems"],
        ),
        (
            Machine::Up7000,
            "UP-7000 Patient Monitoring System",
            "ECG Issues",
            "Lead Off Message",
            vec!["connections_check", "system_check", "safety_systems"],
        ),
    ];

    for (machine, name, category, fault, expected) in cases {
        let (troubleshooter, source) =
            load_troubleshooter(Some(&ConfigSource::Builtin(machine))).unwrap();
        assert_eq!(source, ConfigSource::Builtin(machine));
        assert_eq!(troubleshooter.name(), name);

        let plan = troubleshooter.plan(category, fault).unwrap();
        let ids: Vec<&str> = plan.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, expected, "{}", machine);
    }
}

#[test]
fn test_pms_codes_reach_faults() {
    let (troubleshooter, _) =
        load_troubleshooter(Some(&ConfigSource::Builtin(Machine::Pms))).unwrap();
    let codes: Vec<(&str, &str)> = troubleshooter
        .store()
        .list_categories()
        .iter()
        .flat_map(|c| c.faults())
        .filter_map(|f| f.code.as_deref().map(|code| (code, f.name.as_str())))
        .collect();

    assert_eq!(codes.len(), 6);
    assert!(codes.contains(&("E01", "Low Battery Voltage")));
    assert!(codes.contains(&("E06", "Microcontroller Failure")));
}

#[test]
fn test_config_arg_prefers_existing_file_over_machine_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pms");
    std::fs::write(&path, PLANT).unwrap();

    assert_eq!(ConfigSource::from_arg(&path), ConfigSource::File(path.clone()));
    assert_eq!(
        ConfigSource::from_arg(std::path::Path::new("pms")),
        ConfigSource::Builtin(Machine::Pms)
    );
}
