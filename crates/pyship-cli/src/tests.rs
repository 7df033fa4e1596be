use super::*;

use std::path::PathBuf;

use clap::Parser;
use pyship_core::{DottedVersion, PackageMetadata};
use pyship_installer::{
    BootstrapAction, Classification, ClassificationDecision, DependencyReport, DependencySync,
    InstalledState, InstalledStateRecord, ProvisionReport, PthPatch, Recovered, RuntimeAction,
    RuntimeReport, StaleReason, WipeReport,
};

use crate::render::{
    format_probe_lines, format_report_lines, render_status_line, resolve_output_style,
    OutputStyle,
};

fn sample_metadata() -> PackageMetadata {
    PackageMetadata::parse(
        "AppName = Demo\nAppFolder = demo\nVersion = 1.2.0\nPythonVersion = 3.10.0\n",
        "3.10.0",
    )
    .expect("metadata")
}

fn sample_record() -> InstalledStateRecord {
    InstalledStateRecord {
        app_name: "Demo".to_string(),
        version: "1.2.0".to_string(),
        install_path: PathBuf::from("C:\\Apps\\Demo"),
        installed_at_unix: 0,
    }
}

fn sample_report() -> ProvisionReport {
    ProvisionReport {
        metadata: sample_metadata(),
        decision: ClassificationDecision {
            classification: Classification::CleanReinstall,
            recorded_version: Some("1.2.0".to_string()),
            ordering: None,
        },
        wipe: Some(WipeReport {
            removed: vec![PathBuf::from("Env")],
            preserved: vec![PathBuf::from("_internal")],
            failures: vec![Recovered::error("failed to remove demo.exe: access denied")],
        }),
        installed_state: InstalledState::NoPriorInstall,
        runtime: RuntimeReport {
            action: RuntimeAction::Provisioned {
                archive_url: "https://example.test/python.zip".to_string(),
                archive_sha256: "ab".repeat(32),
                files: 12,
            },
            pth: PthPatch::SkippedNoTemplate,
            recovered: vec![Recovered::warn("path template missing")],
        },
        package_manager: BootstrapAction::Installed {
            version_line: "pip 24.0".to_string(),
        },
        dependencies: DependencyReport {
            sync: DependencySync::Installed {
                specs: vec!["requests==2.31".to_string(), "pythonnet".to_string()],
            },
            recovered: Vec::new(),
        },
        record: sample_record(),
    }
}

#[test]
fn provision_requires_install_path_new_version_and_registry_id() {
    let cli = Cli::try_parse_from([
        "pyship",
        "provision",
        "--install-path",
        "C:\\Apps\\Demo",
        "--new-version",
        "1.2.0",
        "--registry-id",
        "{ABC}_is1",
    ])
    .expect("must parse");
    match cli.command {
        Commands::Provision(args) => {
            assert_eq!(args.install_path, PathBuf::from("C:\\Apps\\Demo"));
            assert_eq!(args.previous_version, None);
            assert_eq!(args.new_version, "1.2.0");
            assert_eq!(args.registry_id, "{ABC}_is1");
        }
        other => panic!("expected provision, got {other:?}"),
    }

    assert!(Cli::try_parse_from(["pyship", "provision", "--install-path", "x"]).is_err());
}

#[test]
fn registry_root_is_accepted_after_subcommand() {
    let cli = Cli::try_parse_from([
        "pyship",
        "probe",
        "--install-path",
        "/opt/demo",
        "--registry-id",
        "demo",
        "--registry-root",
        "/tmp/registry",
    ])
    .expect("must parse");
    assert_eq!(cli.registry_root, Some(PathBuf::from("/tmp/registry")));
}

#[test]
fn build_request_drops_blank_previous_version() {
    let request = build_request(
        PathBuf::from("/opt/demo"),
        Some("  ".to_string()),
        "1.0.0".to_string(),
        "demo".to_string(),
    );
    assert_eq!(request.previous_version, None);
    assert_eq!(request.new_version.as_deref(), Some("1.0.0"));
    assert!(request.preserve.len() <= 1);
}

#[test]
fn compare_line_reports_each_outcome() {
    assert_eq!(compare_line("1.10", "1.9"), "greater");
    assert_eq!(compare_line("1.0", "1.0.0"), "equal");
    assert_eq!(compare_line("0.9.9", "1"), "less");
    assert_eq!(compare_line("1.0-beta", "1.0"), "incomparable");
}

#[test]
fn pth_output_names_file_after_major_minor() {
    let (name, contents) = pth_output("3.11.4").expect("valid version");
    assert_eq!(name, "python311._pth");
    assert_eq!(contents, "python311.zip\nLib\n.\nimport site\n");
    assert!(pth_output("3.x").is_err());
}

#[test]
fn resolve_output_style_follows_stdout_tty() {
    assert_eq!(resolve_output_style(true), OutputStyle::Rich);
    assert_eq!(resolve_output_style(false), OutputStyle::Plain);
}

#[test]
fn render_status_line_plain_is_unadorned() {
    assert_eq!(
        render_status_line(OutputStyle::Plain, "ok", "provisioning complete"),
        "provisioning complete"
    );
    assert_eq!(
        render_status_line(OutputStyle::Rich, "warn", "path template missing"),
        "[WARN] path template missing"
    );
}

#[test]
fn format_report_lines_summarize_each_step() {
    let lines = format_report_lines(&sample_report(), OutputStyle::Rich);
    assert_eq!(
        lines,
        vec![
            "application: Demo 1.2.0",
            "classification: CleanReinstall",
            "installed state: NoPriorInstall",
            "wipe: removed 1 preserved 1 failed 1",
            "runtime: 3.10.0 provisioned (12 files)",
            "path file: template missing",
            "package manager: bootstrapped pip 24.0",
            "dependencies: requests==2.31, pythonnet",
            "[WARN] path template missing",
            "[ERROR] failed to remove demo.exe: access denied",
        ]
    );
}

#[test]
fn format_probe_lines_include_stale_reason() {
    let state = InstalledState::IncompatibleOrStale {
        record: sample_record(),
        reason: StaleReason::InterpreterMissing,
    };
    let lines = format_probe_lines(&state);
    assert_eq!(lines[0], "state: IncompatibleOrStale");
    assert_eq!(lines[1], "recorded: Demo 1.2.0");
    assert!(lines[2].contains("interpreter executable is missing"));

    let compatible = InstalledState::CompatibleInstall {
        record: sample_record(),
        runtime_version: DottedVersion::parse("3.10.0").expect("version"),
    };
    assert_eq!(format_probe_lines(&compatible)[2], "runtime: 3.10.0");
}
