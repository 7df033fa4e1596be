use proptest::prelude::*;

use super::*;

#[test]
fn compare_is_numeric_not_lexical() {
    assert_eq!(compare_versions("1.10.0", "1.9.0"), VersionOrdering::Greater);
    assert_eq!(compare_versions("0.9.0", "1.0.0"), VersionOrdering::Less);
    assert_eq!(compare_versions("2.0.0", "1.0.0"), VersionOrdering::Greater);
    assert_eq!(compare_versions("1.0.0", "1.0.0"), VersionOrdering::Equal);
}

#[test]
fn compare_treats_missing_trailing_segments_as_zero() {
    assert_eq!(compare_versions("1.0", "1.0.0"), VersionOrdering::Equal);
    assert_eq!(compare_versions("3", "3.0.0.0"), VersionOrdering::Equal);
    assert_eq!(compare_versions("1.0.1", "1.0"), VersionOrdering::Greater);
}

#[test]
fn compare_handles_segments_beyond_machine_integers() {
    let huge = "1.123456789012345678901234567890";
    assert_eq!(compare_versions(huge, huge), VersionOrdering::Equal);
    assert_eq!(
        compare_versions(huge, "1.123456789012345678901234567889"),
        VersionOrdering::Greater
    );
    assert_eq!(
        compare_versions("1.99999999999999999999", huge),
        VersionOrdering::Less
    );
    assert_eq!(
        compare_versions("1.000000000000000000000000000002", "1.2"),
        VersionOrdering::Equal
    );
    assert_eq!(compare_versions("1.00", "1"), VersionOrdering::Equal);
}

#[test]
fn compare_reports_incomparable_for_malformed_input() {
    for (a, b) in [
        ("1.0.0", ""),
        ("", ""),
        ("1.0.0-beta", "1.0.0"),
        ("1..0", "1.0"),
        ("v1.0", "1.0"),
        ("1.0.", "1.0"),
        ("1.0.0", "1.x"),
    ] {
        assert_eq!(
            compare_versions(a, b),
            VersionOrdering::Incomparable,
            "{a:?} vs {b:?}"
        );
    }
}

#[test]
fn dotted_version_accessors() {
    let version = DottedVersion::parse(" 3.11.4 ").expect("must parse");
    assert_eq!(version.as_str(), "3.11.4");
    assert_eq!(version.segments(), ["3", "11", "4"]);
    assert_eq!(version.major(), "3");
    assert_eq!(version.minor(), Some("11"));
    assert_eq!(DottedVersion::parse("3").expect("must parse").minor(), None);
}

proptest! {
    #[test]
    fn compare_is_reflexive(segments in prop::collection::vec(0u32..10_000, 1..6)) {
        let raw = join(&segments);
        prop_assert_eq!(compare_versions(&raw, &raw), VersionOrdering::Equal);
    }

    #[test]
    fn compare_is_antisymmetric(
        left in prop::collection::vec(0u32..50, 1..5),
        right in prop::collection::vec(0u32..50, 1..5),
    ) {
        let a = join(&left);
        let b = join(&right);
        prop_assert_eq!(compare_versions(&a, &b), compare_versions(&b, &a).reverse());
    }

    #[test]
    fn compare_matches_padded_componentwise_order(
        left in prop::collection::vec(0u32..50, 1..5),
        right in prop::collection::vec(0u32..50, 1..5),
    ) {
        let len = left.len().max(right.len());
        let pad = |v: &[u32]| {
            let mut out = v.to_vec();
            out.resize(len, 0);
            out
        };
        let expected: VersionOrdering = pad(&left).cmp(&pad(&right)).into();
        prop_assert_eq!(compare_versions(&join(&left), &join(&right)), expected);
    }

    #[test]
    fn compare_never_coerces_malformed_to_equal(
        good in prop::collection::vec(0u32..50, 1..4),
        junk in "[a-z+-]{1,4}",
    ) {
        let malformed = format!("{}{}", join(&good), junk);
        prop_assert_eq!(
            compare_versions(&malformed, &malformed),
            VersionOrdering::Incomparable
        );
        prop_assert_eq!(
            compare_versions(&join(&good), &malformed),
            VersionOrdering::Incomparable
        );
    }
}

fn join(segments: &[u32]) -> String {
    segments
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(".")
}

#[test]
fn parse_metadata_with_all_fields() {
    let raw = "# generated\nAppName = Demo\nAppFolder=demo_app\nEntryFile=main.py\nVersion= 1.2.0\nPythonVersion=3.11.4\n\n";
    let metadata = PackageMetadata::parse(raw, "3.10.0").expect("metadata should parse");
    assert_eq!(metadata.app_name, "Demo");
    assert_eq!(metadata.app_folder, "demo_app");
    assert_eq!(metadata.entry_file, "main.py");
    assert_eq!(metadata.version, "1.2.0");
    assert_eq!(metadata.runtime_version.as_str(), "3.11.4");
    assert_eq!(metadata.runtime_version_source, RuntimeVersionSource::Metadata);
}

#[test]
fn parse_metadata_defaults_runtime_and_entry_file() {
    let raw = "AppName=Demo\nAppFolder=Demo\nVersion=1.0.0\n";
    let metadata = PackageMetadata::parse(raw, "3.10.0").expect("metadata should parse");
    assert_eq!(metadata.entry_file, DEFAULT_ENTRY_FILE);
    assert_eq!(metadata.runtime_version.as_str(), "3.10.0");
    assert_eq!(metadata.runtime_version_source, RuntimeVersionSource::Default);

    let pinned = metadata
        .with_runtime_version("3.12.1", RuntimeVersionSource::Descriptor)
        .expect("pin must apply");
    assert_eq!(pinned.runtime_version.as_str(), "3.12.1");
    assert_eq!(pinned.runtime_version_source, RuntimeVersionSource::Descriptor);
}

#[test]
fn parse_metadata_reports_every_missing_field() {
    let err = PackageMetadata::parse("AppName=\nEntryFile=core.py\n", "3.10.0")
        .expect_err("metadata must be rejected");
    assert_eq!(
        err,
        MetadataError::MissingFields(vec![
            MetadataField::AppName,
            MetadataField::AppFolder,
            MetadataField::Version,
        ])
    );
    assert_eq!(
        err.to_string(),
        "metadata is missing required fields: AppName, AppFolder, Version"
    );
}

#[test]
fn parse_metadata_rejects_malformed_runtime_version() {
    let raw = "AppName=Demo\nAppFolder=Demo\nVersion=1.0.0\nPythonVersion=3.x\n";
    let err = PackageMetadata::parse(raw, "3.10.0").expect_err("must reject runtime version");
    assert_eq!(
        err,
        MetadataError::InvalidRuntimeVersion {
            value: "3.x".to_string()
        }
    );
}

#[test]
fn parse_key_values_keeps_equals_inside_values() {
    let entries = parse_key_values("Key = a=b\nnoseparator\n# Key = ignored\n");
    assert_eq!(entries.get("Key").map(String::as_str), Some("a=b"));
    assert_eq!(entries.len(), 1);
}

#[test]
fn dependency_filter_drops_comments_blanks_and_runtime_pin() {
    let raw = "python==3.11.4\n# comment\n\nrequests==2.31.0\n";
    let list = DependencySpecList::from_descriptor(raw);
    assert_eq!(list.specs(), &["requests==2.31.0".to_string()]);
    assert_eq!(list.to_descriptor(), "requests==2.31.0\n");
}

#[test]
fn dependency_filter_recognizes_every_runtime_pin_syntax() {
    let raw = "Python == 3.12.1\npython==\"3.12.1\"\npython=\"3.12.1\"\npython_version=\"3.12.1\"\npython==3.10.0  # runtime\n";
    let list = DependencySpecList::from_descriptor(raw);
    assert!(list.is_empty(), "unexpected specs: {:?}", list.specs());
}

#[test]
fn dependency_filter_drops_runtime_pin_with_environment_marker() {
    let raw = "python==3.11.4 ; sys_platform==\"win32\"\npython_version=\"3.11.4\";os_name==\"nt\"\nrequests\n";
    let list = DependencySpecList::from_descriptor(raw);
    assert_eq!(list.specs(), &["requests".to_string()]);
}

#[test]
fn dependency_filter_keeps_packages_that_merely_mention_python() {
    let raw = "python-dateutil==2.9.0\npythonnet>=3.0\nrequests; python_version < \"3.8\"\n";
    let list = DependencySpecList::from_descriptor(raw);
    assert_eq!(list.len(), 3);
}

#[test]
fn detect_runtime_pin_returns_first_pin() {
    assert_eq!(
        detect_runtime_pin("requests\npython_version=\"3.9.13\"\npython==3.12.0\n").as_deref(),
        Some("3.9.13")
    );
    assert_eq!(detect_runtime_pin("requests==2.31.0\n"), None);
    assert!(is_runtime_pin("PYTHON==3.11"));
    assert_eq!(
        detect_runtime_pin("python==3.11.4 ; sys_platform==\"win32\"\n").as_deref(),
        Some("3.11.4")
    );
    assert!(!is_runtime_pin("pythonx==3.11"));
}

#[test]
fn runtime_source_builds_vendor_url() {
    let version = DottedVersion::parse("3.10.0").expect("must parse");
    let source = RuntimeSource::default();
    assert_eq!(
        source.archive_url(&version),
        "https://www.python.org/ftp/python/3.10.0/python-3.10.0-embed-amd64.zip"
    );

    let mirror = RuntimeSource {
        base_url: "https://mirror.test/python/".to_string(),
        platform: "arm64".to_string(),
    };
    assert_eq!(
        mirror.archive_url(&version),
        "https://mirror.test/python/3.10.0/python-3.10.0-embed-arm64.zip"
    );
}

#[test]
fn pth_template_opens_site_packages() {
    let version = DottedVersion::parse("3.11.4").expect("must parse");
    assert_eq!(pth_file_name(&version), "python311._pth");
    assert_eq!(
        render_pth_template(&version),
        "python311.zip\nLib\n.\nimport site\n"
    );
    assert_eq!(
        runtime_stem(&DottedVersion::parse("3").expect("must parse")),
        "python3"
    );
}

#[test]
fn parse_interpreter_version_output() {
    assert_eq!(
        parse_interpreter_version("Python 3.10.0\r\n").map(|v| v.to_string()),
        Some("3.10.0".to_string())
    );
    assert!(parse_interpreter_version("").is_none());
    assert!(parse_interpreter_version("Python 3.13.0rc1").is_none());
}
