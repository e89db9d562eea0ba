//! Spec resolution against real project documents

use cordova_config::{ConfigParser, PackageDescriptor};
use cordova_spec::{PinnedVersions, SpecKind, SpecSource, resolve_platform_spec, resolve_plugin_spec};
use cordova_test_utils::TestProject;
use pretty_assertions::assert_eq;

fn documents(project: &TestProject) -> (Option<PackageDescriptor>, ConfigParser) {
    let package = PackageDescriptor::load(&project.path("package.json")).unwrap();
    let config = ConfigParser::load(&project.path("config.xml")).unwrap();
    (package, config)
}

#[test]
fn explicit_then_package_descriptor_then_manifest() {
    let project = TestProject::new()
        .with_config_xml(&[("android", Some("2.0.0"))], &[])
        .with_package_json(r#"{"name": "app", "dependencies": {"android": "1.0.0"}}"#);
    let (package, config) = documents(&project);
    let pinned = PinnedVersions::default();

    let explicit = resolve_platform_spec(
        "android",
        Some("9.9.9"),
        package.as_ref(),
        Some(&config),
        &pinned,
        project.root(),
    )
    .unwrap();
    assert_eq!(explicit.spec, "9.9.9");
    assert_eq!(explicit.source, SpecSource::Explicit);

    let declared = resolve_platform_spec(
        "android",
        None,
        package.as_ref(),
        Some(&config),
        &pinned,
        project.root(),
    )
    .unwrap();
    assert_eq!(declared.spec, "1.0.0");
    assert_eq!(declared.source, SpecSource::PackageDescriptor);
    assert!(declared.kind.is_version());
}

#[test]
fn manifest_engine_used_without_package_descriptor() {
    let project = TestProject::new().with_config_xml(&[("ios", Some("^7.0.0"))], &[]);
    let (package, config) = documents(&project);

    let resolved = resolve_platform_spec(
        "ios",
        None,
        package.as_ref(),
        Some(&config),
        &PinnedVersions::default(),
        project.root(),
    )
    .unwrap();

    assert_eq!(resolved.spec, "^7.0.0");
    assert_eq!(resolved.source, SpecSource::Manifest);
    assert!(matches!(resolved.kind, SpecKind::Range(_)));
}

#[test]
fn pinned_default_then_nothing() {
    let project = TestProject::new().with_config_xml(&[], &[]);
    let (package, config) = documents(&project);
    let pinned = PinnedVersions::empty().with("browser", "^7.0.0");

    let browser = resolve_platform_spec("browser", None, package.as_ref(), Some(&config), &pinned, project.root())
        .unwrap();
    assert_eq!(browser.source, SpecSource::Pinned);

    let unknown = resolve_platform_spec("acme", None, package.as_ref(), Some(&config), &pinned, project.root());
    assert_eq!(unknown, None);
}

#[test]
fn local_directory_spec_is_classified_as_path() {
    let project = TestProject::new()
        .with_config_xml(&[], &[])
        .with_dir("vendor/cordova-android");
    let (package, config) = documents(&project);

    let resolved = resolve_platform_spec(
        "android",
        Some("vendor/cordova-android"),
        package.as_ref(),
        Some(&config),
        &PinnedVersions::default(),
        project.root(),
    )
    .unwrap();

    assert!(matches!(resolved.kind, SpecKind::LocalPath(_)));
}

#[test]
fn plugin_spec_precedence() {
    let project = TestProject::new()
        .with_config_xml(&[], &[("cordova-plugin-device", Some("~2.0.0"), &[])])
        .with_package_json(r#"{"devDependencies": {"cordova-plugin-camera": "^6.0.0"}}"#);
    let (package, config) = documents(&project);

    let camera = resolve_plugin_spec("cordova-plugin-camera", None, package.as_ref(), Some(&config), project.root())
        .unwrap();
    assert_eq!(camera.spec, "^6.0.0");

    let device = resolve_plugin_spec("cordova-plugin-device", None, package.as_ref(), Some(&config), project.root())
        .unwrap();
    assert_eq!(device.spec, "~2.0.0");
    assert_eq!(device.source, SpecSource::Manifest);

    assert_eq!(
        resolve_plugin_spec("cordova-plugin-file", None, package.as_ref(), Some(&config), project.root()),
        None
    );
}
