//! On-disk behaviour of the project documents

use cordova_config::{ConfigParser, PackageDescriptor, PluginDecl, Variables};
use cordova_test_utils::{TestProject, seconds_ago};
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
#[case::two_spaces("{\n  \"name\": \"app\"\n}\n")]
#[case::tabs_crlf("{\r\n\t\"name\": \"app\"\r\n}")]
#[case::compact("{\"name\":\"app\",\"cordova\":{\"platforms\":[]}}")]
fn unchanged_package_descriptor_is_not_rewritten(#[case] content: &str) {
    let project = TestProject::new().with_package_json(content);
    project.set_mtime("package.json", seconds_ago(3600));
    let before = project.mtime("package.json");

    let mut fresh = PackageDescriptor::load(&project.path("package.json"))
        .unwrap()
        .unwrap();

    assert!(!fresh.save().unwrap());
    assert_eq!(project.read_file("package.json"), content);
    assert_eq!(project.mtime("package.json"), before);
}

#[test]
fn package_descriptor_save_keeps_crlf_and_tabs() {
    let project = TestProject::new().with_package_json("{\r\n\t\"name\": \"app\"\r\n}\r\n");
    let mut pkg = PackageDescriptor::load(&project.path("package.json"))
        .unwrap()
        .unwrap();

    pkg.add_platform("ios");
    assert!(pkg.save().unwrap());

    assert_eq!(
        project.read_file("package.json"),
        "{\r\n\t\"name\": \"app\",\r\n\t\"cordova\": {\r\n\t\t\"platforms\": [\r\n\t\t\t\"ios\"\r\n\t\t]\r\n\t}\r\n}\r\n"
    );
}

#[test]
fn missing_package_descriptor_loads_as_none() {
    let project = TestProject::new();
    assert!(
        PackageDescriptor::load(&project.path("package.json"))
            .unwrap()
            .is_none()
    );
}

#[test]
fn config_write_is_skipped_without_edits() {
    let project = TestProject::new().with_config_xml(&[("android", Some("^12.0.0"))], &[]);
    project.set_mtime("config.xml", seconds_ago(3600));
    let before = project.mtime("config.xml");

    let mut config = ConfigParser::load(&project.path("config.xml")).unwrap();
    assert!(!config.write().unwrap());
    assert_eq!(project.mtime("config.xml"), before);
}

#[test]
fn config_edits_persist_and_reload() {
    let project = TestProject::new().with_config_xml(
        &[("android", Some("^12.0.0"))],
        &[("cordova-plugin-device", None, &[])],
    );
    let mut config = ConfigParser::load(&project.path("config.xml")).unwrap();

    config.remove_engine("android").unwrap();
    config.add_engine("ios", Some("~7.1.0")).unwrap();
    let mut vars = Variables::new();
    vars.insert("API_KEY".into(), "secret".into());
    config
        .add_plugin(&PluginDecl::new("cordova-plugin-maps", None, vars))
        .unwrap();
    assert!(config.write().unwrap());

    let reloaded = ConfigParser::load(&project.path("config.xml")).unwrap();
    let engines: Vec<_> = reloaded.engines().into_iter().map(|e| e.name).collect();
    assert_eq!(engines, vec!["ios"]);
    let plugins: Vec<_> = reloaded.plugins().into_iter().map(|p| p.name).collect();
    assert_eq!(plugins, vec!["cordova-plugin-device", "cordova-plugin-maps"]);
    assert_eq!(
        reloaded
            .plugin("cordova-plugin-maps")
            .unwrap()
            .variables
            .get("API_KEY")
            .map(String::as_str),
        Some("secret")
    );
    assert_eq!(reloaded.name(), Some("HelloCordova"));
}
