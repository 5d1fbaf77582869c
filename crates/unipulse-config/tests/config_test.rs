#![allow(clippy::unwrap_used)]
// Round-trip tests for TOML profile loading and saving.

use unipulse_config::{Config, Profile, load_config_from, profile_to_controller_config,
    save_config_to};

#[test]
fn load_profiles_from_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    std::fs::write(
        &path,
        r#"
default_profile = "home"

[profiles.home]
controller = "https://192.168.1.1:8443"
site = "default"
username = "admin"
password = "hunter2"
insecure = true
timeout = 10

[profiles.lab]
controller = "https://lab.example:8443"
site = "lab"
username = "ops"
password = "secret"
"#,
    )
    .unwrap();

    let config = load_config_from(&path).unwrap();

    assert_eq!(config.default_profile.as_deref(), Some("home"));
    assert_eq!(config.profiles.len(), 2);

    let (name, profile) = config.profile(None).unwrap();
    assert_eq!(name, "home");
    assert_eq!(profile.controller, "https://192.168.1.1:8443");

    let controller = profile_to_controller_config(profile, name).unwrap();
    assert_eq!(controller.site, "default");
    assert_eq!(controller.timeout.as_secs(), 10);
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = load_config_from(&dir.path().join("nonexistent.toml")).unwrap();

    assert_eq!(config.default_profile.as_deref(), Some("default"));
    assert!(config.profiles.is_empty());
}

#[test]
fn save_and_reload_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config.profiles.insert(
        "home".into(),
        Profile {
            controller: "https://ctrl.example:8443".into(),
            site: "default".into(),
            username: Some("admin".into()),
            password: None,
            remember: true,
            ca_cert: None,
            insecure: Some(true),
            timeout: Some(15),
        },
    );

    save_config_to(&config, &path).unwrap();
    let reloaded = load_config_from(&path).unwrap();

    let profile = &reloaded.profiles["home"];
    assert_eq!(profile.controller, "https://ctrl.example:8443");
    assert_eq!(profile.insecure, Some(true));
    assert_eq!(profile.timeout, Some(15));
}
