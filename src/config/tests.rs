use std::io::Write;

use serial_test::serial;

use super::*;

fn raw_with_base(url: &str) -> RawSettings {
    let mut raw = RawSettings::default();
    raw.api.base_url = Some(url.to_string());
    raw
}

#[test]
fn base_url_is_required() {
    let err = Settings::from_raw(RawSettings::default()).expect_err("missing base url");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "api.base_url",
            ..
        }
    ));
}

#[test]
fn defaults_fill_media_url_and_timeout() {
    let settings = Settings::from_raw(raw_with_base("https://blog.example.com/backend"))
        .expect("valid settings");

    assert_eq!(
        settings.api.base_url.as_str(),
        "https://blog.example.com/backend/"
    );
    assert_eq!(
        settings.api.media_url.as_str(),
        "https://blog.example.com/backend/media/"
    );
    assert_eq!(settings.api.timeout, Duration::from_millis(10_000));
    assert!(settings.api.csrf_token.is_none());
    assert!(!settings.navigation.cancel_on_navigate);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = raw_with_base("https://file.example.com");
    raw.api.timeout_ms = Some(5_000);
    raw.logging.level = Some("info".to_string());

    let overrides = ClientOverrides {
        api_url: Some("https://cli.example.com".to_string()),
        timeout_ms: Some(250),
        log_level: Some("debug".to_string()),
        cancel_on_navigate: Some(true),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.api.base_url.as_str(), "https://cli.example.com/");
    assert_eq!(settings.api.timeout, Duration::from_millis(250));
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert!(settings.navigation.cancel_on_navigate);
}

#[test]
fn zero_timeout_is_rejected() {
    let mut raw = raw_with_base("https://blog.example.com");
    raw.api.timeout_ms = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero timeout");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "api.timeout_ms",
            ..
        }
    ));
}

#[test]
fn non_http_scheme_is_rejected() {
    let err = Settings::from_raw(raw_with_base("ftp://blog.example.com")).expect_err("bad scheme");
    assert!(err.to_string().contains("unsupported scheme"));
}

#[test]
fn blank_csrf_token_is_treated_as_absent() {
    let mut raw = raw_with_base("https://blog.example.com");
    raw.api.csrf_token = Some("   ".to_string());

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.api.csrf_token.is_none());
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = raw_with_base("https://blog.example.com");
    let overrides = ClientOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn invalid_log_level_is_reported() {
    let mut raw = raw_with_base("https://blog.example.com");
    raw.logging.level = Some("chatty".to_string());

    let err = Settings::from_raw(raw).expect_err("bad level");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "logging.level",
            ..
        }
    ));
}

#[test]
#[serial]
fn environment_overrides_file_values() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp config");
    writeln!(
        file,
        "[api]\nbase_url = \"https://file.example.com\"\ntimeout_ms = 4000\n"
    )
    .expect("write config");

    // SAFETY: serialized with the other environment tests.
    unsafe {
        std::env::set_var("POSTWIRE_API__TIMEOUT_MS", "1500");
    }
    let result = load(Some(file.path()), &ClientOverrides::default());
    unsafe {
        std::env::remove_var("POSTWIRE_API__TIMEOUT_MS");
    }

    let settings = result.expect("settings load");
    assert_eq!(settings.api.base_url.as_str(), "https://file.example.com/");
    assert_eq!(settings.api.timeout, Duration::from_millis(1500));
}

#[test]
#[serial]
fn explicit_config_file_must_exist() {
    let missing = std::env::temp_dir().join("postwire-missing-config.toml");
    let err = load(Some(&missing), &ClientOverrides::default()).expect_err("missing file");
    assert!(matches!(err, LoadError::Build(_)));
}
