use super::*;

#[test]
fn test_defaults_match_compute_service() {
    let config = Config::default();
    assert_eq!(config.server.bind.port(), 8000);
    assert_eq!(config.server.cors_origins, vec!["http://localhost:3000"]);
    assert_eq!(config.panel.app_name, "panel-test");
    assert_eq!(config.panel.sidebar_width, 350);
    assert!(config.validate().is_ok());
}

#[test]
fn test_default_wave_grid() {
    let wave = WaveConfig::default();
    assert_eq!(wave.samples, 1000);
    assert_eq!((wave.x_min, wave.x_max), (0.0, 10.0));
    assert_eq!((wave.width, wave.height), (800, 400));
    assert!(wave.datashade);
}

#[test]
fn test_partial_toml_keeps_other_defaults() {
    let config = Config::from_toml(
        r#"
        [server]
        bind = "0.0.0.0:9000"

        [wave]
        samples = 200
        datashade = false
        "#,
    )
    .unwrap();
    assert_eq!(config.server.bind.port(), 9000);
    assert_eq!(config.server.ws_idle_timeout_secs, 300);
    assert_eq!(config.wave.samples, 200);
    assert!(!config.wave.datashade);
    assert_eq!(config.panel.title, "Test Pipeline");
}

#[test]
fn test_empty_x_range_rejected() {
    let err = Config::from_toml("[wave]\nx_min = 5.0\nx_max = 5.0\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key: "wave.x_max", .. }));
}

#[test]
fn test_app_name_must_be_single_segment() {
    let err = Config::from_toml("[panel]\napp_name = \"a/b\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key: "panel.app_name", .. }));
}

#[test]
fn test_split_origins_trims_and_drops_empty() {
    assert_eq!(
        split_origins(" http://a.test , ,http://b.test"),
        vec!["http://a.test", "http://b.test"]
    );
}

#[test]
fn test_app_name_cannot_shadow_builtin_routes() {
    for name in ["compute", "wave-test"] {
        let err = Config::from_toml(&format!("[panel]\napp_name = \"{name}\"\n")).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "panel.app_name", .. }));
    }
}

#[test]
fn test_wildcard_cors_origin_rejected() {
    let err = Config::from_toml("[server]\ncors_origins = [\"*\"]\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key: "server.cors_origins", .. }));

    let mut config = Config::default();
    config.server.cors_origins = split_origins("http://localhost:3000,*");
    assert!(matches!(
        config.validate(),
        Err(ConfigError::Invalid { key: "server.cors_origins", .. })
    ));
}

#[test]
fn test_cors_origin_must_be_header_safe() {
    let err = Config::from_toml("[server]\ncors_origins = [\"http://a.test\\n\"]\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key: "server.cors_origins", .. }));
    assert!(Config::from_toml("[server]\ncors_origins = [\"https://app.example.com:8443\"]\n").is_ok());
}

#[test]
fn test_plot_size_is_capped() {
    let err = Config::from_toml("[wave]\nwidth = 70000\nheight = 70000\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { key: "wave.width", .. }));
    let at_cap = format!("[wave]\nwidth = {MAX_PLOT_SIDE}\nheight = 1\n");
    assert!(Config::from_toml(&at_cap).is_ok());
}
