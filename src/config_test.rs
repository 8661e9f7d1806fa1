use super::*;

// =============================================================================
// env_parse
// =============================================================================

#[test]
fn env_parse_missing_returns_default() {
    let val: usize = env_parse("__CODESHARE_TEST_MISSING__", 42);
    assert_eq!(val, 42);
}

#[test]
fn env_parse_present_valid() {
    unsafe { std::env::set_var("__CODESHARE_TEST_VALID__", "99") };
    let val: u64 = env_parse("__CODESHARE_TEST_VALID__", 0);
    assert_eq!(val, 99);
    unsafe { std::env::remove_var("__CODESHARE_TEST_VALID__") };
}

#[test]
fn env_parse_present_invalid_returns_default() {
    unsafe { std::env::set_var("__CODESHARE_TEST_INVALID__", "soon") };
    let val: u64 = env_parse("__CODESHARE_TEST_INVALID__", 7);
    assert_eq!(val, 7);
    unsafe { std::env::remove_var("__CODESHARE_TEST_INVALID__") };
}

// =============================================================================
// Defaults
// =============================================================================

#[test]
fn defaults_match_connection_policy() {
    let config = SyncConfig::default();
    assert_eq!(config.reconnect_delay, Duration::from_millis(5000));
    assert_eq!(config.heart_beat, HeartBeat::new(10_000, 10_000));
    assert_eq!(config.publish_coalesce, None);
    assert_eq!(config.orphan_capacity, 32);
    assert_eq!(config.orphan_ttl, Duration::from_secs(10));
    assert_eq!(config.http_timeout, Duration::from_secs(15));
}

#[test]
fn default_ws_url_matches_default_base_url() {
    let config = SyncConfig::default();
    assert_eq!(derive_ws_url(&config.base_url).expect("derive"), config.ws_url);
}

// =============================================================================
// Endpoints
// =============================================================================

#[test]
fn derive_ws_url_maps_http_schemes() {
    assert_eq!(derive_ws_url("http://localhost:8080").expect("http"), "ws://localhost:8080/ws");
    assert_eq!(derive_ws_url("https://code.example/").expect("https"), "wss://code.example/ws");
}

#[test]
fn derive_ws_url_rejects_other_schemes() {
    let err = derive_ws_url("ftp://example").expect_err("ftp should fail");
    assert_eq!(err, ConfigError::InvalidBaseUrl("ftp://example".to_owned()));
}

#[test]
fn with_endpoints_trims_and_derives() {
    let config = SyncConfig::default()
        .with_endpoints("https://code.example/", None)
        .expect("endpoints");
    assert_eq!(config.base_url, "https://code.example");
    assert_eq!(config.ws_url, "wss://code.example/ws");
}

#[test]
fn with_endpoints_keeps_explicit_ws_url() {
    let config = SyncConfig::default()
        .with_endpoints("http://api.local", Some("ws://broker.local:61614/stomp"))
        .expect("endpoints");
    assert_eq!(config.ws_url, "ws://broker.local:61614/stomp");
}

#[test]
fn coalesce_window_zero_is_disabled() {
    assert_eq!(coalesce_window(0), None);
    assert_eq!(coalesce_window(250), Some(Duration::from_millis(250)));
}
