use chrono::NaiveDate;
use registry_gateway::config::{env, Config, DEFAULT_NPM_BASE_URL, DEFAULT_PACKAGE_PREFIX};
use std::collections::HashMap;
use std::fs;
use tempfile::tempdir;

fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

// ==================== Default Values ====================

#[test]
fn test_config_default_values() {
    let config = Config::default();

    assert!(config.index.host_address.is_empty());
    assert_eq!(config.index.page_size, 10);
    assert_eq!(config.stats.base_url, DEFAULT_NPM_BASE_URL);
    assert_eq!(config.stats.package_prefix, DEFAULT_PACKAGE_PREFIX);
    assert_eq!(config.stats.concurrency, 1);
    assert!(config.stats.start_date.is_none());
    assert!(config.registered_clients.is_empty());
    assert_eq!(config.listen.port, 3000);
}

// ==================== YAML File ====================

#[test]
fn test_config_from_yaml_file() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("gateway.yaml");
    fs::write(
        &path,
        r#"
index:
  host_address: http://es.internal:9200
  index_name: phoenix-plugins
  page_size: 20
stats:
  start_date: 2021-06-01
  concurrency: 4
registered_clients:
  - phoenix-web
  - phoenix-desktop
listen:
  port: 8080
"#,
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.index.host_address, "http://es.internal:9200");
    assert_eq!(config.index.index_name, "phoenix-plugins");
    assert_eq!(config.index.page_size, 20);
    assert_eq!(config.index.timeout_secs, 10);
    assert_eq!(config.stats.start_date, NaiveDate::from_ymd_opt(2021, 6, 1));
    assert_eq!(config.stats.concurrency, 4);
    assert_eq!(config.stats.package_prefix, DEFAULT_PACKAGE_PREFIX);
    assert_eq!(config.registered_clients, vec!["phoenix-web", "phoenix-desktop"]);
    assert_eq!(config.listen.host, "0.0.0.0");
    assert_eq!(config.listen.port, 8080);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_minimal_yaml_gets_defaults() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("gateway.yaml");
    fs::write(&path, "registered_clients: []\n").unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.index.page_size, 10);
    assert_eq!(config.stats.base_url, DEFAULT_NPM_BASE_URL);
    assert!(config.validate().is_err());
}

#[test]
fn test_config_invalid_yaml() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("gateway.yaml");
    fs::write(&path, "index: [unclosed\n").unwrap();

    let err = Config::from_file(&path).unwrap_err();
    assert!(err.to_string().starts_with("Configuration error"));
}

#[test]
fn test_config_missing_file() {
    let tmp = tempdir().unwrap();
    assert!(Config::from_file(&tmp.path().join("absent.yaml")).is_err());
}

#[test]
fn test_config_rejects_zero_index_timeout() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("gateway.yaml");
    fs::write(
        &path,
        r#"
index:
  host_address: http://es.internal:9200
  index_name: phoenix-plugins
  timeout_secs: 0
stats:
  start_date: 2021-06-01
registered_clients: [phoenix-web]
"#,
    )
    .unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.index.timeout_secs, 0);
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("timeout_secs"));
}

// ==================== Environment Overrides ====================

#[test]
fn test_env_overrides_file_values() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("gateway.yaml");
    fs::write(
        &path,
        r#"
index:
  host_address: http://from-file:9200
  index_name: from-file
stats:
  start_date: 2021-06-01
registered_clients: [file-client]
"#,
    )
    .unwrap();

    let mut config = Config::from_file(&path).unwrap();
    config
        .apply_env(vars(&[
            (env::INDEX_HOST_ADDRESS, "http://from-env:9200"),
            (env::REGISTERED_CLIENT_IDS, "env-a, env-b"),
            (env::PACKAGE_PREFIX, "@acme/"),
        ]))
        .unwrap();

    assert_eq!(config.index.host_address, "http://from-env:9200");
    assert_eq!(config.index.index_name, "from-file");
    assert_eq!(config.registered_clients, vec!["env-a", "env-b"]);
    assert_eq!(config.stats.package_prefix, "@acme/");
    assert!(config.validate().is_ok());
}

#[test]
fn test_env_requires_start_date() {
    let mut config = Config::default();
    config
        .apply_env(vars(&[
            (env::INDEX_HOST_ADDRESS, "http://es:9200"),
            (env::INDEX_NAME, "plugins"),
        ]))
        .unwrap();

    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains(env::STATS_START_DATE));
}
