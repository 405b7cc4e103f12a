use serial_test::serial;
use sift_common::observability::LogFormat;
use sift_config::SiftConfigLoader;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

const FILE_YAML: &str = r#"
pipeline:
  max_retries: 4
  retry_delay_ms: 250
  webdriver_url: "${SIFT_TEST_DRIVER}"
  problematic_sites:
    - reddit.com
    - news.example
  viewport:
    width: 1366
    height: 768
server:
  listen_addr: "0.0.0.0:8080"
logging:
  format: json
"#;

#[test]
#[serial]
fn loads_file_and_expands_placeholders() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "sift.yaml", FILE_YAML);

    let cfg = temp_env::with_var("SIFT_TEST_DRIVER", Some("http://driver:4444"), || {
        SiftConfigLoader::new().with_file(&p).load()
    })
    .expect("load config");

    assert_eq!(cfg.pipeline.max_retries, 4);
    assert_eq!(cfg.pipeline.retry_delay_ms, 250);
    assert_eq!(cfg.pipeline.webdriver_url, "http://driver:4444");
    assert_eq!(cfg.pipeline.viewport.width, 1366);
    assert!(cfg.pipeline.is_problematic_host("news.example"));
    // untouched fields keep their defaults
    assert_eq!(cfg.pipeline.navigation_timeout_ms, 30_000);
    assert_eq!(cfg.server.listen_addr, "0.0.0.0:8080");
    assert_eq!(cfg.logging.format, LogFormat::Json);
}

#[test]
#[serial]
fn environment_overrides_file_values() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "sift.yaml", FILE_YAML);

    let cfg = temp_env::with_vars(
        [
            ("SIFT_TEST_DRIVER", Some("http://driver:4444")),
            ("SIFT__PIPELINE__MAX_RETRIES", Some("6")),
            ("SIFT__PIPELINE__HEADLESS", Some("false")),
        ],
        || SiftConfigLoader::new().with_file(&p).load(),
    )
    .expect("load config");

    assert_eq!(cfg.pipeline.max_retries, 6);
    assert!(!cfg.pipeline.headless);
}

#[test]
#[serial]
fn missing_optional_file_yields_defaults() {
    let tmp = TempDir::new().unwrap();
    let cfg = SiftConfigLoader::new()
        .with_optional_file(tmp.path().join("absent.yaml"))
        .load()
        .expect("defaults");
    assert_eq!(cfg.pipeline.max_retries, 3);
    assert_eq!(cfg.server.request_timeout_secs, 120);
}

#[test]
#[serial]
fn missing_required_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let res = SiftConfigLoader::new()
        .with_file(tmp.path().join("absent.yaml"))
        .load();
    assert!(res.is_err());
}
