//! Integration tests for the link checker
//!
//! These tests use wiremock to stand in for both the CKAN API and the
//! servers hosting the resources, and drive full check runs end-to-end.

use ckan_link_checker::catalog::{CkanClient, DatasetFetch};
use ckan_link_checker::config::Config;
use ckan_link_checker::crawler::{probe_ftp, run_check, ProbeOutcome};
use ckan_link_checker::output::{
    FAILED_PACKAGES_CSV, FAILED_RESOURCES_CSV, PACKAGES_CSV, PACKAGES_JSON_DIR,
    PACKAGE_LIST_FILE, STATISTICS_FILE,
};
use ckan_link_checker::{CheckerError, ConfigError};
use serde_json::{json, Value};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing into `results_root`
fn create_test_config(results_root: &Path) -> Config {
    let mut config = Config::default();
    config.checker.request_delay_ms = 0; // Very short for testing
    config.checker.backoff_step_secs = 0;
    config.output.results_root = results_root.display().to_string();
    config
}

/// Mounts the discovery document and the package list
async fn mount_catalog(server: &MockServer, names: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/api/3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"version": 3}"#))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/3/action/package_list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "help": "package_list",
            "success": true,
            "result": names,
        })))
        .mount(server)
        .await;
}

/// Mounts a successful `package_show` for one dataset
async fn mount_dataset(server: &MockServer, name: &str, maintainer: Value, resources: Value) {
    let count = resources.as_array().map(|r| r.len()).unwrap_or(0);
    Mock::given(method("POST"))
        .and(path("/api/3/action/package_show"))
        .and(body_json(json!({ "id": name })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "result": {
                "id": format!("id-{}", name),
                "name": name,
                "maintainer": maintainer,
                "num_resources": count,
                "resources": resources,
            }
        })))
        .mount(server)
        .await;
}

fn endpoint(server: &MockServer) -> String {
    format!("{}/api/3", server.uri())
}

fn read(dir: &Path, file: &str) -> String {
    std::fs::read_to_string(dir.join(file)).unwrap_or_else(|e| panic!("{}: {}", file, e))
}

fn results_dirs(root: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(root)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|p| {
            p.file_name()
                .map(|n| n.to_string_lossy().starts_with("results_"))
                .unwrap_or(false)
        })
        .collect()
}

#[tokio::test]
async fn test_full_check_mixed_links() {
    let catalog = MockServer::start().await;
    let hosting = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/x"))
        .respond_with(ResponseTemplate::new(200).set_body_string("data"))
        .mount(&hosting)
        .await;
    Mock::given(method("GET"))
        .and(path("/y"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&hosting)
        .await;

    let ok_url = format!("{}/x", hosting.uri());
    let bad_url = format!("{}/y", hosting.uri());

    mount_catalog(&catalog, &["ds1"]).await;
    mount_dataset(
        &catalog,
        "ds1",
        json!("Alice"),
        json!([
            {"url": ok_url, "format": "CSV"},
            {"url": bad_url, "format": "CSV"},
        ]),
    )
    .await;

    let root = TempDir::new().unwrap();
    let config = create_test_config(root.path());

    let summary = run_check(&endpoint(&catalog), &config)
        .await
        .expect("Check failed");
    let dir = summary.results_dir.clone();

    assert_eq!(results_dirs(root.path()), vec![dir.clone()]);
    assert!(dir.join(PACKAGE_LIST_FILE).is_file());
    assert!(dir.join(PACKAGES_JSON_DIR).join("ds1.json").is_file());

    assert_eq!(
        read(&dir, PACKAGES_CSV),
        "ok_resources,num_resources,id,name,maintainer\n1,2,id-ds1,ds1,Alice\n"
    );
    assert_eq!(
        read(&dir, FAILED_RESOURCES_CSV),
        format!("ds1,{},404,Not Found\n", bad_url)
    );
    assert!(!dir.join(FAILED_PACKAGES_CSV).exists());

    assert_eq!(summary.counters.resources_probed, 2);
    assert_eq!(summary.counters.resources_failed, 1);
    assert_eq!(summary.statistics.failed_resources, 1);
    assert_eq!(summary.statistics.total_resources, 2);
    assert_eq!(summary.statistics.failed_packages, 0);
    assert!(read(&dir, STATISTICS_FILE).starts_with("1 out of 2 links failed (50.00%)\n"));
}

#[tokio::test]
async fn test_dataset_without_working_links() {
    let catalog = MockServer::start().await;
    let hosting = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/fine"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&hosting)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&hosting)
        .await;

    mount_catalog(&catalog, &["ds1", "ds2"]).await;
    mount_dataset(
        &catalog,
        "ds1",
        Value::Null,
        json!([{"url": format!("{}/fine", hosting.uri()), "format": "CSV"}]),
    )
    .await;
    mount_dataset(
        &catalog,
        "ds2",
        json!("Bob"),
        json!([{"url": format!("{}/broken", hosting.uri()), "format": "JSON"}]),
    )
    .await;

    let root = TempDir::new().unwrap();
    let summary = run_check(&endpoint(&catalog), &create_test_config(root.path()))
        .await
        .expect("Check failed");
    let dir = &summary.results_dir;

    assert_eq!(read(dir, FAILED_PACKAGES_CSV), "ds2\n");
    assert!(read(dir, PACKAGES_CSV).contains("\n1,1,id-ds1,ds1,\n"));
    assert!(read(dir, FAILED_RESOURCES_CSV).contains(",500,Internal Server Error\n"));

    assert_eq!(summary.statistics.failed_packages, 1);
    assert_eq!(summary.statistics.total_packages, 2);
    assert!(summary.statistics.failed_package_percentage() > 0.0);
    assert!(read(dir, STATISTICS_FILE)
        .contains("1 out of 2 datasets contained no working links (50.00%)"));
}

#[tokio::test]
async fn test_error_response_skips_dataset() {
    let catalog = MockServer::start().await;
    let hosting = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&hosting)
        .await;

    mount_catalog(&catalog, &["gone", "ds1"]).await;
    Mock::given(method("POST"))
        .and(path("/api/3/action/package_show"))
        .and(body_json(json!({ "id": "gone" })))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "success": false,
            "error": {"__type": "Not Found Error", "message": "Not found"}
        })))
        .expect(1)
        .mount(&catalog)
        .await;
    mount_dataset(
        &catalog,
        "ds1",
        json!("Alice"),
        json!([{"url": format!("{}/a", hosting.uri()), "format": "CSV"}]),
    )
    .await;

    let root = TempDir::new().unwrap();
    let summary = run_check(&endpoint(&catalog), &create_test_config(root.path()))
        .await
        .expect("Check failed");
    let dir = &summary.results_dir;

    let error_body: Value =
        serde_json::from_str(&read(&dir.join(PACKAGES_JSON_DIR), "gone.json")).unwrap();
    assert_eq!(error_body["__type"], "Not Found Error");

    let packages = read(dir, PACKAGES_CSV);
    let rows: Vec<&str> = packages.lines().skip(1).collect();
    assert_eq!(rows, vec!["0,0,,gone,", "1,1,id-ds1,ds1,Alice"]);
    assert_eq!(read(dir, FAILED_PACKAGES_CSV), "gone\n");
    assert_eq!(summary.counters.datasets_skipped, 1);
}

#[tokio::test]
async fn test_ogc_endpoint_is_probed_as_capabilities_request() {
    let catalog = MockServer::start().await;
    let hosting = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wms"))
        .and(query_param("SERVICE", "WMS"))
        .and(query_param("REQUEST", "GetCapabilities"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&hosting)
        .await;

    let bare_url = format!("{}/wms?map=roads", hosting.uri());
    mount_catalog(&catalog, &["maps"]).await;
    mount_dataset(
        &catalog,
        "maps",
        json!("GIS team"),
        json!([{"url": bare_url, "format": "ogc:wms"}]),
    )
    .await;

    let root = TempDir::new().unwrap();
    let summary = run_check(&endpoint(&catalog), &create_test_config(root.path()))
        .await
        .expect("Check failed");

    assert_eq!(summary.statistics.failed_resources, 0);
    assert!(!summary.results_dir.join(FAILED_RESOURCES_CSV).exists());
}

#[tokio::test]
async fn test_fetch_retries_after_invalid_body() {
    let catalog = MockServer::start().await;
    mount_catalog(&catalog, &["ds1"]).await;

    Mock::given(method("POST"))
        .and(path("/api/3/action/package_show"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&catalog)
        .await;
    mount_dataset(&catalog, "ds1", json!("Alice"), json!([])).await;

    let root = TempDir::new().unwrap();
    let mut config = create_test_config(root.path());
    config.checker.backoff_step_secs = 1;

    let mut client = CkanClient::connect(&endpoint(&catalog), &config)
        .await
        .expect("Failed to connect");

    match client.fetch_dataset("ds1").await {
        DatasetFetch::Found { package, .. } => assert_eq!(package.name, "ds1"),
        other => panic!("expected the dataset, got {:?}", other),
    }

    // One failure raised the delay to 1s, the success ratcheted it back to 0
    assert_eq!(client.backoff_delay(), Duration::ZERO);
}

#[tokio::test]
async fn test_fetch_gives_up_at_ceiling() {
    let catalog = MockServer::start().await;
    mount_catalog(&catalog, &["ds1"]).await;

    Mock::given(method("POST"))
        .and(path("/api/3/action/package_show"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .expect(3)
        .mount(&catalog)
        .await;

    let root = TempDir::new().unwrap();
    let mut config = create_test_config(root.path());
    config.checker.max_fetch_attempts = Some(3);

    let mut client = CkanClient::connect(&endpoint(&catalog), &config)
        .await
        .expect("Failed to connect");

    match client.fetch_dataset("ds1").await {
        DatasetFetch::Failed { document, reason } => {
            assert_eq!(document["__type"], "Retries Exhausted");
            assert!(reason.contains("3 attempts"));
        }
        other => panic!("expected a failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rejects_non_ckan_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/3"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Welcome</html>"))
        .mount(&server)
        .await;

    let root = TempDir::new().unwrap();
    let result = run_check(&endpoint(&server), &create_test_config(root.path())).await;

    assert!(matches!(
        result,
        Err(CheckerError::Config(ConfigError::NotCkanEndpoint(_)))
    ));
    assert!(results_dirs(root.path()).is_empty());
}

#[tokio::test]
async fn test_package_list_forbidden_keeps_catalog_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"version": 3}"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/3/action/package_list"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "success": false,
            "error": {"__type": "Authorization Error", "message": "Access denied"}
        })))
        .mount(&server)
        .await;

    let root = TempDir::new().unwrap();
    let result = run_check(&endpoint(&server), &create_test_config(root.path())).await;

    match result {
        Err(CheckerError::Catalog { kind, message }) => {
            assert_eq!(kind, "Authorization Error");
            assert_eq!(message, "Access denied");
        }
        other => panic!("expected a catalog error, got {:?}", other.map(|s| s.results_dir)),
    }
}

#[tokio::test]
async fn test_package_list_server_error_without_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"version": 3}"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/3/action/package_list"))
        .respond_with(ResponseTemplate::new(503).set_body_string("<html>Maintenance</html>"))
        .mount(&server)
        .await;

    let root = TempDir::new().unwrap();
    let result = run_check(&endpoint(&server), &create_test_config(root.path())).await;

    match result {
        Err(CheckerError::UnexpectedResponse { message, .. }) => {
            assert!(message.contains("503"), "unexpected message: {}", message);
        }
        other => panic!("expected an unexpected response, got {:?}", other.map(|s| s.results_dir)),
    }
}

#[tokio::test]
async fn test_package_list_failure_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/3"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"version": 3}"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/3/action/package_list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "error": {"__type": "Authorization Error", "message": "Access denied"}
        })))
        .mount(&server)
        .await;

    let root = TempDir::new().unwrap();
    let result = run_check(&endpoint(&server), &create_test_config(root.path())).await;

    match result {
        Err(CheckerError::Catalog { kind, message }) => {
            assert_eq!(kind, "Authorization Error");
            assert_eq!(message, "Access denied");
        }
        other => panic!("expected a catalog error, got {:?}", other.map(|s| s.results_dir)),
    }
    assert!(results_dirs(root.path()).is_empty());
}

/// Serves a single FTP control connection that knows one directory
fn spawn_fake_ftp(existing_dir: &'static str) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    std::thread::spawn(move || {
        let Ok((stream, _)) = listener.accept() else {
            return;
        };
        let mut reader = BufReader::new(stream.try_clone().unwrap());
        let mut writer = stream;
        let _ = writer.write_all(b"220 fake server ready\r\n");

        let mut line = String::new();
        while reader.read_line(&mut line).unwrap_or(0) > 0 {
            let command = line.trim_end().to_string();
            line.clear();

            let reply = if command.starts_with("USER") {
                "331 Password required\r\n"
            } else if command.starts_with("PASS") {
                "230 Logged in\r\n"
            } else if let Some(dir) = command.strip_prefix("CWD ") {
                if dir == existing_dir {
                    "250 Directory changed\r\n"
                } else {
                    "550 No such directory\r\n"
                }
            } else if command.starts_with("QUIT") {
                let _ = writer.write_all(b"221 Bye\r\n");
                break;
            } else {
                "502 Command not implemented\r\n"
            };

            if writer.write_all(reply.as_bytes()).is_err() {
                break;
            }
        }
    });

    port
}

#[tokio::test]
async fn test_ftp_probe_success() {
    let port = spawn_fake_ftp("/pub/data");
    let outcome = probe_ftp(
        &format!("ftp://127.0.0.1:{}/pub/data", port),
        Duration::from_secs(5),
    )
    .await;
    assert_eq!(outcome, ProbeOutcome::Ok);
}

#[tokio::test]
async fn test_ftp_probe_missing_directory() {
    let port = spawn_fake_ftp("/pub/data");
    let outcome = probe_ftp(
        &format!("ftp://127.0.0.1:{}/pub/missing", port),
        Duration::from_secs(5),
    )
    .await;

    match outcome {
        ProbeOutcome::Failed {
            status_code,
            reason,
        } => {
            assert_eq!(status_code, 0);
            assert!(reason.contains("550"), "unexpected reason: {}", reason);
        }
        ProbeOutcome::Ok => panic!("expected a failure"),
    }
}

#[tokio::test]
async fn test_ftp_probe_directory_with_space() {
    for url_path in ["/pub/open%20data", "/pub/open data"] {
        let port = spawn_fake_ftp("/pub/open data");
        let outcome = probe_ftp(
            &format!("ftp://127.0.0.1:{}{}", port, url_path),
            Duration::from_secs(5),
        )
        .await;
        assert_eq!(outcome, ProbeOutcome::Ok, "path {}", url_path);
    }
}
