use std::io::Write;
use std::process::{Command, Output};
use tempfile::NamedTempFile;

const MANIFEST: &str = r#"
routes:
  - method: GET
    path: /health
    handler: health
    name: health
  - method: GET
    path: /static/*path
    handler: assets
groups:
  - prefix: /shop
    host: shop.local
    routes:
      - method: POST
        path: /orders/{id:int}
        handler: update_order
        name: order
"#;

fn manifest() -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
    file.write_all(MANIFEST.as_bytes()).unwrap();
    file
}

fn canopy(args: &[&str], manifest: &NamedTempFile) -> Output {
    Command::new(env!("CARGO_BIN_EXE_canopy"))
        .args(args)
        .env("CANOPY_MANIFEST", manifest.path())
        .env("CANOPY_LOG_LEVEL", "error")
        .output()
        .expect("run canopy")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_cli_match_success_exit_code() {
    let file = manifest();
    let output = canopy(&["match", "GET", "/static/css/site.css"], &file);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("status: matched"));
    assert!(out.contains("param path = \"css/site.css\""));
}

#[test]
fn test_cli_match_failure_exit_code() {
    let file = manifest();
    let output = canopy(&["match", "GET", "/missing"], &file);
    assert!(!output.status.success());
    assert!(stdout(&output).contains("status: not_found"));
}

#[test]
fn test_cli_match_by_host() {
    let file = manifest();
    let output = canopy(
        &["match", "POST", "/shop/orders/12", "--host", "shop.local"],
        &file,
    );
    assert!(output.status.success());
    assert!(stdout(&output).contains("param id = \"12\""));

    let output = canopy(&["match", "POST", "/shop/orders/12"], &file);
    assert!(!output.status.success());
}

#[test]
fn test_cli_url() {
    let file = manifest();
    let output = canopy(&["url", "order", "5"], &file);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "/shop/orders/5");

    let output = canopy(&["url", "nope"], &file);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("nope"));
}

#[test]
fn test_cli_routes_listing() {
    let file = manifest();
    let output = canopy(&["routes"], &file);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.starts_with("[routes] count=3"));
    assert!(out.contains("shop.local/shop/orders/{id:int}"));
}

#[test]
fn test_cli_missing_manifest_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_canopy"))
        .args(["routes", "--manifest", "/nonexistent/routes.yaml"])
        .env_remove("CANOPY_MANIFEST")
        .output()
        .expect("run canopy");
    assert!(!output.status.success());
}
