use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn shoprec_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("shoprec");
    path
}

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().to_path_buf();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();

    let config_content = format!(
        r#"[db]
path = "{}/data/shoprec.sqlite"

[retrieval]
pattern_k = 3
product_k = 5
"#,
        root.display()
    );

    let config_path = config_dir.join("shoprec.toml");
    fs::write(&config_path, config_content).unwrap();

    (tmp, config_path)
}

fn run_shoprec(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = shoprec_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path.to_str().unwrap())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run shoprec binary at {:?}: {}", binary, e));

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let success = output.status.success();
    (stdout, stderr, success)
}

#[test]
fn test_init_creates_database() {
    let (_tmp, config_path) = setup_test_env();

    let (stdout, stderr, success) = run_shoprec(&config_path, &["init"]);
    assert!(success, "init failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("initialized"));
}

#[test]
fn test_init_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    let (_, _, success1) = run_shoprec(&config_path, &["init"]);
    assert!(success1, "First init failed");

    let (_, _, success2) = run_shoprec(&config_path, &["init"]);
    assert!(success2, "Second init failed (not idempotent)");
}

#[test]
fn test_seed_loads_demo_catalog() {
    let (_tmp, config_path) = setup_test_env();

    run_shoprec(&config_path, &["init"]);
    let (stdout, stderr, success) = run_shoprec(&config_path, &["seed"]);
    assert!(success, "seed failed: stdout={}, stderr={}", stdout, stderr);
    assert!(stdout.contains("Seeded 30 products and 17 purchase histories."));
}

#[test]
fn test_seed_idempotent() {
    let (_tmp, config_path) = setup_test_env();

    run_shoprec(&config_path, &["init"]);
    run_shoprec(&config_path, &["seed"]);
    let (stdout, _, success) = run_shoprec(&config_path, &["seed"]);
    assert!(success, "Second seed failed (not idempotent)");
    assert!(stdout.contains("Seeded 30 products and 17 purchase histories."));
}

#[test]
fn test_catalog_lists_products() {
    let (_tmp, config_path) = setup_test_env();

    run_shoprec(&config_path, &["init"]);
    run_shoprec(&config_path, &["seed"]);

    let (stdout, _, success) = run_shoprec(&config_path, &["catalog"]);
    assert!(success);
    assert!(stdout.contains("Nike Air Max 90"));
    assert!(stdout.contains("Yoga Mat Premium 6mm"));
    assert!(stdout.contains("30 products."));
}

#[test]
fn test_catalog_empty_database() {
    let (_tmp, config_path) = setup_test_env();

    run_shoprec(&config_path, &["init"]);
    let (stdout, _, success) = run_shoprec(&config_path, &["catalog"]);
    assert!(success);
    assert!(stdout.contains("Catalog is empty"));
}

#[test]
fn test_purchases_for_seeded_user() {
    let (_tmp, config_path) = setup_test_env();

    run_shoprec(&config_path, &["init"]);
    run_shoprec(&config_path, &["seed"]);

    let (stdout, _, success) = run_shoprec(&config_path, &["purchases", "--user", "Albert"]);
    assert!(success);
    assert!(stdout.contains("Nike Air Max 90"));
    assert!(stdout.contains("TOTAL: $129.99"));
}

#[test]
fn test_purchases_user_lookup_case_insensitive() {
    let (_tmp, config_path) = setup_test_env();

    run_shoprec(&config_path, &["init"]);
    run_shoprec(&config_path, &["seed"]);

    let (stdout, _, success) = run_shoprec(&config_path, &["purchases", "--user", "albert"]);
    assert!(success);
    assert!(stdout.contains("Nike Air Max 90"));
}

#[test]
fn test_purchases_unknown_user() {
    let (_tmp, config_path) = setup_test_env();

    run_shoprec(&config_path, &["init"]);
    run_shoprec(&config_path, &["seed"]);

    let (stdout, _, success) = run_shoprec(&config_path, &["purchases", "--user", "Nobody"]);
    assert!(success);
    assert!(stdout.contains("No purchases recorded for Nobody."));
}

#[test]
fn test_search_requires_embedding_provider() {
    let (_tmp, config_path) = setup_test_env();

    run_shoprec(&config_path, &["init"]);
    run_shoprec(&config_path, &["seed"]);

    let (stdout, stderr, success) = run_shoprec(&config_path, &["search", "running shoes"]);
    assert!(!success, "search should fail without embeddings: {}", stdout);
    assert!(stderr.contains("requires embeddings"));
}

#[test]
fn test_context_requires_embedding_provider() {
    let (_tmp, config_path) = setup_test_env();

    run_shoprec(&config_path, &["init"]);
    run_shoprec(&config_path, &["seed"]);

    let (_, stderr, success) = run_shoprec(&config_path, &["context", "P001"]);
    assert!(!success);
    assert!(stderr.contains("requires embeddings"));
}

#[test]
fn test_buy_unknown_product() {
    let (_tmp, config_path) = setup_test_env();

    run_shoprec(&config_path, &["init"]);
    run_shoprec(&config_path, &["seed"]);

    let (_, stderr, success) = run_shoprec(&config_path, &["buy", "P999", "--user", "Alex"]);
    assert!(!success);
    assert!(stderr.contains("product not found: P999"));
}

#[test]
fn test_buy_requires_embedding_provider() {
    let (_tmp, config_path) = setup_test_env();

    run_shoprec(&config_path, &["init"]);
    run_shoprec(&config_path, &["seed"]);

    let (_, stderr, success) = run_shoprec(&config_path, &["buy", "P001", "--user", "Alex"]);
    assert!(!success);
    assert!(stderr.contains("requires embeddings"));
}

#[test]
fn test_invalid_config_rejected() {
    let (tmp, _) = setup_test_env();
    let bad_config = tmp.path().join("config").join("bad.toml");
    fs::write(
        &bad_config,
        format!(
            r#"[db]
path = "{}/data/shoprec.sqlite"

[embedding]
provider = "openai"
"#,
            tmp.path().display()
        ),
    )
    .unwrap();

    let (_, stderr, success) = run_shoprec(&bad_config, &["init"]);
    assert!(!success);
    assert!(stderr.contains("embedding.dims"));
}

#[test]
fn test_missing_config_file() {
    let (tmp, _) = setup_test_env();
    let missing = tmp.path().join("nope.toml");

    let (_, stderr, success) = run_shoprec(&missing, &["init"]);
    assert!(!success);
    assert!(stderr.contains("Failed to read config file"));
}
