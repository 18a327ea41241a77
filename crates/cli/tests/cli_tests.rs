//! CLI integration tests

use std::process::{Command, Output};

fn artifacts() -> &'static str {
    concat!(env!("CARGO_MANIFEST_DIR"), "/../../artifacts")
}

/// Run carval against the shipped artifacts with a pinned reference year
fn carval(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_carval"))
        .arg("--artifacts")
        .arg(artifacts())
        .args(args)
        .env("CARVAL_REFERENCE_YEAR", "2026")
        .env_remove("CARVAL_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command")
}

const GOLF: &[&str] = &[
    "predict",
    "--brand",
    "Volkswagen",
    "--model",
    "Golf",
    "--year",
    "2018",
    "--mileage",
    "80000",
    "--fuel",
    "diesel",
    "--transmission",
    "manual",
    "--displacement",
    "2000",
];

fn json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_carval"))
        .arg("--help")
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("predict"), "Should show predict command");
    assert!(stdout.contains("brands"), "Should show brands command");
    assert!(stdout.contains("models"), "Should show models command");
}

/// Test predict subcommand help
#[test]
fn test_predict_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_carval"))
        .args(["predict", "--help"])
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("--displacement"), "Should show displacement option");
    assert!(stdout.contains("--band-width"), "Should show band width option");
}

#[test]
fn test_predict_json() {
    let mut args = vec!["-f", "json"];
    args.extend_from_slice(GOLF);
    let output = carval(&args);

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let value = json(&output);
    let point = value["point_eur"].as_u64().unwrap();
    assert_eq!(point % 100, 0);
    assert!((5_000..=25_000).contains(&point), "point {}", point);
    assert_eq!(value["lower_eur"].as_u64().unwrap(), point - 2000);
    assert_eq!(value["upper_eur"].as_u64().unwrap(), point + 2000);
    assert_eq!(value["details"]["feature_layout"], "eucar-v2");
}

#[test]
fn test_predict_band_width_override() {
    let mut args = vec!["-f", "json"];
    args.extend_from_slice(GOLF);
    args.extend_from_slice(&["--band-width", "500"]);
    let value = json(&carval(&args));

    let point = value["point_eur"].as_u64().unwrap();
    assert_eq!(value["upper_eur"].as_u64().unwrap(), point + 500);
}

#[test]
fn test_predict_table() {
    let output = carval(GOLF);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("Estimated price"), "{}", stdout);
    assert!(stdout.contains("€"), "{}", stdout);
}

#[test]
fn test_predict_unknown_brand_warns() {
    let output = carval(&[
        "-f",
        "json",
        "predict",
        "--brand",
        "Trabant",
        "--model",
        "601",
        "--year",
        "1989",
        "--mileage",
        "60000",
        "--fuel",
        "petrol",
        "--transmission",
        "manual",
    ]);

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown brand 'Trabant'"), "{}", stderr);
    assert_eq!(json(&output)["details"]["warnings"][0]["field"], "brand");
}

#[test]
fn test_predict_invalid_listing_fails() {
    let output = carval(&[
        "predict",
        "--brand",
        "Volkswagen",
        "--model",
        "Golf",
        "--year",
        "1900",
        "--mileage",
        "80000",
        "--fuel",
        "diesel",
        "--transmission",
        "manual",
    ]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("year"), "{}", stderr);
}

#[test]
fn test_invalid_fuel_rejected_by_parser() {
    let mut args: Vec<&str> = GOLF.to_vec();
    let pos = args.iter().position(|a| *a == "diesel").unwrap();
    args[pos] = "steam";
    let output = carval(&args);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("steam"));
}

#[test]
fn test_brands_json() {
    let output = carval(&["-f", "json", "brands"]);
    assert!(output.status.success());

    let value = json(&output);
    let brands = value.as_array().unwrap();
    assert_eq!(brands.len(), 14);
    let vw = brands.iter().find(|b| b["brand"] == "volkswagen").unwrap();
    assert_eq!(vw["tier"], 2);
    assert!(vw["models"].as_array().unwrap().iter().any(|m| m == "golf"));
}

#[test]
fn test_models_for_brand() {
    let output = carval(&["-f", "json", "models", "--brand", "Volkswagen"]);
    assert!(output.status.success());

    let value = json(&output);
    let names: Vec<&str> = value
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["model"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["golf", "passat", "polo"]);
}

#[test]
fn test_models_unknown_brand_fails() {
    let output = carval(&["models", "--brand", "Trabant"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown brand"));
}

#[test]
fn test_missing_artifacts_fail() {
    let output = Command::new(env!("CARGO_BIN_EXE_carval"))
        .args(["--artifacts", "/nonexistent/carval", "brands"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("failed to load artifacts"));
}
