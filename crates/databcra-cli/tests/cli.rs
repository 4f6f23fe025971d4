//! End-to-end tests for the offline subcommands.

use assert_cmd::Command;
use predicates::prelude::*;

fn databcra() -> Command {
    Command::cargo_bin("databcra").unwrap()
}

#[test]
fn parse_extracts_record_from_text_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bulletin.txt");
    std::fs::write(
        &input,
        "16/01/2026 Reservas en millones de USD 44.808 Compra de divisas en millones de USD 231",
    )
    .unwrap();

    databcra()
        .arg("parse")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("2026-01-16"))
        .stdout(predicate::str::contains("44808"))
        .stdout(predicate::str::contains("231"));
}

#[test]
fn parse_writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bulletin.txt");
    let output = dir.path().join("record.json");
    std::fs::write(&input, "16/01/2026 Reservas 44.808 Sin intervención").unwrap();

    databcra()
        .arg("parse")
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let written = std::fs::read_to_string(&output).unwrap();
    assert!(written.contains("\"net_flow_millions_usd\": 0.0"), "{written}");
}

#[test]
fn parse_fails_on_missing_input() {
    databcra()
        .arg("parse")
        .arg("/nonexistent/bulletin.txt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn run_serves_cache_without_browser() {
    let dir = tempfile::tempdir().unwrap();
    let image_dir = dir.path().join("imagenes");
    std::fs::create_dir_all(&image_dir).unwrap();
    std::fs::write(image_dir.join("bcra_2026-01-19.jpg"), b"jpegbytes").unwrap();

    // The webdriver endpoint is unreachable on purpose: with a cached
    // image the run must never try to start a browser, so the failure
    // has to come from the OCR chain instead.
    let config_path = dir.path().join("databcra.json");
    std::fs::write(
        &config_path,
        format!(
            r#"{{
                "source": {{"image_dir": "{image}"}},
                "session": {{"webdriver_url": "http://127.0.0.1:9"}},
                "ocr": {{"model_dir": "{models}"}}
            }}"#,
            image = image_dir.display(),
            models = dir.path().join("models").display(),
        ),
    )
    .unwrap();

    databcra()
        .arg("--config")
        .arg(&config_path)
        .arg("run")
        .arg("--date")
        .arg("2026-01-19")
        .arg("--no-store")
        .env_remove("OPENAI_API_KEY")
        .env_remove("OCR_SERVICE_URL")
        .env_remove("OCR_SERVICE_KEY")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Using cached image"))
        .stderr(predicate::str::contains("OCR backends"))
        .stderr(predicate::str::contains("webdriver").not());
}

#[test]
fn config_init_then_show() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("databcra.json");

    databcra()
        .arg("config")
        .arg("init")
        .arg("--output")
        .arg(&path)
        .assert()
        .success();

    databcra()
        .arg("--config")
        .arg(&path)
        .arg("config")
        .arg("show")
        .assert()
        .success()
        .stdout(predicate::str::contains("BancoCentral_AR"));
}
