use assert_cmd::Command;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use predicates::prelude::*;
use serde_json::Value;
use std::path::{Path, PathBuf};

fn cli() -> Command {
    Command::cargo_bin("paperdesk-cli").expect("binary should build")
}

/// Writes a generated US-Letter PDF with `pages` pages into `dir`.
fn fixture_pdf(dir: &Path, name: &str, pages: usize) -> PathBuf {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for index in 0..pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(format!("Page {}", index + 1))]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("content should encode"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(pages as i64),
            "Resources" => resources_id,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let path = dir.join(name);
    doc.save(&path).expect("fixture should save");
    path
}

#[test]
fn info_emits_json_contract() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = fixture_pdf(temp.path(), "small.pdf", 2);

    let output = cli().arg("info").arg(&pdf).assert().success().get_output().stdout.clone();

    let value: Value = serde_json::from_slice(&output).expect("stdout should contain valid json");
    assert_eq!(value["page_count"], 2);
    assert_eq!(value["path"], pdf.display().to_string());
    assert_eq!(value["first_page_size_pt"]["width"], 612.0);
    assert_eq!(value["first_page_size_pt"]["height"], 792.0);
}

#[test]
fn render_page_writes_png_at_zoom() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = fixture_pdf(temp.path(), "medium.pdf", 3);
    let output_path = temp.path().join("page.png");

    cli()
        .arg("render-page")
        .arg(&pdf)
        .arg("--page")
        .arg("2")
        .arg("--zoom")
        .arg("150")
        .arg("--output")
        .arg(&output_path)
        .assert()
        .success();

    let raster = image::open(&output_path).expect("output should be a readable image");
    assert_eq!(raster.width(), 918);
    assert_eq!(raster.height(), 1188);
}

#[test]
fn render_page_rejects_page_zero() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = fixture_pdf(temp.path(), "small.pdf", 1);

    cli()
        .arg("render-page")
        .arg(&pdf)
        .arg("--page")
        .arg("0")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--page is 1-based"));
}

#[test]
fn gen_icon_writes_icon_set() {
    let temp = tempfile::tempdir().expect("temp dir should be created");

    cli().arg("gen-icon").arg("--output").arg(temp.path()).assert().success();

    for name in ["icon.png", "icon.ico", "icon_48x48.png", "icon_64x64.png", "icon_128x128.png"] {
        assert!(temp.path().join(name).exists(), "{name} should exist");
    }

    let base = image::open(temp.path().join("icon.png")).expect("icon should decode");
    assert_eq!((base.width(), base.height()), (256, 256));
}

#[test]
fn doctor_reports_backends() {
    cli()
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("geometry backend: available"));
}

#[test]
fn open_supports_dry_run_for_tests() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = fixture_pdf(temp.path(), "small.pdf", 1);

    cli()
        .arg("open")
        .arg(&pdf)
        .env("PAPERDESK_TEST_NO_SPAWN", "1")
        .assert()
        .success()
        .stdout(predicate::str::contains("open:"));
}

#[test]
fn info_fails_for_missing_file() {
    cli()
        .arg("info")
        .arg("missing.pdf")
        .assert()
        .failure()
        .stderr(predicate::str::contains("file does not exist"));
}

#[test]
fn info_fails_for_invalid_pdf() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let bogus = temp.path().join("invalid.pdf");
    std::fs::write(&bogus, b"this is not a pdf").expect("fixture should write");

    cli()
        .arg("info")
        .arg(&bogus)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open PDF"));
}

#[test]
fn info_fails_for_encrypted_marker_pdf() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pdf = fixture_pdf(temp.path(), "plain.pdf", 1);
    let mut bytes = std::fs::read(&pdf).expect("fixture should read");
    bytes.extend_from_slice(b"\n/Encrypt\n");
    let encrypted = temp.path().join("encrypted-marker.pdf");
    std::fs::write(&encrypted, bytes).expect("fixture should write");

    cli()
        .arg("info")
        .arg(&encrypted)
        .assert()
        .failure()
        .stderr(predicate::str::contains("encrypted PDFs are not supported"));
}
