//! Debug artifact tests: paired files, directory handling, abort paths.

use std::fs;
use std::path::Path;
use std::process::Command;

use ticket_forge::artifacts::{generate_debug_artifacts, generate_debug_artifacts_at, DebugRun, ARTIFACT_PREFIX};
use ticket_forge::context::build_context;
use ticket_forge::error::RenderError;
use ticket_forge::renderer::Renderer;
use ticket_forge::templates::{default_template_dir, PDF_TEMPLATE_NAME};

fn renderer() -> Renderer {
    Renderer::new(default_template_dir()).unwrap()
}

fn run(dir: &Path) -> DebugRun<'_> {
    DebugRun {
        output_dir: dir,
        template: PDF_TEMPLATE_NAME,
        write_layout: false,
    }
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn writes_a_paired_html_and_pdf() {
    let out = tempfile::tempdir().unwrap();
    let renderer = renderer();
    let context = build_context().to_map().unwrap();

    let written = generate_debug_artifacts(&renderer, &context, &run(out.path())).unwrap();

    let names = file_names(out.path());
    assert_eq!(names.len(), 2);
    let html_stem = names[0].strip_suffix(".html").unwrap();
    let pdf_stem = names[1].strip_suffix(".pdf").unwrap();
    assert_eq!(html_stem, pdf_stem);
    let token = html_stem.strip_prefix(ARTIFACT_PREFIX).unwrap();
    assert_eq!(token.len(), "YYYYMMDD-HHMMSS".len());
    assert_eq!(token.as_bytes()[8], b'-');

    let html = fs::read_to_string(&written.html).unwrap();
    let expected = renderer.render_ticket(&context, PDF_TEMPLATE_NAME).unwrap();
    assert_eq!(html, expected.html);
    assert!(fs::read(&written.pdf).unwrap().starts_with(b"%PDF-"));
    assert!(written.layout_json.is_none());
}

#[test]
fn output_directory_is_created_and_reused() {
    let root = tempfile::tempdir().unwrap();
    let out = root.path().join("nested").join("artifacts");
    let renderer = renderer();
    let context = build_context().to_map().unwrap();

    generate_debug_artifacts_at(&renderer, &context, &run(&out), "20251112-080000").unwrap();
    generate_debug_artifacts_at(&renderer, &context, &run(&out), "20251112-080001").unwrap();

    assert_eq!(
        file_names(&out),
        vec![
            "ticket_weasy_debug_20251112-080000.html",
            "ticket_weasy_debug_20251112-080000.pdf",
            "ticket_weasy_debug_20251112-080001.html",
            "ticket_weasy_debug_20251112-080001.pdf",
        ]
    );
}

#[test]
fn layout_json_is_optional() {
    let out = tempfile::tempdir().unwrap();
    let context = build_context().to_map().unwrap();
    let written = generate_debug_artifacts_at(
        &renderer(),
        &context,
        &DebugRun {
            write_layout: true,
            ..run(out.path())
        },
        "20251112-080000",
    )
    .unwrap();

    let path = written.layout_json.unwrap();
    assert!(path.ends_with("ticket_weasy_debug_20251112-080000.layout.json"));
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert!(json["pages"].as_array().is_some_and(|p| !p.is_empty()));
}

#[test]
fn validation_failure_writes_nothing() {
    let out = tempfile::tempdir().unwrap();
    let mut context = build_context().to_map().unwrap();
    context.remove("deep_link");

    let err = generate_debug_artifacts(&renderer(), &context, &run(out.path())).unwrap_err();
    match err {
        RenderError::Validation(v) => assert_eq!(v.missing, vec!["deep_link"]),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(file_names(out.path()).is_empty());
}

#[test]
fn failed_pdf_write_removes_the_html() {
    let out = tempfile::tempdir().unwrap();
    // A directory where the PDF should go makes that write fail.
    fs::create_dir(out.path().join("ticket_weasy_debug_20251112-080000.pdf")).unwrap();
    let context = build_context().to_map().unwrap();

    let err = generate_debug_artifacts_at(&renderer(), &context, &run(out.path()), "20251112-080000")
        .unwrap_err();
    assert!(matches!(err, RenderError::Io(_)), "{err:?}");
    assert_eq!(file_names(out.path()), vec!["ticket_weasy_debug_20251112-080000.pdf"]);
}

// =====================================================================
// Binary
// =====================================================================

#[test]
fn binary_prints_both_paths() {
    let out = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_ticket-debug"))
        .arg("--output-dir")
        .arg(out.path())
        .env_remove("TICKET_TEMPLATE_DIR")
        .env_remove("TICKET_FONT")
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2, "{stdout}");
    assert!(lines[0].starts_with("HTML saved to "));
    assert!(lines[1].starts_with("PDF saved to "));
    let html = Path::new(lines[0].trim_start_matches("HTML saved to "));
    let pdf = Path::new(lines[1].trim_start_matches("PDF saved to "));
    assert!(html.is_file());
    assert!(pdf.is_file());
    assert_eq!(html.file_stem(), pdf.file_stem());
}

#[test]
fn binary_exits_non_zero_without_templates() {
    let out = tempfile::tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_ticket-debug"))
        .arg("--output-dir")
        .arg(out.path())
        .arg("--template-dir")
        .arg(out.path().join("missing"))
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"), "{stderr}");
    assert!(stderr.contains("missing"), "{stderr}");
    assert!(file_names(out.path()).is_empty());
}
