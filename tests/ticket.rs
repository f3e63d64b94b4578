//! End-to-end tests over the shipped ticket templates.

use serde_json::Value;

use ticket_forge::context::{build_context, build_context_with, Fixture, TicketStatus};
use ticket_forge::error::RenderError;
use ticket_forge::renderer::Renderer;
use ticket_forge::templates::{default_template_dir, BROWSER_TEMPLATE_NAME, PDF_TEMPLATE_NAME};

fn renderer() -> Renderer {
    Renderer::new(default_template_dir()).unwrap()
}

#[test]
fn injected_markup_is_escaped() {
    let mut ticket = build_context();
    ticket.passenger.name = "<script>alert(1)</script> & co".to_string();
    ticket.route.label = "<b>bold</b>".to_string();
    let context = ticket.to_map().unwrap();

    let html = renderer().render_html(&context, PDF_TEMPLATE_NAME).unwrap();
    assert!(!html.contains("<script>"));
    assert!(!html.contains("<b>bold"));
    assert!(html.contains("&lt;script&gt;alert(1)&lt;&#x2F;script&gt; &amp; co"));
    assert!(html.contains("&lt;b&gt;bold"));
}

/// Replace every string leaf with `marker`, counting the replacements.
fn poison_strings(value: &mut Value, marker: &str) -> usize {
    match value {
        Value::String(s) => {
            *s = marker.to_string();
            1
        }
        Value::Array(items) => items.iter_mut().map(|v| poison_strings(v, marker)).sum(),
        Value::Object(map) => map.values_mut().map(|v| poison_strings(v, marker)).sum(),
        _ => 0,
    }
}

#[test]
fn every_string_field_is_escaped() {
    let mut context = build_context().to_map().unwrap();
    let mut replaced = 0;
    for (key, value) in context.iter_mut() {
        if key != "status_chip" {
            replaced += poison_strings(value, "<&>");
        }
    }
    assert!(replaced > 20, "only {replaced} string fields found");

    let renderer = renderer();
    for template in [PDF_TEMPLATE_NAME, BROWSER_TEMPLATE_NAME] {
        let html = renderer.render_html(&context, template).unwrap();
        assert!(!html.contains("<&>"), "{template} emitted a field unescaped");
        assert!(html.contains("&lt;&amp;&gt;"), "{template} emitted no fields");
    }
}

#[test]
fn default_ticket_embeds_truetype_fonts() {
    let context = build_context().to_map().unwrap();
    let rendered = renderer().render_ticket(&context, PDF_TEMPLATE_NAME).unwrap();

    let pdf = &rendered.pdf;
    assert!(pdf.windows(b"FontFile2".len()).any(|w| w == b"FontFile2"));
    assert!(rendered.layout.text().contains("Электронный"));
}

#[test]
fn status_chip_is_emitted_as_markup() {
    let mut ticket = build_context();
    ticket.status_chip = TicketStatus::Pending.status_chip();
    let html = renderer()
        .render_html(&ticket.to_map().unwrap(), PDF_TEMPLATE_NAME)
        .unwrap();
    assert!(html.contains("<span class='status-chip status-pending'>Ожидает оплаты</span>"));
}

#[test]
fn html_is_deterministic() {
    let renderer = renderer();
    let context = build_context().to_map().unwrap();
    let first = renderer.render_html(&context, PDF_TEMPLATE_NAME).unwrap();
    let second = renderer.render_html(&context, PDF_TEMPLATE_NAME).unwrap();
    assert_eq!(first, second);
}

#[test]
fn stress_ticket_renders_to_pdf() {
    let renderer = renderer();
    let context = build_context_with(Fixture::Stress).to_map().unwrap();
    let rendered = renderer.render_ticket(&context, PDF_TEMPLATE_NAME).unwrap();

    assert_eq!(&rendered.pdf[0..5], b"%PDF-");
    assert_eq!(
        rendered.html,
        renderer.render_html(&context, PDF_TEMPLATE_NAME).unwrap()
    );
    assert!(rendered.layout.title.starts_with("Электронный билет"));
    assert!(!rendered.layout.pages.is_empty());
}

#[test]
fn standard_ticket_renders_to_pdf() {
    let context = build_context_with(Fixture::Standard).to_map().unwrap();
    let rendered = renderer().render_ticket(&context, PDF_TEMPLATE_NAME).unwrap();
    assert_eq!(&rendered.pdf[0..5], b"%PDF-");
    assert!(rendered.layout.text().contains("12A"));
}

#[test]
fn browser_template_shares_the_field_contract() {
    let context = build_context().to_map().unwrap();
    let html = renderer().render_html(&context, BROWSER_TEMPLATE_NAME).unwrap();
    assert!(html.contains("+7 (999) 123-45-67"));
    assert!(html.contains("status-chip status-paid"));
}

#[test]
fn missing_keys_abort_before_rendering() {
    let mut context = build_context().to_map().unwrap();
    context.remove("route");
    context.remove("qr_data_uri");
    let err = renderer().render_ticket(&context, PDF_TEMPLATE_NAME).unwrap_err();
    match err {
        RenderError::Validation(v) => assert_eq!(v.missing, vec!["qr_data_uri", "route"]),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn unknown_template_is_reported() {
    let context = build_context().to_map().unwrap();
    let err = renderer().render_html(&context, "nope.html").unwrap_err();
    assert!(matches!(err, RenderError::TemplateNotFound(ref n) if n == "nope.html"));
}

#[test]
fn missing_template_directory_fails_at_startup() {
    let dir = tempfile::tempdir().unwrap();
    let err = Renderer::new(dir.path().join("templates")).unwrap_err();
    assert!(matches!(err, RenderError::DependencyMissing(_)));
    assert!(err.to_string().contains("templates"));
}
