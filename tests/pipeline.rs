//! Integration tests for the HTML → PDF pipeline.
//!
//! These tests validate:
//! - Parsed structure of the supported elements
//! - Layout positions stay inside the page
//! - Pagination and forced breaks
//! - PDF output exists and has valid format

use ticket_forge::assets::DataUri;
use ticket_forge::dom::{document_head, parse_html, DomNode, StylesheetSource, Tag};
use ticket_forge::layout_config::{LayoutBox, LayoutConfig};
use ticket_forge::pipeline::{compute_layout_config, generate_pdf, PipelineConfig};

// =====================================================================
// Helper
// =====================================================================

fn default_config() -> PipelineConfig {
    PipelineConfig::default()
}

fn layout(html: &str) -> LayoutConfig {
    compute_layout_config(html, &default_config()).unwrap()
}

fn assert_valid_pdf(bytes: &[u8]) {
    assert!(bytes.len() > 100, "PDF too small: {} bytes", bytes.len());
    assert_eq!(&bytes[0..5], b"%PDF-", "Missing PDF header");
}

fn visit_box(lbox: &LayoutBox, f: &mut dyn FnMut(&LayoutBox)) {
    f(lbox);
    for child in &lbox.children {
        visit_box(child, f);
    }
}

fn visit_all(config: &LayoutConfig, f: &mut dyn FnMut(&LayoutBox)) {
    for page in &config.pages {
        for lbox in &page.boxes {
            visit_box(lbox, f);
        }
    }
}

fn count_boxes(config: &LayoutConfig) -> usize {
    let mut count = 0;
    visit_all(config, &mut |_| count += 1);
    count
}

const SQUARE_SVG: &str = "<svg xmlns='http://www.w3.org/2000/svg' width='10' height='10'>\
<rect width='10' height='10' fill='#000000'/></svg>";

const TICKET_LIKE: &str = r#"
<html>
<head>
  <title>Ticket</title>
  <style>
    .card { border: 1px solid #d1d5db; padding: 12px; }
    .row { display: flex; gap: 8px; }
    .cell { flex: 1; }
    .numbers { display: grid; grid-template-columns: repeat(2, 1fr); gap: 4px; }
    .muted { color: #6b7280; font-size: 8pt; }
  </style>
</head>
<body>
  <div class="card">
    <h1>Электронный билет</h1>
    <div class="numbers">
      <div><div class="muted">Билет №</div><div>TICKET-1234567890123456789012345678901234567890</div></div>
      <div><div class="muted">Заказ №</div><div>ORDER-ABCDEFGHIJKLMNOPQRSTUVWXYZABCDEFGHIJKLMNOPQRSTUVWXYZ</div></div>
    </div>
    <div class="row">
      <div class="cell">verylongemailaddress.with.a.lot.of.parts.and.subdomains@example.com</div>
      <div class="cell">Россия, Республика Татарстан, город Казань, улица Санкт-Петербургская</div>
    </div>
  </div>
</body>
</html>
"#;

// =====================================================================
// DOM parsing tests
// =====================================================================

#[test]
fn parse_heading_elements() {
    for tag in ["h1", "h2", "h3"] {
        let html = format!("<{0}>Title</{0}>", tag);
        let dom = parse_html(&html);
        assert_eq!(dom.len(), 1);
        if let DomNode::Element(e) = &dom[0] {
            match tag {
                "h1" => assert_eq!(e.tag, Tag::H1),
                "h2" => assert_eq!(e.tag, Tag::H2),
                "h3" => assert_eq!(e.tag, Tag::H3),
                _ => unreachable!(),
            }
        } else {
            panic!("Expected element for <{}>", tag);
        }
    }
}

#[test]
fn parse_table_structure() {
    let html = r#"
        <table>
            <tr><th>Name</th><th>Value</th></tr>
            <tr><td>Alpha</td><td>100</td></tr>
            <tr><td>Beta</td><td>200</td></tr>
        </table>
    "#;
    let dom = parse_html(html);
    let table = dom
        .iter()
        .find(|n| matches!(n, DomNode::Element(e) if e.tag == Tag::Table));
    assert!(table.is_some(), "Should find a <table>");
    if let Some(DomNode::Element(t)) = table {
        assert_eq!(t.children.len(), 3, "Table should have 3 rows");
    }
}

#[test]
fn parse_image() {
    let html = r#"<img src="qr.svg" style="width: 96px; height: 96px">"#;
    let dom = parse_html(html);
    assert_eq!(dom.len(), 1);
    if let DomNode::Element(img) = &dom[0] {
        assert_eq!(img.tag, Tag::Img);
        assert_eq!(img.src(), Some("qr.svg"));
    } else {
        panic!("Expected <img>");
    }
}

#[test]
fn head_metadata_is_collected_in_document_order() {
    let dom = parse_html(
        "<html><head><title>T</title><link rel='stylesheet' href='a.css'>\
         <style>p { color: red }</style></head><body><p>x</p></body></html>",
    );
    let head = document_head(&dom);
    assert_eq!(head.title.as_deref(), Some("T"));
    assert_eq!(
        head.stylesheets,
        vec![
            StylesheetSource::Linked("a.css".to_string()),
            StylesheetSource::Inline("p { color: red }".to_string()),
        ]
    );
}

// =====================================================================
// Layout config position tests
// =====================================================================

#[test]
fn layout_positions_are_within_page() {
    let config = layout(TICKET_LIKE);
    let page_w = config.page_width_pt;
    let page_h = config.page_height_pt;

    visit_all(&config, &mut |lbox| {
        assert!(
            lbox.x >= 0.0 && lbox.x < page_w,
            "Box x={} outside page width={}",
            lbox.x,
            page_w
        );
        assert!(
            lbox.y >= 0.0 && lbox.y < page_h,
            "Box y={} outside page height={}",
            lbox.y,
            page_h
        );
        assert!(lbox.width >= 0.0, "Negative width: {}", lbox.width);
        assert!(lbox.height >= 0.0, "Negative height: {}", lbox.height);
    });
}

#[test]
fn layout_content_width_matches_page() {
    let cfg = default_config();
    let config = layout("<div style=\"width: 100%\"><p>Full width</p></div>");
    let content_width = cfg.page_width - 2.0 * cfg.page_margin;

    for page in &config.pages {
        for lbox in &page.boxes {
            assert!(
                lbox.width <= content_width + 1.0,
                "Box width {} exceeds content width {}",
                lbox.width,
                content_width
            );
        }
    }
}

#[test]
fn unbreakable_tokens_wrap_inside_their_column() {
    let config = layout(TICKET_LIKE);
    let mut checked = 0;
    visit_all(&config, &mut |lbox| {
        if let Some(text) = &lbox.text {
            if text.lines.len() > 1 {
                checked += 1;
            }
            for line in &text.lines {
                assert!(line.x_offset >= 0.0);
            }
        }
    });
    assert!(checked > 0, "long identifiers should wrap onto several lines");
}

// =====================================================================
// Pagination tests
// =====================================================================

#[test]
fn single_paragraph_fits_one_page() {
    assert_eq!(layout("<p>Short</p>").pages.len(), 1);
}

#[test]
fn many_paragraphs_create_multiple_pages() {
    let mut html = String::new();
    for i in 0..80 {
        html.push_str(&format!(
            "<p>Paragraph {} with enough text to take up some vertical space on the page.</p>",
            i
        ));
    }

    let config = layout(&html);
    assert!(
        config.pages.len() > 1,
        "Expected multiple pages, got {}",
        config.pages.len()
    );
}

#[test]
fn page_break_before() {
    let html = r#"<p>Page 1 content</p><p style="break-before: page">Page 2 content</p>"#;
    let config = layout(html);
    assert!(
        config.pages.len() >= 2,
        "Expected at least 2 pages with break-before"
    );
}

// =====================================================================
// PDF generation tests
// =====================================================================

#[test]
fn generate_pdf_from_ticket_like_markup() {
    let (bytes, config) = generate_pdf(TICKET_LIKE, &default_config()).unwrap();
    assert_valid_pdf(&bytes);
    assert_eq!(config.title, "Ticket");
    assert!(!config.pages.is_empty());
}

#[test]
fn pdf_output_is_stable_in_size() {
    let (bytes1, _) = generate_pdf(TICKET_LIKE, &default_config()).unwrap();
    let (bytes2, _) = generate_pdf(TICKET_LIKE, &default_config()).unwrap();

    // printpdf embeds timestamps, so byte-exact equality isn't guaranteed.
    let diff = (bytes1.len() as i64 - bytes2.len() as i64).unsigned_abs();
    assert!(
        diff < 200,
        "PDF outputs differ significantly: {} vs {} bytes",
        bytes1.len(),
        bytes2.len()
    );
}

#[test]
fn layout_json_is_written_for_every_page() {
    let config = layout(TICKET_LIKE);
    let json: serde_json::Value = serde_json::from_str(&config.to_json().unwrap()).unwrap();
    assert_eq!(json["pages"].as_array().unwrap().len(), config.pages.len());
    assert_eq!(json["title"], "Ticket");
}

// =====================================================================
// Text / inline tests
// =====================================================================

#[test]
fn inline_spans_produce_text_content() {
    let html = r#"<p>Hello <strong>bold</strong> world</p>"#;
    let config = layout(html);
    assert!(config.text().contains("Hello bold world"));
}

// =====================================================================
// Table layout tests
// =====================================================================

#[test]
fn table_produces_row_and_cell_boxes() {
    let html = r#"
        <table style="width: 100%">
            <tr><th>A</th><th>B</th></tr>
            <tr><td>1</td><td>2</td></tr>
        </table>
    "#;
    let config = layout(html);
    let total_boxes = count_boxes(&config);
    assert!(
        total_boxes >= 4,
        "Table should produce at least 4 boxes, got {}",
        total_boxes
    );
}

// =====================================================================
// Image handling test
// =====================================================================

#[test]
fn svg_data_uri_produces_image_content() {
    let src = DataUri::encode("image/svg+xml", SQUARE_SVG.as_bytes());
    let html = format!(r#"<img src="{src}" style="width: 100px; height: 50px">"#);
    let config = layout(&html);

    let mut found_image = false;
    visit_all(&config, &mut |b| {
        if let Some(img) = &b.image {
            assert_eq!(img.src, src);
            assert_eq!((img.width, img.height), (100.0, 50.0));
            found_image = true;
        }
    });
    assert!(found_image, "Should find image content");
}

#[test]
fn image_files_are_inlined_relative_to_base_url() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("qr.svg"), SQUARE_SVG).unwrap();
    let config = PipelineConfig {
        base_url: dir.path().to_str().map(str::to_string),
        ..PipelineConfig::default()
    };
    let layout = compute_layout_config(r#"<img src="qr.svg">"#, &config).unwrap();

    let mut sources = Vec::new();
    visit_all(&layout, &mut |b| {
        if let Some(img) = &b.image {
            sources.push(img.src.clone());
        }
    });
    assert_eq!(sources.len(), 1);
    assert!(sources[0].starts_with("data:image/svg+xml;base64,"));
}

#[test]
fn missing_image_is_skipped() {
    let config = layout(r#"<p>before</p><img src="nowhere.png"><p>after</p>"#);
    let mut images = 0;
    visit_all(&config, &mut |b| images += usize::from(b.image.is_some()));
    assert_eq!(images, 0);
    assert!(config.text().contains("after"));
}

// =====================================================================
// List layout tests
// =====================================================================

#[test]
fn ordered_list_items_carry_markers() {
    let config = layout("<ol><li>First</li><li>Second</li><li>Third</li></ol>");
    let mut markers = Vec::new();
    visit_all(&config, &mut |b| {
        if let Some(marker) = b.text.as_ref().and_then(|t| t.list_marker.clone()) {
            markers.push(marker);
        }
    });
    assert_eq!(markers, vec!["1. ", "2. ", "3. "]);
}

#[test]
fn malformed_colors_do_not_abort_rendering() {
    let html = "<div style='color: #\u{e9}a; background: #ééé'>x</div>\
                <p style='border: 1px solid #12345'>y</p>";
    let (bytes, _) = generate_pdf(html, &default_config()).unwrap();
    assert_valid_pdf(&bytes);
}
