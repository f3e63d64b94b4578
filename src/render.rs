//! PDF renderer – takes a [`LayoutConfig`] and produces PDF bytes using
//! `printpdf` (v0.8 ops-based API).

use std::collections::{BTreeMap, HashMap, HashSet};

use printpdf::*;

use crate::assets::DataUri;
use crate::error::RenderError;
use crate::fonts::{FontKey, FontManager};
use crate::layout_config::*;
use crate::svg::parse_svg;

/// Points to millimetres.
const PT_TO_MM: f32 = 0.352778;

/// An image registered as an XObject, ready to be placed.
struct ImageResource {
    xobj_id: XObjectId,
    /// Size in points at which the XObject draws with a scale of 1.
    natural_width: f32,
    natural_height: f32,
    dpi: f32,
}

impl ImageResource {
    fn scale_to(&self, width: f32, height: f32) -> (f32, f32) {
        let scale = |target: f32, natural: f32| if natural > 0.0 { target / natural } else { 1.0 };
        (
            scale(width, self.natural_width),
            scale(height, self.natural_height),
        )
    }
}

/// Shared state while emitting ops for one document.
struct RenderContext<'a> {
    page_height: f32,
    images: HashMap<String, ImageResource>,
    fonts: &'a FontManager,
    font_ids: BTreeMap<FontKey, FontId>,
    /// Set once any glyph had to be replaced by `?`.
    substituted: bool,
}

/// Render a LayoutConfig into PDF bytes.
///
/// Images that cannot be decoded are skipped with a `log::warn`. Text uses the
/// embedded faces loaded into `fonts`, or builtin Helvetica when there are none.
pub fn render_pdf(config: &LayoutConfig, fonts: &FontManager) -> Result<Vec<u8>, RenderError> {
    let page_w = Mm(config.page_width_pt * PT_TO_MM);
    let page_h = Mm(config.page_height_pt * PT_TO_MM);

    let mut doc = PdfDocument::new(&config.title);

    // ── Embed fonts ───────────────────────────────────────────────────────
    let mut font_ids = BTreeMap::new();
    for (key, bytes) in fonts.loaded() {
        let parsed = ParsedFont::from_bytes(bytes, 0, &mut Vec::new()).ok_or_else(|| {
            RenderError::Pdf(format!("font '{}' could not be embedded", key.family))
        })?;
        font_ids.insert(key.clone(), doc.add_font(&parsed));
    }

    // ── Pre-register all images ────────────────────────────────────────────
    let mut all_srcs: HashSet<&str> = HashSet::new();
    for page_layout in &config.pages {
        for lbox in &page_layout.boxes {
            collect_image_srcs(lbox, &mut all_srcs);
        }
    }

    let mut images: HashMap<String, ImageResource> = HashMap::new();
    let mut img_warnings: Vec<PdfWarnMsg> = Vec::new();

    for src in all_srcs {
        let uri = match DataUri::parse(src) {
            Ok(uri) => uri,
            Err(e) => {
                log::warn!("skipping image: {e}");
                continue;
            }
        };

        if uri.is_svg() {
            match parse_svg(&String::from_utf8_lossy(&uri.bytes)) {
                Ok(svg) => {
                    let xobj_id = doc.add_xobject(&svg.xobject);
                    images.insert(
                        src.to_string(),
                        ImageResource {
                            xobj_id,
                            natural_width: svg.placed_width,
                            natural_height: svg.placed_height,
                            dpi: svg.dpi,
                        },
                    );
                }
                Err(e) => log::warn!("skipping image: {e}"),
            }
            continue;
        }

        // Decode with the `image` crate to obtain pixel dimensions.
        let dyn_img = match ::image::load_from_memory(&uri.bytes) {
            Ok(img) => img,
            Err(e) => {
                log::warn!("skipping image: decode error: {e}");
                continue;
            }
        };
        let (px_width, px_height) = (dyn_img.width(), dyn_img.height());

        // Register with printpdf as a reusable XObject.
        let raw = match RawImage::decode_from_bytes(&uri.bytes, &mut img_warnings) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("skipping image: PDF encode error: {e}");
                continue;
            }
        };
        let xobj_id = doc.add_image(&raw);

        // At dpi=72 printpdf renders 1 px = 1 pt.
        images.insert(
            src.to_string(),
            ImageResource {
                xobj_id,
                natural_width: px_width as f32,
                natural_height: px_height as f32,
                dpi: 72.0,
            },
        );
    }

    // ── Render pages ──────────────────────────────────────────────────────
    let mut ctx = RenderContext {
        page_height: config.page_height_pt,
        images,
        fonts,
        font_ids,
        substituted: false,
    };

    let mut pages: Vec<PdfPage> = config
        .pages
        .iter()
        .map(|page_layout| {
            let mut ops = Vec::new();
            for lbox in &page_layout.boxes {
                render_box(&mut ops, lbox, &mut ctx);
            }
            PdfPage::new(page_w, page_h, ops)
        })
        .collect();

    // Ensure at least one page.
    if pages.is_empty() {
        pages.push(PdfPage::new(page_w, page_h, Vec::new()));
    }

    if ctx.substituted {
        log::warn!("no embedded font covers some text; unsupported characters were rendered as '?'");
    }

    doc.with_pages(pages);
    let bytes = doc.save(&PdfSaveOptions::default(), &mut Vec::new());
    log::debug!("rendered {} page(s), {} bytes", config.pages.len().max(1), bytes.len());

    Ok(bytes)
}

/// Map a UTF-8 string onto WinAnsiEncoding for the builtin fonts. Characters
/// outside the code page become `?`; the flag reports whether that happened.
fn to_winlatin(s: &str) -> (String, bool) {
    let mut substituted = false;
    let bytes: Vec<u8> = s
        .chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80, // euro
            '\u{201A}' => 0x82, // single low-9 quote
            '\u{201E}' => 0x84, // double low-9 quote
            '\u{2026}' => 0x85, // ellipsis
            '\u{2018}' => 0x91, // left single quote
            '\u{2019}' => 0x92, // right single quote
            '\u{201C}' => 0x93, // left double quote
            '\u{201D}' => 0x94, // right double quote
            '\u{2022}' => 0x95, // bullet
            '\u{2013}' => 0x96, // en-dash
            '\u{2014}' => 0x97, // em-dash
            '\u{2122}' => 0x99, // trademark
            '\u{00A0}' => 0x20, // non-breaking space -> space
            c if (c as u32) < 256 => c as u8,
            _ => {
                substituted = true;
                b'?'
            }
        })
        .collect();
    // SAFETY: intentionally non-UTF-8 for 0x80-0xFF; printpdf passes these
    // bytes straight to the PDF stream, decoded by WinAnsiEncoding.
    #[allow(unsafe_code)]
    let text = unsafe { String::from_utf8_unchecked(bytes) };
    (text, substituted)
}

/// Recursively collect all unique `image.src` strings from a [`LayoutBox`] tree.
fn collect_image_srcs<'a>(lbox: &'a LayoutBox, srcs: &mut HashSet<&'a str>) {
    if let Some(img) = &lbox.image {
        srcs.insert(img.src.as_str());
    }
    for child in &lbox.children {
        collect_image_srcs(child, srcs);
    }
}

fn rgb(c: [f32; 4]) -> Color {
    Color::Rgb(Rgb {
        r: c[0],
        g: c[1],
        b: c[2],
        icc_profile: None,
    })
}

fn corner(x: f32, y: f32) -> LinePoint {
    LinePoint {
        p: Point { x: Pt(x), y: Pt(y) },
        bezier: false,
    }
}

/// Filled rectangle; `(x, y)` is the bottom-left corner in PDF space.
fn fill_rect(ops: &mut Vec<Op>, x: f32, y: f32, width: f32, height: f32, color: [f32; 4]) {
    ops.push(Op::SetFillColor { col: rgb(color) });
    ops.push(Op::DrawPolygon {
        polygon: Polygon {
            rings: vec![PolygonRing {
                points: vec![
                    corner(x, y),
                    corner(x + width, y),
                    corner(x + width, y + height),
                    corner(x, y + height),
                ],
            }],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        },
    });
}

/// Emit one run of text at a baseline position.
fn write_text(ops: &mut Vec<Op>, ctx: &mut RenderContext<'_>, text: &TextContent, run: &str, x: f32, y: f32) {
    ops.push(Op::StartTextSection);
    ops.push(Op::SetTextCursor {
        pos: Point { x: Pt(x), y: Pt(y) },
    });
    ops.push(Op::SetLineHeight {
        lh: Pt(text.line_height),
    });
    ops.push(Op::SetFillColor { col: rgb(text.color) });

    let embedded = ctx
        .fonts
        .resolve(&text.font_family, text.bold, text.italic)
        .and_then(|key| ctx.font_ids.get(key));
    match embedded {
        Some(font_id) => {
            ops.push(Op::SetFontSize {
                size: Pt(text.font_size),
                font: font_id.clone(),
            });
            ops.push(Op::WriteText {
                items: vec![TextItem::Text(run.to_string())],
                font: font_id.clone(),
            });
        }
        None => {
            let font = match (text.bold, text.italic) {
                (true, true) => BuiltinFont::HelveticaBoldOblique,
                (true, false) => BuiltinFont::HelveticaBold,
                (false, true) => BuiltinFont::HelveticaOblique,
                (false, false) => BuiltinFont::Helvetica,
            };
            let (encoded, substituted) = to_winlatin(run);
            ctx.substituted |= substituted;
            ops.push(Op::SetFontSizeBuiltinFont {
                size: Pt(text.font_size),
                font,
            });
            ops.push(Op::WriteTextBuiltinFont {
                items: vec![TextItem::Text(encoded)],
                font,
            });
        }
    }
    ops.push(Op::EndTextSection);
}

/// Recursively render a LayoutBox and its children into PDF ops.
fn render_box(ops: &mut Vec<Op>, lbox: &LayoutBox, ctx: &mut RenderContext<'_>) {
    // PDF coordinate system: origin at bottom-left.
    // Our layout uses origin at top-left. Convert:
    let pdf_y = ctx.page_height - lbox.y;

    if let Some(bg) = lbox.background_color {
        fill_rect(ops, lbox.x, pdf_y - lbox.height, lbox.width, lbox.height, bg);
    }

    if let Some(border) = &lbox.border {
        ops.push(Op::SetOutlineColor {
            col: rgb(border.color),
        });
        ops.push(Op::SetOutlineThickness {
            pt: Pt(border.width),
        });
        // Stroke along the centre of the border band.
        let half = border.width / 2.0;
        let (x1, x2) = (lbox.x + half, lbox.x + lbox.width - half);
        let (y1, y2) = (pdf_y - lbox.height + half, pdf_y - half);
        ops.push(Op::DrawLine {
            line: Line {
                points: vec![corner(x1, y2), corner(x2, y2), corner(x2, y1), corner(x1, y1)],
                is_closed: true,
            },
        });
    }

    if let Some(text) = &lbox.text {
        let ascender = ctx
            .fonts
            .ascender_px(text.font_size, text.bold, text.italic, &text.font_family);
        // Centre the glyph box inside the line box.
        let leading = (text.line_height - text.font_size).max(0.0) / 2.0;

        for tline in &text.lines {
            if tline.text.is_empty() {
                continue;
            }
            let text_x = lbox.x + tline.x_offset;
            let text_y = pdf_y - tline.y_offset - leading - ascender;
            write_text(ops, ctx, text, &tline.text, text_x, text_y);

            if text.underline {
                let line_width = ctx.fonts.measure_text_width(
                    &tline.text,
                    text.font_size,
                    text.bold,
                    text.italic,
                    &text.font_family,
                );
                let underline_y = text_y - text.font_size * 0.1;
                ops.push(Op::SetOutlineThickness { pt: Pt(0.5) });
                ops.push(Op::SetOutlineColor { col: rgb(text.color) });
                ops.push(Op::DrawLine {
                    line: Line {
                        points: vec![corner(text_x, underline_y), corner(text_x + line_width, underline_y)],
                        is_closed: false,
                    },
                });
            }
        }

        if let Some(marker) = &text.list_marker {
            let first_y = text.lines.first().map_or(0.0, |l| l.y_offset);
            let marker_y = pdf_y - first_y - leading - ascender;
            write_text(ops, ctx, text, marker, lbox.x - 16.0, marker_y);
        }
    }

    if let Some(img) = &lbox.image {
        if let Some(resource) = ctx.images.get(&img.src) {
            // translate_y = bottom edge of image in PDF coordinates.
            let img_bottom_y = pdf_y - img.height;
            let (scale_x, scale_y) = resource.scale_to(img.width, img.height);

            ops.push(Op::UseXobject {
                id: resource.xobj_id.clone(),
                transform: XObjectTransform {
                    translate_x: Some(Pt(lbox.x)),
                    translate_y: Some(Pt(img_bottom_y)),
                    dpi: Some(resource.dpi),
                    scale_x: Some(scale_x),
                    scale_y: Some(scale_y),
                    rotate: None,
                },
            });
        }
    }

    for child in &lbox.children {
        render_box(ops, child, ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_empty_page() {
        let config = LayoutConfig::a4();
        let bytes = render_pdf(&config, &FontManager::default()).unwrap();
        assert!(bytes.len() > 100, "PDF should have content");
        // PDF magic number
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn winlatin_substitutes_non_latin() {
        let (text, substituted) = to_winlatin("Café");
        assert!(!substituted);
        assert_eq!(text.as_bytes(), b"Caf\xe9");
        let (text, substituted) = to_winlatin("Ок");
        assert!(substituted);
        assert_eq!(text.as_bytes(), b"??");
    }

    #[test]
    fn svg_images_become_form_xobjects() {
        let src = DataUri::encode(
            "image/svg+xml",
            b"<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 2 2' width='2' height='2'>\
              <circle cx='1' cy='1' r='1' fill='#111827'/></svg>",
        );
        let mut lbox = LayoutBox::new(40.0, 40.0, 20.0, 20.0);
        lbox.image = Some(ImageContent {
            src,
            width: 20.0,
            height: 20.0,
        });
        let mut config = LayoutConfig::a4();
        config.pages.push(PageLayout {
            page_index: 0,
            boxes: vec![lbox],
        });
        let bytes = render_pdf(&config, &FontManager::default()).unwrap();
        assert_eq!(&bytes[0..5], b"%PDF-");
    }
}
