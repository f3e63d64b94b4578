//! Pipeline – ties together parsing, stylesheet loading, styling, layout,
//! pagination, and rendering into a single function call.

use std::path::PathBuf;

use crate::assets::{AssetLocation, AssetResolver};
use crate::css::Stylesheet;
use crate::dom::{body_children, document_head, parse_html, StylesheetSource};
use crate::error::RenderError;
use crate::fonts::FontManager;
use crate::layout::compute_layout;
use crate::layout_config::LayoutConfig;
use crate::pagination::{paginate, PAGE_MARGIN_PT};
use crate::render::render_pdf;
use crate::style::build_styled_tree;

/// Title used when neither the config nor the document provides one.
pub const DEFAULT_TITLE: &str = "ticket";

/// Page orientation for the generated PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageOrientation {
    /// Portrait mode: height > width (default).
    #[default]
    Portrait,
    /// Landscape mode: width > height.
    Landscape,
}

/// Configuration for the PDF generation pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Overrides the document's `<title>` in the PDF metadata.
    pub title: Option<String>,
    /// Page width in points (default: A4 = 595.28).
    pub page_width: f32,
    /// Page height in points (default: A4 = 841.89).
    pub page_height: f32,
    /// Page margin in points (default: 40).
    pub page_margin: f32,
    /// Page orientation; swaps effective width/height when `Landscape`.
    pub orientation: PageOrientation,
    /// Directory (or `file://` URL) that relative stylesheet, font and image
    /// references resolve against.
    pub base_url: Option<String>,
    /// TrueType font used for any family without its own `@font-face`.
    pub fallback_font: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            title: None,
            page_width: 595.28,
            page_height: 841.89,
            page_margin: PAGE_MARGIN_PT,
            orientation: PageOrientation::Portrait,
            base_url: None,
            fallback_font: None,
        }
    }
}

impl PipelineConfig {
    /// Effective page width after applying orientation.
    pub fn effective_width(&self) -> f32 {
        match self.orientation {
            PageOrientation::Portrait => self.page_width,
            PageOrientation::Landscape => self.page_height,
        }
    }

    /// Effective page height after applying orientation.
    pub fn effective_height(&self) -> f32 {
        match self.orientation {
            PageOrientation::Portrait => self.page_height,
            PageOrientation::Landscape => self.page_width,
        }
    }

    /// Create an A4 landscape config.
    pub fn a4_landscape() -> Self {
        Self {
            orientation: PageOrientation::Landscape,
            ..Self::default()
        }
    }

    /// Apply `@page` size and margin from the document's stylesheets.
    fn with_page_rule(&self, sheet: &Stylesheet) -> Self {
        let mut config = self.clone();
        let page = sheet.page;
        if let Some((w, h)) = page.size {
            config.page_width = w.min(h);
            config.page_height = w.max(h);
            // Explicit `size: W H` wider than tall means landscape too.
            if page.landscape || w > h {
                config.orientation = PageOrientation::Landscape;
            }
        } else if page.landscape {
            config.orientation = PageOrientation::Landscape;
        }
        if let Some(margin) = page.margin {
            config.page_margin = margin;
        }
        config
    }
}

/// Everything needed to turn a paginated layout into bytes.
struct Prepared {
    layout: LayoutConfig,
    fonts: FontManager,
}

fn prepare(html: &str, config: &PipelineConfig) -> Result<Prepared, RenderError> {
    let resolver = AssetResolver::new(config.base_url.as_deref());

    // 1. Parse HTML
    let dom = parse_html(html);
    let head = document_head(&dom);

    // 2. Stylesheets, in document order
    let mut sheet = Stylesheet::default();
    for source in &head.stylesheets {
        match source {
            StylesheetSource::Inline(css) => sheet.append(css),
            StylesheetSource::Linked(href) => {
                if resolver.locate(href) == AssetLocation::Remote {
                    log::warn!("skipping remote stylesheet {href}");
                    continue;
                }
                sheet.append(&resolver.load_stylesheet(href)?);
            }
        }
    }
    log::debug!(
        "loaded {} style rules, {} font faces",
        sheet.rules.len(),
        sheet.font_faces.len()
    );

    // 3. Fonts
    let fonts = load_fonts(&sheet, &resolver, config)?;

    // 4. Build styled tree; images become data URIs or are dropped
    let dom_nodes = body_children(&dom);
    let mut styled = build_styled_tree(&dom_nodes, &sheet);
    resolver.inline_images(&mut styled);

    // 5. Compute layout
    let page = config.with_page_rule(&sheet);
    let eff_w = page.effective_width();
    let eff_h = page.effective_height();
    let boxes = compute_layout(&styled, eff_w, page.page_margin, &fonts)?;

    // 6. Paginate
    let mut layout = paginate(&boxes, eff_w, eff_h, page.page_margin, &fonts);
    layout.title = config
        .title
        .clone()
        .or(head.title)
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());
    log::debug!("paginated into {} page(s)", layout.pages.len());

    Ok(Prepared { layout, fonts })
}

fn load_fonts(
    sheet: &Stylesheet,
    resolver: &AssetResolver,
    config: &PipelineConfig,
) -> Result<FontManager, RenderError> {
    let mut fonts = FontManager::new();

    for face in &sheet.font_faces {
        if resolver.locate(&face.src) == AssetLocation::Remote {
            log::warn!("skipping remote font {} for '{}'", face.src, face.family);
            continue;
        }
        let bytes = resolver.load(&face.src)?;
        fonts
            .load_font(&face.family, face.bold, face.italic, bytes)
            .map_err(|e| RenderError::Asset {
                href: face.src.clone(),
                path: resolver.base().map(|b| b.join(&face.src)).unwrap_or_default(),
                reason: e.to_string(),
            })?;
    }

    if let Some(path) = &config.fallback_font {
        let bytes = std::fs::read(path).map_err(|e| RenderError::Asset {
            href: path.display().to_string(),
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let family = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("fallback");
        fonts
            .load_font(family, false, false, bytes)
            .map_err(|e| RenderError::Asset {
                href: path.display().to_string(),
                path: path.clone(),
                reason: e.to_string(),
            })?;
    }

    if !fonts.has_real_fonts() {
        log::debug!("no TrueType font configured; using builtin Helvetica");
    }
    Ok(fonts)
}

/// Full pipeline: HTML string → PDF bytes.
///
/// Returns the PDF bytes together with the layout they were rendered from.
pub fn generate_pdf(html: &str, config: &PipelineConfig) -> Result<(Vec<u8>, LayoutConfig), RenderError> {
    let Prepared { layout, fonts } = prepare(html, config)?;
    let pdf_bytes = render_pdf(&layout, &fonts)?;
    Ok((pdf_bytes, layout))
}

/// Generate only the layout config (no PDF rendering).
pub fn compute_layout_config(html: &str, config: &PipelineConfig) -> Result<LayoutConfig, RenderError> {
    prepare(html, config).map(|prepared| prepared.layout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_basic() {
        let html = "<h1>Hello</h1><p>World</p>";
        let (bytes, config) = generate_pdf(html, &PipelineConfig::default()).unwrap();
        assert!(!bytes.is_empty());
        assert!(!config.pages.is_empty());
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn document_title_and_config_override() {
        let html = "<html><head><title>Билет 42</title></head><body><p>x</p></body></html>";
        let layout = compute_layout_config(html, &PipelineConfig::default()).unwrap();
        assert_eq!(layout.title, "Билет 42");

        let config = PipelineConfig {
            title: Some("override".to_string()),
            ..PipelineConfig::default()
        };
        assert_eq!(compute_layout_config(html, &config).unwrap().title, "override");
        assert_eq!(
            compute_layout_config("<p>x</p>", &PipelineConfig::default()).unwrap().title,
            DEFAULT_TITLE
        );
    }

    #[test]
    fn page_rule_sets_geometry() {
        let html = "<style>@page { size: A4 landscape; margin: 20px }</style><p>x</p>";
        let layout = compute_layout_config(html, &PipelineConfig::default()).unwrap();
        assert!((layout.page_width_pt - 841.89).abs() < 0.01);
        assert!((layout.page_height_pt - 595.28).abs() < 0.01);
        let first = &layout.pages[0].boxes[0];
        assert!((first.x - 20.0).abs() < 0.01);
    }

    #[test]
    fn landscape_orientation_swaps_dimensions() {
        let layout = compute_layout_config("<p>x</p>", &PipelineConfig::a4_landscape()).unwrap();
        assert!(layout.page_width_pt > layout.page_height_pt);
    }

    #[test]
    fn linked_stylesheet_resolves_against_base_url() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("t.css"), "p { font-size: 30px }").unwrap();
        let config = PipelineConfig {
            base_url: dir.path().to_str().map(str::to_string),
            ..PipelineConfig::default()
        };
        let html = "<link rel='stylesheet' href='t.css'><p>x</p>";
        let layout = compute_layout_config(html, &config).unwrap();
        let text = layout.pages[0].boxes[0].text.as_ref().unwrap();
        assert_eq!(text.font_size, 30.0);
    }

    #[test]
    fn missing_stylesheet_and_font_are_asset_errors() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            base_url: dir.path().to_str().map(str::to_string),
            ..PipelineConfig::default()
        };
        let err = generate_pdf("<link rel='stylesheet' href='nope.css'><p>x</p>", &config).unwrap_err();
        assert!(matches!(err, RenderError::Asset { .. }), "{err:?}");

        let html = "<style>@font-face { font-family: X; src: url(x.ttf) }</style><p>x</p>";
        let err = generate_pdf(html, &config).unwrap_err();
        assert!(matches!(err, RenderError::Asset { .. }), "{err:?}");

        let config = PipelineConfig {
            fallback_font: Some(dir.path().join("missing.ttf")),
            ..PipelineConfig::default()
        };
        assert!(matches!(
            generate_pdf("<p>x</p>", &config),
            Err(RenderError::Asset { .. })
        ));
    }

    #[test]
    fn remote_references_are_skipped() {
        let html = "<link rel='stylesheet' href='https://cdn.example.com/x.css'>\
                    <p>x</p><img src='https://cdn.example.com/logo.png'>";
        let (bytes, layout) = generate_pdf(html, &PipelineConfig::default()).unwrap();
        assert_eq!(&bytes[0..5], b"%PDF-");
        assert_eq!(layout.pages[0].boxes.len(), 1);
    }
}
