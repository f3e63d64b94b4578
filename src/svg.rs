//! SVG images. usvg reads the document; printpdf (through svg2pdf) turns it
//! into a PDF form XObject with the vector content intact.

use printpdf::{ExternalXObject, PdfWarnMsg, Px, Svg};

/// Resolution printpdf assumes for an XObject that records none.
const DEFAULT_XOBJECT_DPI: f32 = 300.0;

/// A converted SVG ready to be registered with a document.
#[derive(Debug, Clone)]
pub struct VectorImage {
    pub xobject: ExternalXObject,
    /// Size in points at which the XObject draws with a scale of 1.
    pub placed_width: f32,
    pub placed_height: f32,
    pub dpi: f32,
}

/// Natural size of an SVG document in CSS pixels.
pub fn svg_size(source: &str) -> Result<(f32, f32), String> {
    let tree = usvg::Tree::from_str(source, &usvg::Options::default())
        .map_err(|e| format!("usvg parse: {e}"))?;
    let size = tree.size();
    Ok((size.width(), size.height()))
}

/// Convert an SVG document. Everything usvg understands (paths, shapes,
/// gradients, transforms) survives as vector content.
pub fn parse_svg(source: &str) -> Result<VectorImage, String> {
    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let xobject = Svg::parse(source, &mut warnings)?;
    for warning in &warnings {
        log::debug!("svg conversion: {warning:?}");
    }

    let dpi = xobject.dpi.unwrap_or(DEFAULT_XOBJECT_DPI);
    let to_pt = |px: Option<Px>| px.map_or(0.0, |Px(v)| v as f32 * 72.0 / dpi);
    let (placed_width, placed_height) = (to_pt(xobject.width), to_pt(xobject.height));

    Ok(VectorImage {
        xobject,
        placed_width,
        placed_height,
        dpi,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS: &str = "http://www.w3.org/2000/svg";

    #[test]
    fn natural_size_comes_from_width_and_height() {
        let (w, h) = svg_size(&format!(
            "<svg xmlns='{NS}' width='120' height='60'><rect width='10' height='10'/></svg>"
        ))
        .unwrap();
        assert_eq!((w, h), (120.0, 60.0));
    }

    #[test]
    fn view_box_alone_sets_the_size() {
        let (w, h) = svg_size(&format!("<svg xmlns='{NS}' viewBox='0 0 40 20'/>")).unwrap();
        assert_eq!((w, h), (40.0, 20.0));
    }

    #[test]
    fn shapes_other_than_rects_convert() {
        let svg = parse_svg(&format!(
            "<svg xmlns='{NS}' viewBox='0 0 40 40' width='40' height='40'>\
             <circle cx='20' cy='20' r='10' fill='#111827'/>\
             <path d='M0 0 L40 40' stroke='black'/></svg>"
        ))
        .unwrap();
        assert!(svg.placed_width > 0.0);
        assert!(svg.placed_height > 0.0);
        assert!((svg.placed_width - svg.placed_height).abs() < 0.01);
    }

    #[test]
    fn malformed_svg_is_an_error() {
        assert!(svg_size("<svg").is_err());
        assert!(svg_size("not svg at all").is_err());
        assert!(parse_svg("<svg").is_err());
    }
}
