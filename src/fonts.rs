//! Font loading and text measurement using `ttf-parser`.
//!
//! Faces come from `@font-face` rules or the configured fallback font. When
//! none is loaded, text is measured with Helvetica-like metrics and drawn with
//! the PDF builtin Helvetica.

use std::collections::HashMap;

/// A loaded font face with metrics.
#[derive(Clone)]
pub struct FontData {
    /// Raw font bytes (kept alive for ttf-parser's zero-copy API).
    pub bytes: Vec<u8>,
    pub units_per_em: f32,
    pub ascender: f32,
    pub descender: f32,
    pub line_gap: f32,
}

static BUILTIN_METRICS: FontData = FontData {
    bytes: Vec::new(),
    units_per_em: 1000.0,
    ascender: 750.0,
    descender: -250.0,
    line_gap: 0.0,
};

#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FontKey {
    pub family: String,
    pub bold: bool,
    pub italic: bool,
}

impl FontKey {
    pub fn new(family: &str, bold: bool, italic: bool) -> Self {
        Self {
            family: family.to_string(),
            bold,
            italic,
        }
    }
}

/// Manages loaded fonts.
#[derive(Default)]
pub struct FontManager {
    fonts: HashMap<FontKey, FontData>,
    /// First face loaded; used for families nothing was loaded for.
    default_key: Option<FontKey>,
}

impl FontManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a TTF/OTF font from bytes.
    pub fn load_font(
        &mut self,
        family: &str,
        bold: bool,
        italic: bool,
        bytes: Vec<u8>,
    ) -> Result<(), ttf_parser::FaceParsingError> {
        let face = ttf_parser::Face::parse(&bytes, 0)?;

        let data = FontData {
            units_per_em: face.units_per_em() as f32,
            ascender: face.ascender() as f32,
            descender: face.descender() as f32,
            line_gap: face.line_gap() as f32,
            bytes,
        };

        let key = FontKey::new(family, bold, italic);
        log::debug!("loaded font face {key:?}");
        if self.default_key.is_none() {
            self.default_key = Some(key.clone());
        }
        self.fonts.insert(key, data);
        Ok(())
    }

    /// Pick the loaded face for a family/weight/style: exact match, then the
    /// family's regular face, then the default face. `None` means builtin.
    pub fn resolve(&self, family: &str, bold: bool, italic: bool) -> Option<&FontKey> {
        [
            FontKey::new(family, bold, italic),
            FontKey::new(family, bold, false),
            FontKey::new(family, false, false),
        ]
        .iter()
        .find_map(|key| self.fonts.get_key_value(key).map(|(k, _)| k))
        .or(self.default_key.as_ref())
    }

    fn data_for(&self, family: &str, bold: bool, italic: bool) -> &FontData {
        self.resolve(family, bold, italic)
            .and_then(|key| self.fonts.get(key))
            .unwrap_or(&BUILTIN_METRICS)
    }

    /// Measure the width of a string at a given font size (in px).
    /// With real font bytes we sum glyph advances; otherwise we use an
    /// average character width heuristic (0.5 × font_size per char).
    pub fn measure_text_width(&self, text: &str, font_size: f32, bold: bool, italic: bool, family: &str) -> f32 {
        let data = self.data_for(family, bold, italic);

        if data.bytes.is_empty() {
            // Bold is ~10 % wider.
            let avg = if bold { 0.55 } else { 0.5 };
            return text.chars().count() as f32 * font_size * avg;
        }

        match ttf_parser::Face::parse(&data.bytes, 0) {
            Ok(face) => {
                let scale = font_size / data.units_per_em;
                text.chars()
                    .map(|ch| match face.glyph_index(ch) {
                        Some(gid) => face.glyph_hor_advance(gid).unwrap_or(0) as f32 * scale,
                        None => font_size * 0.5,
                    })
                    .sum()
            }
            Err(_) => text.chars().count() as f32 * font_size * 0.5,
        }
    }

    /// Measure the line height in px.
    pub fn line_height_px(&self, font_size: f32, line_height_factor: f32) -> f32 {
        font_size * line_height_factor
    }

    /// Get the ascender in px for the given font.
    pub fn ascender_px(&self, font_size: f32, bold: bool, italic: bool, family: &str) -> f32 {
        let data = self.data_for(family, bold, italic);
        data.ascender * font_size / data.units_per_em
    }

    /// True once any TTF/OTF face is loaded.
    pub fn has_real_fonts(&self) -> bool {
        self.default_key.is_some()
    }

    /// Loaded faces in a stable order, for embedding.
    pub fn loaded(&self) -> Vec<(&FontKey, &[u8])> {
        let mut faces: Vec<_> = self
            .fonts
            .iter()
            .map(|(key, data)| (key, data.bytes.as_slice()))
            .collect();
        faces.sort_by(|a, b| a.0.cmp(b.0));
        faces
    }
}

/// Word-wrap text to fit within `max_width` pixels. Returns a vec of lines.
///
/// Words wider than the line on their own (long e-mail addresses, URLs) are
/// broken between characters.
pub fn wrap_text(
    text: &str,
    font_size: f32,
    bold: bool,
    italic: bool,
    family: &str,
    max_width: f32,
    fonts: &FontManager,
) -> Vec<String> {
    if max_width <= 0.0 || text.is_empty() {
        return vec![text.to_string()];
    }
    let measure = |s: &str| fonts.measure_text_width(s, font_size, bold, italic, family);

    let mut lines: Vec<String> = Vec::new();
    // Split on existing newlines first
    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current_line = String::new();
        for word in words {
            let candidate = if current_line.is_empty() {
                word.to_string()
            } else {
                format!("{current_line} {word}")
            };
            if measure(&candidate) <= max_width {
                current_line = candidate;
                continue;
            }
            if !current_line.is_empty() {
                lines.push(std::mem::take(&mut current_line));
            }
            if measure(word) <= max_width {
                current_line = word.to_string();
                continue;
            }
            // Overlong token: emit full-width chunks, keep the tail open.
            for ch in word.chars() {
                current_line.push(ch);
                if measure(&current_line) > max_width && current_line.chars().count() > 1 {
                    current_line.pop();
                    lines.push(std::mem::take(&mut current_line));
                    current_line.push(ch);
                }
            }
        }
        if !current_line.is_empty() {
            lines.push(current_line);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_text_width() {
        let mgr = FontManager::default();
        let w = mgr.measure_text_width("Hello", 16.0, false, false, "Helvetica");
        // 5 chars × 16 × 0.5 = 40
        assert!((w - 40.0).abs() < 0.1);
    }

    #[test]
    fn word_wrap_basic() {
        let mgr = FontManager::default();
        let lines = wrap_text("Hello world foo bar", 16.0, false, false, "Helvetica", 60.0, &mgr);
        assert!(lines.len() >= 2, "Expected wrapping, got {:?}", lines);
    }

    #[test]
    fn overlong_words_are_broken_between_characters() {
        let mgr = FontManager::default();
        let token = "x".repeat(50);
        // 10 px per char at 20 px font size → 10 chars per 100 px line.
        let lines = wrap_text(&token, 20.0, false, false, "Helvetica", 100.0, &mgr);
        assert_eq!(lines.len(), 5);
        assert!(lines.iter().all(|l| l.chars().count() == 10));
        assert_eq!(lines.concat(), token);
    }

    #[test]
    fn short_words_follow_a_broken_token() {
        let mgr = FontManager::default();
        let lines = wrap_text("aaaaaaaaaaaaaaa b", 20.0, false, false, "Helvetica", 100.0, &mgr);
        assert_eq!(lines, vec!["aaaaaaaaaa".to_string(), "aaaaa b".to_string()]);
    }

    #[test]
    fn explicit_newlines_are_kept() {
        let mgr = FontManager::default();
        let lines = wrap_text("one\ntwo", 10.0, false, false, "Helvetica", 500.0, &mgr);
        assert_eq!(lines, vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn no_faces_resolves_to_builtin() {
        let mut mgr = FontManager::new();
        assert!(mgr.resolve("Helvetica", true, false).is_none());
        assert!(!mgr.has_real_fonts());
        assert!(mgr.load_font("Broken", false, false, b"not a font".to_vec()).is_err());
        assert!(!mgr.has_real_fonts());
        assert!((mgr.ascender_px(10.0, false, false, "x") - 7.5).abs() < 0.01);
    }
}
