//! Stylesheet parser – turns `<style>` contents and linked `.css` files into
//! selector rules, `@font-face` sources and `@page` geometry.
//!
//! Supported selectors: `*`, `tag`, `.class`, `#id`, compounds such as
//! `td.label`, comma lists, and descendant chains (`.card p`). The child
//! combinator `>` is treated as a descendant combinator. Selectors with
//! pseudo-classes, attribute matchers or sibling combinators are skipped.

use crate::dom::ElementNode;

/// Millimetres to points.
pub const MM_TO_PT: f32 = 72.0 / 25.4;

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Compound {
    fn parse(s: &str) -> Option<Self> {
        let mut compound = Compound::default();
        let mut rest = s;
        // Leading type selector (or universal).
        let tag_end = rest.find(['.', '#']).unwrap_or(rest.len());
        let tag = &rest[..tag_end];
        if !tag.is_empty() && tag != "*" {
            if !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                return None;
            }
            compound.tag = Some(tag.to_ascii_lowercase());
        }
        rest = &rest[tag_end..];
        while !rest.is_empty() {
            let marker = rest.chars().next()?;
            let body = &rest[1..];
            let end = body.find(['.', '#']).unwrap_or(body.len());
            let name = &body[..end];
            if name.is_empty() {
                return None;
            }
            match marker {
                '.' => compound.classes.push(name.to_string()),
                '#' => compound.id = Some(name.to_string()),
                _ => return None,
            }
            rest = &body[end..];
        }
        Some(compound)
    }

    fn matches(&self, element: &ElementNode) -> bool {
        if let Some(tag) = &self.tag {
            if element.tag.name() != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.id() != Some(id.as_str()) {
                return false;
            }
        }
        let classes = element.classes();
        self.classes.iter().all(|c| classes.contains(&c.as_str()))
    }
}

/// A descendant chain of compound selectors; the last one is the subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    compounds: Vec<Compound>,
}

impl Selector {
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() || s.contains([':', '[', '+', '~']) {
            return None;
        }
        let compounds = s
            .replace('>', " ")
            .split_whitespace()
            .map(Compound::parse)
            .collect::<Option<Vec<_>>>()?;
        if compounds.is_empty() {
            return None;
        }
        Some(Self { compounds })
    }

    /// `(ids, classes, tags)` – compared lexicographically.
    pub fn specificity(&self) -> (usize, usize, usize) {
        self.compounds.iter().fold((0, 0, 0), |(a, b, c), comp| {
            (
                a + usize::from(comp.id.is_some()),
                b + comp.classes.len(),
                c + usize::from(comp.tag.is_some()),
            )
        })
    }

    /// `ancestors` runs from the document root down to the element's parent.
    pub fn matches(&self, element: &ElementNode, ancestors: &[&ElementNode]) -> bool {
        let Some((subject, chain)) = self.compounds.split_last() else {
            return false;
        };
        if !subject.matches(element) {
            return false;
        }
        // Walk outwards, greedily matching the nearest qualifying ancestor.
        let mut remaining = ancestors.iter().rev();
        chain
            .iter()
            .rev()
            .all(|compound| remaining.any(|ancestor| compound.matches(ancestor)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub selector: Selector,
    pub declarations: Vec<Declaration>,
    /// Position in the combined stylesheet, for cascade ties.
    pub order: usize,
}

/// `@font-face` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFace {
    pub family: String,
    /// First `url(...)` in `src`.
    pub src: String,
    pub bold: bool,
    pub italic: bool,
}

/// Page geometry from `@page`, in points.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PageRule {
    pub size: Option<(f32, f32)>,
    pub landscape: bool,
    pub margin: Option<f32>,
}

#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    pub rules: Vec<Rule>,
    pub font_faces: Vec<FontFace>,
    pub page: PageRule,
}

impl Stylesheet {
    /// Parse one stylesheet. Unparseable rules are dropped, never fatal.
    pub fn parse(source: &str) -> Self {
        let mut sheet = Stylesheet::default();
        sheet.append(source);
        sheet
    }

    /// Parse `source` and add it after the existing rules, so later sheets win
    /// ties exactly like later `<link>`/`<style>` elements do.
    pub fn append(&mut self, source: &str) {
        let css = strip_comments(source);
        let mut rest = css.as_str();
        loop {
            rest = rest.trim_start();
            if rest.is_empty() {
                break;
            }
            if let Some(at_rule) = rest.strip_prefix('@') {
                rest = self.parse_at_rule(at_rule);
                continue;
            }
            let Some(open) = rest.find('{') else {
                break;
            };
            let prelude = &rest[..open];
            let (block, after) = split_block(&rest[open + 1..]);
            let declarations = parse_declarations(block);
            for part in prelude.split(',') {
                match Selector::parse(part) {
                    Some(selector) => self.rules.push(Rule {
                        selector,
                        declarations: declarations.clone(),
                        order: self.rules.len(),
                    }),
                    None => log::debug!("skipping unsupported selector '{}'", part.trim()),
                }
            }
            rest = after;
        }
    }

    fn parse_at_rule<'s>(&mut self, input: &'s str) -> &'s str {
        let name_end = input
            .find(|c: char| c.is_whitespace() || c == '{' || c == ';')
            .unwrap_or(input.len());
        let name = input[..name_end].to_ascii_lowercase();
        let rest = &input[name_end..];
        let brace = rest.find('{');
        let semi = rest.find(';');
        match (brace, semi) {
            // Statement at-rule (@charset, @import): nothing to apply.
            (_, Some(s)) if brace.map_or(true, |b| s < b) => &rest[s + 1..],
            (Some(b), _) => {
                let (block, after) = split_block(&rest[b + 1..]);
                match name.as_str() {
                    "font-face" => {
                        if let Some(face) = parse_font_face(&parse_declarations(block)) {
                            self.font_faces.push(face);
                        }
                    }
                    "page" => self.page = parse_page_rule(&parse_declarations(block), self.page),
                    other => log::debug!("skipping @{other} block"),
                }
                after
            }
            _ => "",
        }
    }

    /// Declarations that apply to `element`, lowest precedence first.
    pub fn declarations_for<'a>(
        &'a self,
        element: &ElementNode,
        ancestors: &[&ElementNode],
    ) -> Vec<&'a Declaration> {
        let mut matched: Vec<&Rule> = self
            .rules
            .iter()
            .filter(|rule| rule.selector.matches(element, ancestors))
            .collect();
        matched.sort_by_key(|rule| (rule.selector.specificity(), rule.order));
        matched
            .into_iter()
            .flat_map(|rule| rule.declarations.iter())
            .collect()
    }
}

fn strip_comments(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

/// Split at the `}` that closes the block whose `{` was just consumed.
fn split_block(s: &str) -> (&str, &str) {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '{' => depth += 1,
            '}' if depth == 0 => return (&s[..i], &s[i + 1..]),
            '}' => depth -= 1,
            _ => {}
        }
    }
    (s, "")
}

/// Split a declaration block on `;`, ignoring semicolons inside quotes or
/// parentheses (`url(data:font/ttf;base64,...)`).
pub fn parse_declarations(block: &str) -> Vec<Declaration> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in block.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth -= 1,
            (None, ';') if depth <= 0 => {
                parts.push(&block[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&block[start..]);

    parts
        .into_iter()
        .filter_map(|decl| {
            let (prop, val) = decl.split_once(':')?;
            let prop = prop.trim().to_ascii_lowercase();
            let val = val.trim().trim_end_matches("!important").trim();
            if prop.is_empty() || val.is_empty() {
                return None;
            }
            Some(Declaration {
                property: prop,
                value: val.to_string(),
            })
        })
        .collect()
}

/// Parse a CSS length into layout units (1 px = 1 pt, as everywhere in the
/// pipeline). `em`/`rem` resolve against `font_size`.
pub fn parse_length(val: &str, font_size: f32) -> Option<f32> {
    let v = val.trim();
    let split = v
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
        .unwrap_or(v.len());
    let (num, unit) = v.split_at(split);
    let n: f32 = num.parse().ok()?;
    let factor = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "px" | "pt" => 1.0,
        "mm" => MM_TO_PT,
        "cm" => MM_TO_PT * 10.0,
        "in" => 72.0,
        "em" | "rem" => font_size,
        _ => return None,
    };
    Some(n * factor)
}

/// Extract the target of the first `url(...)` in a value.
pub fn extract_url(value: &str) -> Option<String> {
    let start = value.find("url(")? + 4;
    let end = start + value[start..].find(')')?;
    let url = value[start..end].trim().trim_matches(['"', '\'']);
    (!url.is_empty()).then(|| url.to_string())
}

/// First family name in a `font-family` list, unquoted.
pub fn first_family(value: &str) -> Option<String> {
    let family = value.split(',').next()?.trim().trim_matches(['"', '\'']).trim();
    (!family.is_empty()).then(|| family.to_string())
}

fn parse_font_face(decls: &[Declaration]) -> Option<FontFace> {
    let mut family = None;
    let mut src = None;
    let mut bold = false;
    let mut italic = false;
    for d in decls {
        match d.property.as_str() {
            "font-family" => family = first_family(&d.value),
            "src" => src = extract_url(&d.value),
            "font-weight" => bold = matches!(d.value.as_str(), "bold" | "600" | "700" | "800" | "900"),
            "font-style" => italic = matches!(d.value.as_str(), "italic" | "oblique"),
            _ => {}
        }
    }
    Some(FontFace {
        family: family?,
        src: src?,
        bold,
        italic,
    })
}

fn parse_page_rule(decls: &[Declaration], mut page: PageRule) -> PageRule {
    for d in decls {
        match d.property.as_str() {
            "size" => {
                let mut lengths = Vec::new();
                for token in d.value.split_whitespace() {
                    match token.to_ascii_lowercase().as_str() {
                        "a4" => page.size = Some((595.28, 841.89)),
                        "a5" => page.size = Some((419.53, 595.28)),
                        "letter" => page.size = Some((612.0, 792.0)),
                        "landscape" => page.landscape = true,
                        "portrait" => page.landscape = false,
                        other => lengths.extend(parse_length(other, 16.0)),
                    }
                }
                if let &[w, h] = lengths.as_slice() {
                    page.size = Some((w, h));
                }
            }
            "margin" => page.margin = d.value.split_whitespace().next().and_then(|m| parse_length(m, 16.0)),
            _ => {}
        }
    }
    page
}
