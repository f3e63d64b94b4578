//! HTML parser – converts an HTML string into a simple DOM tree.
//!
//! We support the controlled subset that ticket templates are written in:
//! - Document: html, head, title, meta, link, style, body
//! - Structural: div, section, header, footer, p, h1-h4, ul, ol, li,
//!   table, tr, td, th, img, br
//! - Inline: span, a, strong/b, em/i
//! - Styling via `class`, `id` and `style` attributes plus stylesheets

use std::collections::HashMap;

// ---------------------------------------------------------------------------
// DOM types
// ---------------------------------------------------------------------------

/// The tag name of a supported element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Html,
    Head,
    Title,
    Meta,
    Link,
    Style,
    Script,
    Body,
    Div,
    Section,
    Header,
    Footer,
    P,
    H1,
    H2,
    H3,
    H4,
    Ul,
    Ol,
    Li,
    Table,
    Tr,
    Td,
    Th,
    Span,
    A,
    Strong,
    Em,
    Br,
    Img,
    /// Anything else – kept in the tree (SVG children need their
    /// attributes) but never laid out.
    Unknown(String),
}

impl Tag {
    pub fn from_name(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "html" => Tag::Html,
            "head" => Tag::Head,
            "title" => Tag::Title,
            "meta" => Tag::Meta,
            "link" => Tag::Link,
            "style" => Tag::Style,
            "script" => Tag::Script,
            "body" => Tag::Body,
            "div" | "main" | "article" => Tag::Div,
            "section" => Tag::Section,
            "header" => Tag::Header,
            "footer" => Tag::Footer,
            "p" => Tag::P,
            "h1" => Tag::H1,
            "h2" => Tag::H2,
            "h3" => Tag::H3,
            "h4" => Tag::H4,
            "ul" => Tag::Ul,
            "ol" => Tag::Ol,
            "li" => Tag::Li,
            "table" => Tag::Table,
            "tr" => Tag::Tr,
            "td" => Tag::Td,
            "th" => Tag::Th,
            "span" | "small" | "time" => Tag::Span,
            "a" => Tag::A,
            "strong" | "b" => Tag::Strong,
            "em" | "i" => Tag::Em,
            "br" => Tag::Br,
            "img" => Tag::Img,
            other => Tag::Unknown(other.to_string()),
        }
    }

    /// Lower-case name used for stylesheet selector matching.
    pub fn name(&self) -> &str {
        match self {
            Tag::Html => "html",
            Tag::Head => "head",
            Tag::Title => "title",
            Tag::Meta => "meta",
            Tag::Link => "link",
            Tag::Style => "style",
            Tag::Script => "script",
            Tag::Body => "body",
            Tag::Div => "div",
            Tag::Section => "section",
            Tag::Header => "header",
            Tag::Footer => "footer",
            Tag::P => "p",
            Tag::H1 => "h1",
            Tag::H2 => "h2",
            Tag::H3 => "h3",
            Tag::H4 => "h4",
            Tag::Ul => "ul",
            Tag::Ol => "ol",
            Tag::Li => "li",
            Tag::Table => "table",
            Tag::Tr => "tr",
            Tag::Td => "td",
            Tag::Th => "th",
            Tag::Span => "span",
            Tag::A => "a",
            Tag::Strong => "strong",
            Tag::Em => "em",
            Tag::Br => "br",
            Tag::Img => "img",
            Tag::Unknown(name) => name,
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Tag::Span | Tag::A | Tag::Strong | Tag::Em | Tag::Br)
    }

    /// Paragraph-like blocks whose inline children are merged into one
    /// wrapped text run.
    pub fn is_text_block(&self) -> bool {
        matches!(
            self,
            Tag::P | Tag::H1 | Tag::H2 | Tag::H3 | Tag::H4 | Tag::Li | Tag::Td | Tag::Th
        )
    }

    /// Elements that never produce boxes.
    pub fn is_metadata(&self) -> bool {
        matches!(
            self,
            Tag::Head | Tag::Title | Tag::Meta | Tag::Link | Tag::Style | Tag::Script
        )
    }
}

/// Elements that have no closing tag.
fn is_void(name: &str) -> bool {
    matches!(
        name.to_ascii_lowercase().as_str(),
        "img" | "br" | "meta" | "link" | "hr" | "input" | "source" | "col" | "wbr" | "base"
    )
}

/// Elements whose content is kept verbatim.
fn is_raw_text(name: &str) -> bool {
    matches!(name.to_ascii_lowercase().as_str(), "style" | "script")
}

/// A node in our DOM tree.
#[derive(Debug, Clone)]
pub enum DomNode {
    Element(ElementNode),
    Text(String),
}

/// An element node carrying tag, attributes, and children.
#[derive(Debug, Clone)]
pub struct ElementNode {
    pub tag: Tag,
    /// Attribute names are lower-cased.
    pub attributes: HashMap<String, String>,
    pub children: Vec<DomNode>,
}

impl ElementNode {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attributes: HashMap::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    pub fn classes(&self) -> Vec<&str> {
        self.attr("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn inline_style(&self) -> Option<&str> {
        self.attr("style")
    }

    pub fn src(&self) -> Option<&str> {
        self.attr("src")
    }

    /// Concatenated text of all descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

fn collect_text(nodes: &[DomNode], out: &mut String) {
    for node in nodes {
        match node {
            DomNode::Text(t) => out.push_str(t),
            DomNode::Element(e) => collect_text(&e.children, out),
        }
    }
}

// ---------------------------------------------------------------------------
// Parser – simple recursive descent over HTML
// ---------------------------------------------------------------------------

/// Parse an HTML string into a list of DOM nodes.
///
/// Hand-written for the controlled subset: templates are trusted, so the
/// parser is lenient and never fails. Malformed markup degrades into an odd
/// tree rather than an error.
pub fn parse_html(html: &str) -> Vec<DomNode> {
    let mut parser = Parser::new(html);
    parser.parse_nodes()
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn parse_nodes(&mut self) -> Vec<DomNode> {
        let mut nodes = Vec::new();
        loop {
            self.skip_whitespace_between_tags();
            if self.eof() || self.starts_with("</") {
                break;
            }
            if let Some(node) = self.parse_node() {
                nodes.push(node);
            }
        }
        nodes
    }

    fn parse_node(&mut self) -> Option<DomNode> {
        if self.starts_with("<!--") {
            self.skip_past("-->");
            return None;
        }
        if self.starts_with("<!") || self.starts_with("<?") {
            // doctype / processing instruction
            self.skip_past(">");
            return None;
        }
        if self.starts_with("<") {
            Some(self.parse_element())
        } else {
            Some(self.parse_text())
        }
    }

    fn parse_text(&mut self) -> DomNode {
        let start = self.pos;
        let end = self.input[start..]
            .find('<')
            .map(|i| start + i)
            .unwrap_or(self.input.len());
        self.pos = end;
        DomNode::Text(decode_entities(&self.input[start..end]))
    }

    fn parse_element(&mut self) -> DomNode {
        self.pos += 1; // '<'
        let name = self.parse_name();
        let mut elem = ElementNode::new(Tag::from_name(&name));

        loop {
            self.skip_whitespace();
            if self.eof() || self.starts_with(">") || self.starts_with("/>") {
                break;
            }
            let before = self.pos;
            let (key, value) = self.parse_attribute();
            if self.pos == before {
                // Stray character inside the tag; step over it.
                self.advance_char();
                continue;
            }
            if !key.is_empty() {
                elem.attributes.insert(key.to_ascii_lowercase(), value);
            }
        }

        if self.starts_with("/>") {
            self.pos += 2;
            return DomNode::Element(elem);
        }
        if self.starts_with(">") {
            self.pos += 1;
        }
        if is_void(&name) {
            return DomNode::Element(elem);
        }

        if is_raw_text(&name) {
            let close = format!("</{}", name.to_ascii_lowercase());
            let rest = &self.input[self.pos..];
            let end = rest
                .to_ascii_lowercase()
                .find(&close)
                .map(|i| self.pos + i)
                .unwrap_or(self.input.len());
            let raw = &self.input[self.pos..end];
            if !raw.trim().is_empty() {
                elem.children.push(DomNode::Text(raw.to_string()));
            }
            self.pos = end;
        } else {
            elem.children = self.parse_nodes();
        }

        // Closing tag
        if self.starts_with("</") {
            self.pos += 2;
            self.parse_name();
            self.skip_past(">");
        }

        DomNode::Element(elem)
    }

    fn parse_name(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == ':' {
                self.advance_char();
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_string()
    }

    fn parse_attribute(&mut self) -> (String, String) {
        let key = self.parse_name();
        self.skip_whitespace();
        if !self.starts_with("=") {
            return (key, String::new());
        }
        self.pos += 1;
        self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let start = self.pos;
                let end = self.input[start..]
                    .find(quote)
                    .map(|i| start + i)
                    .unwrap_or(self.input.len());
                self.pos = (end + 1).min(self.input.len());
                decode_entities(&self.input[start..end])
            }
            _ => {
                let start = self.pos;
                while let Some(c) = self.peek() {
                    if c.is_whitespace() || c == '>' {
                        break;
                    }
                    if c == '/' && self.input[self.pos..].starts_with("/>") {
                        break;
                    }
                    self.advance_char();
                }
                decode_entities(&self.input[start..self.pos])
            }
        };
        (key, value)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance_char();
        }
    }

    /// Skip whitespace-only runs that sit between two tags; whitespace that
    /// leads into text is part of that text.
    fn skip_whitespace_between_tags(&mut self) {
        let saved = self.pos;
        self.skip_whitespace();
        if !self.eof() && !self.starts_with("<") {
            self.pos = saved;
        }
    }

    fn skip_past(&mut self, marker: &str) {
        match self.input[self.pos..].find(marker) {
            Some(i) => self.pos += i + marker.len(),
            None => self.pos = self.input.len(),
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn advance_char(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }
}

/// Decode named and numeric character references.
///
/// Tera's autoescape emits `&#x27;` and `&#x2F;`, so numeric references are
/// as common in rendered templates as the named ones.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_reference(&tail[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }
    Some(match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{00A0}',
        "middot" => '\u{00B7}',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        "rarr" => '\u{2192}',
        "times" => '\u{00D7}',
        "laquo" => '\u{00AB}',
        "raquo" => '\u{00BB}',
        "copy" => '\u{00A9}',
        "hellip" => '\u{2026}',
        _ => return None,
    })
}

// ---------------------------------------------------------------------------
// Document helpers
// ---------------------------------------------------------------------------

/// Where a stylesheet comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StylesheetSource {
    /// Contents of a `<style>` element.
    Inline(String),
    /// `href` of a `<link rel="stylesheet">`, resolved later against the base URL.
    Linked(String),
}

/// Metadata gathered from anywhere in the document, in document order.
#[derive(Debug, Clone, Default)]
pub struct DocumentHead {
    pub title: Option<String>,
    pub stylesheets: Vec<StylesheetSource>,
}

pub fn document_head(nodes: &[DomNode]) -> DocumentHead {
    let mut head = DocumentHead::default();
    collect_head(nodes, &mut head);
    head
}

fn collect_head(nodes: &[DomNode], head: &mut DocumentHead) {
    for node in nodes {
        let DomNode::Element(e) = node else {
            continue;
        };
        match e.tag {
            Tag::Title if head.title.is_none() => {
                let title = e.text_content().split_whitespace().collect::<Vec<_>>().join(" ");
                if !title.is_empty() {
                    head.title = Some(title);
                }
            }
            Tag::Style => head
                .stylesheets
                .push(StylesheetSource::Inline(e.text_content())),
            Tag::Link => {
                let is_stylesheet = e
                    .attr("rel")
                    .is_some_and(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("stylesheet")));
                if let (true, Some(href)) = (is_stylesheet, e.attr("href")) {
                    head.stylesheets.push(StylesheetSource::Linked(href.to_string()));
                }
            }
            _ => collect_head(&e.children, head),
        }
    }
}

/// Find the `<body>` element and return its children, or return all nodes if
/// no `<body>` is present.
pub fn body_children(nodes: &[DomNode]) -> Vec<DomNode> {
    for node in nodes {
        if let DomNode::Element(e) = node {
            if e.tag == Tag::Body {
                return e.children.clone();
            }
            if e.tag == Tag::Html {
                let inner = body_children(&e.children);
                if !inner.is_empty() {
                    return inner;
                }
            }
        }
    }
    nodes
        .iter()
        .filter(|n| !matches!(n, DomNode::Element(e) if e.tag.is_metadata() || e.tag == Tag::Html))
        .cloned()
        .collect()
}
