//! Style resolver – cascades stylesheet rules and inline `style` attributes
//! into a flat [`ComputedStyle`] struct consumed by the layout engine.

use crate::css::{first_family, parse_length, Stylesheet};
use crate::dom::{DomNode, ElementNode, Tag};

/// Fully resolved style for a single element.
#[derive(Debug, Clone)]
pub struct ComputedStyle {
    // Display / layout
    pub display: Display,
    pub flex_direction: FlexDirection,
    pub flex_wrap: FlexWrap,
    pub flex_grow: f32,
    pub flex_shrink: f32,
    pub flex_basis: Dimension,
    pub justify_content: JustifyContent,
    pub align_items: AlignItems,
    pub gap: f32,

    // Grid
    pub grid_template_columns: Vec<GridTrack>,

    // Sizing
    pub width: Dimension,
    pub height: Dimension,
    pub min_width: Dimension,
    pub max_width: Dimension,

    // Spacing
    pub margin_top: f32,
    pub margin_right: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub padding_top: f32,
    pub padding_right: f32,
    pub padding_bottom: f32,
    pub padding_left: f32,

    // Border
    pub border_width: f32,
    pub border_color: Color,

    // Typography
    pub font_size: f32,
    pub font_weight: FontWeight,
    pub font_family: String,
    pub color: Color,
    pub text_align: TextAlign,
    pub line_height: f32,
    pub text_decoration: TextDecoration,
    pub text_transform: TextTransform,
    pub font_style: FontStyle,

    // Background
    pub background_color: Color,

    // Page break
    pub page_break_before: bool,
    pub page_break_after: bool,
    pub page_break_inside_avoid: bool,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: Display::Block,
            flex_direction: FlexDirection::Row,
            flex_wrap: FlexWrap::NoWrap,
            flex_grow: 0.0,
            flex_shrink: 1.0,
            flex_basis: Dimension::Auto,
            justify_content: JustifyContent::Start,
            align_items: AlignItems::Stretch,
            gap: 0.0,
            grid_template_columns: Vec::new(),
            width: Dimension::Auto,
            height: Dimension::Auto,
            min_width: Dimension::Auto,
            max_width: Dimension::Auto,
            margin_top: 0.0,
            margin_right: 0.0,
            margin_bottom: 0.0,
            margin_left: 0.0,
            padding_top: 0.0,
            padding_right: 0.0,
            padding_bottom: 0.0,
            padding_left: 0.0,
            border_width: 0.0,
            border_color: Color::BLACK,
            font_size: 12.0,
            font_weight: FontWeight::Normal,
            font_family: "Helvetica".to_string(),
            color: Color::BLACK,
            text_align: TextAlign::Left,
            line_height: 1.4,
            text_decoration: TextDecoration::None,
            text_transform: TextTransform::None,
            font_style: FontStyle::Normal,
            background_color: Color::TRANSPARENT,
            page_break_before: false,
            page_break_after: false,
            page_break_inside_avoid: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Supporting enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    Flex,
    Grid,
    Inline,
    InlineBlock,
    ListItem,
    TableRow,
    TableCell,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexDirection {
    Row,
    Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexWrap {
    NoWrap,
    Wrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JustifyContent {
    Start,
    End,
    Center,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignItems {
    Start,
    End,
    Center,
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDecoration {
    None,
    Underline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextTransform {
    None,
    Uppercase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    Auto,
    Px(f32),
    Percent(f32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GridTrack {
    Px(f32),
    Fr(f32),
}

/// RGBA colour (0.0 – 1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn is_transparent(&self) -> bool {
        self.a < 0.001
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| v as f32 / 255.0);
        match hex.len() {
            6 => Some(Self::rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => Some(Self::rgb(
                channel(&hex[0..1].repeat(2))?,
                channel(&hex[1..2].repeat(2))?,
                channel(&hex[2..3].repeat(2))?,
            )),
            _ => None,
        }
    }

    /// `#rgb`, `#rrggbb`, `rgb()/rgba()` or a small set of names.
    pub fn parse(value: &str) -> Option<Self> {
        let v = value.trim().to_ascii_lowercase();
        if v.starts_with('#') {
            return Self::from_hex(&v);
        }
        if let Some(args) = v
            .strip_prefix("rgba(")
            .or_else(|| v.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let parts: Vec<f32> = args
                .split([',', ' ', '/'])
                .filter(|p| !p.is_empty())
                .filter_map(|p| p.trim().parse::<f32>().ok())
                .collect();
            return match parts[..] {
                [r, g, b] => Some(Self::rgb(r / 255.0, g / 255.0, b / 255.0)),
                [r, g, b, a] => Some(Self {
                    r: r / 255.0,
                    g: g / 255.0,
                    b: b / 255.0,
                    a,
                }),
                _ => None,
            };
        }
        match v.as_str() {
            "black" => Some(Self::BLACK),
            "white" => Some(Self::WHITE),
            "transparent" | "none" => Some(Self::TRANSPARENT),
            "red" => Some(Self::rgb(1.0, 0.0, 0.0)),
            "green" => Some(Self::rgb(0.0, 0.502, 0.0)),
            "blue" => Some(Self::rgb(0.0, 0.0, 1.0)),
            "gray" | "grey" => Some(Self::rgb(0.502, 0.502, 0.502)),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Style resolution
// ---------------------------------------------------------------------------

/// Resolve the style for an element: tag defaults, inherited text
/// properties, matching stylesheet rules, then the inline `style` attribute.
pub fn resolve_style(
    element: &ElementNode,
    parent: Option<&ComputedStyle>,
    ancestors: &[&ElementNode],
    sheet: &Stylesheet,
) -> ComputedStyle {
    let mut style = ComputedStyle::default();

    if let Some(p) = parent {
        style.font_size = p.font_size;
        style.font_weight = p.font_weight;
        style.font_family = p.font_family.clone();
        style.color = p.color;
        style.text_align = p.text_align;
        style.line_height = p.line_height;
        style.font_style = p.font_style;
        style.text_transform = p.text_transform;
    }

    apply_tag_defaults(&mut style, &element.tag);

    for decl in sheet.declarations_for(element, ancestors) {
        apply_css_property(&mut style, &decl.property, &decl.value);
    }

    if let Some(inline) = element.inline_style() {
        apply_inline_style(&mut style, inline);
    }

    style
}

/// User-agent defaults, sized for print.
fn apply_tag_defaults(s: &mut ComputedStyle, tag: &Tag) {
    let heading = |s: &mut ComputedStyle, size: f32, margin: f32| {
        s.font_size = size;
        s.font_weight = FontWeight::Bold;
        s.margin_top = margin;
        s.margin_bottom = margin * 0.75;
    };
    match tag {
        Tag::H1 => heading(s, 24.0, 12.0),
        Tag::H2 => heading(s, 18.0, 10.0),
        Tag::H3 => heading(s, 14.0, 8.0),
        Tag::H4 => heading(s, 12.0, 6.0),
        Tag::P => s.margin_bottom = 6.0,
        Tag::Ul | Tag::Ol => {
            s.margin_bottom = 6.0;
            s.padding_left = 18.0;
        }
        Tag::Li => {
            s.display = Display::ListItem;
            s.margin_bottom = 2.0;
        }
        Tag::Table => {
            s.display = Display::Grid;
            s.width = Dimension::Percent(100.0);
        }
        Tag::Tr => s.display = Display::TableRow,
        Tag::Td | Tag::Th => {
            s.display = Display::TableCell;
            s.padding_top = 3.0;
            s.padding_right = 6.0;
            s.padding_bottom = 3.0;
            s.padding_left = 6.0;
            if *tag == Tag::Th {
                s.font_weight = FontWeight::Bold;
            }
        }
        Tag::Span | Tag::Br => s.display = Display::Inline,
        Tag::A => {
            s.display = Display::Inline;
            s.color = Color::rgb(0.145, 0.388, 0.922);
            s.text_decoration = TextDecoration::Underline;
        }
        Tag::Strong => {
            s.display = Display::Inline;
            s.font_weight = FontWeight::Bold;
        }
        Tag::Em => {
            s.display = Display::Inline;
            s.font_style = FontStyle::Italic;
        }
        Tag::Img => s.display = Display::InlineBlock,
        Tag::Div | Tag::Section | Tag::Header | Tag::Footer | Tag::Body | Tag::Html => {}
        Tag::Head | Tag::Title | Tag::Meta | Tag::Link | Tag::Style | Tag::Script => {
            s.display = Display::None;
        }
        // Inline SVG is only drawn through <img src="data:image/svg+xml">.
        Tag::Unknown(name) if matches!(name.as_str(), "svg" | "template" | "noscript") => {
            s.display = Display::None;
        }
        Tag::Unknown(_) => {}
    }
}

// ---------------------------------------------------------------------------
// Declaration application
// ---------------------------------------------------------------------------

fn apply_inline_style(s: &mut ComputedStyle, style_str: &str) {
    for decl in crate::css::parse_declarations(style_str) {
        apply_css_property(s, &decl.property, &decl.value);
    }
}

fn apply_css_property(s: &mut ComputedStyle, prop: &str, val: &str) {
    let fs = s.font_size;
    let len = |v: &str| parse_length(v, fs);
    match prop {
        "display" => {
            s.display = match val {
                "flex" => Display::Flex,
                "grid" => Display::Grid,
                "block" => Display::Block,
                "inline" => Display::Inline,
                "inline-block" | "inline-flex" => Display::InlineBlock,
                "none" => Display::None,
                _ => s.display,
            }
        }
        "flex-direction" => {
            s.flex_direction = match val {
                "column" | "column-reverse" => FlexDirection::Column,
                _ => FlexDirection::Row,
            }
        }
        "flex-wrap" => {
            s.flex_wrap = match val {
                "wrap" => FlexWrap::Wrap,
                _ => FlexWrap::NoWrap,
            }
        }
        "flex" => apply_flex_shorthand(s, val, fs),
        "flex-basis" => s.flex_basis = parse_dimension(val, fs),
        "flex-grow" => s.flex_grow = val.parse().unwrap_or(s.flex_grow),
        "flex-shrink" => s.flex_shrink = val.parse().unwrap_or(s.flex_shrink),
        "justify-content" => {
            s.justify_content = match val {
                "flex-end" | "end" => JustifyContent::End,
                "center" => JustifyContent::Center,
                "space-between" => JustifyContent::SpaceBetween,
                "space-around" => JustifyContent::SpaceAround,
                "space-evenly" => JustifyContent::SpaceEvenly,
                _ => JustifyContent::Start,
            }
        }
        "align-items" => {
            s.align_items = match val {
                "flex-start" | "start" => AlignItems::Start,
                "flex-end" | "end" => AlignItems::End,
                "center" => AlignItems::Center,
                _ => AlignItems::Stretch,
            }
        }
        "gap" | "column-gap" => {
            if let Some(px) = val.split_whitespace().next().and_then(len) {
                s.gap = px;
            }
        }
        "grid-template-columns" => s.grid_template_columns = parse_grid_tracks(val, fs),
        "font-size" => {
            // em on font-size is relative to the inherited size.
            if let Some(px) = len(val) {
                s.font_size = px;
            }
        }
        "font-weight" => {
            s.font_weight = match val {
                "bold" | "bolder" | "600" | "700" | "800" | "900" => FontWeight::Bold,
                _ => FontWeight::Normal,
            }
        }
        "font-style" => {
            s.font_style = match val {
                "italic" | "oblique" => FontStyle::Italic,
                _ => FontStyle::Normal,
            }
        }
        "font-family" => {
            if let Some(family) = first_family(val) {
                s.font_family = family;
            }
        }
        "color" => {
            if let Some(c) = Color::parse(val) {
                s.color = c;
            }
        }
        "background-color" | "background" => {
            if let Some(c) = val.split_whitespace().find_map(Color::parse) {
                s.background_color = c;
            }
        }
        "text-align" => {
            s.text_align = match val {
                "center" => TextAlign::Center,
                "right" | "end" => TextAlign::Right,
                _ => TextAlign::Left,
            }
        }
        "text-decoration" | "text-decoration-line" => {
            s.text_decoration = if val.contains("underline") {
                TextDecoration::Underline
            } else {
                TextDecoration::None
            }
        }
        "text-transform" => {
            s.text_transform = match val {
                "uppercase" => TextTransform::Uppercase,
                _ => TextTransform::None,
            }
        }
        "width" => s.width = parse_dimension(val, fs),
        "height" => s.height = parse_dimension(val, fs),
        "min-width" => s.min_width = parse_dimension(val, fs),
        "max-width" => s.max_width = parse_dimension(val, fs),
        "margin" => apply_shorthand_spacing(
            val,
            fs,
            [
                &mut s.margin_top,
                &mut s.margin_right,
                &mut s.margin_bottom,
                &mut s.margin_left,
            ],
        ),
        "margin-top" => set_length(&mut s.margin_top, val, fs),
        "margin-right" => set_length(&mut s.margin_right, val, fs),
        "margin-bottom" => set_length(&mut s.margin_bottom, val, fs),
        "margin-left" => set_length(&mut s.margin_left, val, fs),
        "padding" => apply_shorthand_spacing(
            val,
            fs,
            [
                &mut s.padding_top,
                &mut s.padding_right,
                &mut s.padding_bottom,
                &mut s.padding_left,
            ],
        ),
        "padding-top" => set_length(&mut s.padding_top, val, fs),
        "padding-right" => set_length(&mut s.padding_right, val, fs),
        "padding-bottom" => set_length(&mut s.padding_bottom, val, fs),
        "padding-left" => set_length(&mut s.padding_left, val, fs),
        "border" => {
            if val == "none" || val == "0" {
                s.border_width = 0.0;
                return;
            }
            for token in val.split_whitespace() {
                if let Some(w) = len(token) {
                    s.border_width = w;
                } else if let Some(c) = Color::parse(token) {
                    s.border_color = c;
                }
            }
        }
        "border-width" => set_length(&mut s.border_width, val, fs),
        "border-color" => {
            if let Some(c) = Color::parse(val) {
                s.border_color = c;
            }
        }
        "line-height" => {
            if let Ok(v) = val.parse::<f32>() {
                s.line_height = v;
            } else if let Some(pct) = val.strip_suffix('%').and_then(|p| p.parse::<f32>().ok()) {
                s.line_height = pct / 100.0;
            } else if let Some(px) = len(val) {
                s.line_height = px / s.font_size;
            }
        }
        "break-before" | "page-break-before" => {
            s.page_break_before = val == "always" || val == "page";
        }
        "break-after" | "page-break-after" => {
            s.page_break_after = val == "always" || val == "page";
        }
        "break-inside" | "page-break-inside" => {
            s.page_break_inside_avoid = val == "avoid" || val == "avoid-page";
        }
        _ => {}
    }
}

fn set_length(slot: &mut f32, val: &str, font_size: f32) {
    if let Some(px) = parse_length(val, font_size) {
        *slot = px;
    }
}

/// `flex: none | auto | <grow> [<shrink>] [<basis>] | <basis>`. A number
/// without an explicit basis means a basis of 0.
fn apply_flex_shorthand(s: &mut ComputedStyle, val: &str, font_size: f32) {
    let (grow, shrink, basis) = match val.split_whitespace().collect::<Vec<_>>().as_slice() {
        ["none"] => (0.0, 0.0, Dimension::Auto),
        ["auto"] => (1.0, 1.0, Dimension::Auto),
        [] => return,
        [first, rest @ ..] => match first.parse::<f32>() {
            Ok(grow) => {
                let (shrink, basis) = match rest {
                    [] => (1.0, Dimension::Px(0.0)),
                    [second] => match second.parse::<f32>() {
                        Ok(shrink) => (shrink, Dimension::Px(0.0)),
                        Err(_) => (1.0, parse_dimension(second, font_size)),
                    },
                    [second, third, ..] => (
                        second.parse().unwrap_or(1.0),
                        parse_dimension(third, font_size),
                    ),
                };
                (grow, shrink, basis)
            }
            Err(_) => (1.0, 1.0, parse_dimension(first, font_size)),
        },
    };
    s.flex_grow = grow;
    s.flex_shrink = shrink;
    s.flex_basis = basis;
}

fn parse_dimension(s: &str, font_size: f32) -> Dimension {
    let s = s.trim();
    if s == "auto" || s == "none" {
        Dimension::Auto
    } else if let Some(pct) = s.strip_suffix('%') {
        pct.parse::<f32>()
            .map(Dimension::Percent)
            .unwrap_or(Dimension::Auto)
    } else {
        parse_length(s, font_size)
            .map(Dimension::Px)
            .unwrap_or(Dimension::Auto)
    }
}

fn parse_grid_tracks(val: &str, font_size: f32) -> Vec<GridTrack> {
    // repeat(N, track)
    if let Some(inner) = val.trim().strip_prefix("repeat(").and_then(|r| r.strip_suffix(')')) {
        if let Some((count, track)) = inner.split_once(',') {
            let count: usize = count.trim().parse().unwrap_or(1);
            return parse_grid_tracks(track, font_size)
                .into_iter()
                .cycle()
                .take(count)
                .collect();
        }
    }
    val.split_whitespace()
        .filter_map(|t| match t.strip_suffix("fr") {
            Some(fr) => fr.parse().ok().map(GridTrack::Fr),
            None => parse_length(t, font_size).map(GridTrack::Px),
        })
        .collect()
}

/// CSS 1–4 value shorthand order: top, right, bottom, left.
fn apply_shorthand_spacing(val: &str, font_size: f32, [top, right, bottom, left]: [&mut f32; 4]) {
    let parts: Vec<f32> = val
        .split_whitespace()
        .map(|p| if p == "auto" { Some(0.0) } else { parse_length(p, font_size) })
        .collect::<Option<Vec<_>>>()
        .unwrap_or_default();
    let (t, r, b, l) = match parts[..] {
        [a] => (a, a, a, a),
        [v, h] => (v, h, v, h),
        [t, h, b] => (t, h, b, h),
        [t, r, b, l] => (t, r, b, l),
        _ => return,
    };
    *top = t;
    *right = r;
    *bottom = b;
    *left = l;
}

// ---------------------------------------------------------------------------
// Styled DOM tree
// ---------------------------------------------------------------------------

/// A DOM node annotated with its computed style.
#[derive(Debug, Clone)]
pub enum StyledNode {
    Element {
        tag: Tag,
        style: ComputedStyle,
        children: Vec<StyledNode>,
        /// Original attributes (for images src, etc.)
        attrs: std::collections::HashMap<String, String>,
    },
    Text {
        text: String,
        style: ComputedStyle,
    },
}

/// Build a styled tree from a DOM tree, resolving styles top-down.
pub fn build_styled_tree(nodes: &[DomNode], sheet: &Stylesheet) -> Vec<StyledNode> {
    let mut ancestors = Vec::new();
    style_nodes(nodes, None, &mut ancestors, sheet)
}

fn style_nodes<'a>(
    nodes: &'a [DomNode],
    parent_style: Option<&ComputedStyle>,
    ancestors: &mut Vec<&'a ElementNode>,
    sheet: &Stylesheet,
) -> Vec<StyledNode> {
    let mut result = Vec::new();
    for node in nodes {
        match node {
            DomNode::Element(e) => {
                let style = resolve_style(e, parent_style, ancestors, sheet);
                if style.display == Display::None {
                    continue;
                }
                ancestors.push(e);
                let children = style_nodes(&e.children, Some(&style), ancestors, sheet);
                ancestors.pop();
                result.push(StyledNode::Element {
                    tag: e.tag.clone(),
                    style,
                    children,
                    attrs: e.attributes.clone(),
                });
            }
            DomNode::Text(text) => {
                if !text.trim().is_empty() {
                    let mut style = parent_style.cloned().unwrap_or_default();
                    // Text runs render inline – box-model properties belong
                    // to the enclosing element, not the run.
                    style.display = Display::Inline;
                    style.border_width = 0.0;
                    style.background_color = Color::TRANSPARENT;
                    style.width = Dimension::Auto;
                    style.height = Dimension::Auto;
                    style.flex_basis = Dimension::Auto;
                    style.margin_top = 0.0;
                    style.margin_right = 0.0;
                    style.margin_bottom = 0.0;
                    style.margin_left = 0.0;
                    style.padding_top = 0.0;
                    style.padding_right = 0.0;
                    style.padding_bottom = 0.0;
                    style.padding_left = 0.0;
                    style.page_break_before = false;
                    style.page_break_after = false;
                    result.push(StyledNode::Text {
                        text: text.clone(),
                        style,
                    });
                }
            }
        }
    }
    result
}
