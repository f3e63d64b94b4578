//! Layout engine – uses Taffy to compute flexbox / grid layout from a styled
//! DOM tree, then converts the result into a flat list of positioned boxes.

use std::collections::HashMap;
use taffy::prelude::*;

use crate::assets::DataUri;
use crate::dom::Tag;
use crate::error::RenderError;
use crate::fonts::{wrap_text, FontManager};
use crate::style::{self, ComputedStyle, FontStyle as CssFontStyle, FontWeight, StyledNode, TextTransform};

// ---------------------------------------------------------------------------
// Intermediate layout tree (pre-pagination)
// ---------------------------------------------------------------------------

/// A positioned box in document coordinates (before page splitting).
#[derive(Debug, Clone)]
pub struct PositionedBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub style: ComputedStyle,
    pub content: BoxContent,
    /// Bullet / number drawn in the left gutter of a list item.
    pub list_marker: Option<String>,
    pub children: Vec<PositionedBox>,
    pub page_break_before: bool,
    pub page_break_after: bool,
    pub page_break_inside_avoid: bool,
}

#[derive(Debug, Clone)]
pub enum BoxContent {
    None,
    Text { text: String, lines: Vec<String> },
    Image { src: String },
}

type LayoutResult<T> = Result<T, RenderError>;

// ---------------------------------------------------------------------------
// Build Taffy tree from styled nodes
// ---------------------------------------------------------------------------

struct LayoutBuilder<'a> {
    taffy: TaffyTree<()>,
    fonts: &'a FontManager,
    node_styles: HashMap<NodeId, ComputedStyle>,
    node_content: HashMap<NodeId, BoxContent>,
    node_markers: HashMap<NodeId, String>,
    available_width: f32,
}

impl<'a> LayoutBuilder<'a> {
    fn new(fonts: &'a FontManager, available_width: f32) -> Self {
        Self {
            taffy: TaffyTree::new(),
            fonts,
            node_styles: HashMap::new(),
            node_content: HashMap::new(),
            node_markers: HashMap::new(),
            available_width,
        }
    }

    /// Collect all text content from an inline subtree (spans, text nodes).
    fn collect_inline_text(node: &StyledNode) -> String {
        match node {
            StyledNode::Text { text, .. } => text.clone(),
            StyledNode::Element { tag: Tag::Br, .. } => "\n".to_string(),
            StyledNode::Element { children, .. } => {
                children.iter().map(Self::collect_inline_text).collect()
            }
        }
    }

    /// True when the children can be flattened into one text run: text nodes
    /// and undecorated inline elements only. An inline element with its own
    /// background, border or padding keeps its box.
    fn mergeable(children: &[StyledNode]) -> bool {
        children.iter().all(|c| match c {
            StyledNode::Text { .. } => true,
            StyledNode::Element {
                tag: Tag::Img, ..
            } => false,
            StyledNode::Element {
                style,
                children: gc,
                ..
            } => {
                style.display == style::Display::Inline
                    && style.background_color.is_transparent()
                    && style.border_width <= 0.0
                    && horizontal_insets(style) <= 0.0
                    && Self::mergeable(gc)
            }
        })
    }

    fn build_node(&mut self, styled: &StyledNode, parent_width: f32) -> LayoutResult<NodeId> {
        match styled {
            StyledNode::Text { text, style } => {
                let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
                self.build_text_node(&collapsed, style, parent_width, None)
            }
            StyledNode::Element {
                tag,
                style,
                children,
                attrs,
            } => self.build_element_node(tag, style, children, attrs, parent_width),
        }
    }

    /// A leaf holding pre-wrapped text. The style's own margin, padding and
    /// border are honoured, so a merged paragraph keeps its box.
    fn build_text_node(
        &mut self,
        text: &str,
        style: &ComputedStyle,
        parent_width: f32,
        tag: Option<&Tag>,
    ) -> LayoutResult<NodeId> {
        let bold = style.font_weight == FontWeight::Bold;
        let italic = style.font_style == CssFontStyle::Italic;
        let family = &style.font_family;
        let font_size = style.font_size;
        let line_height_px = self.fonts.line_height_px(font_size, style.line_height);

        let text = match style.text_transform {
            TextTransform::Uppercase => text.to_uppercase(),
            TextTransform::None => text.to_string(),
        };

        let outer = if parent_width > 0.0 {
            parent_width
        } else {
            self.available_width
        };
        let box_width = resolve_width(style.width, outer).unwrap_or(outer - style.margin_left - style.margin_right);
        let max_w = (box_width - horizontal_insets(style)).max(1.0);
        let lines = wrap_text(&text, font_size, bold, italic, family, max_w, self.fonts);

        let text_width = lines
            .iter()
            .map(|l| self.fonts.measure_text_width(l, font_size, bold, italic, family))
            .fold(0.0f32, f32::max);
        let text_height = lines.len() as f32 * line_height_px;

        let is_cell = matches!(tag, Some(Tag::Td | Tag::Th));
        // Inline elements (chips, badges) hug their text instead of stretching.
        let hugs_content = tag.is_some() && style.display == style::Display::Inline;
        let taffy_style = Style {
            align_self: hugs_content.then_some(taffy::AlignSelf::Start),
            size: Size {
                width: dim_to_taffy(style.width),
                height: dim_to_taffy(style.height),
            },
            min_size: Size {
                width: if is_cell {
                    length(0.0)
                } else {
                    length(text_width + horizontal_insets(style))
                },
                height: length(text_height + vertical_insets(style)),
            },
            max_size: Size {
                width: dim_to_taffy(style.max_width),
                height: auto(),
            },
            flex_grow: if is_cell { 1.0 } else { style.flex_grow },
            flex_shrink: style.flex_shrink,
            flex_basis: if is_cell { length(0.0) } else { dim_to_taffy(style.flex_basis) },
            margin: margin_rect(style),
            padding: padding_rect(style),
            border: border_rect(style),
            ..Default::default()
        };

        let node = self.taffy.new_leaf(taffy_style).map_err(RenderError::layout)?;
        self.node_styles.insert(node, style.clone());
        self.node_content.insert(node, BoxContent::Text { text, lines });
        Ok(node)
    }

    fn build_element_node(
        &mut self,
        tag: &Tag,
        style: &ComputedStyle,
        children: &[StyledNode],
        attrs: &HashMap<String, String>,
        parent_width: f32,
    ) -> LayoutResult<NodeId> {
        // Block elements whose children are all plain inline content get their
        // text merged into a single wrapped text node so spans flow correctly.
        let is_container = matches!(style.display, style::Display::Flex | style::Display::Grid);
        if !is_container && *tag != Tag::Img && !children.is_empty() && Self::mergeable(children) {
            let raw: String = children.iter().map(Self::collect_inline_text).collect();
            // Collapse whitespace within each line; <br> splits lines.
            let combined = raw
                .split('\n')
                .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
                .collect::<Vec<_>>()
                .join("\n");
            if !combined.trim().is_empty() {
                return self.build_text_node(combined.trim_matches('\n'), style, parent_width, Some(tag));
            }
        }

        // Compute the width available for children
        let my_width = resolve_width(style.width, parent_width).unwrap_or(parent_width);
        let inner_width = my_width - horizontal_insets(style);

        // Estimate per-child width for flex-row containers and table rows so
        // that text is word-wrapped to the right column width at build time.
        let is_flex_row =
            style.display == style::Display::Flex && style.flex_direction == style::FlexDirection::Row;
        let is_table_row = *tag == Tag::Tr;
        let grid_columns = match style.display {
            style::Display::Grid if *tag != Tag::Table => style.grid_template_columns.len().max(1),
            _ => 1,
        };

        let elem_children: Vec<&StyledNode> = children
            .iter()
            .filter(|c| matches!(c, StyledNode::Element { .. }))
            .collect();
        let elem_child_count = elem_children.len().max(1);

        let child_build_width = if is_flex_row || is_table_row {
            // Children with a fixed width keep it; the rest share what is left.
            let fixed: f32 = elem_children
                .iter()
                .filter_map(|c| match c {
                    StyledNode::Element { style: cs, .. } => resolve_width(cs.width, inner_width),
                    StyledNode::Text { .. } => None,
                })
                .sum();
            let flexible = elem_children
                .iter()
                .filter(|c| matches!(c, StyledNode::Element { style: cs, .. } if resolve_width(cs.width, inner_width).is_none()))
                .count()
                .max(1);
            let gap_total = style.gap * (elem_child_count.saturating_sub(1)) as f32;
            ((inner_width - gap_total - fixed) / flexible as f32).max(1.0)
        } else if grid_columns > 1 {
            let gap_total = style.gap * (grid_columns - 1) as f32;
            ((inner_width - gap_total) / grid_columns as f32).max(1.0)
        } else {
            inner_width
        };

        // Build child nodes
        let mut child_nodes = Vec::new();
        let mut list_counter = 0u32;

        for child in children {
            let li_marker = match child {
                StyledNode::Element { tag: Tag::Li, .. } => {
                    list_counter += 1;
                    Some(if *tag == Tag::Ol {
                        format!("{list_counter}. ")
                    } else {
                        "\u{2022} ".to_string()
                    })
                }
                _ => None,
            };

            // A fixed-width child wraps to its own width, not the share.
            let width_for_child = match child {
                StyledNode::Element { style: cs, .. } if is_flex_row => {
                    resolve_width(cs.width, inner_width).unwrap_or(child_build_width)
                }
                _ => child_build_width,
            };
            let child_id = self.build_node(child, width_for_child)?;

            if let Some(marker) = li_marker {
                self.node_markers.insert(child_id, marker);
            }

            child_nodes.push(child_id);
        }

        // For <img> elements, resolve Auto width/height to concrete pixel dimensions
        // using the image's intrinsic size decoded from the data URI.
        // Without this, a Taffy node with no children and Auto dimensions
        // computes to 0×0, making the image invisible in the rendered PDF.
        let style_override = if *tag == Tag::Img
            && (style.width == style::Dimension::Auto || style.height == style::Dimension::Auto)
        {
            let src = attrs.get("src").map(|s| s.as_str()).unwrap_or("");
            resolve_img_auto_dimensions(src, style, parent_width)
        } else {
            None
        };

        let effective_style = style_override.as_ref().unwrap_or(style);
        let taffy_style = self.computed_to_taffy(effective_style, tag);
        let node = self
            .taffy
            .new_with_children(taffy_style, &child_nodes)
            .map_err(RenderError::layout)?;
        self.node_styles.insert(node, effective_style.clone());

        if *tag == Tag::Img {
            let src = attrs.get("src").cloned().unwrap_or_default();
            self.node_content.insert(node, BoxContent::Image { src });
        }

        Ok(node)
    }

    fn computed_to_taffy(&self, s: &ComputedStyle, tag: &Tag) -> Style {
        let mut ts = Style::default();

        // -----------------------------------------------------------------
        // HTML table model: always use flex regardless of computed display.
        // -----------------------------------------------------------------
        match tag {
            Tag::Table => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Column;
                ts.size.width = dim_to_taffy(s.width);
                ts.size.height = dim_to_taffy(s.height);
                ts.min_size.width = length(0.0);
                ts.padding = padding_rect(s);
                ts.margin = margin_rect(s);
                ts.border = border_rect(s);
                return ts;
            }
            Tag::Tr => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Row;
                ts.align_items = Some(taffy::AlignItems::Stretch);
                ts.size.width = percent(1.0);
                ts.min_size.width = length(0.0);
                ts.margin = margin_rect(s);
                return ts;
            }
            Tag::Td | Tag::Th => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Column;
                ts.flex_grow = 1.0;
                ts.flex_shrink = 1.0;
                ts.flex_basis = length(0.0); // equal columns
                ts.min_size.width = length(0.0);
                ts.padding = padding_rect(s);
                ts.border = border_rect(s);
                return ts;
            }
            _ => {}
        }

        // Display / layout mode
        match s.display {
            style::Display::Flex => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = match s.flex_direction {
                    style::FlexDirection::Row => taffy::FlexDirection::Row,
                    style::FlexDirection::Column => taffy::FlexDirection::Column,
                };
                ts.flex_wrap = match s.flex_wrap {
                    style::FlexWrap::NoWrap => taffy::FlexWrap::NoWrap,
                    style::FlexWrap::Wrap => taffy::FlexWrap::Wrap,
                };
                ts.justify_content = Some(match s.justify_content {
                    style::JustifyContent::Start => taffy::JustifyContent::Start,
                    style::JustifyContent::End => taffy::JustifyContent::End,
                    style::JustifyContent::Center => taffy::JustifyContent::Center,
                    style::JustifyContent::SpaceBetween => taffy::JustifyContent::SpaceBetween,
                    style::JustifyContent::SpaceAround => taffy::JustifyContent::SpaceAround,
                    style::JustifyContent::SpaceEvenly => taffy::JustifyContent::SpaceEvenly,
                });
                ts.align_items = Some(match s.align_items {
                    style::AlignItems::Start => taffy::AlignItems::Start,
                    style::AlignItems::End => taffy::AlignItems::End,
                    style::AlignItems::Center => taffy::AlignItems::Center,
                    style::AlignItems::Stretch => taffy::AlignItems::Stretch,
                });
            }
            style::Display::Grid => {
                ts.display = taffy::Display::Grid;
                ts.grid_template_columns = if s.grid_template_columns.is_empty() {
                    vec![TrackSizingFunction::from_flex(1.0)]
                } else {
                    s.grid_template_columns
                        .iter()
                        .map(|track| match *track {
                            style::GridTrack::Fr(fr) => TrackSizingFunction::from_flex(fr),
                            style::GridTrack::Px(px) => TrackSizingFunction::from_length(px),
                        })
                        .collect()
                };
            }
            style::Display::Block
            | style::Display::ListItem
            | style::Display::TableRow
            | style::Display::TableCell
            | style::Display::InlineBlock => {
                // Use flex column for block-level elements (vertical stacking)
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Column;
            }
            style::Display::Inline => {
                ts.display = taffy::Display::Flex;
                ts.flex_direction = taffy::FlexDirection::Row;
                ts.flex_wrap = taffy::FlexWrap::Wrap;
            }
            style::Display::None => {
                ts.display = taffy::Display::None;
            }
        }

        // Sizing
        ts.size = Size {
            width: dim_to_taffy(s.width),
            height: dim_to_taffy(s.height),
        };
        // Allow flex/shrink items to compress below their natural content size
        ts.min_size = Size {
            width: if s.flex_shrink > 0.0 || s.flex_grow > 0.0 {
                length(0.0)
            } else {
                dim_to_taffy(s.min_width)
            },
            height: auto(),
        };
        ts.max_size = Size {
            width: dim_to_taffy(s.max_width),
            height: auto(),
        };

        ts.flex_grow = s.flex_grow;
        ts.flex_shrink = s.flex_shrink;
        ts.flex_basis = dim_to_taffy(s.flex_basis);
        ts.margin = margin_rect(s);
        ts.padding = padding_rect(s);
        ts.border = border_rect(s);
        ts.gap = Size {
            width: length(s.gap),
            height: length(s.gap),
        };

        ts
    }

    /// Extract positioned boxes after layout computation.
    fn extract(&self, node: NodeId, offset_x: f32, offset_y: f32) -> LayoutResult<PositionedBox> {
        let layout = self.taffy.layout(node).map_err(RenderError::layout)?;
        let style = self.node_styles.get(&node).cloned().unwrap_or_default();
        let content = self
            .node_content
            .get(&node)
            .cloned()
            .unwrap_or(BoxContent::None);

        let x = offset_x + layout.location.x;
        let y = offset_y + layout.location.y;

        let children = self
            .taffy
            .children(node)
            .map_err(RenderError::layout)?
            .into_iter()
            .map(|child| self.extract(child, x, y))
            .collect::<LayoutResult<Vec<_>>>()?;

        Ok(PositionedBox {
            x,
            y,
            width: layout.size.width,
            height: layout.size.height,
            page_break_before: style.page_break_before,
            page_break_after: style.page_break_after,
            page_break_inside_avoid: style.page_break_inside_avoid,
            list_marker: self.node_markers.get(&node).cloned(),
            style,
            content,
            children,
        })
    }
}

// ---------------------------------------------------------------------------
// Style conversion helpers
// ---------------------------------------------------------------------------

fn dim_to_taffy(d: style::Dimension) -> taffy::Dimension {
    match d {
        style::Dimension::Auto => auto(),
        style::Dimension::Px(v) => length(v),
        style::Dimension::Percent(v) => percent(v / 100.0),
    }
}

fn resolve_width(d: style::Dimension, parent_width: f32) -> Option<f32> {
    match d {
        style::Dimension::Px(w) => Some(w),
        style::Dimension::Percent(p) => Some(parent_width * p / 100.0),
        style::Dimension::Auto => None,
    }
}

/// Left + right padding and border.
pub(crate) fn horizontal_insets(s: &ComputedStyle) -> f32 {
    s.padding_left + s.padding_right + 2.0 * s.border_width
}

fn vertical_insets(s: &ComputedStyle) -> f32 {
    s.padding_top + s.padding_bottom + 2.0 * s.border_width
}

fn margin_rect(s: &ComputedStyle) -> Rect<LengthPercentageAuto> {
    Rect {
        top: length(s.margin_top),
        right: length(s.margin_right),
        bottom: length(s.margin_bottom),
        left: length(s.margin_left),
    }
}

fn padding_rect(s: &ComputedStyle) -> Rect<LengthPercentage> {
    Rect {
        top: length(s.padding_top),
        right: length(s.padding_right),
        bottom: length(s.padding_bottom),
        left: length(s.padding_left),
    }
}

fn border_rect(s: &ComputedStyle) -> Rect<LengthPercentage> {
    Rect {
        top: length(s.border_width),
        right: length(s.border_width),
        bottom: length(s.border_width),
        left: length(s.border_width),
    }
}

// ---------------------------------------------------------------------------
// Image intrinsic-size helper
// ---------------------------------------------------------------------------

/// Intrinsic size of a data-URI image in points (1 px = 1 pt).
pub fn image_intrinsic_size(src: &str) -> Option<(f32, f32)> {
    let uri = DataUri::parse(src).ok()?;
    if uri.is_svg() {
        return crate::svg::svg_size(&String::from_utf8_lossy(&uri.bytes)).ok();
    }
    let img = ::image::load_from_memory(&uri.bytes).ok()?;
    Some((img.width() as f32, img.height() as f32))
}

/// Return a cloned [`ComputedStyle`] with any `Auto` width/height replaced
/// by concrete values derived from the image's intrinsic dimensions.
///
/// Returns `None` when the src cannot be decoded or when both dimensions
/// are already specified (no fix needed).
fn resolve_img_auto_dimensions(
    src: &str,
    style: &ComputedStyle,
    parent_width: f32,
) -> Option<ComputedStyle> {
    let (px_w, px_h) = image_intrinsic_size(src)?;
    if px_w <= 0.0 || px_h <= 0.0 {
        return None;
    }
    let aspect = px_w / px_h;

    let known_w = resolve_width(style.width, parent_width);
    let known_h = match style.height {
        style::Dimension::Px(v) => Some(v),
        _ => None,
    };

    let mut s = style.clone();
    match (known_w, known_h) {
        // Width known → derive height from aspect ratio.
        (Some(w), None) => s.height = style::Dimension::Px((w / aspect).max(1.0)),
        // Height known → derive width from aspect ratio.
        (None, Some(h)) => s.width = style::Dimension::Px((h * aspect).max(1.0)),
        // Both Auto → intrinsic size, shrunk to fit the container.
        (None, None) => {
            let w = px_w.min(parent_width.max(1.0));
            s.width = style::Dimension::Px(w);
            s.height = style::Dimension::Px(w / aspect);
        }
        (Some(_), Some(_)) => return None,
    }
    Some(s)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute layout for a styled tree, returning a list of top-level positioned
/// boxes in document coordinates.
pub fn compute_layout(
    styled_nodes: &[StyledNode],
    page_width: f32,
    page_margin: f32,
    fonts: &FontManager,
) -> Result<Vec<PositionedBox>, RenderError> {
    let content_width = page_width - 2.0 * page_margin;
    if content_width <= 0.0 {
        return Err(RenderError::layout(format!(
            "page margin {page_margin} leaves no room on a {page_width} pt wide page"
        )));
    }
    let mut builder = LayoutBuilder::new(fonts, content_width);

    // Wrap all nodes in a root flex-column container
    let child_ids = styled_nodes
        .iter()
        .map(|node| builder.build_node(node, content_width))
        .collect::<LayoutResult<Vec<_>>>()?;

    let root_style = Style {
        display: taffy::Display::Flex,
        flex_direction: taffy::FlexDirection::Column,
        size: Size {
            width: length(content_width),
            height: auto(),
        },
        ..Default::default()
    };

    let root = builder
        .taffy
        .new_with_children(root_style, &child_ids)
        .map_err(RenderError::layout)?;

    builder
        .taffy
        .compute_layout(
            root,
            Size {
                width: AvailableSpace::Definite(content_width),
                height: AvailableSpace::MaxContent,
            },
        )
        .map_err(RenderError::layout)?;

    let root_box = builder.extract(root, page_margin, 0.0)?;
    log::debug!("layout produced {} top-level boxes", root_box.children.len());
    Ok(root_box.children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::Stylesheet;
    use crate::dom::parse_html;
    use crate::style::build_styled_tree;

    fn layout(html: &str, css: &str) -> Vec<PositionedBox> {
        let styled = build_styled_tree(&parse_html(html), &Stylesheet::parse(css));
        compute_layout(&styled, 595.0, 40.0, &FontManager::default()).unwrap()
    }

    #[test]
    fn layout_simple_paragraph() {
        let boxes = layout("<p>Hello world</p>", "");
        assert!(!boxes.is_empty(), "Should produce at least one box");
        let first = &boxes[0];
        assert!(first.width > 0.0, "Box should have width");
        assert!(first.height > 0.0, "Box should have height");
    }

    #[test]
    fn layout_flex_row() {
        let boxes = layout(
            r#"<div class="row"><div class="col">A</div><div class="col">B</div></div>"#,
            ".row { display: flex } .col { flex: 1 }",
        );
        let row = &boxes[0];
        assert_eq!(row.children.len(), 2);
        let (a, b) = (&row.children[0], &row.children[1]);
        assert!((a.width - b.width).abs() < 0.5);
        assert!(b.x > a.x);
    }

    #[test]
    fn flex_one_splits_evenly_regardless_of_content() {
        let boxes = layout(
            r#"<div class="row"><div class="col">A</div><div class="col">a noticeably longer run</div></div>"#,
            ".row { display: flex; gap: 10px } .col { flex: 1 }",
        );
        let row = &boxes[0];
        let (a, b) = (&row.children[0], &row.children[1]);
        assert!((a.width - b.width).abs() < 0.5, "{} vs {}", a.width, b.width);
        assert!((a.width + b.width + 10.0 - row.width).abs() < 1.0);
    }

    #[test]
    fn inline_children_merge_into_one_text_box() {
        let boxes = layout("<div>Hello <strong>bold</strong> world</div>", "");
        let BoxContent::Text { text, .. } = &boxes[0].content else {
            panic!("expected merged text, got {:?}", boxes[0].content);
        };
        assert_eq!(text, "Hello bold world");
    }

    #[test]
    fn decorated_span_keeps_its_box() {
        let boxes = layout(
            "<div>Status: <span class='chip'>Paid</span></div>",
            ".chip { background: #dcfce7; padding: 2px 6px }",
        );
        assert!(matches!(boxes[0].content, BoxContent::None));
        assert_eq!(boxes[0].children.len(), 2);
    }

    #[test]
    fn long_tokens_wrap_inside_narrow_columns() {
        let email = format!("{}@example.com", "a".repeat(120));
        let boxes = layout(&format!("<div style='width: 200px'><p>{email}</p></div>"), "");
        let BoxContent::Text { lines, .. } = &boxes[0].children[0].content else {
            panic!("expected text");
        };
        assert!(lines.len() > 1);
        assert!(boxes[0].children[0].width <= 200.0 + 0.5);
    }

    #[test]
    fn svg_image_takes_intrinsic_size() {
        let src = DataUri::encode(
            "image/svg+xml",
            b"<svg xmlns='http://www.w3.org/2000/svg' width='120' height='60'><rect width='4' height='4'/></svg>",
        );
        let boxes = layout(&format!("<div><img src='{src}'></div>"), "");
        let img = &boxes[0].children[0];
        assert!(matches!(img.content, BoxContent::Image { .. }));
        assert!((img.width - 120.0).abs() < 0.5);
        assert!((img.height - 60.0).abs() < 0.5);
    }

    #[test]
    fn list_items_carry_markers() {
        let boxes = layout("<ol><li>one</li><li>two</li></ol>", "");
        let markers: Vec<_> = boxes[0]
            .children
            .iter()
            .map(|li| li.list_marker.clone())
            .collect();
        assert_eq!(markers, vec![Some("1. ".to_string()), Some("2. ".to_string())]);
    }

    #[test]
    fn zero_content_width_is_a_layout_error() {
        let err = compute_layout(&[], 60.0, 40.0, &FontManager::default()).unwrap_err();
        assert!(matches!(err, RenderError::Layout(_)));
    }
}
