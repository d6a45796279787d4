//! Core data types for the explanation canvas.
//!
//! This module defines the canvas element model: the tagged union of element
//! kinds (editor, text, arrow, image), the source ranges that link
//! annotations back to editor content, and the per-canvas settings and
//! defaults. Elements are pure data; all rendering state is derived from
//! them each frame by the UI layer.

use egui::Color32;
use serde::{Deserialize, Serialize};

use crate::constants;

/// Unique identifier for canvas elements.
///
/// Ids are small positive integers allocated by the scene store
/// (`max(existing) + 1`) and stay stable for the element's lifetime.
pub type ElementId = u64;

/// A source-position span within one editor element's content.
///
/// Lines and columns are 1-based, matching the conventions of code editors.
/// The end column is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    /// First line of the span (1-based).
    pub start_line: u32,
    /// Column on the first line where the span starts (1-based).
    pub start_column: u32,
    /// Last line of the span (1-based).
    pub end_line: u32,
    /// Column on the last line where the span ends (exclusive).
    pub end_column: u32,
}

impl Range {
    /// Creates a range from start/end line and column.
    pub fn new(start_line: u32, start_column: u32, end_line: u32, end_column: u32) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// The position an arrow binds to for the given anchor end.
    pub fn anchor_position(&self, anchor_at: AnchorAt) -> (u32, u32) {
        match anchor_at {
            AnchorAt::Start => (self.start_line, self.start_column),
            AnchorAt::End => (self.end_line, self.end_column),
        }
    }

    /// Returns true if the span covers zero characters.
    pub fn is_empty(&self) -> bool {
        self.start_line == self.end_line && self.start_column == self.end_column
    }
}

/// Which end of an arrow's range the start anchor binds to.
///
/// Insertion paths only ever construct `Start`; `End` binds to the end
/// position of the same range and is reachable through the sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorAt {
    /// Bind to the start position of the range.
    Start,
    /// Bind to the end position of the range.
    End,
}

/// Routing style for connector arrows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowPath {
    /// Cubic curve between the anchors.
    Smooth,
    /// Axis-aligned polyline.
    Grid,
    /// Straight line segment.
    Straight,
}

/// Kind-specific data for a code editor block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorElement {
    /// The code shown and edited in this block.
    pub source: String,
    /// Source-language tag used for syntax highlighting (free-form).
    pub language: String,
    /// Font size in points.
    pub font_size: f32,
    /// Whether a line-number gutter is shown.
    pub line_numbers: bool,
}

/// Kind-specific data for a floating text callout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextElement {
    /// The annotation text.
    pub content: String,
    /// The editor this annotation was produced from, if any.
    pub editor_id: Option<ElementId>,
    /// The source span this text explains; present only for
    /// selection explanations.
    pub range: Option<Range>,
    /// The arrow visually connecting this text to its source range.
    /// Set and cleared together with `range`.
    pub arrow_id: Option<ElementId>,
    /// Font size in points.
    pub font_size: f32,
    /// Text color.
    pub foreground: Color32,
    /// Fill color behind the text.
    pub background: Color32,
    /// Rotation in degrees applied when rendering.
    pub rotate: f32,
    /// Whether the background is drawn with rounded corners.
    pub rounded: bool,
    /// Marks the primary full-explanation text for an editor.
    /// At most one per editor by convention.
    pub main: bool,
}

/// Kind-specific data for a connector arrow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrowElement {
    /// The editor this arrow originates from.
    pub editor_id: ElementId,
    /// The source span the start anchor binds to.
    pub range: Range,
    /// Which end of `range` the start anchor binds to.
    pub anchor_at: AnchorAt,
    /// Routing style.
    pub path: ArrowPath,
    /// Stroke color.
    pub color: Color32,
    /// Stroke width in canvas units.
    pub stroke_width: f32,
    /// Whether the stroke is dashed.
    pub dashness: bool,
    /// Stroke opacity (0.0 - 1.0).
    pub opacity: f32,
}

/// Kind-specific data for an image element (placeholder, not part of the
/// editing surface).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageElement {
    /// Source descriptor.
    pub from: String,
    /// Destination descriptor.
    pub to: String,
}

/// The element kind union, discriminated by a `type` tag on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    /// A code editor block.
    Editor(EditorElement),
    /// A floating text callout.
    Text(TextElement),
    /// A connector arrow.
    Arrow(ArrowElement),
    /// An image placeholder.
    Image(ImageElement),
}

/// Plain tag for querying elements by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    /// Code editor blocks.
    Editor,
    /// Text callouts.
    Text,
    /// Connector arrows.
    Arrow,
    /// Image placeholders.
    Image,
}

/// One visual object on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Unique identifier, stable for the element's lifetime.
    pub id: ElementId,
    /// Whether the element is rendered.
    pub visible: bool,
    /// Optional ordering hint on top of sequence order.
    pub z_index: Option<i32>,
    /// Whether the user may delete this element. Seeded elements are
    /// created non-deletable; everything user-created or produced by an
    /// explanation is deletable.
    pub deletable: bool,
    /// Center position on the canvas frame as (x, y) in frame pixels.
    /// Unused for arrows, whose geometry is derived from their anchors.
    pub position: (f32, f32),
    /// Size as (width, height) in frame pixels. Unused for arrows.
    pub size: (f32, f32),
    /// The kind-specific payload.
    pub kind: ElementKind,
}

impl Element {
    /// Creates a new editor block with default styling.
    pub fn new_editor(id: ElementId, defaults: &EditorDefaults, position: (f32, f32)) -> Self {
        Self {
            id,
            visible: true,
            z_index: Some(id as i32),
            deletable: true,
            position,
            size: (460.0, 190.0),
            kind: ElementKind::Editor(EditorElement {
                source: String::new(),
                language: defaults.language.clone(),
                font_size: defaults.font_size,
                line_numbers: defaults.line_numbers,
            }),
        }
    }

    /// Creates a new free-standing or editor-linked text callout.
    pub fn new_text(
        id: ElementId,
        defaults: &TextDefaults,
        editor_id: Option<ElementId>,
        position: (f32, f32),
    ) -> Self {
        Self {
            id,
            visible: true,
            z_index: Some(id as i32),
            deletable: true,
            position,
            size: (320.0, 120.0),
            kind: ElementKind::Text(TextElement {
                content: String::new(),
                editor_id,
                range: None,
                arrow_id: None,
                font_size: defaults.font_size,
                foreground: defaults.foreground,
                background: defaults.background,
                rotate: 0.0,
                rounded: false,
                main: false,
            }),
        }
    }

    /// Creates a new connector arrow bound to the start of `range`.
    pub fn new_arrow(id: ElementId, editor_id: ElementId, range: Range) -> Self {
        Self {
            id,
            visible: true,
            z_index: Some(id as i32),
            deletable: true,
            position: (0.0, 0.0),
            size: (0.0, 0.0),
            kind: ElementKind::Arrow(ArrowElement {
                editor_id,
                range,
                anchor_at: AnchorAt::Start,
                path: ArrowPath::Smooth,
                color: constants::DEFAULT_ARROW_COLOR,
                stroke_width: constants::DEFAULT_ARROW_STROKE_WIDTH,
                dashness: false,
                opacity: constants::DEFAULT_ARROW_OPACITY,
            }),
        }
    }

    /// The plain kind tag of this element.
    pub fn element_type(&self) -> ElementType {
        match &self.kind {
            ElementKind::Editor(_) => ElementType::Editor,
            ElementKind::Text(_) => ElementType::Text,
            ElementKind::Arrow(_) => ElementType::Arrow,
            ElementKind::Image(_) => ElementType::Image,
        }
    }

    /// The editor payload, if this is an editor element.
    pub fn as_editor(&self) -> Option<&EditorElement> {
        match &self.kind {
            ElementKind::Editor(e) => Some(e),
            _ => None,
        }
    }

    /// The text payload, if this is a text element.
    pub fn as_text(&self) -> Option<&TextElement> {
        match &self.kind {
            ElementKind::Text(t) => Some(t),
            _ => None,
        }
    }

    /// The arrow payload, if this is an arrow element.
    pub fn as_arrow(&self) -> Option<&ArrowElement> {
        match &self.kind {
            ElementKind::Arrow(a) => Some(a),
            _ => None,
        }
    }
}

/// Direction of a gradient background.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GradientKind {
    /// Linear gradient along the given CSS-style angle in degrees
    /// (0 points up, 90 points right, 180 points down).
    Linear(f32),
    /// Radial gradient from the frame center outwards.
    Radial,
}

/// The paint used behind the canvas frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CanvasBackground {
    /// Single solid color.
    Solid(Color32),
    /// Multi-stop gradient, stops evenly spaced.
    Gradient {
        /// Direction of the gradient.
        kind: GradientKind,
        /// Color stops, at least two.
        stops: Vec<Color32>,
    },
}

impl CanvasBackground {
    /// The built-in background palette offered by the sidebar.
    pub fn presets() -> Vec<CanvasBackground> {
        use CanvasBackground::Gradient;
        use GradientKind::{Linear, Radial};
        vec![
            Gradient {
                kind: Linear(90.0),
                stops: vec![Color32::from_rgb(0x11, 0x99, 0x8e), Color32::from_rgb(0x38, 0xef, 0x7d)],
            },
            Gradient {
                kind: Linear(180.0),
                stops: vec![
                    Color32::from_rgb(0xa6, 0xff, 0xcb),
                    Color32::from_rgb(0x12, 0xd8, 0xfa),
                    Color32::from_rgb(0x1f, 0xa2, 0xff),
                ],
            },
            Gradient {
                kind: Linear(135.0),
                stops: vec![Color32::from_rgb(0xfb, 0xe4, 0x5f), Color32::from_rgb(0x71, 0xa4, 0x37)],
            },
            Gradient {
                kind: Linear(135.0),
                stops: vec![Color32::from_rgb(0xf5, 0x44, 0x5b), Color32::from_rgb(0xbe, 0x60, 0xb1)],
            },
            Gradient {
                kind: Linear(135.0),
                stops: vec![Color32::from_rgb(0x48, 0xaa, 0xd0), Color32::from_rgb(0x3e, 0x30, 0xd7)],
            },
            Gradient {
                kind: Linear(135.0),
                stops: vec![Color32::from_rgb(0x48, 0x4a, 0xdb), Color32::from_rgb(0x68, 0xf6, 0xce)],
            },
            Gradient {
                kind: Linear(225.0),
                stops: vec![Color32::from_rgb(0x31, 0xd5, 0x39), Color32::from_rgb(0xe9, 0xb4, 0x3b)],
            },
            Gradient {
                kind: Linear(225.0),
                stops: vec![Color32::from_rgb(0xde, 0xa5, 0x9e), Color32::from_rgb(0x1c, 0xe6, 0xe5)],
            },
            Gradient {
                kind: Linear(135.0),
                stops: vec![Color32::from_rgb(0xd2, 0xf6, 0xfa), Color32::from_rgb(0x14, 0xd2, 0xcb)],
            },
            Gradient {
                kind: Radial,
                stops: vec![Color32::from_rgb(0xc1, 0xa7, 0x8f), Color32::from_rgb(0xc3, 0x4c, 0x6a)],
            },
            Gradient {
                kind: Radial,
                stops: vec![Color32::from_rgb(0x31, 0xda, 0x79), Color32::from_rgb(0x3e, 0xaa, 0x48)],
            },
        ]
    }

    /// Picks a random preset for a fresh canvas.
    pub fn random_preset() -> CanvasBackground {
        use rand::seq::IndexedRandom;
        let presets = Self::presets();
        let mut rng = rand::rng();
        presets
            .choose(&mut rng)
            .cloned()
            .unwrap_or(CanvasBackground::Solid(Color32::from_gray(40)))
    }
}

/// Per-canvas frame settings, edited from the sidebar. Independent of the
/// element collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasSettings {
    /// Frame width in pixels.
    pub width: f32,
    /// Frame height in pixels.
    pub height: f32,
    /// Frame background paint.
    pub background: CanvasBackground,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            width: constants::DEFAULT_CANVAS_WIDTH,
            height: constants::DEFAULT_CANVAS_HEIGHT,
            background: CanvasBackground::random_preset(),
        }
    }
}

impl CanvasSettings {
    /// Center of the frame, where new elements are placed.
    pub fn center(&self) -> (f32, f32) {
        (self.width / 2.0, self.height / 2.0)
    }
}

/// Default styling for new text callouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextDefaults {
    /// Font size in points.
    pub font_size: f32,
    /// Text color.
    pub foreground: Color32,
    /// Fill color behind the text.
    pub background: Color32,
}

/// Default configuration for new editor blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorDefaults {
    /// Font size in points.
    pub font_size: f32,
    /// Language tag for syntax highlighting.
    pub language: String,
    /// Line height multiplier.
    pub line_height: f32,
    /// Whether the line-number gutter is shown.
    pub line_numbers: bool,
}

/// Externally supplied defaults for elements created on a canvas.
/// Overridable per canvas session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDefaults {
    /// Defaults for text callouts.
    pub text: TextDefaults,
    /// Defaults for editor blocks.
    pub editor: EditorDefaults,
}

impl Default for ElementDefaults {
    fn default() -> Self {
        Self {
            text: TextDefaults {
                font_size: constants::DEFAULT_TEXT_FONT_SIZE,
                foreground: constants::DEFAULT_TEXT_FOREGROUND,
                background: constants::DEFAULT_TEXT_BACKGROUND,
            },
            editor: EditorDefaults {
                font_size: constants::DEFAULT_EDITOR_FONT_SIZE,
                language: constants::DEFAULT_EDITOR_LANGUAGE.to_string(),
                line_height: constants::DEFAULT_EDITOR_LINE_HEIGHT,
                line_numbers: constants::DEFAULT_EDITOR_LINE_NUMBERS,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editor_element_creation() {
        let defaults = ElementDefaults::default();
        let editor = Element::new_editor(3, &defaults.editor, (100.0, 200.0));

        assert_eq!(editor.id, 3);
        assert!(editor.visible);
        assert!(editor.deletable);
        assert_eq!(editor.position, (100.0, 200.0));
        assert_eq!(editor.element_type(), ElementType::Editor);
        let payload = editor.as_editor().expect("editor payload");
        assert_eq!(payload.language, "javascript");
        assert!(payload.source.is_empty());
    }

    #[test]
    fn test_text_element_creation_linked_and_free() {
        let defaults = ElementDefaults::default();

        let linked = Element::new_text(4, &defaults.text, Some(1), (0.0, 0.0));
        assert_eq!(linked.as_text().unwrap().editor_id, Some(1));
        assert!(linked.as_text().unwrap().range.is_none());
        assert!(linked.as_text().unwrap().arrow_id.is_none());
        assert!(!linked.as_text().unwrap().main);

        let free = Element::new_text(5, &defaults.text, None, (0.0, 0.0));
        assert_eq!(free.as_text().unwrap().editor_id, None);
    }

    #[test]
    fn test_arrow_element_creation() {
        let range = Range::new(1, 1, 1, 5);
        let arrow = Element::new_arrow(7, 1, range);

        let payload = arrow.as_arrow().expect("arrow payload");
        assert_eq!(payload.editor_id, 1);
        assert_eq!(payload.range, range);
        assert_eq!(payload.anchor_at, AnchorAt::Start);
        assert_eq!(payload.path, ArrowPath::Smooth);
    }

    #[test]
    fn test_range_anchor_position() {
        let range = Range::new(2, 3, 4, 9);
        assert_eq!(range.anchor_position(AnchorAt::Start), (2, 3));
        assert_eq!(range.anchor_position(AnchorAt::End), (4, 9));
        assert!(!range.is_empty());
        assert!(Range::new(1, 1, 1, 1).is_empty());
    }

    #[test]
    fn test_element_kind_tag_serialization() {
        let defaults = ElementDefaults::default();
        let editor = Element::new_editor(1, &defaults.editor, (0.0, 0.0));
        let json = serde_json::to_value(&editor.kind).unwrap();
        assert_eq!(json["type"], "editor");

        let arrow = Element::new_arrow(2, 1, Range::new(1, 1, 1, 2));
        let json = serde_json::to_value(&arrow.kind).unwrap();
        assert_eq!(json["type"], "arrow");
        assert_eq!(json["anchor_at"], "start");
    }

    #[test]
    fn test_element_roundtrip_serialization() {
        let defaults = ElementDefaults::default();
        let text = Element::new_text(9, &defaults.text, Some(2), (10.0, 20.0));
        let json = serde_json::to_string(&text).unwrap();
        let restored: Element = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, text);
    }

    #[test]
    fn test_canvas_settings_center_follows_size() {
        let mut settings = CanvasSettings::default();
        settings.width = 800.0;
        settings.height = 600.0;
        assert_eq!(settings.center(), (400.0, 300.0));
    }

    #[test]
    fn test_background_presets_have_stops() {
        for preset in CanvasBackground::presets() {
            match preset {
                CanvasBackground::Gradient { stops, .. } => assert!(stops.len() >= 2),
                CanvasBackground::Solid(_) => {}
            }
        }
    }
}
