//! Canvas interaction functionality.
//!
//! This module handles hit-testing of elements, pointer gestures for
//! selecting, moving, and resizing them, and the coordinate mapping
//! between the canvas frame and screen space. Arrow geometry lives here
//! too since hit-testing and rendering both need the anchor positions.

use eframe::egui;

use super::state::{CanvasApp, Gesture};
use crate::constants;
use crate::types::{ArrowElement, Element, ElementId, ElementKind, ElementType};

/// Horizontal padding between an editor's border and its code.
pub(super) const EDITOR_PADDING: f32 = 10.0;
/// Width reserved for the line-number gutter when enabled.
pub(super) const GUTTER_WIDTH: f32 = 30.0;
/// Distance in pixels within which a pointer hits an arrow.
const ARROW_HIT_DISTANCE: f32 = 6.0;

impl CanvasApp {
    /// The on-screen rect of the canvas frame, centered in the available
    /// area. Element positions are relative to this rect's origin.
    pub fn frame_rect(&self, available: egui::Rect) -> egui::Rect {
        egui::Rect::from_center_size(
            available.center(),
            egui::vec2(self.canvas.width, self.canvas.height),
        )
    }

    /// The frame-space rect occupied by an element (center position plus
    /// size). Not meaningful for arrows.
    pub fn element_rect(&self, element: &Element) -> egui::Rect {
        egui::Rect::from_center_size(
            egui::pos2(element.position.0, element.position.1),
            egui::vec2(element.size.0, element.size.1),
        )
    }

    /// Frame-space position of the character the given arrow anchors to
    /// inside its source editor. `None` when the editor is gone, which can
    /// only happen transiently within a frame.
    pub fn arrow_anchor_pos(&self, arrow: &ArrowElement) -> Option<egui::Pos2> {
        let (line, column) = arrow.range.anchor_position(arrow.anchor_at);
        self.range_anchor_pos(arrow.editor_id, line, column)
    }

    /// Frame-space position of a 1-based line/column inside an editor,
    /// clamped into the editor's rect.
    pub fn range_anchor_pos(
        &self,
        editor_id: ElementId,
        line: u32,
        column: u32,
    ) -> Option<egui::Pos2> {
        let editor = self.scene.by_id(editor_id)?;
        let payload = editor.as_editor()?;
        let rect = self.element_rect(editor);

        let line_height = payload.font_size * self.defaults.editor.line_height;
        // Monospace advance approximation, good enough for anchoring.
        let char_width = payload.font_size * 0.6;
        let gutter = if payload.line_numbers { GUTTER_WIDTH } else { 0.0 };

        let x = rect.left() + EDITOR_PADDING + gutter + (column.saturating_sub(1)) as f32 * char_width;
        let y = rect.top() + EDITOR_PADDING + (line as f32 - 0.5) * line_height;
        Some(egui::pos2(
            x.clamp(rect.left(), rect.right()),
            y.clamp(rect.top(), rect.bottom()),
        ))
    }

    /// Frame-space endpoints of an arrow: from the edge of its text callout
    /// towards the anchored character in the editor.
    pub fn arrow_endpoints(&self, arrow_id: ElementId, arrow: &ArrowElement) -> Option<(egui::Pos2, egui::Pos2)> {
        let to = self.arrow_anchor_pos(arrow)?;
        let text = self.scene.texts_referencing_arrow(arrow_id).next()?;
        let text_rect = self.element_rect(text);
        // Leave the callout from the side facing the anchor.
        let from = egui::pos2(
            text_rect.center().x.clamp(text_rect.left(), text_rect.right()),
            if to.y >= text_rect.center().y {
                text_rect.bottom()
            } else {
                text_rect.top()
            },
        );
        Some((from, to))
    }

    /// Finds the topmost visible element at a frame-space position.
    ///
    /// Elements later in the sequence paint on top, so the scan runs in
    /// reverse paint order. Arrows hit within a small distance of their
    /// line.
    pub fn find_element_at(&self, pos: egui::Pos2) -> Option<ElementId> {
        for element in self.scene.all().iter().rev() {
            if !element.visible {
                continue;
            }
            match &element.kind {
                ElementKind::Arrow(arrow) => {
                    if let Some((from, to)) = self.arrow_endpoints(element.id, arrow) {
                        if point_to_segment_distance(pos, from, to) <= ARROW_HIT_DISTANCE {
                            return Some(element.id);
                        }
                    }
                }
                _ => {
                    if self.element_rect(element).contains(pos) {
                        return Some(element.id);
                    }
                }
            }
        }
        None
    }

    /// The corner resize handle rect for an element, in frame space.
    pub fn resize_handle_rect(&self, element: &Element) -> egui::Rect {
        let rect = self.element_rect(element);
        egui::Rect::from_center_size(
            rect.right_bottom(),
            egui::Vec2::splat(constants::RESIZE_HANDLE_SIZE),
        )
    }

    /// Handles pointer gestures over the canvas: click-select, empty-click
    /// deselect, element dragging, and corner resizing.
    ///
    /// # Arguments
    ///
    /// * `ui` - The egui UI context
    /// * `response` - The response of the canvas-wide interaction area
    /// * `frame` - The on-screen rect of the canvas frame
    pub fn handle_element_gestures(
        &mut self,
        ui: &mut egui::Ui,
        response: &egui::Response,
        frame: egui::Rect,
    ) {
        let pointer = ui.input(|i| i.pointer.latest_pos());
        let pressed = ui.input(|i| i.pointer.primary_pressed());
        let down = ui.input(|i| i.pointer.primary_down());
        let released = ui.input(|i| i.pointer.primary_released());

        let frame_pos = pointer.map(|p| p - frame.min.to_vec2());

        self.update_hover_link(down, frame_pos);

        if pressed && response.hovered() {
            if let Some(pos) = frame_pos {
                match self.find_element_at(pos) {
                    Some(id) => {
                        // Resizing only starts from the handle of the
                        // already-selected element.
                        let on_handle = self.interaction.selected == Some(id)
                            && self
                                .scene
                                .by_id(id)
                                .is_some_and(|e| self.resize_handle_rect(e).contains(pos));
                        let gesture = if on_handle {
                            let original_size =
                                self.scene.by_id(id).map(|e| e.size).unwrap_or((0.0, 0.0));
                            Gesture::Resizing { original_size }
                        } else {
                            Gesture::Pending { start: pos }
                        };
                        self.interaction.gesture = Some((id, gesture));
                    }
                    None => self.interaction.clear(),
                }
            }
        }

        if down {
            if let (Some((id, gesture)), Some(pos)) = (self.interaction.gesture, frame_pos) {
                match gesture {
                    Gesture::Pending { start } => {
                        let movable = self
                            .scene
                            .by_id(id)
                            .is_some_and(|e| e.element_type() != ElementType::Arrow);
                        if movable && (pos - start).length() > constants::CLICK_THRESHOLD {
                            // Promote to a drag; select immediately. The
                            // element has not moved since the press, so the
                            // grab offset is measured against the press
                            // position, not the pointer's current one.
                            let grab_offset = self
                                .scene
                                .by_id(id)
                                .map(|e| egui::pos2(e.position.0, e.position.1) - start)
                                .unwrap_or(egui::Vec2::ZERO);
                            self.interaction.selected = Some(id);
                            self.interaction.gesture = Some((id, Gesture::Dragging { grab_offset }));
                        }
                    }
                    Gesture::Dragging { grab_offset } => {
                        let new_center = pos + grab_offset;
                        self.scene.update_element(id, |e| {
                            e.position = (new_center.x, new_center.y);
                        });
                    }
                    Gesture::Resizing { .. } => {
                        let min = self
                            .scene
                            .by_id(id)
                            .map(|e| self.element_rect(e).min)
                            .unwrap_or(egui::Pos2::ZERO);
                        let width = (pos.x - min.x).max(60.0);
                        let height = (pos.y - min.y).max(40.0);
                        self.scene.update_element(id, |e| {
                            // Keep the top-left corner fixed while resizing.
                            e.position = (min.x + width / 2.0, min.y + height / 2.0);
                            e.size = (width, height);
                        });
                    }
                }
            }
        }

        if released {
            if let Some((id, Gesture::Pending { .. })) = self.interaction.gesture {
                self.interaction.selected = Some(id);
            }
            self.interaction.gesture = None;
        }
    }

    /// Recomputes the hover-highlight link from the current pointer
    /// position. Hovering a callout with a range, or its arrow, decorates
    /// the linked range in the source editor.
    fn update_hover_link(&mut self, pointer_down: bool, frame_pos: Option<egui::Pos2>) {
        self.interaction.hover_link = None;
        if pointer_down {
            return;
        }
        let Some(pos) = frame_pos else { return };
        let Some(id) = self.find_element_at(pos) else { return };
        let Some(element) = self.scene.by_id(id) else { return };
        self.interaction.hover_link = match &element.kind {
            ElementKind::Text(t) => t.editor_id.zip(t.range),
            ElementKind::Arrow(a) => Some((a.editor_id, a.range)),
            _ => None,
        };
    }
}

/// Distance from a point to a line segment.
pub(super) fn point_to_segment_distance(p: egui::Pos2, a: egui::Pos2, b: egui::Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq <= f32::EPSILON {
        return (p - a).length();
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).length()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Range;

    #[test]
    fn test_point_to_segment_distance() {
        let a = egui::pos2(0.0, 0.0);
        let b = egui::pos2(10.0, 0.0);
        assert_eq!(point_to_segment_distance(egui::pos2(5.0, 3.0), a, b), 3.0);
        assert_eq!(point_to_segment_distance(egui::pos2(-4.0, 0.0), a, b), 4.0);
        // Degenerate segment
        assert_eq!(point_to_segment_distance(egui::pos2(3.0, 4.0), a, a), 5.0);
    }

    #[test]
    fn test_find_element_prefers_topmost() {
        let mut app = CanvasApp::default();
        // Two overlapping texts; the later one paints on top.
        let defaults = app.defaults.clone();
        let first = app.scene.insert_text(&defaults, None, (100.0, 100.0));
        let second = app.scene.insert_text(&defaults, None, (100.0, 100.0));
        assert!(first < second);
        assert_eq!(app.find_element_at(egui::pos2(100.0, 100.0)), Some(second));
    }

    #[test]
    fn test_find_element_misses_empty_space() {
        let app = CanvasApp::default();
        assert_eq!(app.find_element_at(egui::pos2(-500.0, -500.0)), None);
    }

    #[test]
    fn test_arrow_anchor_tracks_editor_position() {
        let mut app = CanvasApp::default();
        let defaults = app.defaults.clone();
        let (_, arrow_id) = app.scene.apply_selection_explanation(
            &defaults,
            1,
            Range::new(1, 1, 1, 5),
            "x",
            (200.0, 200.0),
        );
        let arrow = app.scene.by_id(arrow_id).unwrap().as_arrow().unwrap().clone();

        let before = app.arrow_anchor_pos(&arrow).unwrap();
        app.scene.update_element(1, |e| e.position = (e.position.0 + 50.0, e.position.1));
        let after = app.arrow_anchor_pos(&arrow).unwrap();
        assert_eq!(after.x - before.x, 50.0);
        assert_eq!(after.y, before.y);
    }

    #[test]
    fn test_arrow_endpoints_leave_from_callout_edge() {
        let mut app = CanvasApp::default();
        let defaults = app.defaults.clone();
        let (text_id, arrow_id) = app.scene.apply_selection_explanation(
            &defaults,
            1,
            Range::new(1, 1, 1, 5),
            "x",
            (200.0, 100.0),
        );
        let arrow = app.scene.by_id(arrow_id).unwrap().as_arrow().unwrap().clone();
        let (from, to) = app.arrow_endpoints(arrow_id, &arrow).unwrap();

        let text_rect = app.element_rect(app.scene.by_id(text_id).unwrap());
        assert!(from.y == text_rect.top() || from.y == text_rect.bottom());
        let editor_rect = app.element_rect(app.scene.by_id(1).unwrap());
        assert!(editor_rect.contains(to));
    }
}
