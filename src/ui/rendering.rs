//! Canvas rendering functionality for the frame and its elements.
//!
//! This module handles all drawing operations: the gradient or solid
//! frame background, editor blocks with highlighted code, text callouts,
//! connector arrows with their heads, and the selection decorations.

use eframe::egui;
use eframe::epaint::StrokeKind;

use super::canvas::{EDITOR_PADDING, GUTTER_WIDTH};
use super::highlighters;
use super::state::CanvasApp;
use crate::constants;
use crate::types::{
    ArrowElement, ArrowPath, CanvasBackground, Element, ElementKind, GradientKind, Range,
    TextElement,
};

/// Number of strips used to approximate a gradient fill.
const GRADIENT_STEPS: usize = 96;

impl CanvasApp {
    /// Paints the whole canvas frame: background, then every visible
    /// element in sequence order, then selection decorations on top.
    ///
    /// # Arguments
    ///
    /// * `painter` - The egui painter, clipped to the canvas area
    /// * `frame` - The on-screen rect of the canvas frame
    pub fn render_canvas(&self, painter: &egui::Painter, frame: egui::Rect) {
        self.draw_background(painter, frame);

        let origin = frame.min.to_vec2();
        for element in self.scene.all() {
            if !element.visible {
                continue;
            }
            match &element.kind {
                ElementKind::Editor(_) => self.draw_editor(painter, origin, element),
                ElementKind::Text(text) => self.draw_text(painter, origin, element, text),
                ElementKind::Arrow(arrow) => self.draw_arrow(painter, origin, element.id, arrow),
                ElementKind::Image(_) => self.draw_image_placeholder(painter, origin, element),
            }
        }

        if let Some(selected) = self.interaction.selected {
            if let Some(element) = self.scene.by_id(selected) {
                self.draw_selection_decoration(painter, origin, element);
            }
        }
    }

    /// Fills the frame with its configured background paint.
    pub fn draw_background(&self, painter: &egui::Painter, frame: egui::Rect) {
        match &self.canvas.background {
            CanvasBackground::Solid(color) => {
                painter.rect_filled(frame, 0.0, *color);
            }
            CanvasBackground::Gradient { kind, stops } => match kind {
                GradientKind::Linear(angle_deg) => {
                    draw_linear_gradient(painter, frame, *angle_deg, stops);
                }
                GradientKind::Radial => draw_radial_gradient(painter, frame, stops),
            },
        }
    }

    fn draw_editor(&self, painter: &egui::Painter, origin: egui::Vec2, element: &Element) {
        let Some(editor) = element.as_editor() else { return };
        let rect = self.element_rect(element).translate(origin);

        painter.rect_filled(rect, 6.0, egui::Color32::from_rgb(30, 30, 30));
        painter.rect_stroke(
            rect,
            6.0,
            egui::Stroke::new(1.0, egui::Color32::from_gray(70)),
            StrokeKind::Inside,
        );

        let font_id = egui::FontId::monospace(editor.font_size);
        let line_height = editor.font_size * self.defaults.editor.line_height;
        let gutter = if editor.line_numbers { GUTTER_WIDTH } else { 0.0 };
        let text_origin = rect.min + egui::vec2(EDITOR_PADDING + gutter, EDITOR_PADDING);

        // Hover-highlight the linked range before the code paints over it.
        if let Some((editor_id, range)) = self.interaction.hover_link {
            if editor_id == element.id {
                self.draw_range_highlight(painter, rect, editor, range);
            }
        }

        if editor.line_numbers {
            let line_count = editor.source.lines().count().max(1);
            for line in 1..=line_count {
                painter.text(
                    rect.min + egui::vec2(EDITOR_PADDING, EDITOR_PADDING + (line - 1) as f32 * line_height),
                    egui::Align2::LEFT_TOP,
                    line.to_string(),
                    font_id.clone(),
                    egui::Color32::from_gray(110),
                );
            }
        }

        if editor.source.is_empty() {
            painter.text(
                text_origin,
                egui::Align2::LEFT_TOP,
                constants::DEFAULT_EDITOR_PLACEHOLDER,
                font_id,
                egui::Color32::from_gray(120),
            );
        } else {
            let mut job = highlighters::highlight_source(&editor.source, font_id, &editor.language);
            job.wrap.max_width = rect.width() - 2.0 * EDITOR_PADDING - gutter;
            let galley = painter.layout_job(job);
            painter.galley(text_origin, galley, egui::Color32::WHITE);
        }
    }

    /// Paints the translucent box over the character span a hovered callout
    /// or arrow points at.
    fn draw_range_highlight(
        &self,
        painter: &egui::Painter,
        rect: egui::Rect,
        editor: &crate::types::EditorElement,
        range: Range,
    ) {
        let line_height = editor.font_size * self.defaults.editor.line_height;
        let char_width = editor.font_size * 0.6;
        let gutter = if editor.line_numbers { GUTTER_WIDTH } else { 0.0 };
        let left = rect.left() + EDITOR_PADDING + gutter;

        for line in range.start_line..=range.end_line {
            let start_col = if line == range.start_line { range.start_column } else { 1 };
            // Full-width highlight for intermediate lines.
            let end_x = if line == range.end_line {
                left + (range.end_column.saturating_sub(1)) as f32 * char_width
            } else {
                rect.right() - EDITOR_PADDING
            };
            let start_x = left + (start_col.saturating_sub(1)) as f32 * char_width;
            let top = rect.top() + EDITOR_PADDING + (line - 1) as f32 * line_height;
            let highlight = egui::Rect::from_min_max(
                egui::pos2(start_x, top),
                egui::pos2(end_x.max(start_x + char_width), top + line_height),
            );
            painter.rect_filled(
                highlight.intersect(rect),
                2.0,
                egui::Color32::from_rgba_unmultiplied(255, 213, 79, 70),
            );
        }
    }

    fn draw_text(
        &self,
        painter: &egui::Painter,
        origin: egui::Vec2,
        element: &Element,
        text: &TextElement,
    ) {
        let rect = self.element_rect(element).translate(origin);

        if text.background != egui::Color32::TRANSPARENT {
            let rounding = if text.rounded { 10.0 } else { 0.0 };
            painter.rect_filled(rect, rounding, text.background);
        }

        let galley = painter.layout(
            text.content.clone(),
            egui::FontId::proportional(text.font_size),
            text.foreground,
            rect.width(),
        );
        let pos = rect.center() - galley.size() / 2.0;
        if text.rotate.abs() > f32::EPSILON {
            let angle = text.rotate.to_radians();
            let mut shape = egui::epaint::TextShape::new(pos, galley, text.foreground);
            shape.angle = angle;
            painter.add(shape);
        } else {
            painter.galley(pos, galley, text.foreground);
        }
    }

    fn draw_arrow(
        &self,
        painter: &egui::Painter,
        origin: egui::Vec2,
        arrow_id: crate::types::ElementId,
        arrow: &ArrowElement,
    ) {
        let Some((from, to)) = self.arrow_endpoints(arrow_id, arrow) else { return };
        let from = from + origin;
        let to = to + origin;

        let color = arrow.color.gamma_multiply(arrow.opacity);
        let stroke = egui::Stroke::new(arrow.stroke_width, color);

        // Stop the stroke short of the tip so it does not poke past the head.
        let head_len = constants::DEFAULT_ARROW_HEAD_SIZE * arrow.stroke_width;
        let dir = (to - from).normalized();
        let line_end = to - dir * head_len * 0.8;

        let points: Vec<egui::Pos2> = match arrow.path {
            ArrowPath::Straight => vec![from, line_end],
            ArrowPath::Grid => {
                // Vertical-first orthogonal routing.
                let mid = egui::pos2(from.x, to.y);
                vec![from, mid, line_end]
            }
            ArrowPath::Smooth => sample_cubic(from, line_end, 24),
        };

        if arrow.dashness {
            painter.extend(egui::Shape::dashed_line(&points, stroke, 8.0, 6.0));
        } else {
            painter.add(egui::Shape::line(points, stroke));
        }

        draw_arrow_head(painter, to, dir, head_len, color);
    }

    fn draw_image_placeholder(&self, painter: &egui::Painter, origin: egui::Vec2, element: &Element) {
        let rect = self.element_rect(element).translate(origin);
        painter.rect_filled(rect, 4.0, egui::Color32::from_gray(60));
        painter.text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            "image",
            egui::FontId::proportional(13.0),
            egui::Color32::from_gray(160),
        );
    }

    /// Draws the selection outline and resize handle over the selected
    /// element. Arrows get only the outline of their bounding segment.
    fn draw_selection_decoration(
        &self,
        painter: &egui::Painter,
        origin: egui::Vec2,
        element: &Element,
    ) {
        let accent = egui::Color32::from_rgb(100, 150, 255);
        match &element.kind {
            ElementKind::Arrow(arrow) => {
                if let Some((from, to)) = self.arrow_endpoints(element.id, arrow) {
                    painter.line_segment(
                        [from + origin, to + origin],
                        egui::Stroke::new(1.0, accent),
                    );
                }
            }
            _ => {
                let rect = self.element_rect(element).translate(origin).expand(2.0);
                painter.rect_stroke(rect, 4.0, egui::Stroke::new(2.0, accent), StrokeKind::Outside);
                let handle = self
                    .resize_handle_rect(element)
                    .translate(origin);
                painter.rect_filled(handle, 2.0, accent);
            }
        }
    }
}

/// Interpolated color along the gradient's evenly spaced stops.
pub(super) fn gradient_color(stops: &[egui::Color32], t: f32) -> egui::Color32 {
    match stops.len() {
        0 => egui::Color32::TRANSPARENT,
        1 => stops[0],
        n => {
            let t = t.clamp(0.0, 1.0) * (n - 1) as f32;
            let idx = (t.floor() as usize).min(n - 2);
            let frac = t - idx as f32;
            let a = stops[idx];
            let b = stops[idx + 1];
            let lerp = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * frac).round() as u8;
            egui::Color32::from_rgb(lerp(a.r(), b.r()), lerp(a.g(), b.g()), lerp(a.b(), b.b()))
        }
    }
}

/// Approximates a linear gradient with strips perpendicular to the CSS
/// angle (0 degrees points up, 90 points right).
fn draw_linear_gradient(
    painter: &egui::Painter,
    rect: egui::Rect,
    angle_deg: f32,
    stops: &[egui::Color32],
) {
    let painter = painter.with_clip_rect(rect);
    let rad = angle_deg.to_radians();
    let axis = egui::vec2(rad.sin(), -rad.cos());
    let normal = egui::vec2(-axis.y, axis.x);

    let center = rect.center();
    let half_span = (rect.width() * axis.x.abs() + rect.height() * axis.y.abs()) / 2.0;
    let half_width = (rect.width() + rect.height()) / 2.0;

    let step = (2.0 * half_span) / GRADIENT_STEPS as f32;
    for i in 0..GRADIENT_STEPS {
        let t0 = -half_span + i as f32 * step;
        let t1 = t0 + step + 0.5;
        let color = gradient_color(stops, (i as f32 + 0.5) / GRADIENT_STEPS as f32);
        let quad = vec![
            center + axis * t0 - normal * half_width,
            center + axis * t0 + normal * half_width,
            center + axis * t1 + normal * half_width,
            center + axis * t1 - normal * half_width,
        ];
        painter.add(egui::Shape::convex_polygon(quad, color, egui::Stroke::NONE));
    }
}

/// Approximates a radial gradient with concentric circles painted from the
/// outside in.
fn draw_radial_gradient(painter: &egui::Painter, rect: egui::Rect, stops: &[egui::Color32]) {
    let painter = painter.with_clip_rect(rect);
    let center = rect.center();
    let max_radius = (rect.size() / 2.0).length();

    painter.rect_filled(rect, 0.0, gradient_color(stops, 1.0));
    for i in (0..GRADIENT_STEPS).rev() {
        let t = i as f32 / GRADIENT_STEPS as f32;
        painter.circle_filled(center, max_radius * t, gradient_color(stops, t));
    }
}

/// Points of a gentle S-curve between the endpoints.
fn sample_cubic(from: egui::Pos2, to: egui::Pos2, samples: usize) -> Vec<egui::Pos2> {
    let bend = (to.y - from.y) * 0.5;
    let c1 = egui::pos2(from.x, from.y + bend);
    let c2 = egui::pos2(to.x, to.y - bend);
    (0..=samples)
        .map(|i| {
            let t = i as f32 / samples as f32;
            let u = 1.0 - t;
            let p = from.to_vec2() * (u * u * u)
                + c1.to_vec2() * (3.0 * u * u * t)
                + c2.to_vec2() * (3.0 * u * t * t)
                + to.to_vec2() * (t * t * t);
            p.to_pos2()
        })
        .collect()
}

fn draw_arrow_head(
    painter: &egui::Painter,
    tip: egui::Pos2,
    direction: egui::Vec2,
    length: f32,
    color: egui::Color32,
) {
    let perpendicular = egui::vec2(-direction.y, direction.x);
    let base = tip - direction * length;
    painter.add(egui::Shape::convex_polygon(
        vec![
            tip,
            base + perpendicular * length * 0.5,
            base - perpendicular * length * 0.5,
        ],
        color,
        egui::Stroke::NONE,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gradient_color_endpoints_and_midpoint() {
        let stops = [egui::Color32::BLACK, egui::Color32::WHITE];
        assert_eq!(gradient_color(&stops, 0.0), egui::Color32::BLACK);
        assert_eq!(gradient_color(&stops, 1.0), egui::Color32::WHITE);
        let mid = gradient_color(&stops, 0.5);
        assert_eq!(mid.r(), 128);
        assert_eq!(mid.r(), mid.g());
    }

    #[test]
    fn test_gradient_color_three_stops() {
        let stops = [
            egui::Color32::from_rgb(255, 0, 0),
            egui::Color32::from_rgb(0, 255, 0),
            egui::Color32::from_rgb(0, 0, 255),
        ];
        assert_eq!(gradient_color(&stops, 0.5), egui::Color32::from_rgb(0, 255, 0));
        assert_eq!(gradient_color(&stops, 2.0), egui::Color32::from_rgb(0, 0, 255));
    }

    #[test]
    fn test_sample_cubic_hits_endpoints() {
        let from = egui::pos2(0.0, 0.0);
        let to = egui::pos2(100.0, 50.0);
        let points = sample_cubic(from, to, 16);
        assert_eq!(points.len(), 17);
        assert_eq!(points[0], from);
        assert!((points[16] - to).length() < 0.001);
    }
}
