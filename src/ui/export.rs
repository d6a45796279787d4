//! Export utilities: render the canvas frame to SVG and rasterize to PNG.
//!
//! The SVG is built from the scene data, not from the live egui output,
//! so exports are deterministic and include nothing outside the frame.
//! PNG rasterization runs through resvg at a fixed pixel ratio, and the
//! save dialog runs async with the result reported over the export
//! channel.

use std::fmt::Write as _;
use std::sync::Arc;

use eframe::egui;

use super::state::{CanvasApp, ExportResult};
use crate::constants;
use crate::types::{ArrowPath, CanvasBackground, ElementKind, GradientKind};

impl CanvasApp {
    /// Rasterizes the frame to PNG and prompts for a save location.
    ///
    /// Runs the dialog and file write on the async runtime; the outcome
    /// arrives over the export channel and is drained next frame.
    pub fn export_png(&mut self, ctx: &egui::Context) {
        let svg = self.build_svg();
        let width = self.canvas.width;
        let height = self.canvas.height;

        let mut opt = usvg::Options::default();
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        opt.fontdb = Arc::new(db);

        let tree = match usvg::Tree::from_data(svg.as_bytes(), &opt) {
            Ok(t) => t,
            Err(err) => {
                log::error!("Failed to parse generated SVG: {err}");
                let _ = self
                    .export
                    .result_sender
                    .send(ExportResult::Failed(format!("Export failed: {err}")));
                return;
            }
        };

        let scale = constants::DEFAULT_EXPORT_PIXEL_RATIO;
        let out_w = (width * scale).round().max(1.0) as u32;
        let out_h = (height * scale).round().max(1.0) as u32;
        let Some(mut pixmap) = tiny_skia::Pixmap::new(out_w, out_h) else {
            let _ = self
                .export
                .result_sender
                .send(ExportResult::Failed(format!(
                    "Export failed: cannot allocate {out_w}x{out_h} image"
                )));
            return;
        };

        let transform = tiny_skia::Transform::from_scale(scale, scale);
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        self.export.in_progress = true;
        let sender = self.export.result_sender.clone();
        let repaint_ctx = ctx.clone();
        tokio::spawn(async move {
            let result = match rfd::AsyncFileDialog::new()
                .add_filter("PNG", &["png"])
                .set_file_name("tutorial.png")
                .save_file()
                .await
            {
                Some(handle) => {
                    let path = handle.path().to_path_buf();
                    match pixmap.save_png(&path) {
                        Ok(()) => ExportResult::Completed(path.display().to_string()),
                        Err(err) => ExportResult::Failed(format!("Failed to save PNG: {err}")),
                    }
                }
                None => ExportResult::Failed("Export cancelled".to_string()),
            };
            let _ = sender.send(result);
            repaint_ctx.request_repaint();
        });
    }

    /// Builds an SVG document of the whole canvas frame.
    pub fn build_svg(&self) -> String {
        let width = self.canvas.width;
        let height = self.canvas.height;

        let mut out = String::new();
        let _ = writeln!(
            out,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">"
        );

        self.write_background(&mut out, width, height);

        for element in self.scene.all() {
            if !element.visible {
                continue;
            }
            let rect = self.element_rect(element);
            match &element.kind {
                ElementKind::Editor(editor) => {
                    let _ = writeln!(
                        out,
                        "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" rx=\"6\" fill=\"#1e1e1e\" />",
                        rect.left(), rect.top(), rect.width(), rect.height()
                    );
                    let line_height = editor.font_size * self.defaults.editor.line_height;
                    let gutter = if editor.line_numbers { super::canvas::GUTTER_WIDTH } else { 0.0 };
                    let x = rect.left() + super::canvas::EDITOR_PADDING + gutter;
                    for (i, line) in editor.source.lines().enumerate() {
                        let y = rect.top() + super::canvas::EDITOR_PADDING + (i as f32 + 0.8) * line_height;
                        if y > rect.bottom() {
                            break;
                        }
                        if editor.line_numbers {
                            let _ = writeln!(
                                out,
                                "<text x=\"{:.1}\" y=\"{y:.1}\" font-family=\"monospace\" font-size=\"{:.1}\" fill=\"#6e6e6e\">{}</text>",
                                rect.left() + super::canvas::EDITOR_PADDING,
                                editor.font_size,
                                i + 1
                            );
                        }
                        let _ = writeln!(
                            out,
                            "<text x=\"{x:.1}\" y=\"{y:.1}\" font-family=\"monospace\" font-size=\"{:.1}\" fill=\"#d4d4d4\" xml:space=\"preserve\">{}</text>",
                            editor.font_size,
                            escape_xml(line)
                        );
                    }
                }
                ElementKind::Text(text) => {
                    let mut group_attrs = String::new();
                    if text.rotate.abs() > f32::EPSILON {
                        let _ = write!(
                            group_attrs,
                            " transform=\"rotate({:.1} {:.1} {:.1})\"",
                            text.rotate,
                            rect.center().x,
                            rect.center().y
                        );
                    }
                    let _ = writeln!(out, "<g{group_attrs}>");
                    if text.background != egui::Color32::TRANSPARENT {
                        let radius = if text.rounded { 10.0 } else { 0.0 };
                        let _ = writeln!(
                            out,
                            "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" rx=\"{radius}\" fill=\"{}\" fill-opacity=\"{:.3}\" />",
                            rect.left(), rect.top(), rect.width(), rect.height(),
                            hex_color(text.background),
                            text.background.a() as f32 / 255.0
                        );
                    }
                    for (i, line) in text.content.lines().enumerate() {
                        let y = rect.top() + (i as f32 + 1.0) * text.font_size * 1.25;
                        let _ = writeln!(
                            out,
                            "<text x=\"{:.1}\" y=\"{y:.1}\" font-size=\"{:.1}\" fill=\"{}\" text-anchor=\"middle\">{}</text>",
                            rect.center().x,
                            text.font_size,
                            hex_color(text.foreground),
                            escape_xml(line)
                        );
                    }
                    let _ = writeln!(out, "</g>");
                }
                ElementKind::Arrow(arrow) => {
                    let Some((from, to)) = self.arrow_endpoints(element.id, arrow) else {
                        continue;
                    };
                    let color = hex_color(arrow.color);
                    let dash = if arrow.dashness { " stroke-dasharray=\"8 6\"" } else { "" };
                    let d = match arrow.path {
                        ArrowPath::Straight => {
                            format!("M{:.1},{:.1} L{:.1},{:.1}", from.x, from.y, to.x, to.y)
                        }
                        ArrowPath::Grid => format!(
                            "M{:.1},{:.1} L{:.1},{:.1} L{:.1},{:.1}",
                            from.x, from.y, from.x, to.y, to.x, to.y
                        ),
                        ArrowPath::Smooth => {
                            let bend = (to.y - from.y) * 0.5;
                            format!(
                                "M{:.1},{:.1} C{:.1},{:.1} {:.1},{:.1} {:.1},{:.1}",
                                from.x, from.y,
                                from.x, from.y + bend,
                                to.x, to.y - bend,
                                to.x, to.y
                            )
                        }
                    };
                    let _ = writeln!(
                        out,
                        "<path d=\"{d}\" fill=\"none\" stroke=\"{color}\" stroke-width=\"{:.1}\" stroke-opacity=\"{:.2}\"{dash} />",
                        arrow.stroke_width, arrow.opacity
                    );
                    // Arrowhead triangle at the anchor end.
                    let dir = (to - from).normalized();
                    let perp = egui::vec2(-dir.y, dir.x);
                    let len = constants::DEFAULT_ARROW_HEAD_SIZE * arrow.stroke_width;
                    let base = to - dir * len;
                    let l = base + perp * len * 0.5;
                    let r = base - perp * len * 0.5;
                    let _ = writeln!(
                        out,
                        "<polygon points=\"{:.1},{:.1} {:.1},{:.1} {:.1},{:.1}\" fill=\"{color}\" fill-opacity=\"{:.2}\" />",
                        to.x, to.y, l.x, l.y, r.x, r.y, arrow.opacity
                    );
                }
                ElementKind::Image(_) => {
                    let _ = writeln!(
                        out,
                        "<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" rx=\"4\" fill=\"#3c3c3c\" />",
                        rect.left(), rect.top(), rect.width(), rect.height()
                    );
                }
            }
        }

        let _ = writeln!(out, "</svg>");
        out
    }

    fn write_background(&self, out: &mut String, width: f32, height: f32) {
        match &self.canvas.background {
            CanvasBackground::Solid(color) => {
                let _ = writeln!(
                    out,
                    "<rect width=\"{width}\" height=\"{height}\" fill=\"{}\" />",
                    hex_color(*color)
                );
            }
            CanvasBackground::Gradient { kind, stops } => {
                let stop_tags: String = stops
                    .iter()
                    .enumerate()
                    .map(|(i, color)| {
                        let offset = if stops.len() > 1 {
                            i as f32 / (stops.len() - 1) as f32 * 100.0
                        } else {
                            0.0
                        };
                        format!(
                            "<stop offset=\"{offset:.0}%\" stop-color=\"{}\" />",
                            hex_color(*color)
                        )
                    })
                    .collect();
                match kind {
                    GradientKind::Linear(angle_deg) => {
                        // CSS angle to SVG endpoint vector: 0 points up.
                        let rad = angle_deg.to_radians();
                        let (dx, dy) = (rad.sin(), -rad.cos());
                        let (x1, y1) = (50.0 - dx * 50.0, 50.0 - dy * 50.0);
                        let (x2, y2) = (50.0 + dx * 50.0, 50.0 + dy * 50.0);
                        let _ = writeln!(
                            out,
                            "<defs><linearGradient id=\"bg\" x1=\"{x1:.0}%\" y1=\"{y1:.0}%\" x2=\"{x2:.0}%\" y2=\"{y2:.0}%\">{stop_tags}</linearGradient></defs>"
                        );
                    }
                    GradientKind::Radial => {
                        let _ = writeln!(
                            out,
                            "<defs><radialGradient id=\"bg\" cx=\"50%\" cy=\"50%\" r=\"70%\">{stop_tags}</radialGradient></defs>"
                        );
                    }
                }
                let _ = writeln!(out, "<rect width=\"{width}\" height=\"{height}\" fill=\"url(#bg)\" />");
            }
        }
    }
}

fn hex_color(color: egui::Color32) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r(), color.g(), color.b())
}

fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ElementDefaults, Range};

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a < b && c > 'd'"), "a &lt; b &amp;&amp; c &gt; &apos;d&apos;");
        assert_eq!(escape_xml("plain"), "plain");
    }

    #[test]
    fn test_svg_includes_gradient_background() {
        let mut app = CanvasApp::default();
        app.canvas.background = CanvasBackground::Gradient {
            kind: GradientKind::Linear(90.0),
            stops: vec![egui::Color32::RED, egui::Color32::BLUE],
        };
        let svg = app.build_svg();
        assert!(svg.contains("<linearGradient id=\"bg\""));
        assert!(svg.contains("fill=\"url(#bg)\""));
        assert!(svg.contains("stop-color=\"#ff0000\""));
    }

    #[test]
    fn test_svg_escapes_code_content() {
        let mut app = CanvasApp::default();
        app.scene.update_element(1, |e| {
            if let ElementKind::Editor(ed) = &mut e.kind {
                ed.source = "if (a < b) {}".to_string();
            }
        });
        let svg = app.build_svg();
        assert!(svg.contains("if (a &lt; b) {}"));
        assert!(!svg.contains("if (a < b)"));
    }

    #[test]
    fn test_svg_skips_invisible_elements() {
        let mut app = CanvasApp::default();
        let defaults = ElementDefaults::default();
        let id = app.scene.insert_text(&defaults, None, (100.0, 100.0));
        app.scene.update_element(id, |e| {
            e.visible = false;
            if let ElementKind::Text(t) = &mut e.kind {
                t.content = "hidden-marker".to_string();
            }
        });
        let svg = app.build_svg();
        assert!(!svg.contains("hidden-marker"));
    }

    #[test]
    fn test_svg_draws_arrow_with_head() {
        let mut app = CanvasApp::default();
        let defaults = ElementDefaults::default();
        app.scene.apply_selection_explanation(
            &defaults,
            1,
            Range::new(1, 1, 1, 4),
            "note",
            (700.0, 200.0),
        );
        let svg = app.build_svg();
        assert!(svg.contains("<path d=\"M"));
        assert!(svg.contains("<polygon points="));
    }

    #[test]
    fn test_solid_background() {
        let mut app = CanvasApp::default();
        app.canvas.background = CanvasBackground::Solid(egui::Color32::from_rgb(1, 2, 3));
        let svg = app.build_svg();
        assert!(svg.contains("fill=\"#010203\""));
    }
}
