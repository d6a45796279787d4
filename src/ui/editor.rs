//! The interactive code editor embedded in editor elements.
//!
//! Wraps an egui `TextEdit` with syntax-highlighted layout, records
//! content changes for the explanation debounce, and extracts the current
//! text selection as a line/column range for selection explanations.

use eframe::egui;

use super::canvas::{EDITOR_PADDING, GUTTER_WIDTH};
use super::highlighters;
use super::state::CanvasApp;
use crate::constants;
use crate::types::{ElementId, ElementKind, Range};

impl CanvasApp {
    /// Widget id of the text edit inside an editor element.
    pub(super) fn editor_widget_id(id: ElementId) -> egui::Id {
        egui::Id::new(("editor_source", id))
    }

    /// Shows the editable code area of an editor element at its on-screen
    /// rect. Records content changes and selection movement for the
    /// explanation pipeline.
    pub(super) fn show_editor_widget(
        &mut self,
        ui: &mut egui::Ui,
        id: ElementId,
        screen_rect: egui::Rect,
    ) {
        let Some(element) = self.scene.by_id(id) else { return };
        let Some(editor) = element.as_editor() else { return };

        let language = editor.language.clone();
        let font_id = egui::FontId::monospace(editor.font_size);
        let gutter = if editor.line_numbers { GUTTER_WIDTH } else { 0.0 };
        let inner = egui::Rect::from_min_max(
            screen_rect.min + egui::vec2(EDITOR_PADDING + gutter, EDITOR_PADDING),
            screen_rect.max - egui::vec2(EDITOR_PADDING, EDITOR_PADDING),
        );

        let mut layouter = |ui: &egui::Ui, text: &dyn egui::TextBuffer, wrap_width: f32| {
            let mut job = highlighters::highlight_source(text.as_str(), font_id.clone(), &language);
            job.wrap.max_width = wrap_width;
            ui.fonts_mut(|f| f.layout_job(job))
        };

        let mut source = editor.source.clone();
        let widget_id = Self::editor_widget_id(id);
        let response = ui.put(
            inner,
            egui::TextEdit::multiline(&mut source)
                .id(widget_id)
                .font(egui::FontId::monospace(editor.font_size))
                .frame(false)
                .lock_focus(true)
                .layouter(&mut layouter),
        );

        let now = ui.input(|i| i.time);
        if response.changed() {
            self.scene.update_element(id, |e| {
                if let ElementKind::Editor(ed) = &mut e.kind {
                    ed.source = source.clone();
                }
            });
            self.explain.last_change.insert(id, now);
            // Typing invalidates any selection candidate.
            self.explain.pending_selection.remove(&id);
            return;
        }

        self.track_selection(ui, id, &source);
    }

    /// Updates the per-editor selection candidate from the text edit's
    /// cursor state. The candidate only feeds the "Explain code" button;
    /// it never triggers a request on its own.
    fn track_selection(&mut self, ui: &egui::Ui, id: ElementId, source: &str) {
        let char_range = ui.memory(|mem| {
            mem.data
                .get_temp::<egui::text_edit::TextEditState>(Self::editor_widget_id(id))
                .and_then(|s| s.cursor.char_range())
                .map(|r| {
                    let a = r.primary.index;
                    let b = r.secondary.index;
                    (a.min(b), a.max(b))
                })
        });

        match char_range {
            Some((min, max)) if max - min >= constants::DEFAULT_EDITOR_MIN_SELECTION => {
                let range = char_range_to_range(source, min, max);
                let snippet = slice_chars(source, min, max);
                let stale = self
                    .explain
                    .pending_selection
                    .get(&id)
                    .is_none_or(|(r, _)| *r != range);
                if stale {
                    self.explain.pending_selection.insert(id, (range, snippet));
                }
            }
            _ => {
                self.explain.pending_selection.remove(&id);
            }
        }
    }
}

/// Converts a character index span into a 1-based line/column range with an
/// exclusive end column.
pub(super) fn char_range_to_range(source: &str, min: usize, max: usize) -> Range {
    let (start_line, start_column) = char_index_to_line_col(source, min);
    let (end_line, end_column) = char_index_to_line_col(source, max);
    Range::new(start_line, start_column, end_line, end_column)
}

fn char_index_to_line_col(source: &str, char_index: usize) -> (u32, u32) {
    let mut line = 1;
    let mut column = 1;
    for c in source.chars().take(char_index) {
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

/// Extracts the characters between two char indices.
pub(super) fn slice_chars(source: &str, min: usize, max: usize) -> String {
    source.chars().skip(min).take(max.saturating_sub(min)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_range_on_single_line() {
        let source = "const x = 1;";
        let range = char_range_to_range(source, 6, 7);
        assert_eq!(range, Range::new(1, 7, 1, 8));
        assert_eq!(slice_chars(source, 6, 7), "x");
    }

    #[test]
    fn test_char_range_across_lines() {
        let source = "let a = 1;\nlet b = 2;";
        // Selects "a = 1;\nlet b"
        let range = char_range_to_range(source, 4, 16);
        assert_eq!(range.start_line, 1);
        assert_eq!(range.start_column, 5);
        assert_eq!(range.end_line, 2);
        assert_eq!(range.end_column, 6);
        assert_eq!(slice_chars(source, 4, 16), "a = 1;\nlet b");
    }

    #[test]
    fn test_char_range_handles_multibyte_chars() {
        let source = "é = 1";
        assert_eq!(slice_chars(source, 0, 1), "é");
        let range = char_range_to_range(source, 0, 1);
        assert_eq!(range, Range::new(1, 1, 1, 2));
    }

    #[test]
    fn test_index_past_end_clamps() {
        let source = "ab";
        let range = char_range_to_range(source, 0, 99);
        assert_eq!(range.end_line, 1);
        assert_eq!(range.end_column, 3);
    }
}
