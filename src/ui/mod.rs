//! User interface components and rendering logic for the explanation canvas.
//!
//! This module contains all the UI-related code including the main
//! application struct, the toolbar, the element properties sidebar, the
//! canvas area, modal dialogs, and the debounced explanation pipeline.
//!
//! # Module Organization
//!
//! - `state` - Application state structures and the main CanvasApp
//! - `canvas` - Element hit-testing, gestures, and arrow geometry
//! - `rendering` - Drawing the frame background and elements
//! - `editor` - The embedded code editor widget and selection tracking
//! - `highlighters` - Syntax highlighting for editor content
//! - `export` - SVG building and PNG export

mod canvas;
mod editor;
mod export;
mod highlighters;
mod rendering;
mod state;


pub use state::CanvasApp;

use eframe::egui;

use self::state::{ExplainOutcome, ExportResult, OpenModal};
use crate::constants;
use crate::explain::{ExplainError, ExplainMode, ExplainRequest};
use crate::settings;
use crate::types::{
    AnchorAt, ArrowPath, CanvasBackground, ElementId, ElementKind, ElementType, Range,
};

impl eframe::App for CanvasApp {
    /// Persists preferences and credentials between restarts. Scene content
    /// is session-local and deliberately not stored.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        settings::store_settings(storage, &self.settings);
        settings::store_user(storage, self.user.as_ref());
        if self.has_seen_onboarding {
            settings::set_has_seen_onboarding(storage);
        }
    }

    /// Main update function called by egui for each frame.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The egui context
    /// * `frame` - The eframe frame
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(egui::Visuals::dark());

        self.process_explain_outcomes(ctx);
        self.process_export_results(ctx);
        self.dispatch_due_explanations(ctx);
        self.handle_delete_key(ctx);

        egui::TopBottomPanel::top("top_toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui, ctx);
        });

        egui::SidePanel::right("properties_panel")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| {
                self.draw_sidebar(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_canvas(ui);
        });

        self.draw_modals(ctx);
        self.draw_flash(ctx);

        // Keep frames coming while debounce timers or requests are pending.
        if self.explain.in_flight > 0
            || !self.explain.last_change.is_empty()
            || self.flash.is_some()
        {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}

impl CanvasApp {
    /// Creates the app, restoring persisted preferences when available.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let mut app = Self::default();
        if let Some(storage) = cc.storage {
            app.settings = settings::load_settings(storage);
            app.user = settings::load_user(storage);
            app.has_seen_onboarding = settings::has_seen_onboarding(storage);
        }
        if !app.has_seen_onboarding {
            app.modal = OpenModal::Onboarding;
        }
        app
    }

    /// Deletes the selected element on Delete or Backspace. The engine
    /// refuses ids without delete authorization, in which case the
    /// selection stays.
    fn handle_delete_key(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let pressed = ctx.input(|i| {
            i.key_pressed(egui::Key::Delete) || i.key_pressed(egui::Key::Backspace)
        });
        if !pressed {
            return;
        }
        if let Some(selected) = self.interaction.selected {
            if self.scene.delete_element(selected) {
                self.interaction.clear();
            }
        }
    }

    /// Renders the toolbar with element insertion, export, and account
    /// controls.
    ///
    /// # Arguments
    ///
    /// * `ui` - The egui UI context
    /// * `ctx` - The egui context, for async spawns
    fn draw_toolbar(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.horizontal(|ui| {
            if ui.button("Add code snippet").clicked() {
                let center = self.canvas.center();
                let (editor_id, _) = self.scene.insert_editor(&self.defaults.clone(), true, center);
                self.interaction.selected = Some(editor_id);
            }
            if ui.button("Add text").clicked() {
                let center = self.canvas.center();
                let id = self.scene.insert_text(&self.defaults.clone(), None, center);
                self.interaction.selected = Some(id);
            }

            ui.separator();

            ui.add_enabled_ui(!self.export.in_progress, |ui| {
                if ui.button("Export PNG").clicked() {
                    self.export_png(ctx);
                }
            });

            if self.explain.in_flight > 0 {
                ui.spinner();
                ui.label("Explaining…");
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                match &self.user {
                    Some(user) => {
                        let email = user.email.clone();
                        if ui.button("Log out").clicked() {
                            self.user = None;
                        }
                        ui.label(email);
                    }
                    None => {
                        if ui.button("Log in").clicked() {
                            self.modal = OpenModal::Login;
                        }
                    }
                }
                if ui.button("Settings").clicked() {
                    self.modal = OpenModal::Settings;
                }
            });
        });
    }

    /// Renders the properties sidebar for the current selection plus the
    /// canvas settings section.
    fn draw_sidebar(&mut self, ui: &mut egui::Ui) {
        egui::ScrollArea::vertical()
            .auto_shrink([false; 2])
            .show(ui, |ui| {
                ui.heading("Properties");
                ui.separator();

                match self.interaction.selected {
                    Some(id) => self.draw_element_properties(ui, id),
                    None => {
                        ui.label("Click an element to edit its properties.");
                    }
                }

                ui.separator();
                ui.heading("Canvas");
                self.draw_canvas_settings(ui);
            });
    }

    fn draw_element_properties(&mut self, ui: &mut egui::Ui, id: ElementId) {
        let Some(element) = self.scene.by_id(id).cloned() else {
            ui.label("Element not found");
            return;
        };

        match element.kind.clone() {
            ElementKind::Editor(mut editor) => {
                ui.label("Type: Code snippet");
                ui.separator();

                let mut changed = false;
                ui.label("Language:");
                egui::ComboBox::from_id_salt("editor_language")
                    .selected_text(editor.language.clone())
                    .show_ui(ui, |ui| {
                        for lang in [
                            "javascript", "typescript", "python", "rust", "go", "java", "cpp",
                            "csharp", "ruby", "shell",
                        ] {
                            changed |= ui
                                .selectable_value(&mut editor.language, lang.to_string(), lang)
                                .changed();
                        }
                    });

                changed |= ui
                    .add(
                        egui::Slider::new(&mut editor.font_size, 8.0..=32.0).text("Font size"),
                    )
                    .changed();
                changed |= ui.checkbox(&mut editor.line_numbers, "Line numbers").changed();

                if changed {
                    self.scene.update_element(id, |e| {
                        e.kind = ElementKind::Editor(editor.clone());
                    });
                }
            }
            ElementKind::Text(mut text) => {
                ui.label("Type: Text");
                ui.separator();

                let mut changed = false;
                ui.label("Content:");
                changed |= ui.text_edit_multiline(&mut text.content).changed();
                changed |= ui
                    .add(
                        egui::Slider::new(
                            &mut text.font_size,
                            constants::DEFAULT_TEXT_MIN_SIZE..=constants::DEFAULT_TEXT_MAX_SIZE,
                        )
                        .text("Font size"),
                    )
                    .changed();
                ui.horizontal(|ui| {
                    ui.label("Text color:");
                    changed |= ui.color_edit_button_srgba(&mut text.foreground).changed();
                });
                ui.horizontal(|ui| {
                    ui.label("Background:");
                    changed |= ui.color_edit_button_srgba(&mut text.background).changed();
                });
                changed |= ui
                    .add(egui::Slider::new(&mut text.rotate, -180.0..=180.0).text("Rotation"))
                    .changed();
                changed |= ui.checkbox(&mut text.rounded, "Rounded corners").changed();

                if changed {
                    self.scene.update_element(id, |e| {
                        e.kind = ElementKind::Text(text.clone());
                    });
                }
            }
            ElementKind::Arrow(mut arrow) => {
                ui.label("Type: Arrow");
                ui.separator();

                let mut changed = false;
                ui.horizontal(|ui| {
                    ui.label("Color:");
                    changed |= ui.color_edit_button_srgba(&mut arrow.color).changed();
                });
                changed |= ui
                    .add(
                        egui::Slider::new(
                            &mut arrow.stroke_width,
                            constants::DEFAULT_ARROW_MIN_STROKE_WIDTH
                                ..=constants::DEFAULT_ARROW_MAX_STROKE_WIDTH,
                        )
                        .text("Stroke width"),
                    )
                    .changed();
                changed |= ui
                    .add(egui::Slider::new(&mut arrow.opacity, 0.0..=1.0).text("Opacity"))
                    .changed();
                changed |= ui.checkbox(&mut arrow.dashness, "Dashed").changed();

                ui.label("Path:");
                egui::ComboBox::from_id_salt("arrow_path")
                    .selected_text(match arrow.path {
                        ArrowPath::Smooth => "Smooth",
                        ArrowPath::Grid => "Grid",
                        ArrowPath::Straight => "Straight",
                    })
                    .show_ui(ui, |ui| {
                        changed |= ui
                            .selectable_value(&mut arrow.path, ArrowPath::Smooth, "Smooth")
                            .changed();
                        changed |= ui
                            .selectable_value(&mut arrow.path, ArrowPath::Grid, "Grid")
                            .changed();
                        changed |= ui
                            .selectable_value(&mut arrow.path, ArrowPath::Straight, "Straight")
                            .changed();
                    });

                ui.label("Anchor at:");
                egui::ComboBox::from_id_salt("arrow_anchor")
                    .selected_text(match arrow.anchor_at {
                        AnchorAt::Start => "Selection start",
                        AnchorAt::End => "Selection end",
                    })
                    .show_ui(ui, |ui| {
                        changed |= ui
                            .selectable_value(&mut arrow.anchor_at, AnchorAt::Start, "Selection start")
                            .changed();
                        changed |= ui
                            .selectable_value(&mut arrow.anchor_at, AnchorAt::End, "Selection end")
                            .changed();
                    });

                if changed {
                    self.scene.update_element(id, |e| {
                        e.kind = ElementKind::Arrow(arrow.clone());
                    });
                }
            }
            ElementKind::Image(_) => {
                ui.label("Type: Image");
            }
        }

        if element.deletable {
            ui.separator();
            if ui.button("Delete element").clicked() && self.scene.delete_element(id) {
                self.interaction.clear();
            }
        }
    }

    fn draw_canvas_settings(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Size:");
            ui.add(
                egui::DragValue::new(&mut self.canvas.width)
                    .range(200.0..=4000.0)
                    .suffix(" px"),
            );
            ui.label("×");
            ui.add(
                egui::DragValue::new(&mut self.canvas.height)
                    .range(200.0..=4000.0)
                    .suffix(" px"),
            );
        });

        ui.label("Background:");
        ui.horizontal_wrapped(|ui| {
            for (i, preset) in CanvasBackground::presets().into_iter().enumerate() {
                let color = match &preset {
                    CanvasBackground::Gradient { stops, .. } => stops[0],
                    CanvasBackground::Solid(c) => *c,
                };
                let size = egui::Vec2::splat(22.0);
                let (rect, response) =
                    ui.allocate_exact_size(size, egui::Sense::click());
                ui.painter().rect_filled(rect, 4.0, color);
                if response.clicked() {
                    self.canvas.background = preset;
                }
                response.on_hover_text(format!("Preset {}", i + 1));
            }
        });
        if ui.button("Random background").clicked() {
            self.canvas.background = CanvasBackground::random_preset();
        }
    }

    /// Renders the canvas frame and its elements, then layers the
    /// interactive editor widgets on top.
    pub fn draw_canvas(&mut self, ui: &mut egui::Ui) {
        let available = ui.available_rect_before_wrap();
        let response = ui.allocate_rect(available, egui::Sense::click_and_drag());
        let frame = self.frame_rect(available);

        let painter = ui.painter().with_clip_rect(available);
        self.render_canvas(&painter, frame);
        self.handle_element_gestures(ui, &response, frame);

        let editor_ids: Vec<ElementId> = self
            .scene
            .by_kind(ElementType::Editor)
            .filter(|e| e.visible)
            .map(|e| e.id)
            .collect();
        for id in editor_ids {
            if let Some(rect) = self
                .scene
                .by_id(id)
                .map(|e| self.element_rect(e).translate(frame.min.to_vec2()))
            {
                self.show_editor_widget(ui, id, rect);
            }
        }

        self.draw_explain_buttons(ui, frame);
    }

    /// Offers an "Explain code" button above each editor's current text
    /// selection. Selection explanations fire only from this button,
    /// never from the selection sitting still.
    fn draw_explain_buttons(&mut self, ui: &mut egui::Ui, frame: egui::Rect) {
        let candidates: Vec<(ElementId, Range)> = self
            .explain
            .pending_selection
            .iter()
            .map(|(id, (range, _))| (*id, *range))
            .collect();
        for (editor_id, range) in candidates {
            let Some(anchor) =
                self.range_anchor_pos(editor_id, range.start_line, range.start_column)
            else {
                continue;
            };
            let rect = egui::Rect::from_center_size(
                frame.min + anchor.to_vec2() + egui::vec2(0.0, -30.0),
                egui::vec2(110.0, 24.0),
            );
            if ui.put(rect, egui::Button::new("Explain code")).clicked() {
                let ctx = ui.ctx().clone();
                self.request_selection_explanation(&ctx, editor_id);
            }
        }
    }

    /// Fires the selection explanation for an editor's current selection
    /// candidate. No-op when the candidate is gone or its snippet blank.
    fn request_selection_explanation(&mut self, ctx: &egui::Context, editor_id: ElementId) {
        let Some((range, snippet)) = self.explain.pending_selection.remove(&editor_id) else {
            return;
        };
        if snippet.trim().is_empty() {
            return;
        }
        self.spawn_explanation(ctx, editor_id, Some((range, snippet)));
    }

    /// Moves quiet editors into full-explanation requests once their
    /// debounce window has elapsed.
    fn dispatch_due_explanations(&mut self, ctx: &egui::Context) {
        let now = ctx.input(|i| i.time);
        let timeout = constants::DEFAULT_EDITOR_LAST_CHANGE_TIMEOUT;

        let due: Vec<ElementId> = self
            .explain
            .last_change
            .iter()
            .filter(|(_, t)| now - **t >= timeout)
            .map(|(id, _)| *id)
            .collect();
        for editor_id in due {
            self.explain.last_change.remove(&editor_id);
            let source_empty = self
                .scene
                .by_id(editor_id)
                .and_then(|e| e.as_editor())
                .is_none_or(|e| e.source.trim().is_empty());
            if !source_empty {
                self.spawn_explanation(ctx, editor_id, None);
            }
        }
    }

    /// Fires one explanation request on the async runtime. The outcome
    /// arrives over the explain channel; a newer answer for the same
    /// editor simply overwrites an older one on arrival.
    fn spawn_explanation(
        &mut self,
        ctx: &egui::Context,
        editor_id: ElementId,
        selection: Option<(Range, String)>,
    ) {
        let Some(editor) = self.scene.by_id(editor_id).and_then(|e| e.as_editor()).cloned()
        else {
            return;
        };

        let request = ExplainRequest {
            language: editor.language,
            mode: if selection.is_some() {
                ExplainMode::Selection
            } else {
                ExplainMode::Full
            },
            source: editor.source,
            explanation_level: self.settings.level.clone(),
            locale: self.settings.locale.clone(),
            followup_questions: selection.is_some(),
            visitor_id: None,
            selection: selection.as_ref().map(|(_, snippet)| snippet.clone()),
        };

        let client = self.explain.client.clone();
        let user = self.user.clone();
        let sender = self.explain.outcome_sender.clone();
        let repaint_ctx = ctx.clone();
        self.explain.in_flight += 1;

        tokio::spawn(async move {
            let result = client.explain(&request, user.as_ref()).await.map(|r| r.answer);
            let outcome = match selection {
                None => ExplainOutcome::Full { editor_id, result },
                Some((range, _)) => ExplainOutcome::Selection {
                    editor_id,
                    range,
                    result,
                },
            };
            let _ = sender.send(outcome);
            repaint_ctx.request_repaint();
        });
    }

    /// Drains finished explanation requests and applies them to the scene.
    fn process_explain_outcomes(&mut self, ctx: &egui::Context) {
        while let Ok(outcome) = self.explain.outcome_receiver.try_recv() {
            self.explain.in_flight = self.explain.in_flight.saturating_sub(1);
            match outcome {
                ExplainOutcome::Full { editor_id, result } => match result {
                    Ok(answer) => {
                        if self.scene.apply_full_explanation(editor_id, &answer).is_none() {
                            log::debug!(
                                "Dropping explanation for editor {editor_id} without a main text"
                            );
                        }
                    }
                    Err(err) => self.handle_explain_error(ctx, err),
                },
                ExplainOutcome::Selection {
                    editor_id,
                    range,
                    result,
                } => match result {
                    Ok(answer) => {
                        let position = self.selection_callout_position(editor_id, range);
                        self.scene.apply_selection_explanation(
                            &self.defaults.clone(),
                            editor_id,
                            range,
                            &answer,
                            position,
                        );
                    }
                    Err(err) => self.handle_explain_error(ctx, err),
                },
            }
        }
    }

    /// Placement for a new selection callout: beside the editor, level
    /// with the selected line, clamped into the frame.
    fn selection_callout_position(&self, editor_id: ElementId, range: Range) -> (f32, f32) {
        let Some(editor) = self.scene.by_id(editor_id) else {
            return self.canvas.center();
        };
        let rect = self.element_rect(editor);
        let line_height = self.defaults.editor.font_size * self.defaults.editor.line_height;
        let x = (rect.right() + 190.0).min(self.canvas.width - 170.0);
        let y = (rect.top() + range.start_line as f32 * line_height)
            .clamp(70.0, self.canvas.height - 70.0);
        (x, y)
    }

    fn handle_explain_error(&mut self, ctx: &egui::Context, err: ExplainError) {
        match err {
            ExplainError::Auth => {
                self.modal = OpenModal::Login;
            }
            ExplainError::RateLimit => {
                let message = err.to_string();
                self.flash(ctx, message);
            }
            other => {
                log::error!("{other}");
                self.flash(ctx, "Could not get an explanation. Please try again.");
            }
        }
    }

    /// Drains finished export operations into flash messages.
    fn process_export_results(&mut self, ctx: &egui::Context) {
        while let Ok(result) = self.export.result_receiver.try_recv() {
            self.export.in_progress = false;
            match result {
                ExportResult::Completed(path) => self.flash(ctx, format!("Exported to {path}")),
                ExportResult::Failed(message) => self.flash(ctx, message),
            }
        }
    }

    fn draw_modals(&mut self, ctx: &egui::Context) {
        match self.modal {
            OpenModal::None => {}
            OpenModal::Onboarding => self.draw_onboarding_modal(ctx),
            OpenModal::Login => self.draw_login_modal(ctx),
            OpenModal::Settings => self.draw_settings_modal(ctx),
        }
    }

    fn draw_onboarding_modal(&mut self, ctx: &egui::Context) {
        egui::Window::new("Welcome")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label("Build visual code walkthroughs in three steps:");
                ui.label("1. Write or paste code into a snippet.");
                ui.label("2. Wait a moment for the AI explanation to appear.");
                ui.label("3. Select part of the code to annotate just that part.");
                ui.add_space(8.0);
                if ui.button("Get started").clicked() {
                    self.has_seen_onboarding = true;
                    self.modal = OpenModal::None;
                }
            });
    }

    fn draw_login_modal(&mut self, ctx: &egui::Context) {
        egui::Window::new("Log in")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label("Log in to get more explanations.");
                ui.label("Email:");
                ui.text_edit_singleline(&mut self.login_form.email);
                ui.label("API key:");
                ui.add(egui::TextEdit::singleline(&mut self.login_form.key).password(true));
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    let filled = !self.login_form.email.trim().is_empty()
                        && !self.login_form.key.trim().is_empty();
                    ui.add_enabled_ui(filled, |ui| {
                        if ui.button("Log in").clicked() {
                            self.user = Some(crate::settings::StoredUser {
                                email: self.login_form.email.trim().to_string(),
                                key: self.login_form.key.trim().to_string(),
                            });
                            self.login_form = Default::default();
                            self.modal = OpenModal::None;
                        }
                    });
                    if ui.button("Cancel").clicked() {
                        self.modal = OpenModal::None;
                    }
                });
            });
    }

    fn draw_settings_modal(&mut self, ctx: &egui::Context) {
        egui::Window::new("Settings")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label("Explanation language:");
                egui::ComboBox::from_id_salt("settings_locale")
                    .selected_text(self.settings.locale.clone())
                    .show_ui(ui, |ui| {
                        for locale in ["en", "es", "fr", "de", "pt", "ja"] {
                            ui.selectable_value(
                                &mut self.settings.locale,
                                locale.to_string(),
                                locale,
                            );
                        }
                    });

                ui.label("Explanation level:");
                egui::ComboBox::from_id_salt("settings_level")
                    .selected_text(self.settings.level.clone())
                    .show_ui(ui, |ui| {
                        for level in ["basic", "advanced"] {
                            ui.selectable_value(
                                &mut self.settings.level,
                                level.to_string(),
                                level,
                            );
                        }
                    });

                ui.add_space(8.0);
                if ui.button("Close").clicked() {
                    self.modal = OpenModal::None;
                }
            });
    }

    /// Shows and expires the transient flash message.
    fn draw_flash(&mut self, ctx: &egui::Context) {
        let Some(flash) = &self.flash else { return };
        if ctx.input(|i| i.time) >= flash.expires_at {
            self.flash = None;
            return;
        }
        let text = flash.text.clone();
        egui::Area::new(egui::Id::new("flash_message"))
            .anchor(egui::Align2::CENTER_TOP, egui::vec2(0.0, 40.0))
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.label(text);
                });
            });
    }
}
