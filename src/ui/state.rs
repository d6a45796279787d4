//! Application state management structures.
//!
//! This module contains the state structures that track the application's
//! current UI state: element selection and gestures, in-flight explanation
//! requests, export operations, modals, and flash messages.

use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};

use eframe::egui;

use crate::explain::{ExplainClient, ExplainError};
use crate::scene::Scene;
use crate::settings::{LocalSettings, StoredUser};
use crate::types::{CanvasSettings, ElementDefaults, ElementId, Range};

/// What the pointer is currently doing to an element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gesture {
    /// Pointer went down on the element; becomes a drag past the click
    /// threshold, otherwise a click-select on release.
    Pending { start: egui::Pos2 },
    /// Element is being moved.
    Dragging { grab_offset: egui::Vec2 },
    /// Element is being resized from its corner handle.
    Resizing { original_size: (f32, f32) },
}

/// State related to user interactions with elements on the canvas.
///
/// Tracks selection, the active pointer gesture, and the hover-highlight
/// link between callouts and their editor ranges.
#[derive(Default)]
pub struct InteractionState {
    /// Currently selected element, if any.
    pub selected: Option<ElementId>,
    /// Element under an active pointer gesture, with the gesture phase.
    pub gesture: Option<(ElementId, Gesture)>,
    /// Editor range to decorate because a linked callout or arrow is
    /// hovered. Recomputed every frame from hover state.
    pub hover_link: Option<(ElementId, Range)>,
}

impl InteractionState {
    /// Clears selection and any gesture in progress.
    pub fn clear(&mut self) {
        self.selected = None;
        self.gesture = None;
    }
}

/// Outcome of an async explanation request, sent back to the UI thread.
#[derive(Debug)]
pub enum ExplainOutcome {
    /// A full-content explanation finished.
    Full {
        editor_id: ElementId,
        result: Result<String, ExplainError>,
    },
    /// A selection explanation finished.
    Selection {
        editor_id: ElementId,
        range: Range,
        result: Result<String, ExplainError>,
    },
}

/// State for the debounced explanation pipeline.
///
/// Editors report content changes here; once an editor has been quiet for
/// the debounce window a full explanation is requested. Results come back
/// over the channel and are drained once per frame.
pub struct ExplainState {
    /// HTTP client shared by all requests.
    pub client: ExplainClient,
    /// Per-editor time of last content change, in `egui` time seconds.
    pub last_change: HashMap<ElementId, f64>,
    /// Per-editor selection candidate: the selected range and snippet.
    /// Offered to the user as an "Explain code" button; a request fires
    /// only when that button is clicked.
    pub pending_selection: HashMap<ElementId, (Range, String)>,
    /// Number of requests currently in flight, drives the loading indicator.
    pub in_flight: usize,
    /// Sender half handed to spawned request tasks.
    pub outcome_sender: Sender<ExplainOutcome>,
    /// Receiver half drained once per frame by the UI thread.
    pub outcome_receiver: Receiver<ExplainOutcome>,
}

impl Default for ExplainState {
    fn default() -> Self {
        let (sender, receiver) = channel();
        Self {
            client: ExplainClient::default(),
            last_change: HashMap::new(),
            pending_selection: HashMap::new(),
            in_flight: 0,
            outcome_sender: sender,
            outcome_receiver: receiver,
        }
    }
}

/// Messages sent from async export operations back to the main app.
#[derive(Debug)]
pub enum ExportResult {
    /// Export completed successfully with the given path.
    Completed(String),
    /// Export was cancelled or failed with an error message.
    Failed(String),
}

/// State for the async PNG export pipeline.
pub struct ExportState {
    /// Whether an export is currently running.
    pub in_progress: bool,
    /// Sender half handed to the spawned export task.
    pub result_sender: Sender<ExportResult>,
    /// Receiver half drained once per frame by the UI thread.
    pub result_receiver: Receiver<ExportResult>,
}

impl Default for ExportState {
    fn default() -> Self {
        let (sender, receiver) = channel();
        Self {
            in_progress: false,
            result_sender: sender,
            result_receiver: receiver,
        }
    }
}

/// A transient notification shown near the top of the window.
#[derive(Debug, Clone)]
pub struct FlashMessage {
    /// The message shown to the user.
    pub text: String,
    /// `egui` time at which the message disappears.
    pub expires_at: f64,
}

/// Which modal dialog is open, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenModal {
    #[default]
    None,
    /// First-run walkthrough.
    Onboarding,
    /// Credentials prompt, shown on demand or after a 401.
    Login,
    /// Locale and explanation-level preferences.
    Settings,
}

/// Temporary form fields for the login modal.
#[derive(Default)]
pub struct LoginForm {
    /// Account email field.
    pub email: String,
    /// API key field.
    pub key: String,
}

/// The main application structure containing UI state and the scene data.
///
/// This struct implements the `eframe::App` trait and handles all user
/// interface rendering and interaction logic.
pub struct CanvasApp {
    /// The scene being edited.
    pub scene: Scene,
    /// Styling defaults applied to newly created elements.
    pub defaults: ElementDefaults,
    /// Canvas frame size and background.
    pub canvas: CanvasSettings,
    /// User interaction state.
    pub interaction: InteractionState,
    /// Debounced explanation pipeline state.
    pub explain: ExplainState,
    /// Async export pipeline state.
    pub export: ExportState,
    /// Persisted explanation preferences.
    pub settings: LocalSettings,
    /// Credentials, when the user has logged in.
    pub user: Option<StoredUser>,
    /// Whether the onboarding walkthrough was already shown.
    pub has_seen_onboarding: bool,
    /// Currently open modal dialog.
    pub modal: OpenModal,
    /// Login modal form fields.
    pub login_form: LoginForm,
    /// Transient notification, if one is showing.
    pub flash: Option<FlashMessage>,
}

impl Default for CanvasApp {
    fn default() -> Self {
        let defaults = ElementDefaults::default();
        let canvas = CanvasSettings::default();
        let scene = Scene::seeded(&defaults, canvas.center());
        Self {
            scene,
            defaults,
            canvas,
            interaction: InteractionState::default(),
            explain: ExplainState::default(),
            export: ExportState::default(),
            settings: LocalSettings::default(),
            user: None,
            has_seen_onboarding: false,
            modal: OpenModal::None,
            login_form: LoginForm::default(),
            flash: None,
        }
    }
}

impl CanvasApp {
    /// Shows a flash message for the standard duration.
    pub fn flash(&mut self, ctx: &egui::Context, text: impl Into<String>) {
        self.flash = Some(FlashMessage {
            text: text.into(),
            expires_at: ctx.input(|i| i.time) + crate::constants::FLASH_MESSAGE_SECONDS,
        });
    }
}
