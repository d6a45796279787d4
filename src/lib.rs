//! # Explain Canvas
//!
//! A visual editor for building code-explanation tutorials. Code snippets
//! live on a free-form canvas next to AI-generated text callouts; selecting
//! part of a snippet produces an annotation connected to the selection by
//! an arrow.
//!
//! ## Features
//! - Editable code snippet blocks with syntax highlighting
//! - Debounced full-snippet explanations from the explanation service
//! - Selection explanations rendered as text + arrow pairs
//! - Element dragging, resizing, and per-element styling
//! - Gradient canvas backgrounds and PNG export

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod explain;
pub mod scene;
pub mod settings;
pub mod types;
mod ui;

pub use scene::Scene;
pub use types::*;
use ui::CanvasApp;

/// Runs the canvas application.
///
/// Starts a tokio runtime for explanation requests and file dialogs, then
/// hands control to the egui event loop.
///
/// # Returns
///
/// Returns `Ok(())` when the window closes normally, or an `eframe::Error`
/// if initialization fails.
///
/// # Example
///
/// ```no_run
/// fn main() -> Result<(), eframe::Error> {
///     explain_canvas::run_app()
/// }
/// ```
pub fn run_app() -> Result<(), eframe::Error> {
    let runtime = tokio::runtime::Runtime::new().expect("failed to start async runtime");
    let _guard = runtime.enter();

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_title("Explain Canvas"),
        ..Default::default()
    };
    eframe::run_native(
        "Explain Canvas",
        options,
        Box::new(|cc| Ok(Box::new(CanvasApp::new(cc)))),
    )
}
