//! Shared application-wide constants.
//! Centralizes default element styling and behavior values used across the
//! scene, sidebar, and rendering code.

use egui::Color32;

/// Base URL of the explanation API.
pub const API_ENDPOINT: &str = "https://api.explain.dev";

// Arrow defaults
/// Default arrow stroke color.
pub const DEFAULT_ARROW_COLOR: Color32 = Color32::WHITE;
/// Default arrow opacity (0.0 - 1.0).
pub const DEFAULT_ARROW_OPACITY: f32 = 0.8;
/// Default arrow stroke width in canvas units.
pub const DEFAULT_ARROW_STROKE_WIDTH: f32 = 4.0;
/// Minimum stroke width the sidebar allows.
pub const DEFAULT_ARROW_MIN_STROKE_WIDTH: f32 = 1.0;
/// Maximum stroke width the sidebar allows.
pub const DEFAULT_ARROW_MAX_STROKE_WIDTH: f32 = 10.0;
/// Size of the arrow head in multiples of the stroke width.
pub const DEFAULT_ARROW_HEAD_SIZE: f32 = 4.0;

// Text defaults
/// Default text callout foreground color.
pub const DEFAULT_TEXT_FOREGROUND: Color32 = Color32::BLACK;
/// Default text callout background color (fully transparent).
pub const DEFAULT_TEXT_BACKGROUND: Color32 = Color32::TRANSPARENT;
/// Default font size for selection-explanation callouts.
pub const DEFAULT_TEXT_FONT_SIZE: f32 = 17.0;
/// Font size for an editor's main (full-explanation) callout.
pub const DEFAULT_TEXT_LARGE_FONT_SIZE: f32 = 27.0;
/// Smallest font size the sidebar allows.
pub const DEFAULT_TEXT_MIN_SIZE: f32 = 8.0;
/// Largest font size the sidebar allows.
pub const DEFAULT_TEXT_MAX_SIZE: f32 = 72.0;
/// Placeholder content for the main text element seeded on a new canvas.
pub const DEFAULT_TEXT_PLACEHOLDER: &str = "\u{2728}How it works\u{2728}\n\n\u{1f469}\u{200d}\u{1f4bb} Write some code below to get an explanation using AI\n\n\u{1f446} Select portions of code within your snippet for more details\n\n\u{1f9d1}\u{200d}\u{1f3a8} Drag & customize the elements in your tutorial!";

// Editor defaults
/// Default editor font size.
pub const DEFAULT_EDITOR_FONT_SIZE: f32 = 15.0;
/// Default editor line height multiplier.
pub const DEFAULT_EDITOR_LINE_HEIGHT: f32 = 1.5;
/// Whether editors show line numbers by default.
pub const DEFAULT_EDITOR_LINE_NUMBERS: bool = false;
/// Default language tag for new editor elements.
pub const DEFAULT_EDITOR_LANGUAGE: &str = "javascript";
/// Number of spaces inserted per tab stop.
pub const DEFAULT_EDITOR_TAB_SIZE: usize = 2;
/// Minimum number of selected characters required to request a
/// selection explanation.
pub const DEFAULT_EDITOR_MIN_SELECTION: usize = 1;
/// Seconds an editor must stay unchanged before a full explanation is
/// requested for its content.
pub const DEFAULT_EDITOR_LAST_CHANGE_TIMEOUT: f64 = 1.0;
/// Placeholder shown in an empty editor element.
pub const DEFAULT_EDITOR_PLACEHOLDER: &str = "// Enter your code here";

// Canvas defaults
/// Default canvas frame height in pixels.
pub const DEFAULT_CANVAS_HEIGHT: f32 = 750.0;
/// Default canvas frame width in pixels.
pub const DEFAULT_CANVAS_WIDTH: f32 = 1000.0;

/// Export pixel ratio applied when rasterizing the frame to PNG.
pub const DEFAULT_EXPORT_PIXEL_RATIO: f32 = 2.0;

/// Seconds a flash message stays on screen.
pub const FLASH_MESSAGE_SECONDS: f64 = 4.0;

/// Drag threshold in pixels for distinguishing click vs drag on an element.
pub const CLICK_THRESHOLD: f32 = 4.0;
/// Size in pixels of the corner resize handle on editor and text elements.
pub const RESIZE_HANDLE_SIZE: f32 = 12.0;
