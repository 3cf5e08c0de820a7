//! pianotui - a terminal virtual piano.
//!
//! This library provides the core functionality for the piano app: the
//! pitch/key model, the preloaded sample store, the per-note player with
//! fade-out, the input-routing controller, and the ratatui UI.

pub mod app;
pub mod audio;
pub mod keys;
pub mod note;
pub mod settings;
pub mod ui;

// Re-export commonly used types
pub use app::{App, LayoutRegions};
pub use audio::{NotePlayer, SampleStore};
pub use keys::{default_keys, key_for_char, Key, KEYBOARD_MAP};
pub use note::Note;
pub use settings::Settings;
