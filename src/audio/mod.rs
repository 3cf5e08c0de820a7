//! Audio playback: the preloaded sample store and the per-note player.

pub mod player;
pub mod store;

pub use player::NotePlayer;
pub use store::{SampleError, SampleStore};
