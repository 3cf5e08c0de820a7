//! Application state and input routing.
//!
//! [`App`] is the controller that owns all interaction state: the key list,
//! the note player, the persisted settings, the visually-pressed set, and
//! the pointer state machine. Mouse press/drag/release and keyboard
//! press/repeat/release all converge on [`App::press_key`] /
//! [`App::release_key`], which keep the visual state and the audio state in
//! step (visual state is updated even when a note has no sample, so the key
//! stays interactive).

use crate::audio::NotePlayer;
use crate::keys::{key_for_char, Key};
use crate::settings::Settings;
use ratatui::layout::Rect;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// How long the piano area stays blanked after a terminal resize before it
/// is redrawn. Works around terminals that repaint stale cells mid-resize.
pub const RESIZE_REDRAW_DELAY: Duration = Duration::from_millis(110);

/// How long status messages stay on screen.
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// Screen region of one piano key, recomputed each frame for mouse hit
/// testing.
#[derive(Debug, Clone, Copy)]
pub struct KeyRegion {
    /// Index into the app's key list.
    pub key_index: usize,
    /// The key's on-screen rectangle.
    pub rect: Rect,
    /// Whether this is a black key (drawn on top of the white keys).
    pub is_black: bool,
}

/// Layout regions for mouse hit testing (updated each frame).
#[derive(Debug, Clone, Default)]
pub struct LayoutRegions {
    /// The header bar at the top.
    pub header: Rect,
    /// The clickable note-labels checkbox inside the header.
    pub checkbox: Rect,
    /// The piano area.
    pub piano: Rect,
    /// Per-key screen regions, black keys included.
    pub key_regions: Vec<KeyRegion>,
}

impl LayoutRegions {
    fn contains(rect: Rect, x: u16, y: u16) -> bool {
        x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
    }

    /// Resolves the key under the given screen coordinates.
    ///
    /// Black keys are checked first since they overlap the top portion of
    /// their white neighbors.
    pub fn key_at(&self, x: u16, y: u16) -> Option<usize> {
        self.key_regions
            .iter()
            .filter(|r| r.is_black)
            .chain(self.key_regions.iter().filter(|r| !r.is_black))
            .find(|r| Self::contains(r.rect, x, y))
            .map(|r| r.key_index)
    }

    /// Whether the coordinates hit the note-labels checkbox.
    pub fn is_checkbox(&self, x: u16, y: u16) -> bool {
        Self::contains(self.checkbox, x, y)
    }
}

/// Main application state.
pub struct App {
    /// The piano keys, fixed at startup.
    keys: Vec<Key>,
    /// The per-note audio player.
    pub player: NotePlayer,
    /// Persisted user settings.
    pub settings: Settings,
    /// Where settings are saved on change.
    settings_path: PathBuf,
    /// Indices of visually-pressed keys.
    pressed: HashSet<usize>,
    /// Whether a mouse button (or touch) is currently held.
    pointer_held: bool,
    /// The key currently sounding under the pointer, if any.
    pointer_key: Option<usize>,
    /// Layout regions for mouse hit testing (updated each frame).
    pub layout: LayoutRegions,
    /// Status message to display.
    pub status_message: Option<(String, Instant)>,
    /// While set, the piano area is blanked (after a resize); cleared once
    /// the deadline passes.
    piano_hidden_until: Option<Instant>,
}

impl App {
    /// Creates the application controller.
    pub fn new(keys: Vec<Key>, player: NotePlayer, settings: Settings, settings_path: PathBuf) -> Self {
        Self {
            keys,
            player,
            settings,
            settings_path,
            pressed: HashSet::new(),
            pointer_held: false,
            pointer_key: None,
            layout: LayoutRegions::default(),
            status_message: None,
            piano_hidden_until: None,
        }
    }

    /// Returns the piano keys.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Whether a key is visually pressed.
    pub fn is_pressed(&self, index: usize) -> bool {
        self.pressed.contains(&index)
    }

    /// Stores the layout regions computed during rendering.
    pub fn update_layout(&mut self, layout: LayoutRegions) {
        self.layout = layout;
    }

    /// Per-frame update: advances fades, expires status messages, and ends
    /// the post-resize blanking once its deadline passes.
    pub fn update(&mut self) {
        self.player.tick();
        self.clear_expired_status();
        if let Some(deadline) = self.piano_hidden_until {
            if Instant::now() >= deadline {
                self.piano_hidden_until = None;
            }
        }
    }

    // ==================== Key press/release core ====================

    /// Presses a key: marks it visually active and starts its note.
    ///
    /// The visual state is set regardless of whether audio succeeds, so a
    /// key with a missing sample still responds to input.
    pub fn press_key(&mut self, index: usize) {
        let Some(key) = self.keys.get(index) else {
            return;
        };
        let note = key.note;
        self.pressed.insert(index);
        self.player.play(note);
    }

    /// Releases a key: clears its visual state and begins the note's fade.
    pub fn release_key(&mut self, index: usize) {
        let Some(key) = self.keys.get(index) else {
            return;
        };
        let note = key.note;
        self.pressed.remove(&index);
        self.player.release(note);
    }

    /// Releases every held key and every sounding note.
    pub fn release_all(&mut self) {
        self.pressed.clear();
        self.pointer_key = None;
        self.pointer_held = false;
        self.player.release_all();
    }

    // ==================== Pointer state machine ====================
    // A single pointer (mouse button or touch) sounds at most one key at a
    // time. Dragging across keys releases the old key and plays the new
    // one; dragging off the keyboard releases without clearing the held
    // flag, so dragging back on plays again.

    /// Pointer pressed down on a key.
    pub fn pointer_press(&mut self, index: usize) {
        self.pointer_held = true;
        self.pointer_key = Some(index);
        self.press_key(index);
    }

    /// Pointer moved while held; `hit` is the key now under it, if any.
    pub fn pointer_move(&mut self, hit: Option<usize>) {
        if !self.pointer_held {
            return;
        }
        if hit == self.pointer_key {
            return;
        }
        if let Some(old) = self.pointer_key.take() {
            self.release_key(old);
        }
        if let Some(new) = hit {
            self.press_key(new);
            self.pointer_key = Some(new);
        }
    }

    /// Pointer lifted, wherever it is. Always clears the held flag, so a
    /// release outside the piano cannot leave a stuck key.
    pub fn pointer_lift(&mut self) {
        self.pointer_held = false;
        if let Some(index) = self.pointer_key.take() {
            self.release_key(index);
        }
    }

    // ==================== Mouse event handlers ====================

    /// Handles a left mouse press at screen coordinates.
    pub fn handle_mouse_down(&mut self, x: u16, y: u16) {
        // First interaction unlocks audio; the player makes this a one-shot
        self.player.warm_up();

        if self.layout.is_checkbox(x, y) {
            self.toggle_labels();
            return;
        }
        if let Some(index) = self.layout.key_at(x, y) {
            self.pointer_press(index);
        }
    }

    /// Handles mouse movement with the left button held.
    pub fn handle_mouse_drag(&mut self, x: u16, y: u16) {
        self.pointer_move(self.layout.key_at(x, y));
    }

    /// Handles the left button being released, anywhere on screen.
    pub fn handle_mouse_up(&mut self) {
        self.pointer_lift();
    }

    // ==================== Keyboard event handlers ====================

    /// Handles a character key press.
    ///
    /// `repeat` is true for auto-repeat events: those keep the key visually
    /// pressed without re-triggering playback.
    ///
    /// Returns true if the character was bound to a piano key.
    pub fn handle_note_key(&mut self, c: char, repeat: bool) -> bool {
        let Some(index) = key_for_char(&self.keys, c) else {
            return false;
        };
        if repeat {
            self.pressed.insert(index);
        } else {
            self.player.warm_up();
            self.press_key(index);
        }
        true
    }

    /// Handles a character key release.
    pub fn handle_note_key_release(&mut self, c: char) {
        if let Some(index) = key_for_char(&self.keys, c) {
            self.release_key(index);
        }
    }

    // ==================== Note-label visibility ====================

    /// Toggles note-label visibility, applies it, and persists it.
    ///
    /// Persistence failure is logged but never interrupts the session.
    pub fn toggle_labels(&mut self) {
        self.settings.show_notes = !self.settings.show_notes;
        if let Err(e) = self.settings.save(&self.settings_path) {
            tracing::error!("failed to save settings: {:#}", e);
        }
        let status = if self.settings.show_notes {
            "Note labels shown"
        } else {
            "Note labels hidden"
        };
        self.set_status(status);
    }

    // ==================== Resize handling ====================

    /// Blanks the piano briefly after a terminal resize; rendering resumes
    /// with the current label visibility once the delay passes.
    pub fn handle_resize(&mut self) {
        self.piano_hidden_until = Some(Instant::now() + RESIZE_REDRAW_DELAY);
    }

    /// Whether the piano area is currently blanked.
    pub fn piano_hidden(&self) -> bool {
        self.piano_hidden_until.is_some()
    }

    // ==================== Status messages ====================

    /// Sets a status message to display temporarily.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some((message.into(), Instant::now()));
    }

    /// Clears expired status messages.
    fn clear_expired_status(&mut self) {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed() > STATUS_TIMEOUT {
                self.status_message = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::store::testing::store_with_notes;
    use crate::keys::default_keys;
    use crate::note::Note;
    use std::sync::atomic::{AtomicU32, Ordering};

    static DIR_COUNTER: AtomicU32 = AtomicU32::new(0);

    fn temp_settings_path() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "pianotui-app-{}-{}",
            std::process::id(),
            DIR_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join("settings.json")
    }

    /// App over a headless player whose store holds samples for the given
    /// note names.
    fn test_app(sample_names: &[&str]) -> App {
        let notes: Vec<Note> = sample_names.iter().map(|n| Note::parse(n).unwrap()).collect();
        let player = NotePlayer::new(None, store_with_notes(&notes));
        App::new(
            default_keys(),
            player,
            Settings::default(),
            temp_settings_path(),
        )
    }

    fn index_of(app: &App, name: &str) -> usize {
        let note = Note::parse(name).unwrap();
        app.keys().iter().position(|k| k.note == note).unwrap()
    }

    #[test]
    fn test_mouse_drag_across_keys() {
        let mut app = test_app(&["C4", "D4"]);
        let c4 = index_of(&app, "C4");
        let d4 = index_of(&app, "D4");
        let (c4_note, d4_note) = (app.keys()[c4].note, app.keys()[d4].note);

        app.pointer_press(c4);
        assert!(app.is_pressed(c4));
        assert!(app.player.is_active(c4_note));

        // Drag to the next key: C4 released, D4 played
        app.pointer_move(Some(d4));
        assert!(!app.is_pressed(c4));
        assert!(app.is_pressed(d4));
        assert!(app.player.is_fading(c4_note));
        assert!(app.player.is_active(d4_note));
        assert!(!app.player.is_fading(d4_note));

        // Exactly one note sounding at full volume
        let full: usize = [c4_note, d4_note]
            .iter()
            .filter(|&&n| app.player.is_active(n) && !app.player.is_fading(n))
            .count();
        assert_eq!(full, 1);
    }

    #[test]
    fn test_drag_off_and_back_onto_keys() {
        let mut app = test_app(&["C4"]);
        let c4 = index_of(&app, "C4");

        app.pointer_press(c4);
        // Leaving the keyboard while held releases the key
        app.pointer_move(None);
        assert!(!app.is_pressed(c4));

        // Re-entering while still held plays it again
        app.pointer_move(Some(c4));
        assert!(app.is_pressed(c4));

        app.pointer_lift();
        assert!(!app.is_pressed(c4));
    }

    #[test]
    fn test_pointer_move_without_press_is_ignored() {
        let mut app = test_app(&["C4"]);
        let c4 = index_of(&app, "C4");
        app.pointer_move(Some(c4));
        assert!(!app.is_pressed(c4));
        assert_eq!(app.player.active_count(), 0);
    }

    #[test]
    fn test_touch_sequence_start_move_lift() {
        let mut app = test_app(&["E4", "F4"]);
        let e4 = index_of(&app, "E4");
        let f4 = index_of(&app, "F4");
        let (e4_note, f4_note) = (app.keys()[e4].note, app.keys()[f4].note);

        app.pointer_press(e4);
        app.pointer_move(Some(f4));
        assert!(app.player.is_fading(e4_note));
        assert!(app.player.is_active(f4_note));

        app.pointer_lift();
        assert!(app.player.is_fading(f4_note));
        assert!(!app.is_pressed(e4));
        assert!(!app.is_pressed(f4));
    }

    #[test]
    fn test_keyboard_auto_repeat_triggers_once() {
        let mut app = test_app(&["C4"]);
        let c4 = index_of(&app, "C4");
        let c4_note = app.keys()[c4].note;

        assert!(app.handle_note_key('q', false));
        assert_eq!(app.player.active_count(), 1);

        // Auto-repeat keeps the visual state without re-triggering
        assert!(app.handle_note_key('q', true));
        assert!(app.handle_note_key('q', true));
        assert_eq!(app.player.active_count(), 1);
        assert!(app.is_pressed(c4));
        assert!(!app.player.is_fading(c4_note));

        app.handle_note_key_release('q');
        assert!(!app.is_pressed(c4));
        assert!(app.player.is_fading(c4_note));
    }

    #[test]
    fn test_keyboard_matching_is_case_insensitive() {
        let mut app = test_app(&["C4"]);
        assert!(app.handle_note_key('Q', false));
        assert_eq!(app.player.active_count(), 1);
        app.handle_note_key_release('Q');
        assert!(app.player.is_fading(Note::parse("C4").unwrap()));
    }

    #[test]
    fn test_unbound_char_is_not_handled() {
        let mut app = test_app(&[]);
        assert!(!app.handle_note_key('p', false));
    }

    #[test]
    fn test_key_without_sample_stays_interactive() {
        // Store is empty: no audio, but the key still responds visually
        let mut app = test_app(&[]);
        let c4 = index_of(&app, "C4");
        app.pointer_press(c4);
        assert!(app.is_pressed(c4));
        assert_eq!(app.player.active_count(), 0);
        app.pointer_lift();
        assert!(!app.is_pressed(c4));
    }

    #[test]
    fn test_toggle_labels_persists() {
        let mut app = test_app(&[]);
        let path = app.settings_path.clone();
        assert!(app.settings.show_notes);

        app.toggle_labels();
        assert!(!app.settings.show_notes);
        assert!(!Settings::load(&path).show_notes);

        app.toggle_labels();
        assert!(Settings::load(&path).show_notes);
    }

    #[test]
    fn test_resize_blanks_piano_briefly() {
        let mut app = test_app(&[]);
        assert!(!app.piano_hidden());

        app.handle_resize();
        app.update();
        assert!(app.piano_hidden());

        std::thread::sleep(RESIZE_REDRAW_DELAY + Duration::from_millis(20));
        app.update();
        assert!(!app.piano_hidden());
    }

    #[test]
    fn test_release_all_clears_everything() {
        let mut app = test_app(&["C4", "D4"]);
        app.pointer_press(index_of(&app, "C4"));
        app.handle_note_key('w', false); // D4
        assert_eq!(app.player.active_count(), 2);

        app.release_all();
        assert!(app.player.is_fading(Note::parse("C4").unwrap()));
        assert!(app.player.is_fading(Note::parse("D4").unwrap()));
        assert!(!app.is_pressed(index_of(&app, "C4")));
    }
}
