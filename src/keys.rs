//! The piano keyboard model.
//!
//! A [`Key`] is a visual piano key: a pitch plus an optional bound computer
//! keyboard character. The key list is built once at startup from a fixed
//! layout table and is immutable afterwards.

use crate::note::Note;

/// Octave of the lowest key on the piano.
pub const BASE_OCTAVE: i8 = 3;

/// Keyboard character to piano key mapping.
/// Uses a piano-like layout on QWERTY keyboards; the second element is the
/// semitone offset above the lowest key (C3).
pub const KEYBOARD_MAP: [(char, u8); 25] = [
    // Lower row (Z-M) = C3 to B3
    ('z', 0),  // C3
    ('s', 1),  // C#3
    ('x', 2),  // D3
    ('d', 3),  // D#3
    ('c', 4),  // E3
    ('v', 5),  // F3
    ('g', 6),  // F#3
    ('b', 7),  // G3
    ('h', 8),  // G#3
    ('n', 9),  // A3
    ('j', 10), // A#3
    ('m', 11), // B3
    // Upper row (Q-U) = C4 to B4
    ('q', 12), // C4 (Middle C)
    ('2', 13), // C#4
    ('w', 14), // D4
    ('3', 15), // D#4
    ('e', 16), // E4
    ('r', 17), // F4
    ('5', 18), // F#4
    ('t', 19), // G4
    ('6', 20), // G#4
    ('y', 21), // A4
    ('7', 22), // A#4
    ('u', 23), // B4
    ('i', 24), // C5
];

/// A single piano key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key {
    /// The pitch this key plays.
    pub note: Note,
    /// The computer keyboard character bound to this key, if any.
    pub binding: Option<char>,
}

/// Builds the default 25-key piano (C3 to C5), every key bound to a
/// keyboard character per [`KEYBOARD_MAP`].
pub fn default_keys() -> Vec<Key> {
    KEYBOARD_MAP
        .iter()
        .map(|&(binding, offset)| Key {
            note: Note::new(offset % 12, BASE_OCTAVE + (offset / 12) as i8),
            binding: Some(binding),
        })
        .collect()
}

/// Finds the index of the key bound to a keyboard character.
///
/// Matching is case-insensitive, so a shifted key press still reaches its
/// note.
pub fn key_for_char(keys: &[Key], c: char) -> Option<usize> {
    let lower = c.to_ascii_lowercase();
    keys.iter().position(|key| key.binding == Some(lower))
}
