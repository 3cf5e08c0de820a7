//! Pitch-name representation.
//!
//! Notes are identified by name ("C4", "F#3") rather than by frequency or
//! MIDI number: the sample library is keyed by name, and the piano layout is
//! built from names. Sharp spellings are used for display; sample files on
//! disk use flat spellings, so the two are mapped here.

use std::fmt;

/// Note names within an octave, sharp spelling (used for display).
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Note names within an octave, flat spelling (used for sample file stems).
pub const FLAT_NAMES: [&str; 12] = [
    "C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B",
];

/// A pitch identified by semitone-within-octave and octave number.
///
/// `semitone` 0 is C, 1 is C#, up to 11 for B. Octaves follow scientific
/// pitch notation, so middle C is `Note::new(0, 4)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Note {
    octave: i8,
    semitone: u8,
}

impl Note {
    /// Creates a note from a semitone index (0-11) and octave.
    ///
    /// Semitone values outside 0-11 wrap into the octave.
    pub fn new(semitone: u8, octave: i8) -> Self {
        Self {
            semitone: semitone % 12,
            octave,
        }
    }

    /// Returns the semitone index within the octave (0 = C, 11 = B).
    pub fn semitone(&self) -> u8 {
        self.semitone
    }

    /// Returns the octave number.
    pub fn octave(&self) -> i8 {
        self.octave
    }

    /// Whether this note is a sharp (a black key on the piano).
    pub fn is_sharp(&self) -> bool {
        matches!(self.semitone, 1 | 3 | 6 | 8 | 10)
    }

    /// Parses a note name like "C4", "F#3" or "Bb2".
    ///
    /// Accepts both sharp and flat spellings. Returns None for anything
    /// else.
    pub fn parse(name: &str) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        // Find where the octave number starts (digit or minus sign)
        let octave_start = name.chars().position(|c| c.is_ascii_digit() || c == '-')?;

        let note_part = &name[..octave_start];
        let octave_part = &name[octave_start..];

        let semitone = NOTE_NAMES
            .iter()
            .position(|&n| n == note_part)
            .or_else(|| FLAT_NAMES.iter().position(|&n| n == note_part))?;
        let octave: i8 = octave_part.parse().ok()?;

        Some(Self::new(semitone as u8, octave))
    }

    /// Returns the sample file stem for this note, using the flat spelling.
    ///
    /// Sample files only exist under flat names, so "C#4" resolves to
    /// "Db4" while naturals map to themselves.
    pub fn file_stem(&self) -> String {
        format!("{}{}", FLAT_NAMES[self.semitone as usize], self.octave)
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", NOTE_NAMES[self.semitone as usize], self.octave)
    }
}
