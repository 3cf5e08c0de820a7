//! Preloaded audio sample store.
//!
//! One sample file per note, located by a fixed naming convention:
//! `<flat-note><octave>.<ext>` (e.g. `Db4.mp3` for C#4). Samples are decoded
//! once at startup into buffered sources that clone cheaply, so starting a
//! note never touches the filesystem.

use crate::note::Note;
use rodio::source::Buffered;
use rodio::{Decoder, Source};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File extensions probed for each note, in order of preference.
pub const SAMPLE_EXTENSIONS: [&str; 4] = ["mp3", "wav", "ogg", "flac"];

/// A decoded, cheaply-cloneable audio source for one note.
pub type SampleSource = Buffered<Decoder<BufReader<File>>>;

/// Why a sample could not be loaded.
#[derive(Debug, Error)]
pub enum SampleError {
    /// No file with any known extension exists for the note.
    #[error("no sample file for {note} (looked for {stem}.{{mp3,wav,ogg,flac}})")]
    NotFound { note: String, stem: String },

    /// The file exists but could not be opened.
    #[error("failed to open {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file opened but could not be decoded as audio.
    #[error("failed to decode {path}")]
    Decode {
        path: PathBuf,
        #[source]
        source: rodio::decoder::DecoderError,
    },
}

/// Maps notes to their preloaded audio sources.
pub struct SampleStore {
    samples: HashMap<Note, SampleSource>,
}

impl SampleStore {
    /// Creates an empty store. Every note plays silently.
    pub fn empty() -> Self {
        Self {
            samples: HashMap::new(),
        }
    }

    /// Loads a sample for every note from the given directory.
    ///
    /// Load failures are logged and skipped; the affected notes become
    /// silent no-ops rather than errors. This mirrors the error model of the
    /// whole program: a missing or broken sample never breaks interactivity.
    pub fn load(dir: &Path, notes: impl IntoIterator<Item = Note>) -> Self {
        let mut samples = HashMap::new();
        for note in notes {
            match Self::load_one(dir, note) {
                Ok(source) => {
                    samples.insert(note, source);
                }
                Err(e) => {
                    tracing::warn!("sample for {} unavailable: {}", note, e);
                }
            }
        }
        tracing::info!("loaded {} samples from {}", samples.len(), dir.display());
        Self { samples }
    }

    /// Loads and decodes the sample file for a single note.
    fn load_one(dir: &Path, note: Note) -> Result<SampleSource, SampleError> {
        let stem = note.file_stem();
        for ext in SAMPLE_EXTENSIONS {
            let path = dir.join(format!("{}.{}", stem, ext));
            if !path.exists() {
                continue;
            }
            let file = File::open(&path).map_err(|source| SampleError::Io {
                path: path.clone(),
                source,
            })?;
            let decoder = Decoder::new(BufReader::new(file))
                .map_err(|source| SampleError::Decode { path, source })?;
            return Ok(decoder.buffered());
        }
        Err(SampleError::NotFound {
            note: note.to_string(),
            stem,
        })
    }

    /// Returns a playable source for the note, if one was loaded.
    pub fn get(&self, note: Note) -> Option<SampleSource> {
        self.samples.get(&note).cloned()
    }

    /// Whether a sample exists for the note.
    pub fn contains(&self, note: Note) -> bool {
        self.samples.contains_key(&note)
    }

    /// Iterates over every loaded sample.
    pub fn iter(&self) -> impl Iterator<Item = (Note, SampleSource)> + '_ {
        self.samples.iter().map(|(n, s)| (*n, s.clone()))
    }

    /// Number of loaded samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether no samples were loaded.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    static DIR_COUNTER: AtomicU32 = AtomicU32::new(0);

    /// Creates a fresh temp directory unique to this test run.
    pub fn temp_sample_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "pianotui-samples-{}-{}",
            std::process::id(),
            DIR_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Writes a short silent-ish WAV file to the given path.
    pub fn write_wav(path: &Path) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..441 {
            writer.write_sample(((i % 100) * 30) as i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    /// Builds a store whose directory contains a WAV for each given note,
    /// named with the flat-spelling convention.
    pub fn store_with_notes(notes: &[Note]) -> SampleStore {
        let dir = temp_sample_dir();
        for note in notes {
            write_wav(&dir.join(format!("{}.wav", note.file_stem())));
        }
        SampleStore::load(&dir, notes.iter().copied())
    }
}
