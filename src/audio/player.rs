//! Per-note playback with fade-out on release.
//!
//! Each sounding note owns a rodio sink playing its looped sample. Releasing
//! a note does not stop it immediately: the voice fades in fixed volume
//! steps driven by the main loop's tick, then the sink is stopped and the
//! voice removed. A note stays a member of the voice map from the moment
//! playback starts until its fade completes, which is what makes `play`
//! idempotent while a note is held.

use crate::audio::store::SampleStore;
use crate::note::Note;
use rodio::{OutputStreamHandle, Sink, Source};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Volume removed per fade step.
pub const FADE_STEP: f32 = 0.1;

/// Interval between fade steps.
pub const FADE_INTERVAL: Duration = Duration::from_millis(20);

/// Volume at or below which a fading voice is stopped outright.
pub const FADE_FLOOR: f32 = 0.1;

/// An in-progress fade-out.
struct Fade {
    /// When the last volume step was applied.
    last_step: Instant,
}

/// One sounding note.
struct Voice {
    /// The sink playing the looped sample. None when audio output is
    /// unavailable or the sink could not be created; the voice then tracks
    /// state silently so the rest of the program behaves identically.
    sink: Option<Sink>,
    /// Current volume (1.0 = full).
    volume: f32,
    /// The pending fade, if the note has been released.
    fade: Option<Fade>,
}

/// Starts and stops notes, owning the set of currently-sounding voices.
pub struct NotePlayer {
    output: Option<OutputStreamHandle>,
    store: SampleStore,
    voices: HashMap<Note, Voice>,
    /// One-shot warm-up flag, consumed on the first user interaction.
    warmed_up: bool,
}

impl NotePlayer {
    /// Creates a player over the given sample store.
    ///
    /// `output` may be None when no audio device is available; the player
    /// then runs silently but keeps full state-machine behavior.
    pub fn new(output: Option<OutputStreamHandle>, store: SampleStore) -> Self {
        Self {
            output,
            store,
            voices: HashMap::new(),
            warmed_up: false,
        }
    }

    /// Starts playback of a note from the top of its sample.
    ///
    /// No-op while the note is already sounding and not fading, so held keys
    /// and auto-repeat never restart the sample. If the note is mid-fade,
    /// the fade is cancelled and playback restarts from the beginning.
    /// Notes without a loaded sample are silent no-ops.
    pub fn play(&mut self, note: Note) {
        if let Some(voice) = self.voices.get_mut(&note) {
            if voice.fade.is_none() {
                return;
            }
            // Mid-fade: cancel the fade and restart cleanly below
            if let Some(sink) = voice.sink.take() {
                sink.stop();
            }
            self.voices.remove(&note);
        }

        let Some(source) = self.store.get(note) else {
            tracing::debug!("no sample for {}, playing silently", note);
            return;
        };

        let sink = self.start_sink(note, source);
        self.voices.insert(
            note,
            Voice {
                sink,
                volume: 1.0,
                fade: None,
            },
        );
    }

    /// Creates a sink playing the looped sample at full volume.
    ///
    /// Returns None if output is unavailable or the sink fails to start;
    /// either way the failure is confined to this note's audio.
    fn start_sink(&self, note: Note, source: crate::audio::store::SampleSource) -> Option<Sink> {
        let handle = self.output.as_ref()?;
        match Sink::try_new(handle) {
            Ok(sink) => {
                sink.append(source.repeat_infinite());
                Some(sink)
            }
            Err(e) => {
                tracing::error!("failed to start playback for {}: {}", note, e);
                None
            }
        }
    }

    /// Begins the fade-out of a note. No-op if the note is not sounding or
    /// is already fading.
    pub fn release(&mut self, note: Note) {
        if let Some(voice) = self.voices.get_mut(&note) {
            if voice.fade.is_none() {
                voice.fade = Some(Fade {
                    last_step: Instant::now(),
                });
            }
        }
    }

    /// Releases every sounding note.
    pub fn release_all(&mut self) {
        let notes: Vec<Note> = self.voices.keys().copied().collect();
        for note in notes {
            self.release(note);
        }
    }

    /// Advances all pending fades. Called from the main event loop.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    /// Advances fades as of `now`, applying one volume step per elapsed
    /// interval and removing voices that reach the floor.
    fn tick_at(&mut self, now: Instant) {
        self.voices.retain(|_, voice| {
            let Some(fade) = voice.fade.as_mut() else {
                return true;
            };

            while now.duration_since(fade.last_step) >= FADE_INTERVAL && voice.volume > FADE_FLOOR
            {
                voice.volume -= FADE_STEP;
                fade.last_step += FADE_INTERVAL;
            }

            if voice.volume > FADE_FLOOR {
                if let Some(sink) = &voice.sink {
                    sink.set_volume(voice.volume);
                }
                true
            } else {
                if let Some(sink) = voice.sink.take() {
                    sink.stop();
                }
                false
            }
        });
    }

    /// One-time audio warm-up, run on the first user interaction.
    ///
    /// Briefly enqueues every sample at zero volume and stops it again,
    /// priming the output mixer so the first real note starts without the
    /// initial-path latency. Subsequent calls are no-ops.
    pub fn warm_up(&mut self) {
        if self.warmed_up {
            return;
        }
        self.warmed_up = true;

        let Some(handle) = self.output.as_ref() else {
            return;
        };

        let mut primed = 0usize;
        for (note, source) in self.store.iter() {
            match Sink::try_new(handle) {
                Ok(sink) => {
                    sink.set_volume(0.0);
                    sink.append(source);
                    sink.stop();
                    primed += 1;
                }
                Err(e) => {
                    tracing::debug!("warm-up skipped for {}: {}", note, e);
                }
            }
        }
        tracing::debug!("audio warm-up complete ({} samples primed)", primed);
    }

    /// Whether a note is currently sounding (including a fading note).
    pub fn is_active(&self, note: Note) -> bool {
        self.voices.contains_key(&note)
    }

    /// Whether a note is currently fading out.
    pub fn is_fading(&self, note: Note) -> bool {
        self.voices
            .get(&note)
            .is_some_and(|voice| voice.fade.is_some())
    }

    /// Number of currently-sounding voices, fading ones included.
    pub fn active_count(&self) -> usize {
        self.voices.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::store::testing::store_with_notes;

    fn note(name: &str) -> Note {
        Note::parse(name).unwrap()
    }

    /// A player with real decoded samples but no audio output, so tests run
    /// headless while still exercising the store path.
    fn silent_player(names: &[&str]) -> NotePlayer {
        let notes: Vec<Note> = names.iter().map(|n| note(n)).collect();
        NotePlayer::new(None, store_with_notes(&notes))
    }

    #[test]
    fn test_play_is_idempotent_while_active() {
        let mut player = silent_player(&["C4"]);
        player.play(note("C4"));
        player.play(note("C4"));
        assert_eq!(player.active_count(), 1);
        assert!(!player.is_fading(note("C4")));
    }

    #[test]
    fn test_release_of_inactive_note_is_noop() {
        let mut player = silent_player(&["C4"]);
        player.release(note("C4"));
        assert_eq!(player.active_count(), 0);
    }

    #[test]
    fn test_missing_sample_plays_silently() {
        let mut player = silent_player(&["C4"]);
        player.play(note("G7"));
        assert_eq!(player.active_count(), 0);
        // And releasing it later is still a no-op
        player.release(note("G7"));
        assert_eq!(player.active_count(), 0);
    }

    #[test]
    fn test_fade_removes_voice() {
        let mut player = silent_player(&["C4"]);
        let start = Instant::now();
        player.play(note("C4"));
        player.release(note("C4"));
        assert!(player.is_fading(note("C4")));

        // Nine 20ms steps take the volume from 1.0 to the floor
        player.tick_at(start + Duration::from_millis(300));
        assert_eq!(player.active_count(), 0);
    }

    #[test]
    fn test_fade_is_gradual() {
        let mut player = silent_player(&["C4"]);
        let start = Instant::now();
        player.play(note("C4"));
        player.release(note("C4"));

        // Two intervals in: still sounding, two steps applied
        player.tick_at(start + Duration::from_millis(45));
        assert!(player.is_active(note("C4")));
        assert!(player.is_fading(note("C4")));
    }

    #[test]
    fn test_replay_cancels_pending_fade() {
        let mut player = silent_player(&["C4"]);
        let start = Instant::now();
        player.play(note("C4"));
        player.release(note("C4"));
        player.tick_at(start + Duration::from_millis(45));

        // Re-playing mid-fade restarts the note at full volume
        player.play(note("C4"));
        assert!(!player.is_fading(note("C4")));

        // No stale fade timer remains: the voice survives indefinitely
        player.tick_at(start + Duration::from_secs(10));
        assert_eq!(player.active_count(), 1);
    }

    #[test]
    fn test_release_all() {
        let mut player = silent_player(&["C4", "E4", "G4"]);
        let start = Instant::now();
        player.play(note("C4"));
        player.play(note("E4"));
        player.play(note("G4"));
        assert_eq!(player.active_count(), 3);

        player.release_all();
        player.tick_at(start + Duration::from_millis(300));
        assert_eq!(player.active_count(), 0);
    }

    #[test]
    fn test_warm_up_is_one_shot() {
        let mut player = silent_player(&["C4"]);
        assert!(!player.warmed_up);
        player.warm_up();
        assert!(player.warmed_up);
        // Second call is a no-op either way
        player.warm_up();
        assert!(player.warmed_up);
    }
}
