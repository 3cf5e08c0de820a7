//! pianotui - a terminal virtual piano.
//!
//! Renders a 25-key piano (C3 to C5) and plays a preloaded audio sample per
//! note on mouse or keyboard input.
//!
//! # Features
//!
//! - Mouse play with drag-across-keys (press, glide, release)
//! - Computer-keyboard play on a tracker-style QWERTY layout
//! - Per-note fade-out on release
//! - Toggleable note-name labels, persisted across runs
//!
//! # Usage
//!
//! ```bash
//! cargo run                       # Samples from ./samples
//! cargo run -- --samples ~/piano  # Custom sample directory
//! ```
//!
//! Sample files are named by flat-spelled pitch, e.g. `Db4.mp3` for C#4.

use pianotui::app::App;
use pianotui::audio::{NotePlayer, SampleStore};
use pianotui::keys::default_keys;
use pianotui::settings::{Settings, DEFAULT_SETTINGS_PATH};
use pianotui::ui;

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
    KeyboardEnhancementFlags, MouseButton, MouseEvent, MouseEventKind,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use rodio::OutputStream;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::Duration;

/// Command-line options for the application.
struct CliOptions {
    /// Directory containing the per-note sample files.
    samples_dir: PathBuf,
    /// Path of the settings file.
    settings_path: PathBuf,
    /// Run without opening an audio device.
    no_audio: bool,
}

impl CliOptions {
    /// Parses command-line arguments.
    ///
    /// Supports:
    /// - `--samples <dir>` or `-s <dir>`: Sample directory (default `samples`)
    /// - `--settings <path>`: Settings file path (default `.pianotui.json`)
    /// - `--no-audio`: Skip audio output entirely (silent piano)
    /// - `--help` or `-h`: Print help and exit
    fn parse() -> Result<Self> {
        let args: Vec<String> = std::env::args().collect();
        let mut samples_dir = PathBuf::from("samples");
        let mut settings_path = PathBuf::from(DEFAULT_SETTINGS_PATH);
        let mut no_audio = false;
        let mut i = 1;

        while i < args.len() {
            match args[i].as_str() {
                "--samples" | "-s" => {
                    i += 1;
                    if i >= args.len() {
                        eprintln!("Error: --samples requires a directory argument");
                        std::process::exit(1);
                    }
                    samples_dir = PathBuf::from(&args[i]);
                }
                "--settings" => {
                    i += 1;
                    if i >= args.len() {
                        eprintln!("Error: --settings requires a path argument");
                        std::process::exit(1);
                    }
                    settings_path = PathBuf::from(&args[i]);
                }
                "--no-audio" => no_audio = true,
                "--help" | "-h" => {
                    eprintln!("pianotui - Terminal virtual piano");
                    eprintln!();
                    eprintln!(
                        "Usage: {} [OPTIONS]",
                        args.first().unwrap_or(&"pianotui".to_string())
                    );
                    eprintln!();
                    eprintln!("Options:");
                    eprintln!("  -s, --samples DIR   Directory with per-note sample files (default: samples)");
                    eprintln!("      --settings PATH Settings file path (default: {DEFAULT_SETTINGS_PATH})");
                    eprintln!("      --no-audio      Run silently, without opening an audio device");
                    eprintln!("  -h, --help          Print this help message");
                    eprintln!();
                    eprintln!("Samples are named <flat-note><octave>.<ext>, e.g. Db4.mp3, C4.wav.");
                    std::process::exit(0);
                }
                other => {
                    // A bare path argument is taken as the sample directory
                    if !other.starts_with('-') {
                        samples_dir = PathBuf::from(other);
                    } else {
                        eprintln!("Unknown option: {}", other);
                        eprintln!("Use --help for usage information");
                        std::process::exit(1);
                    }
                }
            }
            i += 1;
        }

        Ok(Self {
            samples_dir,
            settings_path,
            no_audio,
        })
    }
}

/// Main entry point.
fn main() -> Result<()> {
    // Parse CLI options first (before any terminal setup)
    let cli = CliOptions::parse()?;

    // Initialize logging (optional, for debugging)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Preload every sample before touching the terminal, so load warnings
    // stay readable on stderr
    let keys = default_keys();
    let store = if cli.samples_dir.is_dir() {
        SampleStore::load(&cli.samples_dir, keys.iter().map(|k| k.note))
    } else {
        tracing::warn!(
            "sample directory {} not found, the piano will be silent",
            cli.samples_dir.display()
        );
        SampleStore::empty()
    };

    // Open audio output; failure degrades to a silent but interactive piano
    let (_stream, stream_handle) = if cli.no_audio {
        (None, None)
    } else {
        match OutputStream::try_default() {
            Ok((stream, handle)) => (Some(stream), Some(handle)),
            Err(e) => {
                tracing::warn!("no audio output available, running silently: {}", e);
                (None, None)
            }
        }
    };

    let player = NotePlayer::new(stream_handle, store);
    let settings = Settings::load(&cli.settings_path);
    let mut app = App::new(keys, player, settings, cli.settings_path);

    let (mut terminal, enhanced_keys) = setup_terminal().context("Failed to setup terminal")?;

    // Run main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    restore_terminal(&mut terminal, enhanced_keys).context("Failed to restore terminal")?;

    // Handle any errors from the main loop
    result
}

/// Sets up the terminal for TUI rendering.
///
/// Pushes the keyboard-enhancement flags when supported so key release and
/// repeat events are delivered; the returned bool records whether the flags
/// were pushed (and must be popped on restore).
fn setup_terminal() -> Result<(Terminal<CrosstermBackend<Stdout>>, bool)> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to enter alternate screen")?;

    let enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
    if enhanced {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )
        .context("Failed to enable keyboard enhancement")?;
    } else {
        tracing::warn!(
            "terminal does not report key release events; keyboard notes fade on auto-repeat gaps"
        );
    }

    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("Failed to create terminal")?;
    Ok((terminal, enhanced))
}

/// Restores the terminal to its original state.
fn restore_terminal(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    enhanced_keys: bool,
) -> Result<()> {
    if enhanced_keys {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)
            .context("Failed to disable keyboard enhancement")?;
    }
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("Failed to leave alternate screen")?;
    disable_raw_mode().context("Failed to disable raw mode")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

/// Main application loop.
fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        // Advance fades, status expiry and the post-resize blanking
        app.update();

        // Draw UI
        terminal.draw(|frame| ui::render(frame, app))?;

        // Handle events with a short timeout so fades keep stepping
        if event::poll(Duration::from_millis(16))? {
            match event::read()? {
                Event::Key(key) => match key.kind {
                    KeyEventKind::Press => {
                        if handle_key(app, key.code, key.modifiers) {
                            break;
                        }
                    }
                    KeyEventKind::Repeat => {
                        // Auto-repeat keeps the key visually active without
                        // re-triggering playback
                        if let KeyCode::Char(c) = key.code {
                            app.handle_note_key(c, true);
                        }
                    }
                    KeyEventKind::Release => {
                        if let KeyCode::Char(c) = key.code {
                            app.handle_note_key_release(c);
                        }
                    }
                },
                Event::Mouse(mouse) => handle_mouse(app, mouse),
                Event::Resize(_, _) => app.handle_resize(),
                _ => {}
            }
        }
    }

    Ok(())
}

/// Handles a key press event.
///
/// Returns true if the application should quit.
fn handle_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> bool {
    // Any first key press unlocks audio (one-shot inside the player)
    app.player.warm_up();

    match code {
        // Quit (plain 'q' is a piano key here, so only with Ctrl)
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            return true;
        }
        KeyCode::Char('q') if modifiers.contains(KeyModifiers::CONTROL) => {
            return true;
        }

        // Toggle note-name labels
        KeyCode::Tab => {
            app.toggle_labels();
        }

        // Release everything that is currently sounding
        KeyCode::Esc => {
            app.release_all();
            app.set_status("All notes released");
        }

        // Everything else is routed to the piano
        KeyCode::Char(c) => {
            app.handle_note_key(c, false);
        }

        _ => {}
    }

    false
}

/// Handles mouse events.
fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            app.handle_mouse_down(mouse.column, mouse.row);
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.handle_mouse_drag(mouse.column, mouse.row);
        }
        // Delivered wherever the button is released, so a press that ends
        // outside the piano still clears the held state
        MouseEventKind::Up(MouseButton::Left) => {
            app.handle_mouse_up();
        }
        _ => {}
    }
}
