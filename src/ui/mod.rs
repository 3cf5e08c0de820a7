//! Terminal user interface.
//!
//! The screen is a header bar (title, status, note-labels checkbox), the
//! piano itself, and a footer line of key hints. Layout regions are recorded
//! on the [`App`] every frame so mouse hit testing always matches what was
//! drawn.

mod piano;

use crate::app::{App, LayoutRegions};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

pub use piano::{key_regions, render_piano};

/// Width of the "[x] Note labels" checkbox in the header.
const CHECKBOX_WIDTH: u16 = 16;

/// Renders the complete UI and updates the app's layout regions.
pub fn render(frame: &mut Frame, app: &mut App) {
    let size = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(7),    // Piano
            Constraint::Length(1), // Footer hints
        ])
        .split(size);

    let checkbox = render_header(frame, chunks[0], app);

    let piano_block = Block::default()
        .title(" Piano ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));
    let piano_inner = piano_block.inner(chunks[1]);
    frame.render_widget(piano_block, chunks[1]);

    let regions = key_regions(piano_inner, app.keys());

    // The piano stays blank for a short window after a resize; when it
    // comes back it is drawn with the current label visibility
    if !app.piano_hidden() {
        if regions.is_empty() {
            frame.render_widget(
                Paragraph::new("Terminal too small for the piano")
                    .style(Style::default().fg(Color::DarkGray))
                    .alignment(Alignment::Center),
                piano_inner,
            );
        } else {
            render_piano(frame, app, &regions);
        }
    }

    render_footer(frame, chunks[2]);

    app.update_layout(LayoutRegions {
        header: chunks[0],
        checkbox,
        piano: chunks[1],
        key_regions: regions,
    });
}

/// Renders the header bar; returns the checkbox hit region.
fn render_header(frame: &mut Frame, area: Rect, app: &App) -> Rect {
    let block = Block::default()
        .title(" pianotui ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let parts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(10), Constraint::Length(CHECKBOX_WIDTH)])
        .split(inner);

    // Status message on the left, falling back to a static tagline
    let status = match &app.status_message {
        Some((message, _)) => Span::styled(message.clone(), Style::default().fg(Color::Yellow)),
        None => Span::styled(
            "A virtual piano for your terminal",
            Style::default().fg(Color::DarkGray),
        ),
    };
    frame.render_widget(Paragraph::new(Line::from(status)), parts[0]);

    // Clickable note-labels checkbox on the right
    let mark = if app.settings.show_notes { "x" } else { " " };
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled(format!("[{}]", mark), Style::default().fg(Color::Yellow)),
            Span::styled(" Note labels", Style::default().fg(Color::Gray)),
        ])),
        parts[1],
    );

    parts[1]
}

/// Renders the footer hint line.
fn render_footer(frame: &mut Frame, area: Rect) {
    let key_style = Style::default().fg(Color::Yellow);
    let desc_style = Style::default().fg(Color::DarkGray);

    let hints = Line::from(vec![
        Span::styled("[Z-M / Q-I]", key_style),
        Span::styled(" Play  ", desc_style),
        Span::styled("[Mouse]", key_style),
        Span::styled(" Click/drag keys  ", desc_style),
        Span::styled("[Tab]", key_style),
        Span::styled(" Labels  ", desc_style),
        Span::styled("[Esc]", key_style),
        Span::styled(" Silence  ", desc_style),
        Span::styled("[Ctrl+Q]", key_style),
        Span::styled(" Quit", desc_style),
    ]);
    frame.render_widget(Paragraph::new(hints), area);
}
