//! Piano keyboard rendering and geometry.
//!
//! White keys are drawn as full-height columns; black keys overlay the top
//! portion, straddling the boundary between their white neighbors. The same
//! geometry drives both drawing and mouse hit testing, so the two can never
//! disagree.

use crate::app::{App, KeyRegion};
use crate::keys::Key;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use ratatui::Frame;

/// Width of a white key face in columns.
const WHITE_KEY_FACE: u16 = 3;

/// Horizontal pitch between white keys (face plus one gap column).
const WHITE_KEY_PITCH: u16 = WHITE_KEY_FACE + 1;

/// Maximum piano height in rows.
const MAX_HEIGHT: u16 = 12;

/// Minimum piano height in rows; below this nothing is drawn.
const MIN_HEIGHT: u16 = 5;

/// Computes the on-screen region of every key within `area`.
///
/// Returns an empty vector when the area is too small to fit the keyboard,
/// which the renderer treats as "terminal too small".
pub fn key_regions(area: Rect, keys: &[Key]) -> Vec<KeyRegion> {
    let white_count = keys.iter().filter(|k| !k.note.is_sharp()).count() as u16;
    if white_count == 0 {
        return Vec::new();
    }

    let total_width = white_count * WHITE_KEY_PITCH - 1;
    if area.width < total_width || area.height < MIN_HEIGHT {
        return Vec::new();
    }

    let height = area.height.min(MAX_HEIGHT);
    let black_height = height * 3 / 5;
    let origin_x = area.x + (area.width - total_width) / 2;
    let origin_y = area.y;

    let mut regions = Vec::with_capacity(keys.len());
    let mut white_index: u16 = 0;

    for (key_index, key) in keys.iter().enumerate() {
        if key.note.is_sharp() {
            // Straddles the gap after the previous white key
            let boundary = (origin_x + white_index * WHITE_KEY_PITCH).saturating_sub(1);
            regions.push(KeyRegion {
                key_index,
                rect: Rect::new(boundary.saturating_sub(1), origin_y, 3, black_height),
                is_black: true,
            });
        } else {
            regions.push(KeyRegion {
                key_index,
                rect: Rect::new(
                    origin_x + white_index * WHITE_KEY_PITCH,
                    origin_y,
                    WHITE_KEY_FACE,
                    height,
                ),
                is_black: false,
            });
            white_index += 1;
        }
    }

    regions
}

/// Style for a key face.
fn key_style(is_black: bool, pressed: bool) -> Style {
    if pressed {
        Style::default()
            .fg(Color::White)
            .bg(Color::Blue)
            .add_modifier(Modifier::BOLD)
    } else if is_black {
        Style::default().fg(Color::White).bg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Black).bg(Color::White)
    }
}

/// Renders one centered label row inside a key face.
fn render_label(frame: &mut Frame, rect: Rect, row: u16, text: String, style: Style) {
    if row >= rect.height {
        return;
    }
    let label_area = Rect::new(rect.x, rect.y + row, rect.width, 1);
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(text, style)))
            .alignment(Alignment::Center),
        label_area,
    );
}

/// Draws the piano keys into their precomputed regions.
///
/// White keys are painted first, black keys after so they overlay the top of
/// the white rows. Labels (bound keyboard character and note name) are drawn
/// only when note labels are visible; the visibility flag applies to every
/// key uniformly.
pub fn render_piano(frame: &mut Frame, app: &App, regions: &[KeyRegion]) {
    let show_notes = app.settings.show_notes;

    for pass_black in [false, true] {
        for region in regions.iter().filter(|r| r.is_black == pass_black) {
            let key = app.keys()[region.key_index];
            let pressed = app.is_pressed(region.key_index);
            let style = key_style(region.is_black, pressed);

            frame.render_widget(Block::default().style(style), region.rect);

            if !show_notes {
                continue;
            }

            let rows = region.rect.height;
            if let Some(binding) = key.binding {
                render_label(
                    frame,
                    region.rect,
                    rows.saturating_sub(2),
                    binding.to_ascii_uppercase().to_string(),
                    style.add_modifier(Modifier::DIM),
                );
            }
            render_label(
                frame,
                region.rect,
                rows.saturating_sub(1),
                key.note.to_string(),
                style,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::default_keys;

    fn region_of<'a>(regions: &'a [KeyRegion], keys: &[Key], name: &str) -> &'a KeyRegion {
        let idx = keys
            .iter()
            .position(|k| k.note.to_string() == name)
            .unwrap();
        regions.iter().find(|r| r.key_index == idx).unwrap()
    }

    #[test]
    fn test_every_key_gets_a_region() {
        let keys = default_keys();
        let regions = key_regions(Rect::new(0, 0, 80, 12), &keys);
        assert_eq!(regions.len(), keys.len());
    }

    #[test]
    fn test_too_small_area_yields_no_regions() {
        let keys = default_keys();
        assert!(key_regions(Rect::new(0, 0, 20, 12), &keys).is_empty());
        assert!(key_regions(Rect::new(0, 0, 80, 3), &keys).is_empty());
    }

    #[test]
    fn test_black_keys_overlay_white_boundaries() {
        let keys = default_keys();
        let regions = key_regions(Rect::new(0, 0, 80, 12), &keys);

        let c3 = region_of(&regions, &keys, "C3");
        let cs3 = region_of(&regions, &keys, "C#3");
        let d3 = region_of(&regions, &keys, "D3");

        assert!(!c3.is_black);
        assert!(cs3.is_black);

        // The black key starts inside C3's band and ends inside D3's
        assert!(cs3.rect.x > c3.rect.x);
        assert!(cs3.rect.x < d3.rect.x);
        assert!(cs3.rect.x + cs3.rect.width > d3.rect.x);

        // Black keys are shorter than white keys
        assert!(cs3.rect.height < c3.rect.height);
    }

    #[test]
    fn test_hit_testing_prefers_black_keys() {
        use crate::app::LayoutRegions;

        let keys = default_keys();
        let regions = key_regions(Rect::new(0, 0, 80, 12), &keys);
        let layout = LayoutRegions {
            key_regions: regions.clone(),
            ..Default::default()
        };

        let cs3 = region_of(&regions, &keys, "C#3");
        let c3 = region_of(&regions, &keys, "C3");

        // A point inside the black key's rect resolves to the black key
        // even though it also lies within a white key's column
        let hit = layout.key_at(cs3.rect.x, cs3.rect.y);
        assert_eq!(hit, Some(cs3.key_index));

        // Below the black key, the same column belongs to a white key
        let below = layout.key_at(c3.rect.x, c3.rect.y + c3.rect.height - 1);
        assert_eq!(below, Some(c3.key_index));
    }
}
