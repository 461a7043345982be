use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::app::{App, View};

/// File written by the `e` key.
pub const EXPORT_FILE: &str = "roomwatch_export.json";

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    if app.input_active {
        handle_threshold_input(app, key);
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),

        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.prev_view();
            } else {
                app.next_view();
            }
        }
        KeyCode::BackTab => app.prev_view(),
        KeyCode::Char('1') => app.set_view(View::Overview),
        KeyCode::Char('2') => app.set_view(View::Trends),
        KeyCode::Char('3') => app.set_view(View::Alerts),

        // Navigation (up/down for items, left/right for tabs)
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Left | KeyCode::Char('h') => app.prev_view(),
        KeyCode::Right | KeyCode::Char('l') => app.next_view(),
        KeyCode::PageUp => app.select_prev_n(10),
        KeyCode::PageDown => app.select_next_n(10),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),

        // Thresholds
        KeyCode::Char('m') => app.toggle_metric(),
        KeyCode::Char('+') | KeyCode::Char('=') => app.adjust_threshold(1),
        KeyCode::Char('-') => app.adjust_threshold(-1),
        KeyCode::Char('s') => app.save_thresholds(),
        KeyCode::Char('t') => app.start_threshold_input(),

        // Chart window
        KeyCode::Char(']') => app.adjust_chart_window(1),
        KeyCode::Char('[') => app.adjust_chart_window(-1),

        KeyCode::Esc | KeyCode::Char('d') => app.dismiss_notification(),

        KeyCode::Char('r') => {
            app.reload_data();
        }

        KeyCode::Char('?') => app.toggle_help(),

        KeyCode::Char('e') => {
            let export_path = std::path::PathBuf::from(EXPORT_FILE);
            match app.export_state(&export_path) {
                Ok(()) => {
                    app.set_status_message(format!("Exported to {}", export_path.display()));
                }
                Err(e) => {
                    app.set_status_message(format!("Export failed: {}", e));
                }
            }
        }

        _ => {}
    }
}

/// Handle key input while a threshold update is being typed
fn handle_threshold_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.submit_threshold_input(),
        KeyCode::Esc => app.cancel_threshold_input(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.cancel_threshold_input();
        }
        KeyCode::Backspace => app.input_pop(),
        KeyCode::Char(c) => app.input_push(c),
        _ => {}
    }
}

/// Handle mouse events
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent, content_start_row: u16) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.select_prev(),
        MouseEventKind::ScrollDown => app.select_next(),

        MouseEventKind::Down(MouseButton::Left) => {
            let clicked_row = mouse.row;

            // Rows below the table header select a room
            if clicked_row > content_start_row && app.current_view == View::Overview {
                let item_row = (clicked_row - content_start_row - 1) as usize;
                if item_row < app.aggregator.room_count() {
                    app.selected_room_index = item_row;
                }
            }

            // Tab bar sits on row 1: Overview (0-13), Trends (14-25), Alerts (26-37)
            if clicked_row == 1 {
                let col = mouse.column;
                if col < 14 {
                    app.set_view(View::Overview);
                } else if col < 26 {
                    app.set_view(View::Trends);
                } else if col < 38 {
                    app.set_view(View::Alerts);
                }
            }
        }

        MouseEventKind::Down(MouseButton::Right) => app.dismiss_notification(),

        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Aggregator;
    use crate::source::ChannelSource;
    use roomwatch_types::{BatchBuilder, DecodedBatch, Metric};

    fn press(app: &mut App, code: KeyCode) {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn app_with_rooms(rooms: &[&str]) -> App {
        let (tx, source) = ChannelSource::create("test", 8);
        let mut builder = BatchBuilder::new();
        for room in rooms {
            builder = builder.reading(*room, |r| r.temperature(20.0).humidity(50.0));
        }
        tx.try_send(DecodedBatch::from_readings(builder.build())).unwrap();
        let mut app = App::new(Box::new(source), Aggregator::default());
        app.reload_data();
        app
    }

    #[test]
    fn quit_and_view_keys() {
        let mut app = app_with_rooms(&[]);
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.current_view, View::Alerts);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.current_view, View::Overview);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.current_view, View::Alerts);

        press(&mut app, KeyCode::Char('q'));
        assert!(!app.running);
    }

    #[test]
    fn help_swallows_next_key() {
        let mut app = app_with_rooms(&[]);
        press(&mut app, KeyCode::Char('?'));
        assert!(app.show_help);
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.show_help);
        assert!(app.running);
    }

    #[test]
    fn threshold_keys_act_on_selection() {
        let mut app = app_with_rooms(&["A", "B"]);
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('m'));
        assert_eq!(app.selected_metric, Metric::Humidity);

        press(&mut app, KeyCode::Char('+'));
        let b = app.aggregator.thresholds().get("B").unwrap();
        assert_eq!(b.humidity, Some(51.0));
        assert!(app.aggregator.thresholds().get("A").is_none());
    }

    #[test]
    fn chart_window_keys() {
        let mut app = app_with_rooms(&["A"]);
        let start = app.chart_window;
        press(&mut app, KeyCode::Char(']'));
        assert_eq!(app.chart_window, start + 1);
        for _ in 0..100 {
            press(&mut app, KeyCode::Char('['));
        }
        assert_eq!(app.chart_window, 2);
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn typed_threshold_update_applies_on_enter() {
        let mut app = app_with_rooms(&["Kitchen"]);
        press(&mut app, KeyCode::Char('t'));
        assert!(app.input_active);
        assert_eq!(app.threshold_input, "Kitchen.temp=");

        // 'q' is text while typing, not quit
        type_text(&mut app, "29.5q");
        press(&mut app, KeyCode::Backspace);
        assert!(app.running);
        press(&mut app, KeyCode::Enter);

        assert!(!app.input_active);
        let kitchen = app.aggregator.thresholds().get("Kitchen").unwrap();
        assert_eq!(kitchen.temp, Some(29.5));
        assert!(app.get_status_message().unwrap().starts_with("Applied"));
    }

    #[test]
    fn typed_threshold_update_can_be_cancelled_or_rejected() {
        let mut app = app_with_rooms(&["Kitchen"]);
        press(&mut app, KeyCode::Char('t'));
        type_text(&mut app, "40");
        press(&mut app, KeyCode::Esc);
        assert!(!app.input_active);
        assert!(app.aggregator.thresholds().get("Kitchen").is_none());

        press(&mut app, KeyCode::Char('t'));
        type_text(&mut app, "warm");
        press(&mut app, KeyCode::Enter);
        assert!(app.aggregator.thresholds().get("Kitchen").is_none());
        assert!(app.get_status_message().unwrap().starts_with("Rejected"));
    }
}
