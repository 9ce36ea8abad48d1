//! Keyboard input handling.
//!
//! Maps terminal key events to [`App`] actions.  Which map applies depends on
//! [`App::mode`]: text boxes swallow printable keys, overlays take the
//! arrows, and everything else goes to the table.
//!
//! | Key | Action |
//! |---|---|
//! | `Tab` / `Shift-Tab` | next / previous source |
//! | `f` / `F` | cycle filter value |
//! | `d` / `D` | cycle days window |
//! | `/` | search, `c` clears it |
//! | `n` / `p` | next / previous page |
//! | `b` | focus the pagination bar |
//! | `Enter` | open the selected item |
//! | `e` / `Space` | expand or collapse long text |
//! | `r` | refresh |
//! | `l` / `s` | toggle log / statistics |
//! | `R` / `x` | run / stop parsers |

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::app::{App, Focus, Mode};

/// Process a single key event, updating app state accordingly.
///
/// Only reacts to key-press events (ignoring release / repeat) so that each
/// physical keypress triggers exactly one action.
pub fn handle_key_event(app: &mut App, key: KeyEvent, now: Instant) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    match app.mode {
        Mode::Search => search_key(app, key, now),
        Mode::ParserPicker => picker_key(app, key),
        Mode::UniversalUrl => url_key(app, key),
        Mode::Detail(_) => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                app.close_overlay();
            }
        }
        Mode::Normal => match app.focus {
            Focus::Pagination => pagination_key(app, key),
            Focus::Table => normal_key(app, key),
        },
    }
}

fn normal_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit = true,
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
        KeyCode::Home | KeyCode::Char('g') => app.select_first(),
        KeyCode::End | KeyCode::Char('G') => app.select_last(),
        KeyCode::Tab => app.step_source(1),
        KeyCode::BackTab => app.step_source(-1),
        KeyCode::Char('f') => app.cycle_filter(1),
        KeyCode::Char('F') => app.cycle_filter(-1),
        KeyCode::Char('d') => app.cycle_days(1),
        KeyCode::Char('D') => app.cycle_days(-1),
        KeyCode::Char('/') => app.begin_search(),
        KeyCode::Char('c') => app.clear_search(),
        KeyCode::Char('n') | KeyCode::Right => app.next_page(),
        KeyCode::Char('p') | KeyCode::Left => app.previous_page(),
        KeyCode::Char('b') => app.toggle_pagination_focus(),
        KeyCode::Enter => app.open_detail(),
        KeyCode::Char('e') | KeyCode::Char(' ') => {
            app.toggle_expand();
        }
        KeyCode::Char('r') => app.refresh(),
        KeyCode::Char('l') => app.toggle_log(),
        KeyCode::Char('s') => app.toggle_stats(),
        KeyCode::Char('R') => app.open_parser_picker(),
        KeyCode::Char('x') => app.stop_parsers(),
        _ => {}
    }
}

fn pagination_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Left | KeyCode::Char('h') => app.move_control_cursor(-1),
        KeyCode::Right | KeyCode::Char('l') => app.move_control_cursor(1),
        KeyCode::Enter => app.activate_selected_control(),
        KeyCode::Esc | KeyCode::Char('b') | KeyCode::Tab => app.toggle_pagination_focus(),
        KeyCode::Char('q') => app.quit = true,
        _ => {}
    }
}

fn search_key(app: &mut App, key: KeyEvent, now: Instant) {
    match key.code {
        KeyCode::Enter => app.submit_search(),
        KeyCode::Esc => app.leave_search(),
        KeyCode::Backspace => app.search_backspace(now),
        KeyCode::Char(c) => app.search_push(c, now),
        _ => {}
    }
}

fn picker_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Down | KeyCode::Char('j') => app.picker_move(1),
        KeyCode::Up | KeyCode::Char('k') => app.picker_move(-1),
        KeyCode::Char(' ') => app.picker_toggle(),
        KeyCode::Char('u') => app.begin_universal_url(),
        KeyCode::Enter => app.confirm_parsers(),
        KeyCode::Esc | KeyCode::Char('q') => app.close_overlay(),
        _ => {}
    }
}

fn url_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter | KeyCode::Esc => app.leave_universal_url(),
        KeyCode::Backspace => app.universal_backspace(),
        KeyCode::Char(c) => app.universal_push(c),
        _ => {}
    }
}
