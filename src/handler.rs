use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{App, AppMode, PromptKind, Tab};
use crate::vcs::action::ActionKind;

/// Handle a key event.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    app.mark_dirty();

    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    match app.mode {
        AppMode::Prompt(_) => handle_prompt_key(app, key),
        AppMode::Normal => handle_normal_key(app, key),
    }
}

fn handle_prompt_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.close_prompt(),
        KeyCode::Enter => app.submit_prompt(),
        KeyCode::Backspace => app.prompt_delete_char(),
        KeyCode::Left => app.prompt_move_cursor_left(),
        KeyCode::Right => app.prompt_move_cursor_right(),
        KeyCode::Char(c) => app.prompt_input_char(c),
        _ => {}
    }
}

fn handle_normal_key(app: &mut App, key: KeyEvent) {
    // Keys shared by every tab.
    match key.code {
        KeyCode::Char('q') => return app.quit(),
        KeyCode::Tab => {
            app.tab = app.tab.next();
            return;
        }
        KeyCode::BackTab => {
            app.tab = app.tab.previous();
            return;
        }
        KeyCode::Char(c @ '1'..='5') => {
            if let Some(tab) = Tab::from_index(c as usize - '1' as usize) {
                app.tab = tab;
            }
            return;
        }
        KeyCode::Char('j') | KeyCode::Down => return app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => return app.select_previous(),
        KeyCode::Char('g') | KeyCode::Home => return app.select_first(),
        KeyCode::Char('G') | KeyCode::End => return app.select_last(),
        KeyCode::Char('r') => return app.refresh_current(false),
        KeyCode::F(5) => return app.refresh_current(true),
        KeyCode::Char('u') => {
            let result = app.start_action(ActionKind::Update);
            return app.report(result);
        }
        KeyCode::Char('K') => return app.cancel_action(),
        KeyCode::Char('p') => return app.show_properties(),
        _ => {}
    }

    match app.tab {
        Tab::Repository => handle_tree_key(app, key),
        Tab::Status => handle_status_key(app, key),
        _ => handle_list_key(app, key),
    }
}

fn handle_list_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char(' ') => {
            app.toggle_selected();
            app.select_next();
        }
        KeyCode::Char('*') => app.select_all(),
        KeyCode::Esc => app.clear_selection(),
        _ => {}
    }
}

fn handle_status_key(app: &mut App, key: KeyEvent) {
    let kind = match key.code {
        KeyCode::Char('a') => ActionKind::Add,
        KeyCode::Char('d') => ActionKind::Remove,
        KeyCode::Char('v') => ActionKind::Revert,
        KeyCode::Char('R') => ActionKind::Resolved,
        _ => return handle_list_key(app, key),
    };
    let result = app.start_action(kind);
    app.report(result);
}

fn handle_tree_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter | KeyCode::Char('l') | KeyCode::Right => app.expand_selected(),
        KeyCode::Char('h') | KeyCode::Left => app.collapse_selected(),
        KeyCode::Char('n') => app.prompt_for_selected(|node| PromptKind::Rename { node }),
        KeyCode::Char('m') => app.prompt_for_selected(|parent| PromptKind::Mkdir { parent }),
        KeyCode::Char('c') => app.prompt_for_selected(|node| PromptKind::Copy { node }),
        _ => {}
    }
}

/// Scroll wheel moves the cursor of the current view.
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => {
            app.select_next();
            app.mark_dirty();
        }
        MouseEventKind::ScrollUp => {
            app.select_previous();
            app.mark_dirty();
        }
        _ => {}
    }
}
