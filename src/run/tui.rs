use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;

use crate::config::Config;
use crate::db::Database;
use crate::session::UserContext;
use crate::ui::app::{App, InputMode, PendingAction, Screen};
use crate::ui::commands;
use crate::ui::util::{scroll_down, scroll_to_bottom, scroll_to_top, scroll_up};

pub(crate) fn as_tui(db: &mut Database, user: UserContext, config: &Config) -> Result<()> {
    let mut app = App::new(user, config);
    app.refresh_all(db)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, db);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        tracing::error!(error = %e, "TUI exited with error");
        eprintln!("Error: {e:?}");
    }

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    db: &mut Database,
) -> Result<()> {
    while app.running {
        terminal.draw(|f| {
            let content_height = f.area().height.saturating_sub(3) as usize;
            app.visible_rows = content_height.max(1);
            crate::ui::render::render(f, app);
        })?;

        if let Event::Key(key) = event::read()? {
            if key.kind != event::KeyEventKind::Press {
                continue;
            }
            if app.show_help {
                app.show_help = false;
                continue;
            }
            match app.input_mode {
                InputMode::Normal => handle_normal_input(key, app, db)?,
                InputMode::Command => handle_command_input(key, app, db)?,
                InputMode::Search => handle_search_input(key, app, db)?,
                InputMode::Editing => handle_editing_input(key, app, db)?,
                InputMode::Confirm => handle_confirm_input(key, app, db)?,
            }
        }
    }
    Ok(())
}

// ── Input handlers ───────────────────────────────────────────

fn handle_normal_input(key: event::KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Char(':') => {
            app.input_mode = InputMode::Command;
            app.command_input.clear();
        }
        KeyCode::Char('/') => {
            app.input_mode = InputMode::Search;
            app.search_input.clear();
            app.screen = Screen::Subscriptions;
            app.refresh_subscriptions(db)?;
        }
        KeyCode::Char('q') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.running = false;
        }
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            for _ in 0..app.page() / 2 {
                handle_move_down(app);
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            for _ in 0..app.page() / 2 {
                handle_move_up(app);
            }
        }
        KeyCode::Char('j') | KeyCode::Down => handle_move_down(app),
        KeyCode::Char('k') | KeyCode::Up => handle_move_up(app),
        KeyCode::Char('g') => handle_goto_top(app),
        KeyCode::Char('G') => handle_goto_bottom(app),
        KeyCode::Char('1') => switch_screen(app, db, Screen::Dashboard)?,
        KeyCode::Char('2') => switch_screen(app, db, Screen::Subscriptions)?,
        KeyCode::Char('3') => switch_screen(app, db, Screen::Rules)?,
        KeyCode::Tab => {
            let screens = Screen::all();
            let idx = screens.iter().position(|s| *s == app.screen).unwrap_or(0);
            switch_screen(app, db, screens[(idx + 1) % screens.len()])?;
        }
        KeyCode::BackTab => {
            let screens = Screen::all();
            let idx = screens.iter().position(|s| *s == app.screen).unwrap_or(0);
            let prev = if idx == 0 { screens.len() - 1 } else { idx - 1 };
            switch_screen(app, db, screens[prev])?;
        }
        KeyCode::Char('?') => {
            app.show_help = true;
        }
        KeyCode::Esc => {
            app.status_message.clear();
            if !app.search_input.is_empty() {
                app.search_input.clear();
                app.refresh_subscriptions(db)?;
            }
        }
        KeyCode::Char('D') if app.screen == Screen::Rules => {
            commands::handle_command("delete-rule", app, db)?;
        }
        KeyCode::Char('D') if app.screen == Screen::Subscriptions => {
            commands::handle_command("delete", app, db)?;
        }
        KeyCode::Char('p') if app.screen == Screen::Subscriptions => {
            commands::handle_command("pause", app, db)?;
        }
        KeyCode::Char('c') if app.screen == Screen::Subscriptions => {
            commands::handle_command("cancel", app, db)?;
        }
        KeyCode::Char('a') if app.screen == Screen::Subscriptions => {
            commands::handle_command("resume", app, db)?;
        }
        KeyCode::Char('e') if app.screen == Screen::Subscriptions => {
            commands::handle_command("rename", app, db)?;
        }
        KeyCode::Char('R') if app.screen == Screen::Subscriptions => {
            commands::handle_command("renew", app, db)?;
        }
        _ => {}
    }
    Ok(())
}

fn handle_command_input(key: event::KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Enter => {
            let input = app.command_input.clone();
            app.input_mode = InputMode::Normal;
            app.command_input.clear();
            commands::handle_command(&input, app, db)?;
        }
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.command_input.clear();
        }
        KeyCode::Backspace => {
            app.command_input.pop();
            if app.command_input.is_empty() {
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Char(c) => {
            app.command_input.push(c);
        }
        _ => {}
    }
    Ok(())
}

fn handle_search_input(key: event::KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Enter => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.search_input.clear();
            app.refresh_subscriptions(db)?;
        }
        KeyCode::Backspace => {
            app.search_input.pop();
            live_search(app, db)?;
        }
        KeyCode::Char(c) => {
            app.search_input.push(c);
            live_search(app, db)?;
        }
        _ => {}
    }
    Ok(())
}

fn live_search(app: &mut App, db: &mut Database) -> Result<()> {
    scroll_to_top(&mut app.subscription_index, &mut app.subscription_scroll);
    app.refresh_subscriptions(db)
}

fn handle_editing_input(key: event::KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Enter => {
            let new_name = app.command_input.trim().to_string();
            app.command_input.clear();
            app.input_mode = InputMode::Normal;
            if !new_name.is_empty() {
                commands::handle_command(&format!("rename {new_name}"), app, db)?;
            }
        }
        KeyCode::Esc => {
            app.command_input.clear();
            app.input_mode = InputMode::Normal;
            app.set_status("Edit cancelled");
        }
        KeyCode::Backspace => {
            app.command_input.pop();
        }
        KeyCode::Char(c) => {
            app.command_input.push(c);
        }
        _ => {}
    }
    Ok(())
}

fn handle_confirm_input(key: event::KeyEvent, app: &mut App, db: &mut Database) -> Result<()> {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            if let Some(action) = app.pending_action.take() {
                match action {
                    PendingAction::DeleteSubscription { id, name } => {
                        db.delete_subscription(&id)?;
                        app.refresh_dashboard(db)?;
                        app.refresh_subscriptions(db)?;
                        app.set_status(format!("Deleted: {name}"));
                    }
                    PendingAction::DeleteRule { id, pattern } => {
                        db.delete_category_rule(id)?;
                        app.refresh_rules(db)?;
                        app.set_status(format!("Deleted rule: '{pattern}'"));
                    }
                }
            }
            app.input_mode = InputMode::Normal;
            app.confirm_message.clear();
        }
        _ => {
            // Any other key = cancel
            app.pending_action = None;
            app.input_mode = InputMode::Normal;
            app.confirm_message.clear();
            app.set_status("Cancelled");
        }
    }
    Ok(())
}

// ── Navigation helpers ───────────────────────────────────────

fn switch_screen(app: &mut App, db: &mut Database, screen: Screen) -> Result<()> {
    app.screen = screen;
    match screen {
        Screen::Dashboard => app.refresh_dashboard(db)?,
        Screen::Subscriptions => app.refresh_subscriptions(db)?,
        Screen::Rules => app.refresh_rules(db)?,
    }
    app.set_status(format!("{screen}"));
    Ok(())
}

fn handle_move_down(app: &mut App) {
    let page = app.page();
    match app.screen {
        Screen::Subscriptions => scroll_down(
            &mut app.subscription_index,
            &mut app.subscription_scroll,
            app.subscriptions.len(),
            page,
        ),
        Screen::Rules => scroll_down(
            &mut app.rule_index,
            &mut app.rule_scroll,
            app.rules.len(),
            page,
        ),
        Screen::Dashboard => {}
    }
}

fn handle_move_up(app: &mut App) {
    match app.screen {
        Screen::Subscriptions => {
            scroll_up(&mut app.subscription_index, &mut app.subscription_scroll)
        }
        Screen::Rules => scroll_up(&mut app.rule_index, &mut app.rule_scroll),
        Screen::Dashboard => {}
    }
}

fn handle_goto_top(app: &mut App) {
    match app.screen {
        Screen::Subscriptions => {
            scroll_to_top(&mut app.subscription_index, &mut app.subscription_scroll)
        }
        Screen::Rules => scroll_to_top(&mut app.rule_index, &mut app.rule_scroll),
        Screen::Dashboard => {}
    }
}

fn handle_goto_bottom(app: &mut App) {
    let page = app.page();
    match app.screen {
        Screen::Subscriptions => scroll_to_bottom(
            &mut app.subscription_index,
            &mut app.subscription_scroll,
            app.subscriptions.len(),
            page,
        ),
        Screen::Rules => scroll_to_bottom(
            &mut app.rule_index,
            &mut app.rule_scroll,
            app.rules.len(),
            page,
        ),
        Screen::Dashboard => {}
    }
}
