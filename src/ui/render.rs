use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use super::app::{App, InputMode, Screen};
use super::commands;
use super::theme;

pub(crate) fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Tab bar
            Constraint::Min(5),    // Main content
            Constraint::Length(1), // Status bar
            Constraint::Length(1), // Command bar
        ])
        .split(f.area());

    render_tab_bar(f, chunks[0], app);
    render_screen(f, chunks[1], app);
    render_status_bar(f, chunks[2], app);
    render_command_bar(f, chunks[3], app);

    if app.show_help {
        render_help_overlay(f, f.area());
    }
}

fn render_tab_bar(f: &mut Frame, area: Rect, app: &App) {
    let titles: Vec<Line> = Screen::all()
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let num = format!("{}", i + 1);
            if *s == app.screen {
                Line::from(vec![
                    Span::styled(format!("{num}:"), Style::default().fg(theme::TEXT_DIM)),
                    Span::styled(
                        format!("{s}"),
                        Style::default()
                            .fg(theme::ACCENT)
                            .add_modifier(Modifier::BOLD),
                    ),
                ])
            } else {
                Line::from(Span::styled(
                    format!("{num}:{s}"),
                    Style::default().fg(theme::TEXT_DIM),
                ))
            }
        })
        .collect();

    let tabs = Tabs::new(titles)
        .divider(Span::styled(" | ", Style::default().fg(theme::OVERLAY)))
        .style(Style::default().bg(theme::HEADER_BG));

    f.render_widget(tabs, area);
}

fn render_screen(f: &mut Frame, area: Rect, app: &App) {
    match app.screen {
        Screen::Dashboard => super::screens::dashboard::render(f, area, app),
        Screen::Subscriptions => super::screens::subscriptions::render(f, area, app),
        Screen::Rules => super::screens::rules::render(f, area, app),
    }
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mode_label = format!(" {} ", app.input_mode);
    let mode_bg = match app.input_mode {
        InputMode::Normal => theme::ACCENT,
        InputMode::Command | InputMode::Editing => theme::GREEN,
        InputMode::Search => theme::YELLOW,
        InputMode::Confirm => theme::RED,
    };
    let mode_style = Style::default()
        .fg(theme::HEADER_BG)
        .bg(mode_bg)
        .add_modifier(Modifier::BOLD);

    let info = format!(
        " {} | {} | {} subs",
        app.screen, app.user.user_id, app.summary.total_count
    );

    let right = match app.screen {
        Screen::Dashboard => " :window days | :add | ? help ",
        Screen::Subscriptions => " D delete | p pause | /search | ? help ",
        Screen::Rules => " :rule add | D delete | ? help ",
    };

    let available = area.width as usize;
    let used = mode_label.len() + info.chars().count() + right.len();
    let pad = available.saturating_sub(used);

    let bar = Paragraph::new(Line::from(vec![
        Span::styled(&mode_label, mode_style),
        Span::styled(&info, theme::status_bar_style()),
        Span::styled(" ".repeat(pad), theme::status_bar_style()),
        Span::styled(right, theme::status_bar_style()),
    ]));
    f.render_widget(bar, area);
}

fn render_command_bar(f: &mut Frame, area: Rect, app: &App) {
    let (content, cursor_offset) = match app.input_mode {
        InputMode::Command => (
            Line::from(vec![
                Span::styled(":", Style::default().fg(theme::ACCENT)),
                Span::styled(&app.command_input, theme::command_bar_style()),
            ]),
            Some(1 + app.command_input.chars().count() as u16),
        ),
        InputMode::Search => {
            let match_info = if !app.search_input.is_empty() {
                format!("  ({} matches)", app.subscriptions.len())
            } else {
                String::new()
            };
            (
                Line::from(vec![
                    Span::styled("/", Style::default().fg(theme::YELLOW)),
                    Span::styled(&app.search_input, theme::command_bar_style()),
                    Span::styled(match_info, theme::dim_style()),
                ]),
                Some(1 + app.search_input.chars().count() as u16),
            )
        }
        InputMode::Editing => (
            Line::from(vec![
                Span::styled("edit> ", Style::default().fg(theme::GREEN)),
                Span::styled(&app.command_input, theme::command_bar_style()),
            ]),
            Some(6 + app.command_input.chars().count() as u16),
        ),
        InputMode::Confirm => (
            Line::from(vec![
                Span::styled(&app.confirm_message, Style::default().fg(theme::YELLOW)),
                Span::styled(" [y/N] ", Style::default().fg(theme::RED)),
            ]),
            None,
        ),
        InputMode::Normal => (
            if app.status_message.is_empty() {
                Line::from(Span::styled(
                    " Press : for commands, / to search, ? for help",
                    theme::dim_style(),
                ))
            } else {
                Line::from(Span::styled(
                    &app.status_message,
                    theme::command_bar_style(),
                ))
            },
            None,
        ),
    };

    let bar = Paragraph::new(content).style(Style::default().bg(theme::COMMAND_BG));
    f.render_widget(bar, area);

    if let Some(offset) = cursor_offset {
        f.set_cursor_position((area.x + offset, area.y));
    }
}

/// Key bindings shown in the help overlay, grouped by heading.
const KEY_HELP: &[(&str, &[(&str, &str)])] = &[
    (
        "Navigation",
        &[
            ("j/k", "Move cursor"),
            ("g/G", "Top / bottom"),
            ("Ctrl-d/u", "Half page down / up"),
            ("1-3, Tab", "Switch tabs"),
            ("Ctrl-q", "Quit"),
        ],
    ),
    (
        "Subscriptions",
        &[
            ("p", "Pause"),
            ("c", "Cancel"),
            ("a", "Activate"),
            ("e", "Rename"),
            ("R", "Recompute renewal"),
            ("D", "Delete (asks first)"),
        ],
    ),
    (
        "Input",
        &[
            (":", "Command mode"),
            ("/", "Live search"),
            ("Esc", "Clear / back"),
        ],
    ),
];

fn help_heading(title: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!(" {title}"),
        Style::default()
            .fg(theme::YELLOW)
            .add_modifier(Modifier::BOLD),
    ))
}

/// Lay `pairs` out two per line as `key  description`.
fn key_lines(pairs: &[(&str, &str)]) -> Vec<Line<'static>> {
    pairs
        .chunks(2)
        .map(|chunk| {
            let mut spans = Vec::new();
            for (key, desc) in chunk {
                spans.push(Span::styled(format!("  {key:<10}"), Style::default().fg(theme::ACCENT)));
                spans.push(Span::styled(format!("{desc:<24}"), theme::normal_style()));
            }
            Line::from(spans)
        })
        .collect()
}

/// One entry per distinct command, under its longest alias. One- and two-letter
/// shortcuts are left out.
fn command_lines() -> Vec<Line<'static>> {
    let mut by_description: std::collections::BTreeMap<&str, &str> = std::collections::BTreeMap::new();
    for (&name, cmd) in commands::COMMANDS.iter().filter(|(name, _)| name.len() > 2) {
        let entry = by_description.entry(cmd.description).or_insert(name);
        if name.len() > entry.len() {
            *entry = name;
        }
    }
    let mut entries: Vec<(&str, &str)> = by_description.into_iter().map(|(d, n)| (n, d)).collect();
    entries.sort_by_key(|(name, _)| *name);
    entries
        .into_iter()
        .map(|(name, desc)| {
            Line::from(vec![
                Span::styled(format!("  :{name:<12} "), Style::default().fg(theme::GREEN)),
                Span::styled(desc.to_string(), theme::normal_style()),
            ])
        })
        .collect()
}

fn render_help_overlay(f: &mut Frame, area: Rect) {
    let mut lines = vec![Line::from("")];
    for (heading, pairs) in KEY_HELP {
        lines.push(help_heading(heading));
        lines.extend(key_lines(pairs));
        lines.push(Line::from(""));
    }
    lines.push(help_heading("Commands"));
    lines.extend(command_lines());

    let popup_height = (lines.len() as u16 + 2).min(area.height.saturating_sub(2));
    let popup_width = 76.min(area.width.saturating_sub(4));
    let popup_area = Rect::new(
        area.x + area.width.saturating_sub(popup_width) / 2,
        area.y + area.height.saturating_sub(popup_height) / 2,
        popup_width,
        popup_height,
    );

    f.render_widget(Clear, popup_area);
    let help = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(" SubTrack Help ", theme::title_style()))
            .title_bottom(Span::styled(" any key closes ", theme::dim_style()))
            .border_style(Style::default().fg(theme::ACCENT))
            .style(Style::default().bg(theme::HEADER_BG)),
    );
    f.render_widget(help, popup_area);
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;
