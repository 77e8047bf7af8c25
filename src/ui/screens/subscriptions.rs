use chrono::Datelike;
use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_money, format_short_date, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    if app.subscriptions.is_empty() {
        let msg = if !app.search_input.is_empty() {
            vec![
                Line::from(""),
                Line::from(Span::styled(
                    format!("No subscriptions matching '{}'", app.search_input),
                    theme::dim_style(),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "Press Esc to clear the search",
                    theme::dim_style(),
                )),
            ]
        } else {
            vec![
                Line::from(""),
                Line::from(Span::styled("No subscriptions yet", theme::dim_style())),
                Line::from(""),
                Line::from(Span::styled(
                    "Add one with :add <name> <price> [frequency] [category] or :import <file>",
                    theme::dim_style(),
                )),
            ]
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::OVERLAY))
            .title(Span::styled(" Subscriptions (0) ", theme::title_style()));
        f.render_widget(Paragraph::new(msg).centered().block(block), area);
        return;
    }

    let header_cells = ["Name", "Price", "Frequency", "Category", "Status", "Renews"]
        .iter()
        .map(|h| Cell::from(*h).style(theme::header_style()));
    let header = Row::new(header_cells).height(1);

    let year = app.today.year();
    let rows: Vec<Row> = app
        .subscriptions
        .iter()
        .enumerate()
        .skip(app.subscription_scroll)
        .take(area.height.saturating_sub(3) as usize)
        .map(|(i, sub)| {
            let style = if i == app.subscription_index {
                theme::selected_style()
            } else if i % 2 == 1 {
                theme::alt_row_style()
            } else {
                theme::normal_style()
            };

            let status = sub.status.map(|s| s.as_str()).unwrap_or("—");
            let status_cell = if i == app.subscription_index {
                Cell::from(status)
            } else {
                Cell::from(Span::styled(status, theme::status_style(sub.status)))
            };

            Row::new(vec![
                Cell::from(truncate(&sub.name, 32)),
                Cell::from(format_money(sub.price, sub.currency)),
                Cell::from(sub.frequency.map(|f| f.as_str()).unwrap_or("—")),
                Cell::from(sub.category_label()),
                status_cell,
                Cell::from(format_short_date(sub.renewal_date, year)),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Min(20),
        Constraint::Length(14),
        Constraint::Length(10),
        Constraint::Length(14),
        Constraint::Length(10),
        Constraint::Length(12),
    ];

    let title = if app.search_input.is_empty() {
        format!(" Subscriptions ({}) ", app.subscriptions.len())
    } else {
        format!(
            " Subscriptions ({}) search: '{}' ",
            app.subscriptions.len(),
            app.search_input
        )
    };

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme::OVERLAY))
            .title(Span::styled(title, theme::title_style())),
    );

    f.render_widget(table, area);
}
