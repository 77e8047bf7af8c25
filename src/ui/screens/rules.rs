use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::ui::app::App;
use crate::ui::theme;

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::OVERLAY));

    if app.rules.is_empty() {
        let msg = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "No categorization rules yet",
                theme::dim_style(),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Add rules with :rule <pattern> <category>",
                theme::dim_style(),
            )),
            Line::from(Span::styled(
                "e.g. :rule spotify entertainment",
                Style::default().fg(theme::ACCENT),
            )),
        ])
        .centered()
        .block(block.title(Span::styled(" Category Rules ", theme::title_style())));
        f.render_widget(msg, area);
        return;
    }

    let header_cells = ["Pattern", "Category", "Type", "Priority"]
        .iter()
        .map(|h| Cell::from(*h).style(theme::header_style()));
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = app
        .rules
        .iter()
        .enumerate()
        .skip(app.rule_scroll)
        .take(area.height.saturating_sub(3) as usize)
        .map(|(i, rule)| {
            let style = if i == app.rule_index {
                theme::selected_style()
            } else if i % 2 == 1 {
                theme::alt_row_style()
            } else {
                theme::normal_style()
            };

            Row::new(vec![
                Cell::from(rule.pattern.as_str()),
                Cell::from(rule.category.as_str()),
                Cell::from(if rule.is_regex { "regex" } else { "contains" }),
                Cell::from(rule.priority.to_string()),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Min(20),
        Constraint::Length(16),
        Constraint::Length(10),
        Constraint::Length(9),
    ];

    let table = Table::new(rows, widths).header(header).block(block.title(Span::styled(
        format!(
            " Rules ({}) | :rule <pattern> <category> to add ",
            app.rules.len()
        ),
        theme::title_style(),
    )));
    f.render_widget(table, area);
}
