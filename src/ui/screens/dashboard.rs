use chrono::Datelike;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};
use rust_decimal::prelude::ToPrimitive;

use crate::ui::app::App;
use crate::ui::theme;
use crate::ui::util::{format_amount, format_money, format_short_date, truncate};

pub(crate) fn render(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Summary cards
            Constraint::Min(8),    // Breakdown + upcoming
        ])
        .split(area);

    render_summary_cards(f, chunks[0], app);

    let lower = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);

    render_category_chart(f, lower[0], app);
    render_upcoming(f, lower[1], app);
}

fn render_summary_cards(f: &mut Frame, area: Rect, app: &App) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(area);

    let summary = &app.summary;
    render_card(
        f,
        cards[0],
        "Subscriptions",
        summary.total_count.to_string(),
        theme::ACCENT,
        "tracked",
    );
    render_card(
        f,
        cards[1],
        "Active",
        summary.active_count.to_string(),
        theme::GREEN,
        &format!("{}% of total", summary.active_share_percent()),
    );
    render_card(
        f,
        cards[2],
        "Monthly Cost",
        format_amount(summary.normalized_monthly_cost),
        theme::YELLOW,
        &format!(
            "{} / year",
            format_amount(summary.yearly_cost())
        ),
    );
    render_card(
        f,
        cards[3],
        "Upcoming",
        summary.upcoming_renewals.len().to_string(),
        theme::PEACH,
        &format!("next {} days", app.window_days),
    );
}

fn render_card(f: &mut Frame, area: Rect, title: &str, value: String, color: Color, subtitle: &str) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::OVERLAY))
        .title(Span::styled(format!(" {title} "), theme::title_style()));

    let text = Paragraph::new(vec![
        Line::from(Span::styled(
            value,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(subtitle.to_string(), theme::dim_style())),
    ])
    .centered()
    .block(block);

    f.render_widget(text, area);
}

fn render_category_chart(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::OVERLAY))
        .title(Span::styled(" Monthly Cost by Category ", theme::title_style()));

    if app.summary.category_breakdown.is_empty() {
        let msg = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled("No active subscriptions", theme::dim_style())),
            Line::from(""),
            Line::from(Span::styled(
                "Add one with :add <name> <price> [frequency] [category]",
                theme::dim_style(),
            )),
        ])
        .centered()
        .block(block);
        f.render_widget(msg, area);
        return;
    }

    let bars: Vec<Bar> = app
        .summary
        .category_breakdown
        .iter()
        .map(|(name, amt)| {
            let share = app.summary.category_share_percent(*amt);
            Bar::default()
                .value(amt.round().to_u64().unwrap_or(0))
                .text_value(format!("{share}%"))
                .label(Line::from(truncate(name, 13)))
                .style(Style::default().fg(theme::ACCENT))
                .value_style(
                    Style::default()
                        .fg(theme::HEADER_BG)
                        .bg(theme::ACCENT)
                        .add_modifier(Modifier::BOLD),
                )
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(13)
        .bar_gap(1)
        .bar_style(Style::default().fg(theme::ACCENT))
        .value_style(Style::default().fg(theme::TEXT));

    f.render_widget(chart, area);
}

fn render_upcoming(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme::OVERLAY))
        .title(Span::styled(
            format!(" Upcoming Renewals ({} days) ", app.window_days),
            theme::title_style(),
        ));

    if app.summary.upcoming_renewals.is_empty() {
        let msg = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "Nothing renews in this window",
                theme::dim_style(),
            )),
        ])
        .centered()
        .block(block);
        f.render_widget(msg, area);
        return;
    }

    let header = Row::new(
        ["Date", "Name", "Price"]
            .iter()
            .map(|h| Cell::from(*h).style(theme::header_style())),
    );

    let year = app.today.year();
    let rows: Vec<Row> = app
        .summary
        .upcoming_renewals
        .iter()
        .enumerate()
        .map(|(i, sub)| {
            let days_left = sub
                .renewal_date
                .map(|d| (d - app.today).num_days())
                .unwrap_or_default();
            let date_style = if days_left <= 3 {
                Style::default().fg(theme::RED)
            } else {
                theme::normal_style()
            };
            Row::new(vec![
                Cell::from(Span::styled(format_short_date(sub.renewal_date, year), date_style)),
                Cell::from(truncate(&sub.name, 24)),
                Cell::from(format_money(sub.price, sub.currency)),
            ])
            .style(if i % 2 == 1 {
                theme::alt_row_style()
            } else {
                theme::normal_style()
            })
        })
        .collect();

    let widths = [
        Constraint::Length(12),
        Constraint::Min(12),
        Constraint::Length(12),
    ];
    f.render_widget(Table::new(rows, widths).header(header).block(block), area);
}
