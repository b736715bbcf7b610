mod components;

use std::sync::OnceLock;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::app::{App, Field, Popup, Side};
use crate::card::{FetchStatus, Flag};
use crate::currency::flags::flag_emoji;
use crate::exchange::conversion::PENDING_MESSAGE;
use crate::theme::Theme;
use components::{button, centered_rect, field_block};

// Palette is fixed for the lifetime of the process
static THEME: OnceLock<Theme> = OnceLock::new();

/// Install the palette from config. Later calls are ignored.
pub fn init_theme(theme: Theme) {
    let _ = THEME.set(theme);
}

fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::default)
}

fn accent() -> Color { theme().accent }
fn success() -> Color { theme().success }
fn danger() -> Color { theme().danger }
fn text() -> Color { theme().text }
fn text_dim() -> Color { theme().text_dim }
fn inactive() -> Color { theme().inactive }

/// Spinner frames for an in-flight fetch
const SPINNER: [&str; 4] = ["◐", "◓", "◑", "◒"];

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();

    // Keep the card narrow on wide terminals
    let card_width = area.width.min(64);
    let card_area = Rect {
        x: area.x + (area.width - card_width) / 2,
        y: area.y,
        width: card_width,
        height: area.height,
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),  // Info line
            Constraint::Min(20),    // Card
            Constraint::Length(1),  // Footer
        ])
        .split(card_area);

    draw_info_line(f, app, chunks[0]);
    draw_card(f, app, chunks[1]);
    draw_footer(f, app, chunks[2]);

    match app.popup {
        Popup::None => {}
        Popup::Picker => draw_picker(f, app),
        Popup::Help => draw_help_popup(f),
    }
}

fn draw_info_line(f: &mut Frame, app: &App, area: Rect) {
    let line = if let Some(ref status) = app.status_message {
        Line::from(Span::styled(status.as_str(), Style::default().fg(accent())))
    } else if let Some(updated) = app.card.last_updated() {
        Line::from(Span::styled(format!("Rates updated {}", updated), Style::default().fg(text_dim())))
    } else {
        Line::from(Span::styled("Ready", Style::default().fg(text_dim())))
    };

    f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn draw_card(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(Span::styled(
            " Currency Converter ",
            Style::default().fg(accent()).add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(inactive()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),  // Amount
            Constraint::Length(3),  // From / swap / To
            Constraint::Length(2),  // Flag images
            Constraint::Length(3),  // Result
            Constraint::Length(3),  // Check button
            Constraint::Min(0),
        ])
        .split(inner);

    draw_amount(f, app, rows[0]);
    draw_selectors(f, app, rows[1]);
    draw_flag_urls(f, app, rows[2]);
    draw_result(f, app, rows[3]);
    f.render_widget(button("Check Exchange Rate", app.field == Field::Check), rows[4]);
}

fn draw_amount(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.field == Field::Amount && app.popup == Popup::None;
    let cursor = if focused { "_" } else { "" };

    let amount = Paragraph::new(Line::from(vec![
        Span::styled(app.card.amount(), Style::default().fg(text())),
        Span::styled(cursor, Style::default().fg(accent())),
    ]))
    .block(field_block("Enter Amount", focused));

    f.render_widget(amount, area);
}

fn draw_selectors(f: &mut Frame, app: &App, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(45),
            Constraint::Percentage(10),
            Constraint::Percentage(45),
        ])
        .split(area);

    draw_selector(f, "From", app.card.from_currency().code(), &app.card.from_flag(), app.field == Field::From, cols[0]);
    draw_swap(f, app.field == Field::Swap, cols[1]);
    draw_selector(f, "To", app.card.to_currency().code(), &app.card.to_flag(), app.field == Field::To, cols[2]);
}

fn draw_selector(f: &mut Frame, title: &str, code: &str, flag: &Flag, focused: bool, area: Rect) {
    let emoji = flag.emoji.as_deref().unwrap_or(flag.country_code);
    let arrows = if focused { " ▲▼" } else { "" };

    let line = Line::from(vec![
        Span::raw(format!("{} ", emoji)),
        Span::styled(code.to_string(), Style::default().fg(text()).add_modifier(Modifier::BOLD)),
        Span::styled(arrows, Style::default().fg(accent())),
    ]);

    let selector = Paragraph::new(line).block(field_block(title, focused));
    f.render_widget(selector, area);
}

fn draw_flag_urls(f: &mut Frame, app: &App, area: Rect) {
    // A code without a flag entry gets no image reference at all
    let lines: Vec<Line> = [("From", app.card.from_flag()), ("To", app.card.to_flag())]
        .into_iter()
        .filter_map(|(label, flag)| {
            flag.image_url.map(|url| {
                Line::from(vec![
                    Span::styled(format!("{:>4} flag ", label), Style::default().fg(inactive())),
                    Span::styled(url, Style::default().fg(text_dim())),
                ])
            })
        })
        .collect();

    f.render_widget(Paragraph::new(lines), area);
}

fn draw_swap(f: &mut Frame, focused: bool, area: Rect) {
    let style = if focused {
        Style::default().fg(accent()).add_modifier(Modifier::BOLD | Modifier::REVERSED)
    } else {
        Style::default().fg(accent())
    };

    let swap = Paragraph::new(vec![Line::from(""), Line::from(Span::styled("⇄", style))])
        .alignment(Alignment::Center);
    f.render_widget(swap, area);
}

fn draw_result(f: &mut Frame, app: &App, area: Rect) {
    let result = app.card.exchange_rate().unwrap_or(PENDING_MESSAGE);
    let color = match app.card.status() {
        FetchStatus::Error => danger(),
        FetchStatus::Success => success(),
        FetchStatus::Idle | FetchStatus::Fetching => text(),
    };

    let mut spans = Vec::new();
    if app.card.is_fetching() {
        let frame = (std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() / 150)
            .unwrap_or(0) as usize)
            % SPINNER.len();
        spans.push(Span::styled(format!("{} ", SPINNER[frame]), Style::default().fg(accent())));
    }
    spans.push(Span::styled(result, Style::default().fg(color).add_modifier(Modifier::BOLD)));

    let widget = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(inactive())));
    f.render_widget(widget, area);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let hints: &[(&str, &str)] = match app.popup {
        Popup::Picker => &[("type", "filter"), ("↑↓", "move"), ("Enter", "select"), ("Esc", "cancel")],
        Popup::Help => &[("Esc", "close")],
        Popup::None => match app.field {
            Field::Amount => &[("0-9.", "amount"), ("Tab", "next"), ("Enter", "check"), ("s", "swap"), ("?", "help"), ("q", "quit")],
            Field::From | Field::To => &[("↑↓", "currency"), ("Enter", "pick"), ("Tab", "next"), ("s", "swap"), ("q", "quit")],
            Field::Swap | Field::Check => &[("Enter", "press"), ("Tab", "next"), ("r", "refresh"), ("?", "help"), ("q", "quit")],
        },
    };

    let mut spans = Vec::new();
    for (i, (key, label)) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" │ ", Style::default().fg(inactive())));
        }
        spans.push(Span::styled(*key, Style::default().fg(accent())));
        spans.push(Span::styled(format!(" {}", label), Style::default().fg(text_dim())));
    }

    f.render_widget(Paragraph::new(Line::from(spans)).alignment(Alignment::Center), area);
}

fn draw_picker(f: &mut Frame, app: &App) {
    let popup_area = centered_rect(50, 70, f.area());
    f.render_widget(Clear, popup_area);

    let title = match app.picker.side {
        Side::From => " From currency ",
        Side::To => " To currency ",
    };
    let block = Block::default()
        .title(Span::styled(title, Style::default().fg(accent()).add_modifier(Modifier::BOLD)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent()));
    let inner = block.inner(popup_area);
    f.render_widget(block, popup_area);

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(inner);

    let filter = Paragraph::new(Line::from(vec![
        Span::styled(" Filter: ", Style::default().fg(text_dim())),
        Span::styled(app.picker.filter.as_str(), Style::default().fg(text())),
        Span::styled("_", Style::default().fg(accent())),
    ]));
    f.render_widget(filter, parts[0]);

    let matches = app.picker_matches();
    if matches.is_empty() {
        let empty = Paragraph::new(Span::styled("  No matching currency", Style::default().fg(text_dim())));
        f.render_widget(empty, parts[1]);
        return;
    }

    // Scroll so the selection stays visible
    let visible = parts[1].height as usize;
    let offset = app.picker.selected.saturating_sub(visible.saturating_sub(1));

    let rows: Vec<Row> = matches
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible)
        .map(|(i, currency)| {
            let style = if i == app.picker.selected {
                Style::default().fg(accent()).add_modifier(Modifier::REVERSED)
            } else {
                Style::default().fg(text())
            };
            let emoji = flag_emoji(currency.flag_code()).unwrap_or_default();
            Row::new(vec![
                Span::raw(emoji),
                Span::raw(currency.code()),
                Span::styled(currency.flag_code(), Style::default().fg(text_dim())),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(rows, [Constraint::Length(4), Constraint::Length(6), Constraint::Min(2)]);
    f.render_widget(table, parts[1]);
}

fn draw_help_popup(f: &mut Frame) {
    let area = f.area();
    let popup_area = centered_rect(
        if area.width < 80 { 95 } else { 60 },
        if area.height < 30 { 95 } else { 70 },
        area,
    );

    f.render_widget(Clear, popup_area);

    let section = |title: &'static str| {
        Line::from(Span::styled(title, Style::default().fg(danger()).add_modifier(Modifier::BOLD)))
    };
    let key = |k: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", k), Style::default().fg(accent())),
            Span::raw(desc),
        ])
    };

    let help_text = vec![
        section("═══ Navigation ═══"),
        key("Tab", "Next field (Amount → From → Swap → To → Check)"),
        key("Shift+Tab", "Previous field"),
        Line::from(""),
        section("═══ Converting ═══"),
        key("0-9 .", "Edit the amount (Amount field)"),
        key("↑/↓ j/k", "Change the focused currency"),
        key("Enter", "Pick a currency / press a button"),
        key("s", "Swap From and To"),
        key("r", "Check exchange rate again"),
        Line::from(""),
        section("═══ Setup ═══"),
        Line::from(vec![
            Span::raw("  API key: "),
            Span::styled("FXCARD_API_KEY", Style::default().fg(accent())),
            Span::raw(" or api_key in config.toml"),
        ]),
        Line::from(vec![
            Span::raw("  Logs:    "),
            Span::styled("RUST_LOG=debug", Style::default().fg(accent())),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", Style::default().fg(text_dim())),
            Span::styled("Esc", Style::default().fg(accent())),
            Span::styled(" to close", Style::default().fg(text_dim())),
        ]),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(Span::styled(" fxcard Help ", Style::default().fg(accent())))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent())),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(help, popup_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::ConverterCard;
    use crate::currency::Currency;
    use crate::exchange::{RateClient, DEFAULT_TIMEOUT};
    use ratatui::{backend::TestBackend, Terminal};

    fn render(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn app() -> App {
        let client = RateClient::new("http://unused", None, DEFAULT_TIMEOUT).unwrap();
        let card = ConverterCard::new(
            client,
            "https://f.io",
            "25",
            Currency::parse("USD").unwrap(),
            Currency::parse("KES").unwrap(),
        );
        App::new(card)
    }

    #[test]
    fn test_card_shows_state() {
        let screen = render(&app());

        assert!(screen.contains("Currency Converter"));
        assert!(screen.contains("25"));
        assert!(screen.contains("USD"));
        assert!(screen.contains("KES"));
        assert!(screen.contains("https://f.io/US/shiny/64.png"));
        assert!(screen.contains(PENDING_MESSAGE));
        assert!(screen.contains("Check Exchange Rate"));
    }

    #[test]
    fn test_help_popup_renders() {
        let mut app = app();
        app.popup = Popup::Help;
        let screen = render(&app);

        assert!(screen.contains("fxcard Help"));
        assert!(screen.contains("FXCARD_API_KEY"));
    }
}
