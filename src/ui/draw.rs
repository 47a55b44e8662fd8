use anyhow::Result;
use ratatui::backend::Backend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::{Frame, Terminal};
// Use Popup from tui-widgets to render the open dropdown
use tui_widgets::popup::Popup;

use crate::config::RgbColor;

use super::app::App;

const HELP_OPEN: &str = "Type to filter  Up/Down: move  Enter: select  Esc: close";
const HELP_CLOSED: &str = "Enter: open  x: clear  q: quit";
const SELECTED_MARK: &str = "✓ ";
const QUERY_PROMPT: &str = "> ";

pub fn render<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    terminal.draw(|frame| draw_frame(frame, app))?;
    Ok(())
}

fn draw_frame(frame: &mut Frame<'_>, app: &mut App) {
    let size = frame.area();
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(size);

    draw_header(frame, layout[0], app);
    draw_field(frame, layout[1], app);
    draw_footer(frame, layout[3], app);
    draw_dropdown(frame, size, app);
}

fn draw_header(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let title = Span::styled(
        app.title.to_uppercase(),
        header_text_style(app).add_modifier(Modifier::BOLD),
    );
    frame.render_widget(Paragraph::new(Line::from(title)), area);
}

fn draw_field(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let style = if app.has_selection() {
        Style::default()
    } else {
        muted_style(app)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app));
    let text = Paragraph::new(Span::styled(format!("{} ▾", app.field_text()), style)).block(block);
    frame.render_widget(text, area);
}

fn draw_footer(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let help = if app.picker.is_open() {
        HELP_OPEN
    } else {
        HELP_CLOSED
    };
    let line = match &app.status {
        Some(status) => Line::from(vec![
            Span::styled(status.clone(), header_text_style(app)),
            Span::raw("  "),
            Span::styled(help, muted_style(app)),
        ]),
        None => Line::from(Span::styled(help, muted_style(app))),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_dropdown(frame: &mut Frame<'_>, area: Rect, app: &mut App) {
    if !app.picker.is_open() {
        return;
    }

    let mut width = area.width.saturating_mul(2).saturating_div(3);
    let min_width = area.width.min(40);
    if width < min_width {
        width = min_width;
    }
    if width > area.width {
        width = area.width;
    }

    // Query line, separator, then the list (or the empty state).
    let list_height = if app.rows.is_empty() { 2 } else { app.rows.len() };
    let max_list = area.height.saturating_sub(6).max(1) as usize;
    let content_height = 2 + list_height.min(max_list);

    let content_width = width.saturating_sub(2) as usize;
    let body_lines: Vec<Line> = (0..content_height)
        .map(|_| Line::from(" ".repeat(content_width)))
        .collect();

    let title_line = Line::from(Span::styled(app.title.clone(), header_text_style(app)));
    let popup = Popup::new(Text::from(body_lines))
        .title(title_line)
        .border_style(border_style(app));

    // Render popup using state so we can retrieve its area
    frame.render_stateful_widget_ref(popup, area, &mut app.modal_popup);

    let Some(popup_area) = *app.modal_popup.area() else {
        return;
    };
    let inner = Block::default().borders(Borders::ALL).inner(popup_area);
    if inner.width == 0 || inner.height < 2 {
        return;
    }

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    let query = Line::from(vec![
        Span::styled(QUERY_PROMPT, header_text_style(app)),
        Span::raw(app.query_input.value().to_string()),
    ]);
    frame.render_widget(Paragraph::new(query), layout[0]);
    let cursor_x = layout[0]
        .x
        .saturating_add((QUERY_PROMPT.len() + app.query_input.visual_cursor()) as u16);
    frame.set_cursor_position((cursor_x, layout[0].y));

    let separator = "─".repeat(inner.width as usize);
    frame.render_widget(
        Paragraph::new(Span::styled(separator, border_style(app))),
        layout[1],
    );

    if app.rows.is_empty() {
        draw_empty_state(frame, layout[2], app);
        return;
    }

    let items: Vec<ListItem> = app
        .rows
        .iter()
        .map(|row| {
            if !row.selectable() {
                return ListItem::new(Line::from(Span::styled(
                    row.text.clone(),
                    header_text_style(app).add_modifier(Modifier::BOLD),
                )));
            }
            let mark = if row.selected { SELECTED_MARK } else { "  " };
            let mut spans = vec![Span::raw(mark), Span::raw(row.text.clone())];
            if let Some(subtitle) = &row.subtitle {
                spans.push(Span::raw("  "));
                spans.push(Span::styled(subtitle.clone(), muted_style(app)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let mut state = ListState::default();
    state.select(app.highlighted_row);
    let list = List::new(items).highlight_style(selection_style(app));
    frame.render_stateful_widget(list, layout[2], &mut state);
}

fn draw_empty_state(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let mut lines = vec![Line::from(Span::styled(
        app.empty_message().to_string(),
        muted_style(app),
    ))];
    if let Some(text) = app.custom_candidate() {
        lines.push(Line::from(Span::styled(
            format!("+ Add \"{}\"", text),
            selection_style(app),
        )));
    }
    frame.render_widget(Paragraph::new(lines), area);
}

fn color(rgb: RgbColor) -> Color {
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}

fn selection_style(app: &App) -> Style {
    let colors = app.ui_colors();
    Style::default()
        .fg(color(colors.selection_fg))
        .bg(color(colors.selection_bg))
}

fn border_style(app: &App) -> Style {
    Style::default().fg(color(app.ui_colors().border))
}

fn header_text_style(app: &App) -> Style {
    Style::default().fg(color(app.ui_colors().header))
}

fn muted_style(app: &App) -> Style {
    Style::default().fg(color(app.ui_colors().muted))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::option::PickOption;
    use crate::picker::{Picker, PickerConfig};
    use ratatui::backend::TestBackend;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn open_dropdown_renders_options_inside_popup() {
        let config = Config::default();
        let options = vec![
            PickOption::new("NUST", "nust".to_string()),
            PickOption::new("FAST", "fast".to_string()),
        ];
        let picker = Picker::new(options, PickerConfig::default());
        let mut app = App::new(&config, "Universities", picker);

        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        render(&mut terminal, &mut app).unwrap();

        assert!(app.modal_popup.area().is_some());
        let text = screen_text(&terminal);
        assert!(text.contains("NUST"));
        assert!(text.contains("FAST"));
    }
}
