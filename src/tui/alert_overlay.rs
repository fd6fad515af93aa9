use crate::app::ToolArgsOverlay;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

/// The blocking modal showing the tool arguments of a case. Input is
/// swallowed until it is dismissed.
pub fn render(f: &mut Frame, overlay: &ToolArgsOverlay) {
    let area = f.area();

    let width = (area.width * 6 / 10).max(30).min(area.width);
    let inner_width = width.saturating_sub(2).max(1) as usize;

    // Height estimate from the wrapped argument string, +2 border +1 hint
    let args_width = UnicodeWidthStr::width(overlay.args.as_str());
    let body_lines = (args_width / inner_width + 1).min(u16::MAX as usize - 3) as u16;
    let height = body_lines.saturating_add(3).max(5).min(area.height);

    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let overlay_area = Rect::new(x, y, width, height);

    f.render_widget(Clear, overlay_area);

    let title = format!(" {} ", overlay.case_name);
    let hints = " a/q/Esc close ";

    let block = Block::default()
        .title(title)
        .title_bottom(Line::from(hints).centered())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .style(Style::default().bg(Color::Black));

    let paragraph = Paragraph::new(overlay.args.clone())
        .style(Style::default().fg(Color::White))
        .wrap(Wrap { trim: false })
        .block(block);
    f.render_widget(paragraph, overlay_area);
}
