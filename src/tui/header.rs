use crate::app::{AppState, FilterMode};
use crate::report::format_age;
use chrono::Utc;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

const SPINNER_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

fn spinner_char(idx: usize) -> char {
    SPINNER_FRAMES[idx % SPINNER_FRAMES.len()]
}

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let mut spans = vec![
        Span::styled(
            format!(
                " rtw v{}+{} ",
                env!("CARGO_PKG_VERSION"),
                env!("BUILD_NUMBER")
            ),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("│ "),
    ];

    match &state.report {
        Some(report) => {
            spans.push(Span::styled(
                report.project.clone(),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(
                format!(" [{} commits]", state.shown_commits().len()),
                Style::default().fg(Color::DarkGray),
            ));
            spans.push(Span::styled(
                format!(" updated {}", format_age(report.generated_at, Utc::now())),
                Style::default().fg(Color::DarkGray),
            ));
        }
        None => {
            spans.push(Span::styled(
                "loading report…",
                Style::default().fg(Color::DarkGray),
            ));
        }
    }

    // Filter indicator
    if state.filter == FilterMode::FailingOnly {
        spans.push(Span::styled(
            " [failing]",
            Style::default().fg(Color::Magenta),
        ));
    }

    // Loading spinner or reload countdown
    if state.is_loading {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            format!("{}", spinner_char(state.spinner_frame)),
            Style::default().fg(Color::Yellow),
        ));
    } else if state.next_poll_in > 0 {
        spans.push(Span::styled(
            format!(" {}s", state.next_poll_in),
            Style::default().fg(Color::DarkGray),
        ));
    }

    // Error indicator
    if state.error_message().is_some() {
        spans.push(Span::raw(" "));
        spans.push(Span::styled(
            "!",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray)),
    );

    f.render_widget(header, area);
}
