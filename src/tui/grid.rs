use crate::app::{AppState, FilterMode, Row, NARROW_WIDTH_THRESHOLD, QUICK_SELECT_MAX};
use crate::report::{format_age, BuildStatus, Case, CaseStatus, Commit, Module};
use chrono::Utc;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

pub fn render(f: &mut Frame, area: Rect, state: &AppState) {
    let narrow = area.width < NARROW_WIDTH_THRESHOLD;
    let inner_width = area.width.saturating_sub(2) as usize;

    if state.rows.is_empty() && !state.is_loading {
        let msg = match state.filter {
            FilterMode::FailingOnly => "No failing modules",
            FilterMode::All => "No results in report",
        };
        let para = Paragraph::new(msg)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::NONE));
        f.render_widget(para, area);
        return;
    }

    let Some(report) = &state.report else {
        return;
    };
    let shown = state.shown_commits();

    // Calculate visible window (scroll)
    let visible_height = area.height as usize;
    let scroll_offset = if state.cursor >= visible_height {
        state.cursor - visible_height + 1
    } else {
        0
    };

    // Count which visual module index each module_idx corresponds to
    // (for quick-select labels)
    let mut module_visual_idx: std::collections::HashMap<usize, usize> =
        std::collections::HashMap::new();
    let mut visual = 0;
    for row in &state.rows {
        if let Row::Module { module_idx, .. } = row {
            module_visual_idx.insert(*module_idx, visual);
            visual += 1;
        }
    }

    let mut lines: Vec<Line> = Vec::new();

    for (i, row) in state
        .rows
        .iter()
        .enumerate()
        .skip(scroll_offset)
        .take(visible_height)
    {
        let is_selected = i == state.cursor;
        let line = match row {
            Row::Build {
                commit_idx,
                expanded,
            } => match report.commits.get(*commit_idx) {
                Some(commit) => {
                    let marked = state.panels.build_cell_marked(&commit.id);
                    render_build_line(commit, marked, is_selected, *expanded, narrow, inner_width)
                }
                None => Line::raw(""),
            },
            Row::BuildDetail { line } => render_detail_line(line, 6),
            Row::Module {
                module_idx,
                expanded,
            } => match report.modules.get(*module_idx) {
                Some(module) => {
                    let marked = state.panels.module_row_marked(&module.id);
                    let vis_idx = module_visual_idx.get(module_idx).copied().unwrap_or(0);
                    render_module_line(
                        module,
                        shown,
                        vis_idx,
                        marked,
                        is_selected,
                        *expanded,
                        inner_width,
                    )
                }
                None => Line::raw(""),
            },
            Row::Case {
                module_idx,
                case_idx,
                expanded,
            } => match report
                .modules
                .get(*module_idx)
                .and_then(|m| m.cases.get(*case_idx))
            {
                Some(case) => {
                    let marked = state.panels.case_row_marked(&case.id);
                    render_case_line(case, shown, marked, is_selected, *expanded, inner_width)
                }
                None => Line::raw(""),
            },
            Row::CaseDetail { line } => render_detail_line(line, 10),
        };
        lines.push(line);
    }

    let grid = Paragraph::new(lines).block(Block::default().borders(Borders::NONE));
    f.render_widget(grid, area);
}

fn case_status_icon(status: CaseStatus) -> (&'static str, Color) {
    match status {
        CaseStatus::Passed => ("✓", Color::Green),
        CaseStatus::Failed => ("✗", Color::Red),
        CaseStatus::Errored => ("!", Color::Red),
        CaseStatus::Skipped => ("⊘", Color::DarkGray),
        CaseStatus::Unknown => ("·", Color::DarkGray),
    }
}

fn build_status_icon(status: BuildStatus) -> (&'static str, Color) {
    match status {
        BuildStatus::Succeeded => ("✓", Color::Green),
        BuildStatus::Failed => ("✗", Color::Red),
        BuildStatus::InProgress => ("⟳", Color::Yellow),
        BuildStatus::Unknown => ("·", Color::DarkGray),
    }
}

fn truncate(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        s.to_string()
    } else {
        let mut result = String::new();
        let mut width = 0;
        for c in s.chars() {
            let cw = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
            if width + cw + 1 > max_width {
                result.push('…');
                break;
            }
            result.push(c);
            width += cw;
        }
        result
    }
}

/// Per-commit status cells, newest commit first (one icon per shown commit).
fn status_cells(statuses: impl Iterator<Item = Option<CaseStatus>>) -> Vec<Span<'static>> {
    let mut spans = Vec::new();
    for status in statuses {
        let (icon, color) = match status {
            Some(s) => case_status_icon(s),
            None => ("·", Color::DarkGray),
        };
        spans.push(Span::styled(
            format!("{icon} "),
            Style::default().fg(color),
        ));
    }
    spans
}

fn render_build_line(
    commit: &Commit,
    marked: bool,
    is_selected: bool,
    expanded: bool,
    narrow: bool,
    max_width: usize,
) -> Line<'static> {
    let (icon, icon_color) = build_status_icon(commit.build.status);
    let arrow = if expanded { "▼" } else { "▶" };

    let id = commit.id.short().to_string();
    let age = format_age(commit.date, Utc::now());

    let prefix_width = 2 + 2 + id.len() + 2;
    let suffix_width = if narrow { 0 } else { age.len() + 1 };
    let subject_max = max_width.saturating_sub(prefix_width + suffix_width + 2);
    let subject = truncate(&commit.subject, subject_max);

    let select_style = if is_selected {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    };

    // The shown-details marker highlights the build cell
    let id_style = if marked {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let mut spans = vec![
        Span::styled(format!("{arrow} {icon} "), Style::default().fg(icon_color)),
        Span::styled(format!("{id} "), id_style),
        Span::styled(subject, select_style),
    ];

    if !narrow {
        spans.push(Span::styled(
            format!(" {age}"),
            Style::default().fg(Color::DarkGray),
        ));
        spans.push(Span::styled(
            format!(" {}", commit.author),
            Style::default().fg(Color::Blue),
        ));
    }

    Line::from(spans)
}

fn render_module_line(
    module: &Module,
    shown: &[Commit],
    visual_idx: usize,
    marked: bool,
    is_selected: bool,
    expanded: bool,
    max_width: usize,
) -> Line<'static> {
    let arrow = if expanded { "▼" } else { "▶" };
    let idx_label = if visual_idx < QUICK_SELECT_MAX {
        format!("{}", visual_idx + 1)
    } else {
        " ".to_string()
    };

    let cells = status_cells(shown.iter().map(|c| module.status_for(&c.id)));
    let cells_width = shown.len() * 2;

    let prefix_width = idx_label.len() + 2 + cells_width + 1;
    let name_max = max_width.saturating_sub(prefix_width);
    let name = truncate(module.id.as_str(), name_max);

    let mut name_style = if is_selected {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    };
    if marked {
        name_style = name_style.add_modifier(Modifier::BOLD);
    }

    let mut spans = vec![Span::styled(
        format!("{idx_label}{arrow} "),
        Style::default().fg(Color::DarkGray),
    )];
    spans.extend(cells);
    spans.push(Span::styled(name, name_style));

    Line::from(spans)
}

fn render_case_line(
    case: &Case,
    shown: &[Commit],
    marked: bool,
    is_selected: bool,
    expanded: bool,
    max_width: usize,
) -> Line<'static> {
    let arrow = if expanded { "▼" } else { "▶" };

    let cells = status_cells(shown.iter().map(|c| case.result_for(&c.id).map(|r| r.status)));
    let cells_width = shown.len() * 2;

    let args_hint = if case.tool_args.is_some() { " ⚙" } else { "" };
    let prefix_width = 4 + 2 + cells_width;
    let name_max = max_width.saturating_sub(prefix_width + args_hint.len());
    let name = truncate(&case.name, name_max);

    let mut name_style = if is_selected {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    };
    if marked {
        name_style = name_style.add_modifier(Modifier::BOLD);
    }

    let mut spans = vec![Span::styled(
        format!("    {arrow} "),
        Style::default().fg(Color::DarkGray),
    )];
    spans.extend(cells);
    spans.push(Span::styled(name, name_style));
    if !args_hint.is_empty() {
        spans.push(Span::styled(
            args_hint.to_string(),
            Style::default().fg(Color::DarkGray),
        ));
    }

    Line::from(spans)
}

fn render_detail_line(text: &str, indent: usize) -> Line<'static> {
    Line::from(Span::styled(
        format!("{:indent$}{text}", ""),
        Style::default().fg(Color::DarkGray),
    ))
}
