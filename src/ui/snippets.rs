use console_rules::highlight::token_lines;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::{
        Block, BorderType, List, ListItem, ListState, Paragraph, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Widget,
    },
};

use crate::app::{App, InputMode};
use crate::ui::colors::{RosePine, token_color};
use crate::ui::components::{render_bottom_bar, render_confirm_dialog, render_input_overlay};

pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();
    let chunks = Layout::vertical([Constraint::Fill(1), Constraint::Length(3)]).split(area);
    let panes =
        Layout::horizontal([Constraint::Percentage(35), Constraint::Percentage(65)]).split(chunks[0]);

    // Output pane sized to what the last run printed, at most a third of the height.
    let output_height = if app.run_output.is_empty() {
        0
    } else {
        (app.run_output.len() as u16 + 2).min(panes[1].height / 3)
    };
    let right = Layout::vertical([Constraint::Fill(1), Constraint::Length(output_height)])
        .split(panes[1]);
    app.content_height = right[0].height.saturating_sub(2) as usize;

    render_snippet_list(frame, panes[0], app);
    render_editor(frame, right[0], app);
    if output_height > 0 {
        render_run_output(frame, right[1], app);
    }
    render_bottom_bar(frame, chunks[1], app);

    match app.input_mode {
        InputMode::Rename | InputMode::ImportPath | InputMode::Filter => {
            render_input_overlay(frame, area, app)
        }
        InputMode::ConfirmDelete => render_confirm_dialog(frame, area, app),
        InputMode::Normal => {}
    }
}

fn render_snippet_list(frame: &mut Frame, area: Rect, app: &App) {
    let visible = app.visible_snippets();
    let total = app.session.store.len();

    let title = if app.filter.trim().is_empty() {
        format!(" {} ({total}) ", app.t("savedSnippets"))
    } else {
        format!(
            " {} ({}/{total}) │ /{} ",
            app.t("savedSnippets"),
            visible.len(),
            app.filter
        )
    };

    let block = Block::bordered()
        .title(title)
        .title_alignment(Alignment::Left)
        .border_type(BorderType::Rounded)
        .style(Style::default().fg(RosePine::HIGHLIGHT_HIGH));
    let inner_area = block.inner(area);
    block.render(area, frame.buffer_mut());

    if visible.is_empty() {
        let empty = Paragraph::new(app.t("noSnippets"))
            .alignment(Alignment::Center)
            .style(Style::default().fg(RosePine::MUTED).italic());
        empty.render(inner_area, frame.buffer_mut());
        return;
    }

    let items: Vec<ListItem> = visible
        .iter()
        .map(|snippet| {
            let content = Line::from(vec![
                Span::styled(snippet.name.clone(), Style::default().fg(RosePine::TEXT)),
                Span::styled(
                    format!("  {}", snippet.formatted_time()),
                    Style::default().fg(RosePine::MUTED),
                ),
            ]);
            ListItem::new(content)
        })
        .collect();

    let list = List::new(items)
        .highlight_style(Style::default().fg(RosePine::BASE).bg(RosePine::IRIS).bold())
        .highlight_symbol("▶ ");

    let mut list_state = ListState::default();
    list_state.select(app.active_visible_index());

    frame.render_stateful_widget(list, inner_area, &mut list_state);
}

fn render_editor(frame: &mut Frame, area: Rect, app: &App) {
    let modified = if app.is_modified() { " ●" } else { "" };
    let title = if app.active_id.is_some() {
        format!(" {}{modified} ", app.draft_name)
    } else {
        format!(" {} ", app.t("codeLabel"))
    };

    let block = Block::bordered()
        .title(title)
        .title_alignment(Alignment::Left)
        .border_type(BorderType::Rounded)
        .style(Style::default().fg(RosePine::HIGHLIGHT_HIGH).bg(RosePine::SURFACE));
    let inner_area = block.inner(area);
    block.render(area, frame.buffer_mut());

    if app.active_id.is_none() {
        return;
    }

    if app.draft_code.is_empty() {
        let placeholder = Paragraph::new(app.t("codePlaceholder"))
            .style(Style::default().fg(RosePine::MUTED).italic());
        placeholder.render(inner_area, frame.buffer_mut());
        return;
    }

    render_highlighted_code(frame, inner_area, app);
}

fn render_highlighted_code(frame: &mut Frame, area: Rect, app: &App) {
    let lines = token_lines(&app.draft_code);
    let total_lines = lines.len();
    let visible_lines = area.height as usize;
    let gutter = total_lines.to_string().len();

    let max_scroll = total_lines.saturating_sub(visible_lines);
    let scroll_position = app.content_scroll_position.min(max_scroll);

    let content_area = Rect {
        width: area.width.saturating_sub(1),
        ..area
    };
    let scrollbar_area = Rect {
        x: area.x + area.width.saturating_sub(1),
        y: area.y,
        width: 1,
        height: area.height,
    };

    let styled_lines: Vec<Line> = lines
        .iter()
        .enumerate()
        .skip(scroll_position)
        .take(visible_lines)
        .map(|(number, tokens)| {
            let mut spans = vec![Span::styled(
                format!("{:>gutter$} ", number + 1),
                Style::default().fg(RosePine::HIGHLIGHT_HIGH),
            )];
            spans.extend(tokens.iter().map(|token| {
                Span::styled(
                    token.text.replace('\t', "    "),
                    Style::default().fg(token_color(token.kind)),
                )
            }));
            Line::from(spans)
        })
        .collect();

    Paragraph::new(styled_lines)
        .style(Style::default().bg(RosePine::SURFACE))
        .render(content_area, frame.buffer_mut());

    if total_lines > visible_lines {
        let mut scrollbar_state = ScrollbarState::default()
            .content_length(total_lines)
            .position(scroll_position);

        let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
            .style(Style::default().fg(RosePine::SUBTLE))
            .thumb_style(Style::default().fg(RosePine::HIGHLIGHT_HIGH));

        frame.render_stateful_widget(scrollbar, scrollbar_area, &mut scrollbar_state);
    }
}

/// Shows the tail of what the last run printed.
fn render_run_output(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::bordered()
        .title(format!(" {} ", app.t("output")))
        .title_alignment(Alignment::Left)
        .border_type(BorderType::Rounded)
        .style(Style::default().fg(RosePine::HIGHLIGHT_HIGH));
    let inner_area = block.inner(area);
    block.render(area, frame.buffer_mut());

    let skip = app.run_output.len().saturating_sub(inner_area.height as usize);
    let lines: Vec<Line> = app
        .run_output
        .iter()
        .skip(skip)
        .map(|line| match line.strip_prefix('⇒') {
            Some(result) => Line::from(vec![
                Span::styled("⇒", Style::default().fg(RosePine::FOAM)),
                Span::styled(result.to_string(), Style::default().fg(RosePine::TEXT)),
            ]),
            None => Line::styled(line.clone(), Style::default().fg(RosePine::SUBTLE)),
        })
        .collect();

    Paragraph::new(lines).render(inner_area, frame.buffer_mut());
}
