//! UI Components Module
//!
//! Reusable pieces drawn around and over the main view.
//!
//! # Components
//!
//! - **Bottom Bar**: Status line on the left, keyboard shortcuts on the right
//! - **Input Overlay**: Spotlight-style bar for the filter, a new name or an import path
//! - **Confirm Dialog**: Centered yes/no prompt before deleting a snippet

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::{Block, BorderType, Clear, Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, InputMode};
use crate::ui::colors::RosePine;

pub fn render_bottom_bar(frame: &mut Frame, area: Rect, app: &App) {
    let navbar_chunks = Layout::horizontal([Constraint::Fill(1), Constraint::Fill(2)]).split(area);

    let left_content = Paragraph::new(status_line(app))
        .alignment(Alignment::Left)
        .block(
            Block::bordered()
                .border_type(BorderType::Rounded)
                .style(Style::default().fg(RosePine::HIGHLIGHT_HIGH)),
        );

    let right_content = Paragraph::new(context_shortcuts(app))
        .alignment(Alignment::Right)
        .style(Style::default().fg(RosePine::MUTED))
        .block(
            Block::bordered()
                .border_type(BorderType::Rounded)
                .style(Style::default().fg(RosePine::HIGHLIGHT_HIGH)),
        );

    left_content.render(navbar_chunks[0], frame.buffer_mut());
    right_content.render(navbar_chunks[1], frame.buffer_mut());
}

fn status_line(app: &App) -> Line<'static> {
    let mut spans = vec![Span::styled(
        format!(" {} ", app.session.translator.language().code().to_uppercase()),
        Style::default().fg(RosePine::BASE).bg(RosePine::IRIS),
    )];

    if app.session.runner.is_running() {
        spans.push(Span::styled(
            format!(" {} ", app.t("running")),
            Style::default().fg(RosePine::GOLD),
        ));
    }

    if app.session.store.is_dirty() {
        spans.push(Span::styled(" ⚠ ", Style::default().fg(RosePine::LOVE)));
    }

    if let Some(status) = &app.status {
        let color = if status.is_error {
            RosePine::LOVE
        } else {
            RosePine::FOAM
        };
        spans.push(Span::styled(
            format!(" {}", status.text),
            Style::default().fg(color),
        ));
    }

    Line::from(spans)
}

fn context_shortcuts(app: &App) -> String {
    match app.input_mode {
        InputMode::Filter | InputMode::Rename | InputMode::ImportPath => {
            " [⏎] Confirm │ [Esc] Cancel ".to_string()
        }
        InputMode::ConfirmDelete => format!(" {} ", app.t("confirmHint")),
        InputMode::Normal => format!(
            " [n] {} │ [e] {} │ [r] {} │ [^S] {} │ [^R] {} │ [d] {} │ [x] {} │ [/] {} │ [K/J] {} │ [E] {} │ [i] {} │ [L] {} │ [q] {} ",
            app.t("new"),
            app.t("edit"),
            app.t("rename"),
            app.t("save"),
            app.t("run"),
            app.t("duplicate"),
            app.t("delete"),
            app.t("search"),
            app.t("reorder"),
            app.t("export"),
            app.t("import"),
            app.t("language"),
            app.t("quit"),
        ),
    }
}

pub fn render_input_overlay(frame: &mut Frame, area: Rect, app: &App) {
    let popup_area = spotlight_bar(70, area);

    Clear.render(popup_area, frame.buffer_mut());

    let (title_text, input_text, placeholder) = match app.input_mode {
        InputMode::Filter => (app.t("search"), app.filter.as_str(), app.t("searchPlaceholder")),
        InputMode::Rename => (
            app.t("nameLabel"),
            app.input_buffer.as_str(),
            app.t("namePlaceholder"),
        ),
        _ => (
            app.t("importPathPrompt"),
            app.input_buffer.as_str(),
            String::new(),
        ),
    };

    let block = Block::bordered()
        .border_type(BorderType::Rounded)
        .style(Style::default().fg(RosePine::SUBTLE).bg(RosePine::SURFACE));
    let inner_area = block.inner(popup_area);
    block.render(popup_area, frame.buffer_mut());

    let chunks = Layout::horizontal([
        Constraint::Length(title_text.width() as u16 + 3),
        Constraint::Min(10),
    ])
    .split(inner_area);

    Paragraph::new(format!(" {title_text}"))
        .alignment(Alignment::Left)
        .style(Style::default().fg(RosePine::IRIS).bold())
        .render(chunks[0], frame.buffer_mut());

    let input = if input_text.is_empty() {
        Paragraph::new(placeholder).style(Style::default().fg(RosePine::MUTED).italic())
    } else {
        Paragraph::new(format!("{input_text}▏")).style(Style::default().fg(RosePine::TEXT))
    };
    input.render(chunks[1], frame.buffer_mut());
}

pub fn render_confirm_dialog(frame: &mut Frame, area: Rect, app: &App) {
    let name = app
        .active_snippet()
        .map(|s| s.name.clone())
        .unwrap_or_default();
    let question = app
        .session
        .translator
        .t_with("deleteConfirmation", &[("name", &name)]);

    let popup_width = (question.width() as u16 + 8).max(30).min(area.width);
    let popup_height = 5;
    let popup_area = Rect::new(
        area.x + (area.width.saturating_sub(popup_width)) / 2,
        area.y + (area.height.saturating_sub(popup_height)) / 2,
        popup_width,
        popup_height.min(area.height),
    );

    Clear.render(popup_area, frame.buffer_mut());

    let block = Block::bordered()
        .title(format!(" {} ", app.t("delete")))
        .title_alignment(Alignment::Center)
        .border_type(BorderType::Rounded)
        .style(Style::default().fg(RosePine::LOVE).bg(RosePine::SURFACE));

    let text = vec![
        Line::from(Span::styled(question, Style::default().fg(RosePine::TEXT).bold())),
        Line::from(""),
        Line::from(Span::styled(
            app.t("confirmHint"),
            Style::default().fg(RosePine::SUBTLE),
        )),
    ];

    Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(block)
        .render(popup_area, frame.buffer_mut());
}

fn spotlight_bar(width_percent: u16, r: Rect) -> Rect {
    let layout = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(1),
    ])
    .split(r);

    Layout::horizontal([
        Constraint::Percentage((100 - width_percent) / 2),
        Constraint::Percentage(width_percent),
        Constraint::Percentage((100 - width_percent) / 2),
    ])
    .split(layout[1])[1]
}
