use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Paragraph},
    Frame,
};

use crate::ui::view::ChatView;

/// Rows taken by the entry field, borders included.
const INPUT_HEIGHT: u16 = 3;
/// Rows of the conversation block taken by its title.
const TITLE_ROWS: u16 = 1;

/// Split the frame into the conversation area and the entry field.
fn split_frame(area: Rect) -> [Rect; 2] {
    Layout::vertical([Constraint::Min(0), Constraint::Length(INPUT_HEIGHT)]).areas(area)
}

/// Text rows and columns left for the conversation once the frame is split.
pub fn conversation_viewport(area: Rect) -> (u16, u16) {
    let [conversation, _] = split_frame(area);
    (conversation.height.saturating_sub(TITLE_ROWS), conversation.width)
}

/// Largest scroll offset that still fills the conversation area of a frame.
pub fn max_scroll_offset(view: &ChatView, area: Rect) -> u16 {
    let (height, width) = conversation_viewport(area);
    view.wrapped_line_count(width).saturating_sub(height)
}

pub fn ui(f: &mut Frame, view: &mut ChatView) {
    let [conversation, input] = split_frame(f.area());
    let (height, width) = conversation_viewport(f.area());

    let lines = view.wrapped_lines(width);
    let rows = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    let scroll_offset = view.effective_scroll(rows.saturating_sub(height));

    let title_style = Style::default().add_modifier(Modifier::BOLD);
    let title = if view.is_pending() {
        format!("{} {}", view.title(), view.pulse_symbol())
    } else {
        view.title()
    };

    let messages = Paragraph::new(lines)
        .block(Block::default().title(title).title_style(title_style))
        .scroll((scroll_offset, 0));
    f.render_widget(messages, conversation);

    f.render_widget(view.input(), input);

    let area = input;
    if view.is_pending() && view.input_text().is_empty() && area.height > 2 && area.width > 2 {
        // Inside the borders of the entry field
        let inner = Rect {
            x: area.x + 1,
            y: area.y + 1,
            width: area.width - 2,
            height: 1,
        };
        let hint = Paragraph::new("Input disabled until the reply arrives")
            .style(Style::default().fg(Color::DarkGray));
        f.render_widget(hint, inner);
    }
}
