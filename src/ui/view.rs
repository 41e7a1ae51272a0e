//! State of the full-screen chat window.
//!
//! Only the UI loop touches a [`ChatView`]; background workers reach it through
//! queued events.

use std::time::Instant;

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders};
use tui_textarea::TextArea;

use crate::ui::wrapping::wrap_lines;

pub const THINKING_PLACEHOLDER: &str = "Assistant is thinking...";

const INPUT_TITLE: &str = "Type your message (Enter to send, PgUp/PgDn to scroll, Esc or Ctrl+C to quit)";
const WAITING_TITLE: &str = "Waiting for the reply...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    User,
    Assistant,
    Pending,
    Notice,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub kind: EntryKind,
    pub text: String,
}

pub struct ChatView {
    model: String,
    entries: Vec<Entry>,
    input: TextArea<'static>,
    pending: bool,
    received_chars: usize,
    pulse_start: Instant,
    scroll_offset: u16,
    auto_scroll: bool,
    exit_requested: bool,
}

impl ChatView {
    pub fn new(model: impl Into<String>) -> Self {
        let mut view = Self {
            model: model.into(),
            entries: Vec::new(),
            input: TextArea::default(),
            pending: false,
            received_chars: 0,
            pulse_start: Instant::now(),
            scroll_offset: 0,
            auto_scroll: true,
            exit_requested: false,
        };
        view.refresh_input_chrome();
        view
    }

    pub fn title(&self) -> String {
        format!("Chat with {}", self.model)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn input(&self) -> &TextArea<'static> {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut TextArea<'static> {
        &mut self.input
    }

    pub fn input_text(&self) -> String {
        self.input.lines().join("\n")
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn received_chars(&self) -> usize {
        self.received_chars
    }

    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    /// Take the typed question, clearing the entry field.
    ///
    /// Returns `None` while a reply is pending or when the entry is blank.
    pub fn take_submission(&mut self) -> Option<String> {
        if self.pending {
            return None;
        }
        let text = self.input_text().trim().to_string();
        if text.is_empty() {
            return None;
        }
        self.input = TextArea::default();
        self.refresh_input_chrome();
        Some(text)
    }

    /// Show the question and the thinking placeholder; disable the entry field.
    pub fn begin_turn(&mut self, question: &str) {
        self.push(EntryKind::User, question.to_string());
        self.push(EntryKind::Pending, THINKING_PLACEHOLDER.to_string());
        self.pending = true;
        self.received_chars = 0;
        self.pulse_start = Instant::now();
        self.refresh_input_chrome();
    }

    pub fn record_progress(&mut self, chars: usize) {
        if self.pending {
            self.received_chars += chars;
        }
    }

    /// Replace the placeholder with the reply and re-enable the entry field.
    pub fn finish_turn(&mut self, reply: &str) {
        self.entries.retain(|entry| entry.kind != EntryKind::Pending);
        self.push(EntryKind::Assistant, reply.to_string());
        self.pending = false;
        self.refresh_input_chrome();
    }

    pub fn add_notice(&mut self, text: impl Into<String>) {
        self.push(EntryKind::Notice, text.into());
    }

    fn push(&mut self, kind: EntryKind, text: String) {
        self.entries.push(Entry { kind, text });
        if self.auto_scroll {
            self.scroll_offset = u16::MAX;
        }
    }

    fn refresh_input_chrome(&mut self) {
        let (title, border, cursor) = if self.pending {
            (
                WAITING_TITLE,
                Style::default().fg(Color::DarkGray),
                Style::default(),
            )
        } else {
            (
                INPUT_TITLE,
                Style::default().fg(Color::Reset),
                Style::default().add_modifier(Modifier::REVERSED),
            )
        };
        self.input.set_block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(title),
        );
        self.input.set_cursor_style(cursor);
        self.input.set_cursor_line_style(Style::default());
        self.input.set_placeholder_text("Ask something");
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.auto_scroll = false;
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16, max_offset: u16) {
        self.scroll_offset = self.scroll_offset.saturating_add(lines).min(max_offset);
        if self.scroll_offset >= max_offset {
            self.auto_scroll = true;
        }
    }

    /// Clamp the stored offset against the current layout; sticks to the bottom
    /// while auto-scroll is on.
    pub fn effective_scroll(&mut self, max_offset: u16) -> u16 {
        if self.auto_scroll {
            self.scroll_offset = max_offset;
        } else {
            self.scroll_offset = self.scroll_offset.min(max_offset);
        }
        self.scroll_offset
    }

    pub fn pulse_symbol(&self) -> &'static str {
        let elapsed = self.pulse_start.elapsed().as_millis() as f32 / 1000.0;
        let phase = (elapsed * 2.0) % 2.0;
        let intensity = if phase < 1.0 { phase } else { 2.0 - phase };
        if intensity < 0.33 {
            "○"
        } else if intensity < 0.66 {
            "◐"
        } else {
            "●"
        }
    }

    pub fn display_lines(&self) -> Vec<Line<'_>> {
        let mut lines = Vec::new();
        for entry in &self.entries {
            match entry.kind {
                EntryKind::User => {
                    lines.push(Line::from(vec![
                        Span::styled(
                            "You: ",
                            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(entry.text.as_str(), Style::default().fg(Color::Cyan)),
                    ]));
                }
                EntryKind::Assistant => {
                    let mut content = entry.text.lines();
                    let first = content.next().unwrap_or_default();
                    lines.push(Line::from(vec![
                        Span::styled("Assistant: ", Style::default().add_modifier(Modifier::BOLD)),
                        Span::raw(first),
                    ]));
                    lines.extend(content.map(Line::from));
                }
                EntryKind::Pending => {
                    let text = if self.received_chars > 0 {
                        format!(
                            "{} {} ({} chars received)",
                            self.pulse_symbol(),
                            entry.text,
                            self.received_chars
                        )
                    } else {
                        format!("{} {}", self.pulse_symbol(), entry.text)
                    };
                    lines.push(Line::from(Span::styled(
                        text,
                        Style::default()
                            .fg(Color::DarkGray)
                            .add_modifier(Modifier::ITALIC),
                    )));
                }
                EntryKind::Notice => {
                    lines.push(Line::from(Span::styled(
                        entry.text.as_str(),
                        Style::default().fg(Color::Yellow),
                    )));
                }
            }
            lines.push(Line::from(""));
        }
        lines
    }

    /// Display lines broken into rows of at most `width` columns.
    pub fn wrapped_lines(&self, width: u16) -> Vec<Line<'static>> {
        wrap_lines(&self.display_lines(), usize::from(width))
    }

    pub fn wrapped_line_count(&self, width: u16) -> u16 {
        u16::try_from(self.wrapped_lines(width).len()).unwrap_or(u16::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_text(view: &mut ChatView, text: &str) {
        view.input_mut().insert_str(text);
    }

    #[test]
    fn blank_entry_is_not_submitted() {
        let mut view = ChatView::new("deepseek-r1");
        assert_eq!(view.take_submission(), None);
        type_text(&mut view, "   ");
        assert_eq!(view.take_submission(), None);
        assert!(view.entries().is_empty());
    }

    #[test]
    fn submission_is_trimmed_and_clears_input() {
        let mut view = ChatView::new("deepseek-r1");
        type_text(&mut view, "  hello there ");
        assert_eq!(view.take_submission().as_deref(), Some("hello there"));
        assert_eq!(view.input_text(), "");
    }

    #[test]
    fn pending_turn_blocks_submission() {
        let mut view = ChatView::new("deepseek-r1");
        view.begin_turn("first");
        type_text(&mut view, "second");
        assert_eq!(view.take_submission(), None);
        assert_eq!(view.input_text(), "second");
    }

    #[test]
    fn finish_turn_replaces_placeholder() {
        let mut view = ChatView::new("deepseek-r1");
        view.begin_turn("question");
        assert_eq!(view.entries()[1].kind, EntryKind::Pending);
        assert_eq!(view.entries()[1].text, THINKING_PLACEHOLDER);

        view.record_progress(12);
        assert_eq!(view.received_chars(), 12);

        view.finish_turn("answer");
        assert!(!view.is_pending());
        assert_eq!(
            view.entries(),
            &[
                Entry {
                    kind: EntryKind::User,
                    text: "question".to_string()
                },
                Entry {
                    kind: EntryKind::Assistant,
                    text: "answer".to_string()
                },
            ]
        );
    }

    #[test]
    fn progress_outside_a_turn_is_ignored() {
        let mut view = ChatView::new("m");
        view.record_progress(5);
        assert_eq!(view.received_chars(), 0);
    }

    #[test]
    fn display_lines_prefix_speakers_and_separate_entries() {
        let mut view = ChatView::new("m");
        view.begin_turn("hi");
        view.finish_turn("hello\nworld");

        let text: Vec<String> = view
            .display_lines()
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect();
        assert_eq!(text, vec!["You: hi", "", "Assistant: hello", "world", ""]);
    }

    #[test]
    fn wrapped_line_count_follows_word_breaks() {
        let mut view = ChatView::new("m");
        view.begin_turn("abcdefghij");
        view.finish_turn("ok");
        // "You:" | "abcde" | "fghij", spacer, "Assis" | "tant:" | "ok", spacer
        assert_eq!(view.wrapped_line_count(5), 3 + 1 + 3 + 1);
    }

    #[test]
    fn word_wrap_needs_more_rows_than_character_division() {
        let mut view = ChatView::new("m");
        view.begin_turn("q");
        view.finish_turn("aaaaaa bbbbbb cccccc");
        // "Assistant:" | "aaaaaa" | "bbbbbb" | "cccccc" at width 10
        assert_eq!(view.wrapped_line_count(10), 1 + 1 + 4 + 1);
    }

    #[test]
    fn scrolling_up_disables_auto_scroll_until_bottom() {
        let mut view = ChatView::new("m");
        assert_eq!(view.effective_scroll(10), 10);
        view.scroll_up(4);
        assert_eq!(view.effective_scroll(10), 6);
        view.scroll_down(10, 10);
        view.add_notice("new");
        assert_eq!(view.effective_scroll(12), 12);
    }

    #[test]
    fn title_names_the_model() {
        assert_eq!(ChatView::new("qwen2.5").title(), "Chat with qwen2.5");
    }
}
