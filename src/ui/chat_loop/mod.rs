//! Full-screen chat event loop
//!
//! The loop owns the terminal, the [`ChatView`] and the [`TurnCoordinator`].
//! Turn workers never touch either: they report progress and completion through
//! an unbounded channel that the loop drains between frames.

mod lifecycle;

use std::error::Error;
use std::time::Duration;

use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::layout::Rect;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use self::lifecycle::{restore_terminal, setup_terminal, ChatTerminal};
use crate::core::message::Turn;
use crate::core::turn::{TurnCompletion, TurnCoordinator};
use crate::ui::renderer::{max_scroll_offset, ui};
use crate::ui::view::ChatView;
use crate::utils::logging::TranscriptLog;

const FRAME_INTERVAL: Duration = Duration::from_millis(50);
const SCROLL_STEP: u16 = 5;

/// Messages from turn workers to the UI loop.
#[derive(Debug)]
pub enum UiEvent {
    Progress { chars: usize },
    TurnCompleted(TurnCompletion),
}

#[derive(Debug, PartialEq, Eq)]
enum KeyOutcome {
    Handled,
    Submit(String),
    Exit,
}

pub async fn run_windowed_chat(
    coordinator: TurnCoordinator,
    transcript: &TranscriptLog,
) -> Result<(), Box<dyn Error>> {
    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, coordinator, transcript).await;
    // Restore even when the loop failed
    let restored = restore_terminal(&mut terminal);
    result.and(restored)
}

async fn event_loop(
    terminal: &mut ChatTerminal,
    mut coordinator: TurnCoordinator,
    transcript: &TranscriptLog,
) -> Result<(), Box<dyn Error>> {
    let (tx, mut rx) = mpsc::unbounded_channel::<UiEvent>();
    let mut view = ChatView::new(coordinator.session().model.as_str());
    if let Some(path) = transcript.path() {
        view.add_notice(format!("Logging conversation to {}", path.display()));
    }

    loop {
        drain_events(&mut rx, &mut view, &mut coordinator, transcript);
        terminal.draw(|f| ui(f, &mut view))?;

        let ready = tokio::task::block_in_place(|| event::poll(FRAME_INTERVAL))?;
        if ready {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    let max_offset = scroll_limit(terminal, &view)?;
                    match handle_key(&mut view, key, max_offset) {
                        KeyOutcome::Handled => {}
                        KeyOutcome::Submit(question) => {
                            start_turn(&mut view, &mut coordinator, transcript, &tx, question)
                        }
                        KeyOutcome::Exit => view.request_exit(),
                    }
                }
            }
        }

        if view.exit_requested() {
            break;
        }
    }
    Ok(())
}

fn scroll_limit(terminal: &ChatTerminal, view: &ChatView) -> Result<u16, Box<dyn Error>> {
    let size = terminal.size()?;
    Ok(max_scroll_offset(view, Rect::new(0, 0, size.width, size.height)))
}

fn handle_key(view: &mut ChatView, key: KeyEvent, max_offset: u16) -> KeyOutcome {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return KeyOutcome::Exit;
    }
    match key.code {
        KeyCode::Esc => KeyOutcome::Exit,
        KeyCode::PageUp => {
            view.scroll_up(SCROLL_STEP);
            KeyOutcome::Handled
        }
        KeyCode::PageDown => {
            view.scroll_down(SCROLL_STEP, max_offset);
            KeyOutcome::Handled
        }
        KeyCode::Enter => match view.take_submission() {
            Some(question) => KeyOutcome::Submit(question),
            None => KeyOutcome::Handled,
        },
        _ => {
            if !view.is_pending() {
                view.input_mut().input(key);
            }
            KeyOutcome::Handled
        }
    }
}

fn start_turn(
    view: &mut ChatView,
    coordinator: &mut TurnCoordinator,
    transcript: &TranscriptLog,
    tx: &UnboundedSender<UiEvent>,
    question: String,
) {
    let progress = tx.clone();
    let completed = tx.clone();
    let sink = move |chunk: &str| {
        let _ = progress.send(UiEvent::Progress {
            chars: chunk.chars().count(),
        });
    };
    let on_complete = move |completion: TurnCompletion| {
        let _ = completed.send(UiEvent::TurnCompleted(completion));
    };

    match coordinator.submit_async(&question, sink, on_complete) {
        Ok(()) => {
            view.begin_turn(&question);
            if let Err(err) = transcript.log_turn(&Turn::user(question)) {
                view.add_notice(format!("Failed to write transcript: {err}"));
            }
        }
        Err(rejected) => debug!(%rejected, "submission not started"),
    }
}

fn drain_events(
    rx: &mut UnboundedReceiver<UiEvent>,
    view: &mut ChatView,
    coordinator: &mut TurnCoordinator,
    transcript: &TranscriptLog,
) {
    while let Ok(event) = rx.try_recv() {
        apply_event(event, view, coordinator, transcript);
    }
}

fn apply_event(
    event: UiEvent,
    view: &mut ChatView,
    coordinator: &mut TurnCoordinator,
    transcript: &TranscriptLog,
) {
    match event {
        UiEvent::Progress { chars } => view.record_progress(chars),
        UiEvent::TurnCompleted(completion) => {
            let reply = coordinator.complete(completion);
            view.finish_turn(&reply);
            if let Err(err) = transcript.log_turn(&Turn::assistant(reply)) {
                view.add_notice(format!("Failed to write transcript: {err}"));
            }
        }
    }
}
