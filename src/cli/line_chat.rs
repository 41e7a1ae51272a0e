//! Line-oriented console chat.
//!
//! Each question runs to completion before the next prompt; the raw stream is
//! echoed as it arrives and the cleaned reply is printed afterwards.

use std::error::Error;
use std::io::{BufRead, Write};

use crate::core::message::Turn;
use crate::core::streamer::EchoSink;
use crate::core::turn::TurnCoordinator;
use crate::utils::logging::TranscriptLog;

fn is_exit_command(line: &str) -> bool {
    line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit")
}

pub async fn run_line_chat<R, W>(
    input: &mut R,
    output: &mut W,
    coordinator: &mut TurnCoordinator,
    transcript: &TranscriptLog,
) -> Result<(), Box<dyn Error>>
where
    R: BufRead,
    W: Write + Send,
{
    writeln!(
        output,
        "Interactive {} Chat (CLI Mode). Type 'exit' to quit.",
        coordinator.session().model
    )?;

    let mut line = String::new();
    loop {
        write!(output, "\nYour question: ")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            break;
        }
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if is_exit_command(question) {
            writeln!(output, "Exiting interactive chat.")?;
            break;
        }

        writeln!(output, "\nFetching response...\n")?;
        let reply = coordinator
            .submit(question, &mut EchoSink::new(&mut *output))
            .await;
        writeln!(output, "\n\nResponse:\n{reply}")?;

        for turn in [Turn::user(question), Turn::assistant(reply)] {
            if let Err(err) = transcript.log_turn(&turn) {
                eprintln!("⚠️  Failed to write transcript: {err}");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::{ModelDescriptor, SessionContext};
    use crate::utils::test_utils::{ScriptedClient, ScriptedReply};
    use std::io::Cursor;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn chat(
        client: Arc<ScriptedClient>,
        input: &str,
        transcript: &TranscriptLog,
    ) -> (TurnCoordinator, String) {
        let mut coordinator =
            TurnCoordinator::new(SessionContext::new(client, ModelDescriptor::default()));
        let mut input = Cursor::new(input.to_string());
        let mut output = Vec::new();
        run_line_chat(&mut input, &mut output, &mut coordinator, transcript)
            .await
            .expect("chat");
        (coordinator, String::from_utf8(output).expect("utf8"))
    }

    #[tokio::test]
    async fn echoes_stream_then_prints_clean_reply() {
        let client = Arc::new(ScriptedClient::new([ScriptedReply::chunks([
            "<think>adding</think>",
            " 4",
        ])]));
        let (coordinator, text) =
            chat(client, "What is 2+2?\nexit\n", &TranscriptLog::disabled()).await;

        assert!(text.starts_with("Interactive deepseek-r1 Chat (CLI Mode). Type 'exit' to quit.\n"));
        assert!(text.contains("\nFetching response...\n\n<think>adding</think> 4\n\nResponse:\n4\n"));
        assert!(text.ends_with("Exiting interactive chat.\n"));
        assert_eq!(coordinator.log().len(), 2);
    }

    #[tokio::test]
    async fn blank_lines_are_skipped_and_quit_is_case_insensitive() {
        let client = Arc::new(ScriptedClient::new([]));
        let (coordinator, text) = chat(client.clone(), "\n   \nQUIT\n", &TranscriptLog::disabled()).await;

        assert_eq!(client.call_count(), 0);
        assert!(coordinator.log().is_empty());
        assert!(!text.contains("Fetching response..."));
    }

    #[tokio::test]
    async fn end_of_input_ends_the_session() {
        let client = Arc::new(ScriptedClient::new([ScriptedReply::chunks(["hi"])]));
        let (coordinator, text) = chat(client, "hello", &TranscriptLog::disabled()).await;

        assert_eq!(coordinator.log().len(), 2);
        assert!(!text.contains("Exiting interactive chat."));
    }

    #[tokio::test]
    async fn failures_are_shown_and_transcribed() {
        let temp_dir = TempDir::new().expect("temp dir");
        let path = temp_dir.path().join("chat.log");
        let transcript = TranscriptLog::new(Some(path.clone())).expect("transcript");

        let client = Arc::new(ScriptedClient::new([ScriptedReply::Refuse(
            "model 'x' not found".to_string(),
        )]));
        let (_, text) = chat(client, "hi\nexit\n", &transcript).await;

        assert!(text.contains("Response:\nError: model 'x' not found\n"));
        let logged = std::fs::read_to_string(&path).expect("read transcript");
        assert_eq!(logged, "User: hi\n\nAssistant: Error: model 'x' not found\n\n");
    }
}
