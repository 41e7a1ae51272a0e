//! Interactive conversation-mode menu.

use std::io::{self, BufRead, Write};

use crate::core::config::ChatMode;

pub fn parse_mode_choice(input: &str) -> Option<ChatMode> {
    match input.trim() {
        "1" => Some(ChatMode::Cli),
        "2" => Some(ChatMode::Ui),
        _ => None,
    }
}

/// Ask until the user picks a valid mode. End of input is an error.
pub fn choose_mode<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<ChatMode> {
    writeln!(output, "Choose conversation mode:")?;
    writeln!(output, "1. CLI")?;
    writeln!(output, "2. UI")?;

    let mut line = String::new();
    loop {
        write!(output, "Enter the number of your choice (1 for CLI, 2 for UI): ")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "no conversation mode selected",
            ));
        }
        match parse_mode_choice(&line) {
            Some(mode) => return Ok(mode),
            None => writeln!(output, "Invalid choice. Please enter 1 for CLI or 2 for UI.")?,
        }
    }
}
