//! Interactive model selection
//!
//! Lists the discovered models and reads a choice by number or by name.

use std::io::{self, BufRead, Write};

use crate::core::discovery::resolve_model_choice;
use crate::core::session::{ModelDescriptor, DEFAULT_MODEL};

pub fn choose_model<R: BufRead, W: Write>(
    models: &[String],
    input: &mut R,
    output: &mut W,
) -> io::Result<ModelDescriptor> {
    writeln!(output, "Available models:")?;
    for (i, model) in models.iter().enumerate() {
        writeln!(output, "{}. {}", i + 1, model)?;
    }
    write!(
        output,
        "Choose a model by number or name (default {DEFAULT_MODEL}): "
    )?;
    output.flush()?;

    // End of input counts as accepting the default
    let mut line = String::new();
    input.read_line(&mut line)?;

    let choice = resolve_model_choice(models, &line);
    if let Some(notice) = choice.notice() {
        writeln!(output, "{notice}")?;
    }
    Ok(choice.descriptor())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn models() -> Vec<String> {
        vec!["llama3.2:latest".to_string(), "deepseek-r1:14b".to_string()]
    }

    fn pick(input: &str) -> (ModelDescriptor, String) {
        let mut input = Cursor::new(input.to_string());
        let mut output = Vec::new();
        let model = choose_model(&models(), &mut input, &mut output).expect("choice");
        (model, String::from_utf8(output).expect("utf8"))
    }

    #[test]
    fn lists_models_with_numbers() {
        let (_, text) = pick("\n");
        assert!(text.starts_with("Available models:\n1. llama3.2:latest\n2. deepseek-r1:14b\n"));
        assert!(text.contains("Choose a model by number or name (default deepseek-r1): "));
    }

    #[test]
    fn picks_by_number_and_name() {
        assert_eq!(pick("2\n").0.as_str(), "deepseek-r1:14b");
        assert_eq!(pick("llama3.2:latest\n").0.as_str(), "llama3.2:latest");
    }

    #[test]
    fn blank_or_eof_uses_default_silently() {
        let (model, text) = pick("");
        assert!(model.is_default());
        assert!(!text.contains("Defaulting"));
    }

    #[test]
    fn bad_choices_fall_back_with_notice() {
        let (model, text) = pick("9\n");
        assert!(model.is_default());
        assert!(text.ends_with("Invalid choice. Defaulting to deepseek-r1.\n"));

        let (model, text) = pick("mistral\n");
        assert!(model.is_default());
        assert!(text.ends_with("Model not found in available list. Defaulting to deepseek-r1.\n"));
    }
}
