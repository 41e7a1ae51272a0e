//! Model listing functionality
//!
//! This module handles listing the models installed on the Ollama server.

use std::error::Error;
use std::io::Write;

use crate::api::models::{fetch_models, format_modified_at, format_size};
use crate::api::TagsResponse;

pub async fn list_models(
    base_url: &str,
    default_model: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    let client = reqwest::Client::new();
    let tags = fetch_models(&client, base_url).await?;
    let mut stdout = std::io::stdout().lock();
    write_model_list(&mut stdout, base_url, default_model, &tags)?;
    Ok(())
}

pub fn write_model_list<W: Write>(
    out: &mut W,
    base_url: &str,
    default_model: Option<&str>,
    tags: &TagsResponse,
) -> std::io::Result<()> {
    writeln!(out, "🤖 Available Models at {base_url}")?;
    writeln!(out, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
    writeln!(out)?;

    if let Some(default_model) = default_model {
        writeln!(out, "🎯 Default model: {default_model} (from config)")?;
        writeln!(out)?;
    }

    let models: Vec<_> = tags
        .models
        .iter()
        .filter_map(|model| model.identifier().map(|id| (id, model)))
        .collect();

    if models.is_empty() {
        writeln!(out, "No models found on this server.")?;
        return Ok(());
    }

    writeln!(out, "Found {} models:", models.len())?;
    writeln!(out)?;

    for (id, model) in models {
        writeln!(out, "  • {id}")?;
        if let Some(name) = model.name.as_deref() {
            if !name.is_empty() && name != id {
                writeln!(out, "    Name: {name}")?;
            }
        }
        if let Some(size) = model.size {
            writeln!(out, "    Size: {}", format_size(size))?;
        }
        if let Some(modified) = model.modified_at.as_deref().and_then(format_modified_at) {
            writeln!(out, "    Modified: {modified}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}
