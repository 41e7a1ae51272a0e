//! Model discovery with a hardcoded fallback.

use std::fmt;

use tracing::warn;

use crate::api::models::{fetch_models, model_names};
use crate::core::session::{ModelDescriptor, DEFAULT_MODEL};

#[derive(Debug)]
pub enum DiscoveryError {
    /// The listing request failed.
    Request(String),
    /// The server answered but listed no usable models.
    Empty,
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryError::Request(message) => write!(f, "could not list models: {message}"),
            DiscoveryError::Empty => f.write_str("server returned no models"),
        }
    }
}

impl std::error::Error for DiscoveryError {}

/// Ask the server which models it has.
pub async fn list_model_names(
    http: &reqwest::Client,
    base_url: &str,
) -> Result<Vec<String>, DiscoveryError> {
    let tags = fetch_models(http, base_url)
        .await
        .map_err(|e| DiscoveryError::Request(e.to_string()))?;
    let names = model_names(&tags);
    if names.is_empty() {
        return Err(DiscoveryError::Empty);
    }
    Ok(names)
}

/// Collapse a discovery result into a non-empty list, falling back to [`DEFAULT_MODEL`].
pub fn with_fallback(result: Result<Vec<String>, DiscoveryError>) -> Vec<String> {
    match result {
        Ok(names) if !names.is_empty() => names,
        Ok(_) => fallback(DiscoveryError::Empty),
        Err(err) => fallback(err),
    }
}

fn fallback(err: DiscoveryError) -> Vec<String> {
    warn!("{err}; falling back to {DEFAULT_MODEL}");
    vec![DEFAULT_MODEL.to_string()]
}

/// Models available for selection; never empty.
pub async fn discover_models(http: &reqwest::Client, base_url: &str) -> Vec<String> {
    with_fallback(list_model_names(http, base_url).await)
}

/// How a typed model choice was interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelChoice {
    /// Blank input; the default model is used.
    Default,
    /// A listed model picked by number or name.
    Selected(ModelDescriptor),
    /// A number outside the list.
    InvalidIndex,
    /// A name that is not in the list.
    UnknownName,
}

impl ModelChoice {
    pub fn descriptor(&self) -> ModelDescriptor {
        match self {
            ModelChoice::Selected(model) => model.clone(),
            _ => ModelDescriptor::default(),
        }
    }

    /// Notice shown when the input could not be honoured.
    pub fn notice(&self) -> Option<String> {
        match self {
            ModelChoice::InvalidIndex => Some(format!("Invalid choice. Defaulting to {DEFAULT_MODEL}.")),
            ModelChoice::UnknownName => Some(format!(
                "Model not found in available list. Defaulting to {DEFAULT_MODEL}."
            )),
            ModelChoice::Default | ModelChoice::Selected(_) => None,
        }
    }
}

/// Interpret `input` as a 1-based index or a model name from `models`.
pub fn resolve_model_choice(models: &[String], input: &str) -> ModelChoice {
    let choice = input.trim();
    if choice.is_empty() {
        return ModelChoice::Default;
    }

    if choice.chars().all(|c| c.is_ascii_digit()) {
        return match choice.parse::<usize>() {
            Ok(index) if (1..=models.len()).contains(&index) => {
                ModelChoice::Selected(ModelDescriptor::new(models[index - 1].clone()))
            }
            _ => ModelChoice::InvalidIndex,
        };
    }

    if models.iter().any(|model| model == choice) {
        ModelChoice::Selected(ModelDescriptor::new(choice))
    } else {
        ModelChoice::UnknownName
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::{closed_port_url, serve_once};

    fn models() -> Vec<String> {
        vec!["llama3.2:latest".to_string(), "deepseek-r1:14b".to_string()]
    }

    #[test]
    fn empty_listing_falls_back_to_default() {
        let names = with_fallback(Ok(Vec::new()));
        assert_eq!(names, vec!["deepseek-r1".to_string()]);

        let choice = resolve_model_choice(&names, "");
        assert_eq!(choice.descriptor().as_str(), "deepseek-r1");
    }

    #[test]
    fn failed_listing_falls_back_to_default() {
        let names = with_fallback(Err(DiscoveryError::Request("refused".to_string())));
        assert_eq!(names, vec![DEFAULT_MODEL.to_string()]);
    }

    #[test]
    fn choice_by_number() {
        let choice = resolve_model_choice(&models(), " 2 ");
        assert_eq!(
            choice,
            ModelChoice::Selected(ModelDescriptor::new("deepseek-r1:14b"))
        );
        assert_eq!(choice.notice(), None);
    }

    #[test]
    fn out_of_range_number_uses_default_with_notice() {
        for input in ["0", "3", "99999999999999999999999"] {
            let choice = resolve_model_choice(&models(), input);
            assert_eq!(choice, ModelChoice::InvalidIndex, "input {input}");
            assert!(choice.descriptor().is_default());
            assert!(choice.notice().is_some());
        }
    }

    #[test]
    fn choice_by_name() {
        let choice = resolve_model_choice(&models(), "llama3.2:latest");
        assert_eq!(choice.descriptor().as_str(), "llama3.2:latest");
    }

    #[test]
    fn unknown_name_uses_default_with_notice() {
        let choice = resolve_model_choice(&models(), "mistral");
        assert_eq!(choice, ModelChoice::UnknownName);
        assert_eq!(choice.descriptor(), ModelDescriptor::default());
        assert_eq!(
            choice.notice().as_deref(),
            Some("Model not found in available list. Defaulting to deepseek-r1.")
        );
    }

    #[tokio::test]
    async fn discover_models_reads_tags_endpoint() {
        let body = r#"{"models":[{"name":"qwen2.5:7b","model":"qwen2.5:7b","size":4683087332}]}"#;
        let (base_url, server) = serve_once("200 OK", body.to_string()).await;

        let names = discover_models(&reqwest::Client::new(), &base_url).await;
        assert_eq!(names, vec!["qwen2.5:7b".to_string()]);

        let request = server.await.expect("server task");
        assert!(request.starts_with("GET /api/tags"));
    }

    #[tokio::test]
    async fn discover_models_falls_back_on_empty_server_listing() {
        let (base_url, _server) = serve_once("200 OK", r#"{"models":[]}"#.to_string()).await;
        let names = discover_models(&reqwest::Client::new(), &base_url).await;
        assert_eq!(names, vec!["deepseek-r1".to_string()]);
    }

    #[tokio::test]
    async fn discover_models_falls_back_when_server_is_down() {
        let names = discover_models(&reqwest::Client::new(), &closed_port_url().await).await;
        assert_eq!(names, vec!["deepseek-r1".to_string()]);
    }
}
