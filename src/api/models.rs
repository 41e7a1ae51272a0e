use chrono::{DateTime, Utc};
use tracing::warn;

use crate::api::{construct_api_url, TagsResponse};

pub async fn fetch_models(
    client: &reqwest::Client,
    base_url: &str,
) -> Result<TagsResponse, Box<dyn std::error::Error>> {
    let tags_url = construct_api_url(base_url, "api/tags");
    let response = client.get(tags_url).send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(format!("API request failed with status {status}: {error_text}").into());
    }

    let tags = response.json::<TagsResponse>().await?;
    Ok(tags)
}

/// Identifiers of every listed model, in server order.
///
/// Entries carrying neither a `model` nor a `name` key are skipped.
pub fn model_names(tags: &TagsResponse) -> Vec<String> {
    tags.models
        .iter()
        .filter_map(|info| {
            let id = info.identifier();
            if id.is_none() {
                warn!("model entry has neither 'model' nor 'name' key: {info:?}");
            }
            id.map(str::to_string)
        })
        .collect()
}

/// `modified_at` rendered as a UTC timestamp, when the server sent a parseable one.
pub fn format_modified_at(raw: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
}

/// Human-readable size for model listings (`4.7 GB`).
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
