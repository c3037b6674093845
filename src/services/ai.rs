use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::entry::JournalEntry;

/// Ask the Anthropic Messages API for a short reflection on an entry.
/// Provider problems surface as [`AppError::Upstream`]; callers fall back
/// to [`fallback_reflection`] instead of propagating them, because a broken
/// AI provider must never block the journaling flow.
pub async fn generate_reflection(config: &Config, entry: &JournalEntry) -> AppResult<String> {
    if config.anthropic_api_key.is_empty() {
        return Err(AppError::Upstream("Anthropic API key not configured".into()));
    }

    let moods = if entry.moods.is_empty() {
        "none recorded".to_string()
    } else {
        entry.moods.join(", ")
    };

    let prompt = format!(
        r#"You are a warm, non-judgmental journaling companion. The user wrote the journal entry below. Respond with a short reflection (3-5 sentences) that acknowledges what they expressed, gently highlights one pattern or strength, and closes with one open question for tomorrow. Do not give medical advice.

Moods they tagged: {}

Entry:
{}"#,
        moods, entry.content
    );

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;

    let response = client
        .post("https://api.anthropic.com/v1/messages")
        .header("x-api-key", &config.anthropic_api_key)
        .header("anthropic-version", "2023-06-01")
        .header("content-type", "application/json")
        .json(&serde_json::json!({
            "model": config.anthropic_model,
            "max_tokens": 512,
            "messages": [{
                "role": "user",
                "content": prompt
            }]
        }))
        .send()
        .await
        .map_err(|e| AppError::Upstream(format!("Anthropic request failed: {}", e)))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Upstream(format!(
            "Anthropic API error {}: {}",
            status, body
        )));
    }

    let body: serde_json::Value = response
        .json()
        .await
        .map_err(|e| AppError::Upstream(format!("Anthropic response unreadable: {}", e)))?;
    let text = body["content"][0]["text"]
        .as_str()
        .ok_or_else(|| AppError::Upstream("Anthropic response missing text content".into()))?;

    Ok(text.trim().to_string())
}

/// Deterministic placeholder shown when the AI provider is unavailable or
/// the caller's daily quota is spent. The user can retry manually.
pub fn fallback_reflection(moods: &[String]) -> String {
    match moods.first() {
        Some(mood) => format!(
            "Thank you for writing today. You tagged this entry \"{}\", and putting that feeling into words is itself a step. A fuller reflection isn't available right now; you can try again in a moment.",
            mood
        ),
        None => "Thank you for writing today. Putting your day into words is itself a step. A fuller reflection isn't available right now; you can try again in a moment.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_mentions_first_mood() {
        let text = fallback_reflection(&["Anxious".to_string(), "Hopeful".to_string()]);
        assert!(text.contains("Anxious"));
    }

    #[test]
    fn fallback_without_moods_is_generic() {
        let text = fallback_reflection(&[]);
        assert!(!text.is_empty());
        assert!(!text.contains('"'));
    }
}
