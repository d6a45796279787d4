//! Client for the remote explanation service.
//!
//! Explanations come from a single `POST /api/explain` endpoint. The
//! request body carries the editor content and, for selection
//! explanations, the selected snippet; authenticated users get Basic
//! credentials attached so the service can lift the anonymous rate limit.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::API_ENDPOINT;
use crate::settings::StoredUser;

/// Which flavor of explanation is being requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplainMode {
    /// Explain the whole editor content.
    Full,
    /// Explain a selected snippet within the editor content.
    Selection,
}

/// Request body for the explanation endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainRequest {
    /// Language tag of the source, e.g. `"javascript"`.
    pub language: String,
    /// Full or selection explanation.
    pub mode: ExplainMode,
    /// The complete editor content.
    pub source: String,
    /// Explanation verbosity level from the user's settings.
    pub explanation_level: String,
    /// Answer locale from the user's settings.
    pub locale: String,
    /// Whether the service may include follow-up questions. Off for full
    /// explanations, on for selection explanations.
    pub followup_questions: bool,
    /// Anonymous visitor fingerprint, when one is known. Omitted from the
    /// body when absent; the matching header falls back to empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visitor_id: Option<String>,
    /// The selected snippet. Only present in selection mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<String>,
}

/// Successful response from the explanation endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ExplainResponse {
    /// The explanation text.
    pub answer: String,
}

/// Failure modes of an explanation request.
#[derive(Debug)]
pub enum ExplainError {
    /// 401: the service wants credentials.
    Auth,
    /// 429: the anonymous quota is exhausted.
    RateLimit,
    /// Any other non-success status.
    Status(u16),
    /// Transport-level failure.
    Transport(reqwest::Error),
}

impl fmt::Display for ExplainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auth => write!(f, "Authenticate"),
            Self::RateLimit => {
                write!(f, "Rate limit exceeded. Please log in to get more explanations")
            }
            Self::Status(code) => write!(f, "Explanation service returned status {code}"),
            Self::Transport(err) => write!(f, "Explanation request failed: {err}"),
        }
    }
}

impl std::error::Error for ExplainError {}

impl From<reqwest::Error> for ExplainError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err)
    }
}

/// Thin wrapper over the explanation endpoint.
#[derive(Debug, Clone)]
pub struct ExplainClient {
    base_url: String,
    http: reqwest::Client,
}

impl Default for ExplainClient {
    fn default() -> Self {
        Self::new(API_ENDPOINT)
    }
}

impl ExplainClient {
    /// Creates a client against the given service base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Requests an explanation.
    ///
    /// # Arguments
    ///
    /// * `request` - The explanation request body.
    /// * `user` - Credentials to attach, if the user is logged in.
    ///
    /// # Returns
    ///
    /// The service's answer, or an [`ExplainError`] classifying the failure.
    pub async fn explain(
        &self,
        request: &ExplainRequest,
        user: Option<&StoredUser>,
    ) -> Result<ExplainResponse, ExplainError> {
        let mut builder = self
            .http
            .post(format!("{}/api/explain", self.base_url))
            .header("X-ExplainDev-client-origin-name", "desktop")
            .header(
                "X-ExplainDev-client-origin-version",
                env!("CARGO_PKG_VERSION"),
            )
            .header(
                "X-ExplainDev-client-origin-visitor-id",
                request.visitor_id.as_deref().unwrap_or(""),
            )
            .json(request);
        if let Some(user) = user {
            builder = builder.basic_auth(&user.email, Some(&user.key));
        }

        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            Err(error_for_status(status.as_u16()))
        }
    }
}

/// Maps a non-success HTTP status to the error taxonomy.
fn error_for_status(code: u16) -> ExplainError {
    match code {
        401 => ExplainError::Auth,
        429 => ExplainError::RateLimit,
        other => ExplainError::Status(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_request_serializes_camel_case_without_selection() {
        let request = ExplainRequest {
            language: "javascript".to_string(),
            mode: ExplainMode::Full,
            source: "const x = 1;".to_string(),
            explanation_level: "advanced".to_string(),
            locale: "en".to_string(),
            followup_questions: false,
            visitor_id: None,
            selection: None,
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["mode"], "full");
        assert_eq!(json["explanationLevel"], "advanced");
        assert_eq!(json["followupQuestions"], false);
        assert!(json.get("visitorId").is_none());
        assert!(json.get("selection").is_none());
    }

    #[test]
    fn test_selection_request_includes_snippet() {
        let request = ExplainRequest {
            language: "python".to_string(),
            mode: ExplainMode::Selection,
            source: "x = 1\ny = 2\n".to_string(),
            explanation_level: "basic".to_string(),
            locale: "es".to_string(),
            followup_questions: true,
            visitor_id: Some("fp-1234".to_string()),
            selection: Some("y = 2".to_string()),
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["mode"], "selection");
        assert_eq!(json["selection"], "y = 2");
        assert_eq!(json["visitorId"], "fp-1234");
    }

    #[test]
    fn test_status_codes_map_onto_the_error_taxonomy() {
        assert!(matches!(error_for_status(401), ExplainError::Auth));
        assert!(matches!(error_for_status(429), ExplainError::RateLimit));
        assert!(matches!(error_for_status(500), ExplainError::Status(500)));
        assert!(matches!(error_for_status(503), ExplainError::Status(503)));
    }

    #[test]
    fn test_response_parses_answer() {
        let response: ExplainResponse =
            serde_json::from_str(r#"{"answer":"It adds two numbers."}"#).unwrap();
        assert_eq!(response.answer, "It adds two numbers.");
    }

    #[test]
    fn test_error_messages_match_user_facing_copy() {
        assert_eq!(ExplainError::Auth.to_string(), "Authenticate");
        assert!(ExplainError::RateLimit.to_string().contains("log in"));
        assert!(ExplainError::Status(500).to_string().contains("500"));
    }
}
