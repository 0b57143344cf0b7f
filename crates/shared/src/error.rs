use serde::{Deserialize, Serialize};

/// Fallback shown when a rejection carries no usable message.
pub const DEFAULT_REJECTION_MESSAGE: &str = "Bad Request";

/// Error body returned by the car API on non-success statuses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<ErrorMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Some servers send a single message, validation layers send a list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorMessage {
    Single(String),
    Many(Vec<String>),
}

impl ApiError {
    /// Message to surface to users; `None` when the body has nothing non-blank.
    pub fn display_message(&self) -> Option<String> {
        let text = match self.message.as_ref()? {
            ErrorMessage::Single(text) => text.trim().to_string(),
            ErrorMessage::Many(items) => items
                .iter()
                .map(|item| item.trim())
                .filter(|item| !item.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
        };
        (!text.is_empty()).then_some(text)
    }

    pub fn rejection_message(&self) -> String {
        self.display_message()
            .unwrap_or_else(|| DEFAULT_REJECTION_MESSAGE.to_string())
    }
}
