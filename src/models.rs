use serde::{Deserialize, Serialize};

/// A named point location from the dataset (a school).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Facility {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Facility {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }

    /// `[lat, lon]`, the order the page shows locations in.
    pub fn location(&self) -> [f64; 2] {
        [self.latitude, self.longitude]
    }
}

/// One user submission. Never stored.
#[derive(Debug, Deserialize, Clone)]
pub struct Query {
    #[serde(rename = "question")]
    pub text: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Query {
    pub fn new(text: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            text: text.into(),
            latitude,
            longitude,
        }
    }
}

// Chat message format shared by OpenAI-compatible endpoints
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

// Chat completions request format
#[derive(Debug, Serialize, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

// Chat completions response format
#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChatMessage,
}
