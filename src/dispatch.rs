use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::sync::Arc;

use crate::error::DispatchError;
use crate::models::{ChatMessage, ChatRequest};
use crate::transport::Transport;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const FAILURE_PREFIX: &str = "AI Processing Failed:";

/// Outcome of one dispatch. Failures are values, not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchResult {
    Answered(String),
    Failed(DispatchError),
}

impl DispatchResult {
    /// Generated text verbatim, or `"AI Processing Failed: <cause>"`.
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            DispatchResult::Answered(text) => Cow::Borrowed(text),
            DispatchResult::Failed(err) => Cow::Owned(format!("{FAILURE_PREFIX} {err}")),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DispatchResult::Answered(_))
    }

    pub fn error(&self) -> Option<&DispatchError> {
        match self {
            DispatchResult::Failed(err) => Some(err),
            DispatchResult::Answered(_) => None,
        }
    }

    pub fn into_result(self) -> Result<String, DispatchError> {
        match self {
            DispatchResult::Answered(text) => Ok(text),
            DispatchResult::Failed(err) => Err(err),
        }
    }
}

impl Serialize for DispatchResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire<'a> {
            success: bool,
            text: &'a str,
        }
        let text = self.text();
        Wire {
            success: self.is_success(),
            text: &text,
        }
        .serialize(serializer)
    }
}

/// Sends a question to the text-generation service, grounded at a facility.
pub struct QueryDispatcher {
    tx: Arc<dyn Transport>,
    model: String,
}

impl QueryDispatcher {
    pub fn new(tx: Arc<dyn Transport>, model: String) -> Self {
        Self { tx, model }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn build_request(&self, question: &str, context_label: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(format!(
                    "You are an AI expert in geospatial networks assisting schools in {context_label}."
                )),
                ChatMessage::user(question),
            ],
        }
    }

    /// One request, no retry.
    pub async fn dispatch(&self, question: &str, context_label: &str) -> DispatchResult {
        let request = self.build_request(question, context_label);

        let response = match self.tx.chat(&request).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!("Dispatch for {} failed: {}", context_label, err);
                return DispatchResult::Failed(err);
            }
        };

        match response.choices.into_iter().next() {
            Some(choice) => DispatchResult::Answered(choice.message.content),
            None => {
                tracing::warn!("Dispatch for {} returned no choices", context_label);
                DispatchResult::Failed(DispatchError::MalformedResponse(
                    "response contained no choices".to_string(),
                ))
            }
        }
    }
}
