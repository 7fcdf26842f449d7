//! Chat session controller: transcript and turns with the backend assistant.
//!
//! DESIGN
//! ======
//! The session is a plain owned struct. `send_message` takes `&mut self`
//! across the network await, so a single owner cannot interleave two sends;
//! the `loading` flag exists for the view, not for mutual exclusion.
//!
//! ERROR HANDLING
//! ==============
//! Any failed send (transport, non-success status, bad body) appends one
//! fixed fallback assistant turn. The user's own turn is kept regardless.
//! There is no automatic retry.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::api::PlantApi;
use crate::api::types::{ChatRequest, ChatRole, ChatTurn, SessionConfig};
use crate::kpi::Kpi;
use crate::now_ms;

pub const CHAT_FALLBACK_MESSAGE: &str = "Error connecting to Gemini Pro. Please try again.";

/// A single transcript entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub timestamp_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<Vec<String>>,
}

impl ChatMessage {
    fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self { role, content: content.into(), timestamp_ms: now_ms(), reasoning: None }
    }

    fn to_turn(&self) -> ChatTurn {
        ChatTurn { role: self.role, content: self.content.clone() }
    }
}

/// `Closed → Idle → AwaitingReply → Idle …`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatPhase {
    Closed,
    Idle,
    AwaitingReply,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input; nothing appended, nothing sent.
    Ignored,
    Replied,
    /// The backend call failed and the fallback turn was appended.
    Fallback,
}

pub struct ChatSession {
    api: Arc<dyn PlantApi>,
    config: SessionConfig,
    messages: Vec<ChatMessage>,
    input: String,
    open: bool,
    loading: bool,
}

impl ChatSession {
    #[must_use]
    pub fn new(api: Arc<dyn PlantApi>) -> Self {
        Self {
            api,
            config: SessionConfig::default(),
            messages: Vec::new(),
            input: String::new(),
            open: false,
            loading: false,
        }
    }

    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn phase(&self) -> ChatPhase {
        match (self.open, self.loading) {
            (false, _) => ChatPhase::Closed,
            (true, true) => ChatPhase::AwaitingReply,
            (true, false) => ChatPhase::Idle,
        }
    }

    /// Open the panel. A KPI seeds a gap analysis, a free-text context
    /// seeds an offer to help; with neither the transcript is kept.
    pub fn open_with_context(&mut self, kpi: Option<&Kpi>, context: Option<&str>) {
        self.open = true;
        if let Some(kpi) = kpi {
            self.messages = vec![ChatMessage::new(ChatRole::Assistant, kpi_context_message(kpi))];
        } else if let Some(context) = context {
            self.messages = vec![ChatMessage::new(
                ChatRole::Assistant,
                format!("I can help with {context}. What would you like to know?"),
            )];
        }
    }

    /// Close the panel; the transcript survives until the next seeded open.
    pub fn close(&mut self) {
        self.open = false;
    }

    /// Send the input buffer, clearing it first. Blank input is left in
    /// place and ignored.
    pub async fn send_input(&mut self) -> SendOutcome {
        if self.input.trim().is_empty() {
            return SendOutcome::Ignored;
        }
        let text = std::mem::take(&mut self.input);
        self.send_message(&text).await
    }

    pub async fn send_message(&mut self, text: &str) -> SendOutcome {
        if text.trim().is_empty() {
            return SendOutcome::Ignored;
        }

        let request = ChatRequest {
            message: text.to_owned(),
            history: self.messages.iter().map(ChatMessage::to_turn).collect(),
            system_prompt: self.config.clone(),
        };
        self.messages.push(ChatMessage::new(ChatRole::User, text));
        self.loading = true;

        let result = self.api.chat(&request).await;
        self.loading = false;

        match result {
            Ok(reply) => {
                info!(history = request.history.len(), "chat reply received");
                self.messages.push(ChatMessage {
                    reasoning: reply.reasoning,
                    ..ChatMessage::new(ChatRole::Assistant, reply.response)
                });
                SendOutcome::Replied
            }
            Err(e) => {
                warn!(code = e.code(), error = %e, "chat request failed");
                self.messages.push(ChatMessage::new(ChatRole::Assistant, CHAT_FALLBACK_MESSAGE));
                SendOutcome::Fallback
            }
        }
    }
}

fn kpi_context_message(kpi: &Kpi) -> String {
    let Kpi { label, unit, current, target, model, strategy, improvement } = kpi;
    let gap = kpi.gap_label();
    let direction = kpi.direction().as_str();
    format!(
        "**{label} Optimization Analysis**\n\n\
         **Current:** {current} {unit}\n\
         **Target:** {target} {unit}\n\
         **Gap:** {gap} {unit} ({improvement})\n\n\
         **Model:** {model}\n\
         **Strategy:** {strategy}\n\n\
         **Ask me: How to {direction} from {current} to {target}?**"
    )
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
