//! Model Dispatcher
//!
//! Turns one user message into one assistant message:
//! budget check, prompt assembly, primary model call, single fallback,
//! usage accounting, and history update.

use crate::budget::{estimate_tokens, BudgetTracker};
use crate::config::LlmConfig;
use crate::knowledge::build_system_prompt;
use crate::llm::{Completion, CompletionClient, CompletionRequest};
use crate::models::{ChatMessage, ConversationState};
use crate::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

pub const OVER_BUDGET_MESSAGE: &str = "I've enjoyed our conversation about NYC real estate investments, but I need to head to another client meeting now. Would you like to leave your email so I can send you some property recommendations that match what we've discussed?";

pub const UNAVAILABLE_MESSAGE: &str = "I'm sorry, I'm having trouble connecting with our property database right now. Could you please try again in a moment?";

/// Result of dispatching one user message
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Replied { message: String, model: String },
    OverBudget { message: String },
    Unavailable { message: String },
}

impl DispatchOutcome {
    pub fn message(&self) -> &str {
        match self {
            DispatchOutcome::Replied { message, .. }
            | DispatchOutcome::OverBudget { message }
            | DispatchOutcome::Unavailable { message } => message,
        }
    }

    pub fn is_over_budget(&self) -> bool {
        matches!(self, DispatchOutcome::OverBudget { .. })
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, DispatchOutcome::Unavailable { .. })
    }
}

pub struct ModelDispatcher {
    client: Arc<dyn CompletionClient>,
    budget: BudgetTracker,
    primary_model: String,
    fallback_model: String,
    temperature: f32,
    max_tokens: u32,
    system_prompt: String,
}

impl ModelDispatcher {
    pub fn new(client: Arc<dyn CompletionClient>, budget: BudgetTracker, config: &LlmConfig) -> Self {
        Self {
            client,
            budget,
            primary_model: config.primary_model.clone(),
            fallback_model: config.fallback_model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            system_prompt: build_system_prompt(),
        }
    }

    pub fn budget(&self) -> &BudgetTracker {
        &self.budget
    }

    pub fn primary_model(&self) -> &str {
        &self.primary_model
    }

    /// `[system prompt] + [prior session messages] + [current user message]`
    pub fn build_messages(&self, state: &ConversationState, user_message: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(state.messages.len() + 2);
        messages.push(ChatMessage::system(self.system_prompt.clone()));
        messages.extend(state.messages.iter().cloned());
        messages.push(ChatMessage::user(user_message));
        messages
    }

    /// Dispatch one user message for this conversation.
    ///
    /// History, token counters and cost change only when a model answered.
    pub async fn dispatch(&self, state: &mut ConversationState, user_message: &str) -> DispatchOutcome {
        if !self.budget.is_within_budget(state) {
            return DispatchOutcome::OverBudget {
                message: OVER_BUDGET_MESSAGE.to_string(),
            };
        }

        let messages = self.build_messages(state, user_message);
        let estimated_input: u64 = messages.iter().map(|m| estimate_tokens(&m.content)).sum();

        let (completion, model_used) = match self.complete_with_fallback(messages).await {
            Ok(result) => result,
            Err(e) => {
                warn!("Model dispatch failed after fallback: {}", e);
                return DispatchOutcome::Unavailable {
                    message: UNAVAILABLE_MESSAGE.to_string(),
                };
            }
        };

        let (input_tokens, output_tokens) = match completion.usage {
            Some(usage) => (usage.prompt_tokens, usage.completion_tokens),
            None => (estimated_input, estimate_tokens(&completion.text)),
        };

        state.messages.push(ChatMessage::user(user_message));
        state.messages.push(ChatMessage::assistant(completion.text.clone()));
        self.budget
            .record_usage(state, &model_used, input_tokens, output_tokens);
        state.touch();

        info!(
            "Received response using {} ({} in / {} out, conversation total ${:.4})",
            model_used, input_tokens, output_tokens, state.cost
        );

        DispatchOutcome::Replied {
            message: completion.text,
            model: model_used,
        }
    }

    /// Tiny completion against the primary model to verify credentials.
    pub async fn ping(&self) -> Result<Completion> {
        let request = CompletionRequest {
            model: self.primary_model.clone(),
            messages: vec![ChatMessage::user("Hello, are you working?")],
            temperature: self.temperature,
            max_tokens: 10,
        };
        self.client.complete(&request).await
    }

    async fn complete_with_fallback(&self, messages: Vec<ChatMessage>) -> Result<(Completion, String)> {
        let mut request = CompletionRequest {
            model: self.primary_model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        match self.client.complete(&request).await {
            Ok(completion) => Ok((completion, request.model)),
            Err(primary_error) => {
                warn!(
                    "Error with model {}: {}. Falling back to {}",
                    self.primary_model, primary_error, self.fallback_model
                );
                request.model = self.fallback_model.clone();
                let completion = self.client.complete(&request).await?;
                Ok((completion, request.model))
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::BeaconError;
    use crate::llm::Usage;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Completion client that replays scripted results and records requests.
    pub(crate) struct ScriptedClient {
        replies: Mutex<VecDeque<Result<Completion>>>,
        pub(crate) requests: Mutex<Vec<CompletionRequest>>,
    }

    impl ScriptedClient {
        pub(crate) fn new(replies: Vec<Result<Completion>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn call_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
            self.requests.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(BeaconError::LlmError("no scripted reply".to_string())))
        }
    }

    pub(crate) fn reply(text: &str, usage: Option<Usage>) -> Result<Completion> {
        Ok(Completion {
            text: text.to_string(),
            model: "scripted".to_string(),
            usage,
        })
    }

    pub(crate) fn failure() -> Result<Completion> {
        Err(BeaconError::LlmError("provider down".to_string()))
    }

    fn dispatcher(client: Arc<ScriptedClient>, ceiling: f64) -> ModelDispatcher {
        ModelDispatcher::new(client, BudgetTracker::new(ceiling), &LlmConfig::default())
    }

    #[tokio::test]
    async fn test_reply_appends_history_and_usage() {
        let client = Arc::new(ScriptedClient::new(vec![reply(
            "Brooklyn is a great choice.",
            Some(Usage { prompt_tokens: 1000, completion_tokens: 100 }),
        )]));
        let dispatcher = dispatcher(client.clone(), 1.0);
        let mut state = ConversationState::new();

        let outcome = dispatcher.dispatch(&mut state, "What about Brooklyn?").await;

        assert_eq!(
            outcome,
            DispatchOutcome::Replied {
                message: "Brooklyn is a great choice.".to_string(),
                model: "gpt-4-turbo".to_string(),
            }
        );
        assert_eq!(state.messages.len(), 2);
        assert_eq!(state.messages[0], ChatMessage::user("What about Brooklyn?"));
        assert_eq!(state.messages[1], ChatMessage::assistant("Brooklyn is a great choice."));
        assert_eq!(state.token_count.input, 1000);
        assert_eq!(state.token_count.output, 100);
        assert!((state.cost - 0.013).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_request_contains_system_history_and_message() {
        let client = Arc::new(ScriptedClient::new(vec![reply("ok", None)]));
        let dispatcher = dispatcher(client.clone(), 1.0);
        let mut state = ConversationState::new();
        state.messages.push(ChatMessage::user("hello"));
        state.messages.push(ChatMessage::assistant("hi, I'm Beacon"));

        dispatcher.dispatch(&mut state, "Any condos?").await;

        let requests = client.requests.lock().unwrap();
        let messages = &requests[0].messages;
        assert_eq!(messages.len(), 4);
        assert!(messages[0].content.starts_with("You are Beacon"));
        assert_eq!(messages[1].content, "hello");
        assert_eq!(messages[3], ChatMessage::user("Any condos?"));
        assert_eq!(requests[0].max_tokens, 500);
    }

    #[tokio::test]
    async fn test_fallback_model_answers_after_primary_failure() {
        let client = Arc::new(ScriptedClient::new(vec![failure(), reply("from fallback", None)]));
        let dispatcher = dispatcher(client.clone(), 1.0);
        let mut state = ConversationState::new();

        let outcome = dispatcher.dispatch(&mut state, "hi").await;

        assert_eq!(
            outcome,
            DispatchOutcome::Replied {
                message: "from fallback".to_string(),
                model: "gpt-3.5-turbo".to_string(),
            }
        );
        let requests = client.requests.lock().unwrap();
        assert_eq!(requests[0].model, "gpt-4-turbo");
        assert_eq!(requests[1].model, "gpt-3.5-turbo");
        // Estimated usage is priced at the fallback rate
        let expected = dispatcher.budget().cost(
            "gpt-3.5-turbo",
            state.token_count.input,
            state.token_count.output,
        );
        assert!((state.cost - expected).abs() < 1e-12);
        assert!(state.token_count.input > 0);
    }

    #[tokio::test]
    async fn test_two_failures_leave_state_untouched() {
        let client = Arc::new(ScriptedClient::new(vec![failure(), failure()]));
        let dispatcher = dispatcher(client.clone(), 1.0);
        let mut state = ConversationState::new();
        state.messages.push(ChatMessage::user("earlier"));
        state.messages.push(ChatMessage::assistant("reply"));
        let before = state.clone();

        let outcome = dispatcher.dispatch(&mut state, "are you there?").await;

        assert!(outcome.is_unavailable());
        assert_eq!(outcome.message(), UNAVAILABLE_MESSAGE);
        assert_eq!(client.call_count(), 2);
        assert_eq!(state.messages, before.messages);
        assert_eq!(state.token_count, before.token_count);
        assert_eq!(state.cost, before.cost);
    }

    #[tokio::test]
    async fn test_over_budget_skips_model_call() {
        let client = Arc::new(ScriptedClient::new(vec![reply("should not be used", None)]));
        let dispatcher = dispatcher(client.clone(), 0.05);
        let mut state = ConversationState::new();
        state.cost = 0.05;

        let outcome = dispatcher.dispatch(&mut state, "tell me more").await;

        assert!(outcome.is_over_budget());
        assert_eq!(outcome.message(), OVER_BUDGET_MESSAGE);
        assert_eq!(client.call_count(), 0);
        assert!(state.messages.is_empty());
    }
}
