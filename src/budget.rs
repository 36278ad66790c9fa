//! Budget Tracker
//!
//! Prices each model call from its token counts and decides whether a
//! conversation may issue another one.

use crate::models::ConversationState;
use std::collections::HashMap;
use tracing::{debug, info};

/// Model used for pricing when a model name is not in the table
const DEFAULT_PRICING_MODEL: &str = "gpt-4-turbo-preview";

/// Per-token prices, in dollars
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub input: f64,
    pub output: f64,
}

impl ModelPricing {
    pub const fn new(input: f64, output: f64) -> Self {
        Self { input, output }
    }

    pub fn cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        input_tokens as f64 * self.input + output_tokens as f64 * self.output
    }
}

fn default_pricing_table() -> HashMap<String, ModelPricing> {
    let mut table = HashMap::new();
    // $0.01 / $0.03 per 1K tokens
    table.insert("gpt-4-turbo".to_string(), ModelPricing::new(0.000_01, 0.000_03));
    table.insert("gpt-4-turbo-preview".to_string(), ModelPricing::new(0.000_01, 0.000_03));
    // $0.0015 / $0.002 per 1K tokens
    table.insert("gpt-3.5-turbo".to_string(), ModelPricing::new(0.000_001_5, 0.000_002));
    table
}

/// Approximate token count: about four characters per token.
pub fn estimate_tokens(text: &str) -> u64 {
    ((text.len() + 3) / 4) as u64
}

#[derive(Debug, Clone)]
pub struct BudgetTracker {
    /// Spend ceiling per conversation, in dollars
    ceiling: f64,
    pricing: HashMap<String, ModelPricing>,
}

impl BudgetTracker {
    pub fn new(ceiling: f64) -> Self {
        Self {
            ceiling,
            pricing: default_pricing_table(),
        }
    }

    pub fn with_pricing(mut self, model: impl Into<String>, pricing: ModelPricing) -> Self {
        self.pricing.insert(model.into(), pricing);
        self
    }

    pub fn ceiling(&self) -> f64 {
        self.ceiling
    }

    pub fn pricing_for(&self, model: &str) -> ModelPricing {
        self.pricing
            .get(model)
            .or_else(|| self.pricing.get(DEFAULT_PRICING_MODEL))
            .copied()
            .unwrap_or(ModelPricing::new(0.000_01, 0.000_03))
    }

    /// Dollar cost of one call
    pub fn cost(&self, model: &str, input_tokens: u64, output_tokens: u64) -> f64 {
        self.pricing_for(model).cost(input_tokens, output_tokens)
    }

    /// True iff the conversation has spent strictly less than the ceiling.
    pub fn is_within_budget(&self, state: &ConversationState) -> bool {
        let within = state.cost < self.ceiling;
        if !within {
            info!(
                "Conversation over budget: spent ${:.4} of ${:.2}",
                state.cost, self.ceiling
            );
        }
        within
    }

    pub fn remaining(&self, state: &ConversationState) -> f64 {
        (self.ceiling - state.cost).max(0.0)
    }

    /// Add a call's tokens and cost to the conversation; returns the call cost.
    pub fn record_usage(
        &self,
        state: &mut ConversationState,
        model: &str,
        input_tokens: u64,
        output_tokens: u64,
    ) -> f64 {
        let cost = self.cost(model, input_tokens, output_tokens);

        state.token_count.input += input_tokens;
        state.token_count.output += output_tokens;
        state.cost += cost;

        debug!(
            model,
            input_tokens,
            output_tokens,
            cost,
            total_cost = state.cost,
            "Recorded model usage"
        );

        cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_uses_model_rates() {
        let tracker = BudgetTracker::new(1.0);
        let gpt4 = tracker.cost("gpt-4-turbo", 1000, 1000);
        let gpt35 = tracker.cost("gpt-3.5-turbo", 1000, 1000);

        assert!((gpt4 - 0.04).abs() < 1e-9);
        assert!((gpt35 - 0.0035).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_model_uses_default_rate() {
        let tracker = BudgetTracker::new(1.0);
        assert_eq!(
            tracker.pricing_for("some-new-model"),
            tracker.pricing_for("gpt-4-turbo-preview")
        );
    }

    #[test]
    fn test_within_budget_until_ceiling_reached() {
        let tracker = BudgetTracker::new(0.10).with_pricing("flat", ModelPricing::new(0.01, 0.0));
        let mut state = ConversationState::new();

        // Each call costs exactly $0.03
        let mut history = Vec::new();
        for _ in 0..5 {
            history.push(tracker.is_within_budget(&state));
            tracker.record_usage(&mut state, "flat", 3, 0);
        }

        assert_eq!(history, vec![true, true, true, true, false]);
        assert!(!tracker.is_within_budget(&state));
        assert_eq!(tracker.remaining(&state), 0.0);
    }

    #[test]
    fn test_exactly_at_ceiling_is_over_budget() {
        let tracker = BudgetTracker::new(0.5);
        let mut state = ConversationState::new();
        state.cost = 0.5;
        assert!(!tracker.is_within_budget(&state));

        state.cost = 0.499;
        assert!(tracker.is_within_budget(&state));
    }

    #[test]
    fn test_record_usage_accumulates_tokens() {
        let tracker = BudgetTracker::new(1.0);
        let mut state = ConversationState::new();

        tracker.record_usage(&mut state, "gpt-3.5-turbo", 100, 20);
        tracker.record_usage(&mut state, "gpt-3.5-turbo", 50, 10);

        assert_eq!(state.token_count.input, 150);
        assert_eq!(state.token_count.output, 30);
        assert!(state.cost > 0.0);
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }
}
