//! Preference Extractor
//!
//! Pulls structured lead preferences out of free-text chat messages:
//! - Investment strategy, from a fixed keyword vocabulary
//! - NYC boroughs, every one mentioned
//! - An email address, verbatim

use crate::knowledge::BOROUGHS;
use crate::models::{CollectedInfo, InvestmentStrategy};
use lazy_static::lazy_static;
use regex::Regex;

/// Keyword sets in priority order; the first set with a hit wins.
const STRATEGY_KEYWORDS: &[(InvestmentStrategy, &[&str])] = &[
    (InvestmentStrategy::Value, &["value", "undervalued"]),
    (InvestmentStrategy::Cashflow, &["cash flow", "rental income"]),
    (InvestmentStrategy::Growth, &["growth", "appreciation"]),
    (InvestmentStrategy::Luxury, &["luxury", "premium"]),
];

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"[\w.-]+@[\w.-]+\.\w+").expect("email pattern is valid");
}

/// Keyword/regex preference extractor
pub struct PreferenceExtractor;

impl PreferenceExtractor {
    /// Extract whatever preferences a single user message states.
    ///
    /// Fields the message says nothing about are left empty so the result
    /// can be merged into an existing [`CollectedInfo`].
    pub fn extract(message: &str) -> CollectedInfo {
        let lowered = message.to_lowercase();

        CollectedInfo {
            investment_strategy: detect_strategy(&lowered),
            boroughs: detect_boroughs(&lowered),
            email: detect_email(message),
            ..Default::default()
        }
    }

    /// Extract from `message` and merge into `info`.
    pub fn apply(info: &mut CollectedInfo, message: &str) -> CollectedInfo {
        let extracted = Self::extract(message);
        info.merge(&extracted);
        extracted
    }
}

fn detect_strategy(lowered: &str) -> Option<InvestmentStrategy> {
    STRATEGY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| lowered.contains(*kw)))
        .map(|(strategy, _)| *strategy)
}

fn detect_boroughs(lowered: &str) -> Vec<String> {
    BOROUGHS
        .iter()
        .filter(|b| lowered.contains(&b.to_lowercase()))
        .map(|b| b.to_string())
        .collect()
}

fn detect_email(message: &str) -> Option<String> {
    EMAIL_RE.find(message).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_keywords() {
        let cases = vec![
            ("I'm hunting for undervalued buildings", InvestmentStrategy::Value),
            ("Looking for good VALUE", InvestmentStrategy::Value),
            ("I care about cash flow", InvestmentStrategy::Cashflow),
            ("steady rental income please", InvestmentStrategy::Cashflow),
            ("long term appreciation", InvestmentStrategy::Growth),
            ("mostly growth", InvestmentStrategy::Growth),
            ("something premium", InvestmentStrategy::Luxury),
            ("Luxury penthouse", InvestmentStrategy::Luxury),
        ];

        for (message, expected) in cases {
            assert_eq!(
                PreferenceExtractor::extract(message).investment_strategy,
                Some(expected),
                "{}",
                message
            );
        }
    }

    #[test]
    fn test_strategy_priority_order() {
        // "value" outranks "luxury" when both appear
        let info = PreferenceExtractor::extract("luxury but good value");
        assert_eq!(info.investment_strategy, Some(InvestmentStrategy::Value));
    }

    #[test]
    fn test_multiple_boroughs() {
        let info = PreferenceExtractor::extract("Either Staten Island or brooklyn, maybe QUEENS");
        assert_eq!(info.boroughs, vec!["Brooklyn", "Queens", "Staten Island"]);
    }

    #[test]
    fn test_email_returned_verbatim() {
        let info = PreferenceExtractor::extract("reach me at Jane.Doe-99@Mail.Example.com thanks");
        assert_eq!(info.email.as_deref(), Some("Jane.Doe-99@Mail.Example.com"));
    }

    #[test]
    fn test_growth_brooklyn_scenario() {
        let info = PreferenceExtractor::extract(
            "I want a growth property in Brooklyn under 1 million, contact me at a@b.com",
        );
        assert_eq!(info.investment_strategy, Some(InvestmentStrategy::Growth));
        assert_eq!(info.boroughs, vec!["Brooklyn"]);
        assert_eq!(info.max_budget, None);
        assert_eq!(info.email.as_deref(), Some("a@b.com"));
    }

    #[test]
    fn test_nothing_to_extract() {
        let info = PreferenceExtractor::extract("hi there");
        assert!(info.is_empty());
    }

    #[test]
    fn test_apply_keeps_existing_values() {
        let mut info = CollectedInfo {
            email: Some("first@example.com".to_string()),
            boroughs: vec!["Bronx".to_string()],
            ..Default::default()
        };

        PreferenceExtractor::apply(&mut info, "I like cash flow");
        assert_eq!(info.investment_strategy, Some(InvestmentStrategy::Cashflow));
        assert_eq!(info.email.as_deref(), Some("first@example.com"));
        assert_eq!(info.boroughs, vec!["Bronx"]);

        PreferenceExtractor::apply(&mut info, "actually use second@example.com");
        assert_eq!(info.email.as_deref(), Some("second@example.com"));
    }
}
