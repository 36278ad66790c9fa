//! Core data models for the realty agent

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum InvestmentStrategy {
    Value,
    #[serde(alias = "cash_flow")]
    Cashflow,
    Growth,
    Luxury,
}

impl InvestmentStrategy {
    pub const ALL: [InvestmentStrategy; 4] = [
        InvestmentStrategy::Value,
        InvestmentStrategy::Cashflow,
        InvestmentStrategy::Growth,
        InvestmentStrategy::Luxury,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvestmentStrategy::Value => "value",
            InvestmentStrategy::Cashflow => "cashflow",
            InvestmentStrategy::Growth => "growth",
            InvestmentStrategy::Luxury => "luxury",
        }
    }

    /// Parse the tag used in the catalog and request payloads.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "value" => Some(InvestmentStrategy::Value),
            "cashflow" | "cash_flow" | "cash flow" => Some(InvestmentStrategy::Cashflow),
            "growth" => Some(InvestmentStrategy::Growth),
            "luxury" => Some(InvestmentStrategy::Luxury),
            _ => None,
        }
    }
}

/// How much risk a lead is willing to take
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    #[serde(alias = "conservative")]
    Low,
    #[serde(alias = "moderate")]
    Medium,
    #[serde(alias = "aggressive")]
    High,
}

impl RiskTolerance {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTolerance::Low => "low",
            RiskTolerance::Medium => "medium",
            RiskTolerance::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "low" | "conservative" => Some(RiskTolerance::Low),
            "medium" | "moderate" => Some(RiskTolerance::Medium),
            "high" | "aggressive" => Some(RiskTolerance::High),
            _ => None,
        }
    }
}

/// Risk tag carried by a catalog property
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

//
// ================= Conversation =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

/// Preferences gathered from a lead over the conversation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CollectedInfo {
    #[serde(default)]
    pub investment_strategy: Option<InvestmentStrategy>,
    #[serde(default)]
    pub boroughs: Vec<String>,
    #[serde(default)]
    pub neighborhoods: Vec<String>,
    #[serde(default)]
    pub property_types: Vec<String>,
    #[serde(default)]
    pub min_budget: Option<u64>,
    #[serde(default)]
    pub max_budget: Option<u64>,
    #[serde(default)]
    pub risk_tolerance: Option<RiskTolerance>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl CollectedInfo {
    /// Merge a partial update into this record.
    ///
    /// Per field: a present, non-empty value in `update` wins; an absent or
    /// empty one leaves the existing value alone. Lists are replaced whole.
    pub fn merge(&mut self, update: &CollectedInfo) {
        if update.investment_strategy.is_some() {
            self.investment_strategy = update.investment_strategy;
        }
        merge_list(&mut self.boroughs, &update.boroughs);
        merge_list(&mut self.neighborhoods, &update.neighborhoods);
        merge_list(&mut self.property_types, &update.property_types);
        if update.min_budget.is_some() {
            self.min_budget = update.min_budget;
        }
        if update.max_budget.is_some() {
            self.max_budget = update.max_budget;
        }
        if update.risk_tolerance.is_some() {
            self.risk_tolerance = update.risk_tolerance;
        }
        merge_text(&mut self.name, &update.name);
        merge_text(&mut self.email, &update.email);
    }

    pub fn is_empty(&self) -> bool {
        *self == CollectedInfo::default()
    }
}

fn merge_list(target: &mut Vec<String>, update: &[String]) {
    let cleaned: Vec<String> = update
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    if !cleaned.is_empty() {
        *target = cleaned;
    }
}

fn merge_text(target: &mut Option<String>, update: &Option<String>) {
    if let Some(value) = update.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        *target = Some(value.to_string());
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenCounts {
    pub input: u64,
    pub output: u64,
}

/// Everything a single chat session remembers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    pub messages: Vec<ChatMessage>,
    pub token_count: TokenCounts,
    /// Accumulated spend, in dollars
    pub cost: f64,
    pub collected_info: CollectedInfo,
    #[serde(default)]
    pub last_lead: Option<LeadReceipt>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationState {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            messages: Vec::new(),
            token_count: TokenCounts::default(),
            cost: 0.0,
            collected_info: CollectedInfo::default(),
            last_lead: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

//
// ================= Catalog =================
//

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Property {
    pub property_id: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub borough: String,
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub property_type: Option<String>,
    /// Estimated value, in dollars
    #[serde(default)]
    pub price: Option<u64>,
    #[serde(default)]
    pub bedrooms: Option<u32>,
    #[serde(default)]
    pub bathrooms: Option<f64>,
    #[serde(default)]
    pub square_feet: Option<u32>,
    #[serde(default)]
    pub year_built: Option<u16>,
    #[serde(default)]
    pub investment_strategy: Option<InvestmentStrategy>,
    /// Estimated annual return, in percent
    #[serde(default)]
    pub roi_potential: Option<f64>,
    #[serde(default)]
    pub risk_level: Option<RiskLevel>,
    #[serde(default)]
    pub image_url: Option<String>,
}

//
// ================= Leads =================
//

/// A lead ready to be persisted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeadProfile {
    pub name: Option<String>,
    pub email: String,
    pub newsletter_subscribed: bool,
    pub investment_strategy: Option<InvestmentStrategy>,
    pub boroughs: Vec<String>,
    pub neighborhoods: Vec<String>,
    pub property_types: Vec<String>,
    pub min_budget: Option<u64>,
    pub max_budget: Option<u64>,
    pub risk_tolerance: Option<RiskTolerance>,
}

impl LeadProfile {
    /// Build a lead from collected info; a lead without an email is useless.
    pub fn from_collected(info: &CollectedInfo) -> Option<Self> {
        let email = info.email.clone()?;
        Some(Self {
            name: info.name.clone(),
            email,
            newsletter_subscribed: true,
            investment_strategy: info.investment_strategy,
            boroughs: info.boroughs.clone(),
            neighborhoods: info.neighborhoods.clone(),
            property_types: info.property_types.clone(),
            min_budget: info.min_budget,
            max_budget: info.max_budget,
            risk_tolerance: info.risk_tolerance,
        })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeadReceipt {
    pub user_id: i64,
    pub profile_id: i64,
}

impl fmt::Display for InvestmentStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for RiskTolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskTolerance::Low => "Low",
            RiskTolerance::Medium => "Medium",
            RiskTolerance::High => "High",
        };
        write!(f, "{}", s)
    }
}
