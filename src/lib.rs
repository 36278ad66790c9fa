//! Beacon Realty Agent
//!
//! Backend for a NYC real-estate lead-generation chatbot that:
//! - Drives a conversation through an OpenAI-compatible completion API
//! - Caps model spend per conversation
//! - Picks investment preferences out of free text
//! - Answers property catalog searches and recommendations
//! - Persists qualified leads
//!
//! REQUEST FLOW:
//! SESSION → EXTRACT → BUDGET CHECK → DISPATCH (→ FALLBACK) → SAVE

pub mod api;
pub mod budget;
pub mod catalog;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod extractor;
pub mod knowledge;
pub mod leads;
pub mod llm;
pub mod mcp;
pub mod models;
pub mod session;

pub use error::Result;

// Re-export common types
pub use models::*;
pub use budget::BudgetTracker;
pub use catalog::{PropertyCatalog, PropertyQuery};
pub use config::AppConfig;
pub use dispatcher::{DispatchOutcome, ModelDispatcher};
pub use extractor::PreferenceExtractor;
