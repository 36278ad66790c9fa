//! MCP envelope
//!
//! The JSON shapes used to hand property context to clients and to the
//! model: search context, property context and conversation memory.

use crate::catalog::{PropertyQuery, SortDirection, SortField};
use crate::models::{InvestmentStrategy, Property, RiskLevel};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// How many properties an unfiltered natural-language query returns
pub const UNFILTERED_SAMPLE_SIZE: usize = 5;

//
// ================= Property records =================
//

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct McpProperty {
    pub property_id: String,
    pub name: String,
    pub description: String,
    pub borough: String,
    pub neighborhood: Option<String>,
    pub property_type: Option<String>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<f64>,
    pub building_sqft: Option<u32>,
    pub year_built: Option<u16>,
    pub estimated_value: Option<u64>,
    pub investment_strategy: Option<InvestmentStrategy>,
    pub roi_potential: Option<f64>,
    pub risk_level: Option<RiskLevel>,
    pub image_url: Option<String>,
}

impl From<&Property> for McpProperty {
    fn from(p: &Property) -> Self {
        Self {
            property_id: p.property_id.to_string(),
            name: p.name.clone(),
            description: p.description.clone(),
            borough: p.borough.clone(),
            neighborhood: p.neighborhood.clone(),
            property_type: p.property_type.clone(),
            bedrooms: p.bedrooms,
            bathrooms: p.bathrooms,
            building_sqft: p.square_feet,
            year_built: p.year_built,
            estimated_value: p.price,
            investment_strategy: p.investment_strategy,
            roi_potential: p.roi_potential,
            risk_level: p.risk_level,
            image_url: p.image_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct McpPropertySummary {
    pub property_id: String,
    pub name: String,
    pub borough: String,
    pub estimated_value: Option<u64>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<f64>,
}

impl From<&Property> for McpPropertySummary {
    fn from(p: &Property) -> Self {
        Self {
            property_id: p.property_id.to_string(),
            name: p.name.clone(),
            borough: p.borough.clone(),
            estimated_value: p.price,
            bedrooms: p.bedrooms,
            bathrooms: p.bathrooms,
        }
    }
}

//
// ================= Search =================
//

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchFilters {
    pub borough: Vec<String>,
    pub min_price: Option<u64>,
    pub max_price: Option<u64>,
    pub min_bedrooms: Option<u32>,
    pub min_bathrooms: Option<f64>,
    pub property_type: Vec<String>,
    pub min_sqft: Option<u32>,
    pub max_year_built: Option<u16>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchContext {
    pub filters: SearchFilters,
    pub sort_by: SortField,
    pub sort_direction: SortDirection,
    pub limit: usize,
}

impl From<&PropertyQuery> for SearchContext {
    fn from(q: &PropertyQuery) -> Self {
        Self {
            filters: SearchFilters {
                borough: q.boroughs.clone(),
                min_price: q.min_price,
                max_price: q.max_price,
                min_bedrooms: q.min_bedrooms,
                min_bathrooms: q.min_bathrooms,
                property_type: q.property_types.clone(),
                min_sqft: q.min_sqft,
                max_year_built: q.max_year_built,
            },
            sort_by: q.sort_by,
            sort_direction: q.sort_direction,
            limit: q.limit,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchResponse {
    pub search_context: SearchContext,
    pub properties: Vec<McpProperty>,
}

impl SearchResponse {
    pub fn new(query: &PropertyQuery, properties: &[Property]) -> Self {
        Self {
            search_context: SearchContext::from(query),
            properties: properties.iter().map(McpProperty::from).collect(),
        }
    }
}

//
// ================= Property detail =================
//

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PropertyDetail {
    pub current_property: McpProperty,
    pub similar_properties: Vec<McpPropertySummary>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PropertyDetailResponse {
    pub property_context: PropertyDetail,
}

impl PropertyDetailResponse {
    pub fn new(current: &Property, similar: &[Property]) -> Self {
        Self {
            property_context: PropertyDetail {
                current_property: McpProperty::from(current),
                similar_properties: similar.iter().map(McpPropertySummary::from).collect(),
            },
        }
    }
}

//
// ================= Natural-language query =================
//

/// Filters a natural-language query actually stated
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ExtractedParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub borough: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_bedrooms: Option<u32>,
}

impl ExtractedParameters {
    pub fn is_empty(&self) -> bool {
        *self == ExtractedParameters::default()
    }

    pub fn to_query(&self) -> PropertyQuery {
        PropertyQuery {
            boroughs: self.borough.clone().unwrap_or_default(),
            max_price: self.max_price,
            min_bedrooms: self.min_bedrooms,
            ..Default::default()
        }
    }
}

/// Read the handful of phrases the property search understands.
pub fn parse_property_query(text: &str) -> ExtractedParameters {
    let lowered = text.to_lowercase();
    let mut params = ExtractedParameters::default();

    if lowered.contains("manhattan") {
        params.borough = Some(vec!["Manhattan".to_string()]);
    } else if lowered.contains("brooklyn") {
        params.borough = Some(vec!["Brooklyn".to_string()]);
    }

    if lowered.contains("under 2 million") {
        params.max_price = Some(2_000_000);
    } else if lowered.contains("under 1 million") {
        params.max_price = Some(1_000_000);
    }

    if lowered.contains("at least 2 bedrooms") {
        params.min_bedrooms = Some(2);
    } else if lowered.contains("at least 3 bedrooms") {
        params.min_bedrooms = Some(3);
    }

    params
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PropertyMention {
    pub property_id: String,
    pub mention_count: u32,
    pub last_mentioned_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ConversationMemory {
    pub property_mentions: Vec<PropertyMention>,
    pub user_questions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PropertyList {
    pub properties: Vec<McpProperty>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NaturalLanguageQueryResponse {
    pub query: String,
    pub extracted_parameters: ExtractedParameters,
    pub property_context: PropertyList,
    pub conversation_memory: ConversationMemory,
}

impl NaturalLanguageQueryResponse {
    pub fn new(
        query: &str,
        extracted_parameters: ExtractedParameters,
        properties: &[Property],
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            query: query.to_string(),
            extracted_parameters,
            property_context: PropertyList {
                properties: properties.iter().map(McpProperty::from).collect(),
            },
            conversation_memory: ConversationMemory {
                property_mentions: properties
                    .iter()
                    .map(|p| PropertyMention {
                        property_id: p.property_id.to_string(),
                        mention_count: 1,
                        last_mentioned_at: now,
                    })
                    .collect(),
                user_questions: vec![query.to_string()],
            },
        }
    }
}
