//! Property catalog
//!
//! Read-only reference data loaded once at startup, either from the
//! built-in sample list or from a JSON export.

use crate::error::BeaconError;
use crate::models::{InvestmentStrategy, Property};
use crate::Result;
use std::path::Path;
use tracing::{info, warn};

pub mod query;
pub mod seed;

pub use query::{sort_properties, PropertyQuery, SortDirection, SortField, DEFAULT_LIMIT};

/// How many similar properties a detail lookup returns
pub const SIMILAR_LIMIT: usize = 3;

#[derive(Debug, Clone)]
pub struct PropertyCatalog {
    properties: Vec<Property>,
}

impl PropertyCatalog {
    pub fn new(properties: Vec<Property>) -> Self {
        Self { properties }
    }

    /// Catalog with the built-in sample properties
    pub fn seeded() -> Self {
        Self::new(seed::seed_properties())
    }

    /// Load a JSON array of properties
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            BeaconError::CatalogError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let properties: Vec<Property> = serde_json::from_str(&raw)?;

        if properties.is_empty() {
            warn!("Property file {} contains no properties", path.display());
        }
        info!("Loaded {} properties from {}", properties.len(), path.display());

        Ok(Self::new(properties))
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn all(&self) -> &[Property] {
        &self.properties
    }

    pub fn get(&self, property_id: u32) -> Option<&Property> {
        self.properties.iter().find(|p| p.property_id == property_id)
    }

    /// Filter, sort, then truncate to the query's limit.
    pub fn query(&self, criteria: &PropertyQuery) -> Vec<Property> {
        let mut matched: Vec<Property> = self
            .properties
            .iter()
            .filter(|p| criteria.matches(p))
            .cloned()
            .collect();

        sort_properties(&mut matched, criteria.sort_by, criteria.sort_direction);
        matched.truncate(criteria.limit);
        matched
    }

    /// Properties comparable to `property_id`: same borough, at most one
    /// bedroom/bathroom fewer, priced within 30% either way.
    pub fn similar(&self, property_id: u32, limit: usize) -> Vec<Property> {
        let Some(target) = self.get(property_id) else {
            return Vec::new();
        };

        let criteria = PropertyQuery {
            boroughs: vec![target.borough.clone()],
            min_bedrooms: target.bedrooms.filter(|b| *b > 1).map(|b| b - 1),
            min_bathrooms: target.bathrooms.map(|b| b - 1.0).filter(|b| *b > 0.0),
            min_price: target.price.filter(|p| *p > 0).map(|p| (p as f64 * 0.7).floor() as u64),
            max_price: target.price.filter(|p| *p > 0).map(|p| (p as f64 * 1.3).ceil() as u64),
            limit: limit + 1,
            ..Default::default()
        };

        self.query(&criteria)
            .into_iter()
            .filter(|p| p.property_id != property_id)
            .take(limit)
            .collect()
    }

    /// First property (catalog order) with the given strategy that also sits
    /// in one of `boroughs` and is one of `property_types`, when those are set.
    pub fn recommend(
        &self,
        strategy: InvestmentStrategy,
        boroughs: &[String],
        property_types: &[String],
    ) -> Option<&Property> {
        let criteria = PropertyQuery {
            boroughs: boroughs.to_vec(),
            property_types: property_types.to_vec(),
            ..Default::default()
        };

        self.properties
            .iter()
            .filter(|p| p.investment_strategy == Some(strategy))
            .find(|p| criteria.matches(p))
    }
}

impl Default for PropertyCatalog {
    fn default() -> Self {
        Self::seeded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(properties: &[Property]) -> Vec<u32> {
        properties.iter().map(|p| p.property_id).collect()
    }

    #[test]
    fn test_manhattan_under_two_million() {
        let catalog = PropertyCatalog::seeded();
        let results = catalog.query(&PropertyQuery {
            boroughs: vec!["Manhattan".to_string()],
            max_price: Some(2_000_000),
            ..Default::default()
        });

        assert_eq!(ids(&results), vec![1, 2]);
        assert!(results
            .iter()
            .all(|p| p.borough == "Manhattan" && p.price.unwrap() <= 2_000_000));
    }

    #[test]
    fn test_combined_filters() {
        let catalog = PropertyCatalog::seeded();
        let results = catalog.query(&PropertyQuery {
            min_bedrooms: Some(3),
            min_bathrooms: Some(2.5),
            min_sqft: Some(2200),
            sort_by: SortField::SquareFeet,
            sort_direction: SortDirection::Asc,
            ..Default::default()
        });

        // Ties on size keep catalog order
        assert_eq!(ids(&results), vec![3, 12, 4, 10, 7, 13]);
    }

    #[test]
    fn test_limit_truncates_after_sort() {
        let catalog = PropertyCatalog::seeded();
        let results = catalog.query(&PropertyQuery {
            limit: 2,
            ..Default::default()
        });
        assert_eq!(ids(&results), vec![3, 4]);
    }

    #[test]
    fn test_no_match_is_empty() {
        let catalog = PropertyCatalog::seeded();
        let results = catalog.query(&PropertyQuery {
            boroughs: vec!["Hoboken".to_string()],
            ..Default::default()
        });
        assert!(results.is_empty());
    }

    #[test]
    fn test_similar_properties() {
        let catalog = PropertyCatalog::seeded();
        // Park Slope Condo: Brooklyn, 2bd/2ba, $1.45M -> [$1.015M, $1.885M]
        let similar = catalog.similar(5, SIMILAR_LIMIT);
        assert_eq!(ids(&similar), vec![6]);

        assert!(catalog.similar(999, SIMILAR_LIMIT).is_empty());
    }

    #[test]
    fn test_recommend_uses_catalog_order() {
        let catalog = PropertyCatalog::seeded();

        let pick = catalog.recommend(InvestmentStrategy::Growth, &[], &[]).unwrap();
        assert_eq!(pick.property_id, 2);

        let pick = catalog
            .recommend(InvestmentStrategy::Growth, &["Queens".to_string()], &[])
            .unwrap();
        assert_eq!(pick.property_id, 8);

        assert!(catalog
            .recommend(InvestmentStrategy::Luxury, &["Queens".to_string()], &[])
            .is_none());
    }

    #[test]
    fn test_from_json_file_with_missing_fields() {
        let path = std::env::temp_dir().join(format!("beacon-catalog-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"[{"property_id": 1, "name": "12 Main St", "borough": "Brooklyn", "price": 900000},
                {"property_id": 2, "name": "7 Elm St", "borough": "Brooklyn"}]"#,
        )
        .unwrap();

        let catalog = PropertyCatalog::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(catalog.len(), 2);
        let results = catalog.query(&PropertyQuery::default());
        assert_eq!(ids(&results), vec![1, 2]);
        let results = catalog.query(&PropertyQuery {
            sort_direction: SortDirection::Asc,
            ..Default::default()
        });
        assert_eq!(ids(&results), vec![1, 2]);
    }
}
