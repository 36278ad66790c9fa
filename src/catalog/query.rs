//! Property filter criteria, predicates and ordering

use crate::error::BeaconError;
use crate::models::Property;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;
use tracing::debug;

pub const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    EstimatedValue,
    Bedrooms,
    Bathrooms,
    SquareFeet,
    YearBuilt,
    RoiPotential,
    Name,
    PropertyId,
}

impl SortField {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "estimated_value" | "price" => Some(SortField::EstimatedValue),
            "bedrooms" | "bedroom_count" => Some(SortField::Bedrooms),
            "bathrooms" | "bathroom_count" => Some(SortField::Bathrooms),
            "square_feet" | "sqft" | "building_sqft" => Some(SortField::SquareFeet),
            "year_built" => Some(SortField::YearBuilt),
            "roi_potential" | "roi" => Some(SortField::RoiPotential),
            "name" => Some(SortField::Name),
            "property_id" | "id" => Some(SortField::PropertyId),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::EstimatedValue => "estimated_value",
            SortField::Bedrooms => "bedrooms",
            SortField::Bathrooms => "bathrooms",
            SortField::SquareFeet => "square_feet",
            SortField::YearBuilt => "year_built",
            SortField::RoiPotential => "roi_potential",
            SortField::Name => "name",
            SortField::PropertyId => "property_id",
        }
    }

    fn value<'a>(&self, property: &'a Property) -> Option<SortValue<'a>> {
        use SortValue::{Number, Text};
        match self {
            SortField::EstimatedValue => property.price.map(|v| Number(v as f64)),
            SortField::Bedrooms => property.bedrooms.map(|v| Number(v as f64)),
            SortField::Bathrooms => property.bathrooms.map(Number),
            SortField::SquareFeet => property.square_feet.map(|v| Number(v as f64)),
            SortField::YearBuilt => property.year_built.map(|v| Number(v as f64)),
            SortField::RoiPotential => property.roi_potential.map(Number),
            SortField::Name => Some(Text(&property.name)),
            SortField::PropertyId => Some(Number(property.property_id as f64)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Some(SortDirection::Asc),
            "desc" | "descending" => Some(SortDirection::Desc),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

enum SortValue<'a> {
    Number(f64),
    Text(&'a str),
}

impl SortValue<'_> {
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
            (SortValue::Text(a), SortValue::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            _ => Ordering::Equal,
        }
    }
}

/// AND-combined catalog filter.
///
/// Empty sets and `None` bounds do not constrain. A bound excludes
/// properties whose attribute is unknown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyQuery {
    #[serde(default)]
    pub boroughs: Vec<String>,
    #[serde(default)]
    pub min_price: Option<u64>,
    #[serde(default)]
    pub max_price: Option<u64>,
    #[serde(default)]
    pub min_bedrooms: Option<u32>,
    #[serde(default)]
    pub min_bathrooms: Option<f64>,
    #[serde(default)]
    pub min_sqft: Option<u32>,
    #[serde(default)]
    pub max_year_built: Option<u16>,
    #[serde(default)]
    pub property_types: Vec<String>,
    #[serde(default)]
    pub sort_by: SortField,
    #[serde(default)]
    pub sort_direction: SortDirection,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

impl Default for PropertyQuery {
    fn default() -> Self {
        Self {
            boroughs: Vec::new(),
            min_price: None,
            max_price: None,
            min_bedrooms: None,
            min_bathrooms: None,
            min_sqft: None,
            max_year_built: None,
            property_types: Vec::new(),
            sort_by: SortField::default(),
            sort_direction: SortDirection::default(),
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PropertyQuery {
    /// Build a query from URL query pairs. `borough` and `property_type`
    /// may repeat; blank values are ignored; unknown keys are skipped.
    pub fn from_params(pairs: &[(String, String)]) -> Result<Self> {
        let mut query = PropertyQuery::default();

        for (key, value) in pairs {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_str() {
                "borough" => query.boroughs.push(value.to_string()),
                "property_type" => query.property_types.push(value.to_string()),
                "min_price" => query.min_price = Some(parse_param(key, value)?),
                "max_price" => query.max_price = Some(parse_param(key, value)?),
                "min_bedrooms" => query.min_bedrooms = Some(parse_param(key, value)?),
                "min_bathrooms" => query.min_bathrooms = Some(parse_param(key, value)?),
                "min_sqft" => query.min_sqft = Some(parse_param(key, value)?),
                "max_year_built" => query.max_year_built = Some(parse_param(key, value)?),
                "limit" => query.limit = parse_param(key, value)?,
                "sort_by" => {
                    query.sort_by = SortField::parse(value).ok_or_else(|| {
                        BeaconError::ValidationError(format!("unknown sort field '{}'", value))
                    })?
                }
                "sort_direction" => {
                    query.sort_direction = SortDirection::parse(value).ok_or_else(|| {
                        BeaconError::ValidationError(format!(
                            "sort_direction must be 'asc' or 'desc', got '{}'",
                            value
                        ))
                    })?
                }
                other => debug!("Ignoring query parameter {}", other),
            }
        }

        Ok(query)
    }

    /// True when no predicate is set (ordering and limit aside).
    pub fn has_no_filters(&self) -> bool {
        self.boroughs.is_empty()
            && self.property_types.is_empty()
            && self.min_price.is_none()
            && self.max_price.is_none()
            && self.min_bedrooms.is_none()
            && self.min_bathrooms.is_none()
            && self.min_sqft.is_none()
            && self.max_year_built.is_none()
    }

    pub fn matches(&self, property: &Property) -> bool {
        in_set(&self.boroughs, Some(&property.borough))
            && in_set(&self.property_types, property.property_type.as_ref())
            && at_least(self.min_price, property.price)
            && at_most(self.max_price, property.price)
            && at_least(self.min_bedrooms, property.bedrooms)
            && at_least(self.min_bathrooms, property.bathrooms)
            && at_least(self.min_sqft, property.square_feet)
            && at_most(self.max_year_built, property.year_built)
    }
}

fn parse_param<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        BeaconError::ValidationError(format!("{} must be a non-negative number, got '{}'", key, value))
    })
}

fn in_set(set: &[String], value: Option<&String>) -> bool {
    if set.is_empty() {
        return true;
    }
    value.is_some_and(|v| set.iter().any(|s| s.eq_ignore_ascii_case(v)))
}

fn at_least<T: PartialOrd>(bound: Option<T>, value: Option<T>) -> bool {
    match bound {
        None => true,
        Some(min) => value.is_some_and(|v| v >= min),
    }
}

fn at_most<T: PartialOrd>(bound: Option<T>, value: Option<T>) -> bool {
    match bound {
        None => true,
        Some(max) => value.is_some_and(|v| v <= max),
    }
}

/// Stable sort; properties missing the field go last in either direction.
pub fn sort_properties(properties: &mut [Property], field: SortField, direction: SortDirection) {
    properties.sort_by(|a, b| match (field.value(a), field.value(b)) {
        (Some(x), Some(y)) => {
            let ordering = x.compare(&y);
            match direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}
