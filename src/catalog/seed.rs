//! Reference properties seeded on first run

use crate::models::{InvestmentStrategy, Property, RiskLevel};

#[allow(clippy::too_many_arguments)]
fn property(
    property_id: u32,
    name: &str,
    description: &str,
    borough: &str,
    neighborhood: &str,
    property_type: &str,
    price: u64,
    bedrooms: u32,
    bathrooms: f64,
    square_feet: u32,
    strategy: InvestmentStrategy,
    roi_potential: f64,
    risk_level: RiskLevel,
) -> Property {
    Property {
        property_id,
        name: name.to_string(),
        description: description.to_string(),
        borough: borough.to_string(),
        neighborhood: Some(neighborhood.to_string()),
        property_type: Some(property_type.to_string()),
        price: Some(price),
        bedrooms: Some(bedrooms),
        bathrooms: Some(bathrooms),
        square_feet: Some(square_feet),
        year_built: None,
        investment_strategy: Some(strategy),
        roi_potential: Some(roi_potential),
        risk_level: Some(risk_level),
        image_url: Some(format!("/static/images/property{}.jpg", property_id)),
    }
}

/// The fixed sample catalog
pub fn seed_properties() -> Vec<Property> {
    use InvestmentStrategy::*;
    use RiskLevel::*;

    vec![
        // Manhattan
        property(1, "The Hudson Residence", "Luxury condominium with river views and high-end finishes",
            "Manhattan", "Upper West Side", "Condo", 1_950_000, 2, 2.0, 1200, Value, 4.2, Medium),
        property(2, "Greenwich Village Co-op", "Pre-war co-op with character in prime location",
            "Manhattan", "Greenwich Village", "Co-op", 1_250_000, 1, 1.0, 750, Growth, 3.8, Low),
        property(3, "Tribeca Loft", "Converted loft space with high ceilings and open floor plan",
            "Manhattan", "Tribeca", "Condo", 3_200_000, 3, 2.5, 2200, Luxury, 3.5, Medium),
        // Brooklyn
        property(4, "Williamsburg Townhouse", "Renovated brownstone with rental unit in basement",
            "Brooklyn", "Williamsburg", "Townhouse", 2_750_000, 4, 3.5, 2800, Cashflow, 5.1, Low),
        property(5, "Park Slope Condo", "Modern condo near Prospect Park with outdoor space",
            "Brooklyn", "Park Slope", "Condo", 1_450_000, 2, 2.0, 1100, Value, 4.5, Low),
        property(6, "Dumbo Loft", "Industrial conversion with Manhattan views",
            "Brooklyn", "Dumbo", "Condo", 1_850_000, 1, 1.5, 1300, Growth, 4.8, Medium),
        // Queens
        property(7, "Astoria Multi-family", "Three-unit building with stable rental income",
            "Queens", "Astoria", "Multi-family", 1_650_000, 6, 3.0, 3200, Cashflow, 6.2, Medium),
        property(8, "Long Island City High-Rise", "New development with amenities and skyline views",
            "Queens", "Long Island City", "Condo", 1_200_000, 1, 1.0, 800, Growth, 4.9, Low),
        property(9, "Forest Hills Tudor", "Classic Tudor in prestigious neighborhood",
            "Queens", "Forest Hills", "Single-family", 1_350_000, 3, 2.5, 2100, Value, 3.7, Low),
        // Bronx
        property(10, "Riverdale Luxury Home", "Spacious home with yard in upscale neighborhood",
            "Bronx", "Riverdale", "Single-family", 1_250_000, 4, 3.0, 2800, Luxury, 3.4, Low),
        property(11, "Mott Haven Development", "Emerging area with strong appreciation potential",
            "Bronx", "Mott Haven", "Condo", 650_000, 2, 2.0, 1100, Growth, 5.8, High),
        // Staten Island
        property(12, "St. George Townhouse", "Recently renovated with ferry access to Manhattan",
            "Staten Island", "St. George", "Townhouse", 850_000, 3, 2.5, 2200, Cashflow, 5.3, Medium),
        property(13, "Todt Hill Estate", "Luxury estate with large lot and privacy",
            "Staten Island", "Todt Hill", "Single-family", 1_650_000, 5, 4.0, 4200, Luxury, 2.9, Low),
    ]
}
