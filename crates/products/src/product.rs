use serde::{Deserialize, Serialize};

use restock_core::{DomainError, DomainResult, ProductId};

/// Storage class of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductType {
    #[serde(rename = "Perishable")]
    Perishable,
    #[serde(rename = "Non-Perishable")]
    NonPerishable,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Perishable => "Perishable",
            ProductType::NonPerishable => "Non-Perishable",
        }
    }
}

impl core::fmt::Display for ProductType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for ProductType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', ' '], "-").as_str() {
            "perishable" => Ok(ProductType::Perishable),
            "non-perishable" | "nonperishable" => Ok(ProductType::NonPerishable),
            other => Err(DomainError::validation(format!(
                "unknown product type '{other}' (expected Perishable or Non-Perishable)"
            ))),
        }
    }
}

/// Longest supplier lead time the catalog accepts (ten years).
pub const MAX_LEAD_TIME_DAYS: u32 = 3650;

/// Product metadata.
///
/// `lead_time_days` is optional in storage; consumers treat a missing value as
/// zero days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: ProductId,
    pub name: String,
    pub category: String,
    pub product_type: ProductType,
    pub shelf_life_days: u32,
    pub lead_time_days: Option<u32>,
    pub supplier: String,
}

impl Product {
    /// Validate a product before it is written to the catalog.
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("product name must not be empty"));
        }
        if self.product_type == ProductType::Perishable && self.shelf_life_days == 0 {
            return Err(DomainError::invariant(format!(
                "perishable product {} must declare a non-zero shelf life",
                self.product_id
            )));
        }
        if let Some(lead) = self.lead_time_days.filter(|&d| d > MAX_LEAD_TIME_DAYS) {
            return Err(DomainError::validation(format!(
                "lead time of {lead} days for {} exceeds {MAX_LEAD_TIME_DAYS}",
                self.product_id
            )));
        }
        Ok(())
    }

    /// Lead time with the "absent means zero" rule applied.
    pub fn effective_lead_time_days(&self) -> u32 {
        self.lead_time_days.unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn milk() -> Product {
        Product {
            product_id: ProductId::parse("SKU_101").unwrap(),
            name: "Whole Milk 1L".to_string(),
            category: "Dairy".to_string(),
            product_type: ProductType::Perishable,
            shelf_life_days: 10,
            lead_time_days: Some(2),
            supplier: "Mother Dairy".to_string(),
        }
    }

    #[test]
    fn valid_product_passes_validation() {
        assert!(milk().validate().is_ok());
    }

    #[test]
    fn blank_name_is_rejected() {
        let mut p = milk();
        p.name = "  ".to_string();
        match p.validate().unwrap_err() {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for empty name"),
        }
    }

    #[test]
    fn perishable_without_shelf_life_is_rejected() {
        let mut p = milk();
        p.shelf_life_days = 0;
        match p.validate().unwrap_err() {
            DomainError::InvariantViolation(_) => {}
            _ => panic!("Expected invariant violation for zero shelf life"),
        }
    }

    #[test]
    fn lead_time_beyond_ten_years_is_rejected() {
        let mut p = milk();
        p.lead_time_days = Some(MAX_LEAD_TIME_DAYS);
        assert!(p.validate().is_ok());

        p.lead_time_days = Some(u32::MAX);
        match p.validate().unwrap_err() {
            DomainError::Validation(msg) => assert!(msg.contains("SKU_101")),
            _ => panic!("Expected Validation error for oversized lead time"),
        }
    }

    #[test]
    fn missing_lead_time_counts_as_zero() {
        let mut p = milk();
        p.lead_time_days = None;
        assert_eq!(p.effective_lead_time_days(), 0);
    }

    #[test]
    fn product_type_uses_catalog_spelling() {
        assert_eq!(
            serde_json::to_string(&ProductType::NonPerishable).unwrap(),
            "\"Non-Perishable\""
        );
        assert_eq!("non perishable".parse::<ProductType>().unwrap(), ProductType::NonPerishable);
        assert_eq!("Perishable".parse::<ProductType>().unwrap(), ProductType::Perishable);
        assert!("frozen".parse::<ProductType>().is_err());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: product type names round-trip through their display form.
            #[test]
            fn product_type_display_parses_back(perishable in any::<bool>()) {
                let t = if perishable { ProductType::Perishable } else { ProductType::NonPerishable };
                prop_assert_eq!(t.to_string().parse::<ProductType>().unwrap(), t);
            }

            /// Property: lead time passes through unchanged when present.
            #[test]
            fn effective_lead_time_matches_declared(lead in 0u32..365) {
                let mut p = milk();
                p.lead_time_days = Some(lead);
                prop_assert_eq!(p.effective_lead_time_days(), lead);
            }
        }
    }
}
