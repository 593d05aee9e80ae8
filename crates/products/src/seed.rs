//! Starter catalog used by the `restock-seed` binary.

use restock_core::{DomainResult, ProductId};

use crate::product::{Product, ProductType};

fn entry(
    id: &str,
    name: &str,
    category: &str,
    product_type: ProductType,
    shelf_life_days: u32,
    lead_time_days: u32,
    supplier: &str,
) -> DomainResult<Product> {
    let product = Product {
        product_id: ProductId::parse(id)?,
        name: name.to_string(),
        category: category.to_string(),
        product_type,
        shelf_life_days,
        lead_time_days: Some(lead_time_days),
        supplier: supplier.to_string(),
    };
    product.validate()?;
    Ok(product)
}

/// Default product metadata for a fresh store. Every entry is validated.
pub fn default_catalog() -> DomainResult<Vec<Product>> {
    [
        entry("SKU_101", "Whole Milk 1L", "Dairy", ProductType::Perishable, 10, 2, "Mother Dairy"),
        entry(
            "SKU_102",
            "Basmati Rice 1kg",
            "Grocery",
            ProductType::NonPerishable,
            365,
            5,
            "India Gate",
        ),
    ]
    .into_iter()
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use restock_core::DomainError;

    #[test]
    fn default_catalog_is_valid() {
        let catalog = default_catalog().unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[0].product_id.as_str(), "SKU_101");
        assert_eq!(catalog[1].lead_time_days, Some(5));
    }

    #[test]
    fn bad_entry_is_reported_not_dropped() {
        let blank_id = entry(" ", "Bread", "Bakery", ProductType::Perishable, 3, 1, "Bakehouse");
        assert!(matches!(blank_id, Err(DomainError::InvalidId(_))));

        let no_shelf_life = entry("SKU_9", "Bread", "Bakery", ProductType::Perishable, 0, 1, "Bakehouse");
        assert!(no_shelf_life.is_err());
    }
}
