//! # Product Types
//!
//! Product catalog types for voltshop.
//! The catalog is loaded from `config/products.toml`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A product in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique product identifier (e.g., "deye-sun-12k")
    pub id: String,

    /// Display name
    pub name: String,

    /// URL slug
    pub slug: String,

    /// Short description
    #[serde(default)]
    pub description: String,

    /// Category slug (e.g., "inverters", "batteries")
    #[serde(default)]
    pub category: Option<String>,

    /// Unit price, exact decimal
    pub price: Decimal,

    /// Optional image URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    /// Whether this product is available for purchase
    #[serde(default = "default_true")]
    pub available: bool,
}

fn default_true() -> bool {
    true
}

impl Product {
    /// Create a product with required fields
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Decimal) -> Self {
        let name: String = name.into();
        let slug = slugify(&name);
        Self {
            id: id.into(),
            name,
            slug,
            description: String::new(),
            category: None,
            price,
            image_url: None,
            available: true,
        }
    }

    /// Builder: set description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    /// Builder: set category
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Builder: set image URL
    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// Builder: mark unavailable
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }
}

fn slugify(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Product catalog (loaded from config)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductCatalog {
    pub products: Vec<Product>,
}

impl ProductCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self {
            products: Vec::new(),
        }
    }

    /// Add a product to the catalog
    pub fn add(&mut self, product: Product) {
        self.products.push(product);
    }

    /// Find a product by ID
    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// All products currently available for purchase
    pub fn available_products(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|p| p.available)
    }

    /// Available products in a category
    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Product> {
        self.available_products()
            .filter(move |p| p.category.as_deref() == Some(category))
    }

    /// Load catalog from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Deye SUN 12K"), "deye-sun-12k");
        assert_eq!(slugify("  LiFePO4 -- 48V  "), "lifepo4-48v");
    }

    #[test]
    fn test_catalog_lookup() {
        let mut catalog = ProductCatalog::new();
        catalog.add(Product::new("p1", "Inverter", dec!(999.99)).with_category("inverters"));
        catalog.add(Product::new("p2", "Battery", dec!(1450.00)).unavailable());

        assert_eq!(catalog.get("p1").unwrap().slug, "inverter");
        assert!(catalog.get("missing").is_none());
        assert_eq!(catalog.available_products().count(), 1);
        assert_eq!(catalog.by_category("inverters").count(), 1);
    }

    #[test]
    fn test_catalog_from_toml() {
        let toml_str = r#"
            [[products]]
            id = "deye-sun-12k"
            name = "Deye SUN-12K"
            slug = "deye-sun-12k"
            price = "3200.00"
            category = "inverters"
        "#;

        let catalog = ProductCatalog::from_toml(toml_str).unwrap();
        let product = catalog.get("deye-sun-12k").unwrap();
        assert_eq!(product.price, dec!(3200.00));
        assert!(product.available);
    }
}
