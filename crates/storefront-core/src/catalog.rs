//! Product Catalog
//!
//! The trusted price list. The server prices payment intents from it; the
//! frontend renders add-to-cart buttons from it.

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::NewLine;
use crate::error::{Result, StorefrontError};

/// A sellable product
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Offered sizes; empty when the product has no size variants
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sizes: Vec<String>,
}

impl Product {
    pub fn offers_size(&self, size: Option<&str>) -> bool {
        match size {
            None => self.sizes.is_empty(),
            Some(size) => self.sizes.iter().any(|s| s == size),
        }
    }

    /// Cart line for this product in the given size
    pub fn to_line(&self, size: Option<&str>) -> NewLine {
        let mut line = NewLine::new(self.id.clone(), self.name.clone(), self.price);
        line.image = self.image.clone();
        line.size = size.map(str::to_string);
        line
    }
}

/// Ordered list of products
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Result<Self> {
        for product in &products {
            if product.price < Decimal::ZERO {
                return Err(StorefrontError::InvalidInput(format!(
                    "product '{}' has a negative price",
                    product.id
                )));
            }
        }

        let mut ids: Vec<&str> = products.iter().map(|p| p.id.as_str()).collect();
        ids.sort_unstable();
        if let Some(dup) = ids.windows(2).find(|w| w[0] == w[1]) {
            return Err(StorefrontError::InvalidInput(format!("duplicate product id '{}'", dup[0])));
        }

        Ok(Self { products })
    }

    /// Parse a JSON array of products
    pub fn from_json(raw: &str) -> Result<Self> {
        let products: Vec<Product> = serde_json::from_str(raw)?;
        Self::new(products)
    }

    /// Load a JSON catalog file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| StorefrontError::Config(format!("cannot read catalog {}: {e}", path.display())))?;
        Self::from_json(&raw)
    }

    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
