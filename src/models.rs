//! Core data models used throughout shoprec.
//!
//! These types represent the catalog products and purchase histories that
//! flow through the co-purchase aggregation and retrieval pipeline.

/// A product in the catalog. Immutable for the retrieval engine's purposes.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub price: f64,
    pub tags: Vec<String>,
}

impl Product {
    /// Rich text representation used as embedding input.
    ///
    /// Deterministic: the same product always yields the same text, so
    /// re-indexing an unchanged catalog is reproducible.
    pub fn canonical_text(&self) -> String {
        format!(
            "{}. Category: {}. {} Tags: {}.",
            self.name,
            self.category,
            self.description,
            self.tags.join(", ")
        )
    }
}

/// A user's purchase history. Grows by appending product ids; never shrinks.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseRecord {
    pub user_id: String,
    pub username: String,
    pub product_ids: Vec<String>,
}
