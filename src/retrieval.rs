//! Retrieval orchestration over the dual similarity index.
//!
//! [`VectorStore`] holds two indices built from one catalog/purchase
//! snapshot: one over product canonical texts, one over co-purchase pattern
//! documents. [`VectorStore::retrieve_context`] merges both signal types
//! into a single ranked, deduplicated evidence bundle for the text-generation
//! boundary. Queries reflect the snapshot as of the last build; recording new
//! purchases does not retroactively update an existing store.

use std::collections::HashMap;

use thiserror::Error;

use crate::copurchase::{build_pattern_document, co_purchase_counts};
use crate::embedding::EmbeddingProvider;
use crate::index::VectorIndex;
use crate::models::{Product, PurchaseRecord};

/// Failures the retrieval boundary reports to callers.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The requested product id is absent from the catalog. Never silently
    /// substituted with a partial document.
    #[error("product not found: {0}")]
    ProductNotFound(String),

    /// The external embedding call failed after retries. Retryable by the
    /// caller; retrieval aborts rather than returning an empty context that
    /// could be mistaken for "no matches".
    #[error("embedding provider failure")]
    Embedding(#[source] anyhow::Error),
}

/// A co-purchase pattern retrieved for a query.
#[derive(Debug, Clone)]
pub struct PatternMatch {
    pub source_product_id: String,
    pub score: f32,
    pub document: String,
}

/// A similar product retrieved for a query.
#[derive(Debug, Clone)]
pub struct SimilarMatch {
    pub product_id: String,
    pub name: String,
    pub price: f64,
    pub description: String,
    pub score: f32,
}

/// The assembled evidence bundle for one purchase event. Transient: produced
/// per request, never persisted.
#[derive(Debug, Clone)]
pub struct RetrievalContext {
    pub product: Product,
    pub patterns: Vec<PatternMatch>,
    pub similar: Vec<SimilarMatch>,
}

impl RetrievalContext {
    /// Render the context as the plain-text document handed to the LLM.
    /// Empty sections are omitted entirely.
    pub fn render(&self) -> String {
        let mut parts = vec![
            "=== PURCHASED PRODUCT ===".to_string(),
            format!("Product: {}", self.product.name),
            format!("Category: {}", self.product.category),
            format!("Description: {}", self.product.description),
            format!("Price: ${:.2}", self.product.price),
            format!("Tags: {}", self.product.tags.join(", ")),
        ];

        if !self.patterns.is_empty() {
            parts.push(String::new());
            parts.push("=== CO-PURCHASE PATTERNS (from user history) ===".to_string());
            for pattern in &self.patterns {
                parts.push(format!("[Relevance: {:.3}]", pattern.score));
                parts.push(pattern.document.clone());
            }
        }

        if !self.similar.is_empty() {
            parts.push(String::new());
            parts.push("=== SIMILAR PRODUCTS (by embedding similarity) ===".to_string());
            for similar in &self.similar {
                parts.push(format!(
                    "[Similarity: {:.3}] {} - ${:.2} - {}",
                    similar.score, similar.name, similar.price, similar.description
                ));
            }
        }

        parts.join("\n")
    }
}

/// Dual similarity index over one catalog/purchase snapshot.
pub struct VectorStore {
    provider: Box<dyn EmbeddingProvider>,
    products: HashMap<String, Product>,
    product_index: VectorIndex,
    pattern_index: VectorIndex,
    pattern_docs: HashMap<String, String>,
}

impl VectorStore {
    /// Build both indices from the given snapshot.
    ///
    /// The product index covers every product's canonical text. The pattern
    /// index covers one pattern document per product with a non-empty
    /// co-purchase aggregate. Construction completes in full before the
    /// store is returned, so no partially-populated index is ever queryable;
    /// rebuilding means building a new store and swapping it in.
    pub async fn build(
        products: Vec<Product>,
        purchases: &[PurchaseRecord],
        provider: Box<dyn EmbeddingProvider>,
    ) -> Result<Self, RetrievalError> {
        let catalog: HashMap<String, Product> = products
            .iter()
            .map(|p| (p.id.clone(), p.clone()))
            .collect();

        let product_entries: Vec<(String, String)> = products
            .iter()
            .map(|p| (p.id.clone(), p.canonical_text()))
            .collect();

        let mut pattern_entries: Vec<(String, String)> = Vec::new();
        let mut pattern_docs: HashMap<String, String> = HashMap::new();
        for product in &products {
            let aggregate = co_purchase_counts(&product.id, purchases);
            if aggregate.is_empty() {
                continue;
            }
            let document = build_pattern_document(product, &aggregate, &catalog);
            pattern_entries.push((product.id.clone(), document.clone()));
            pattern_docs.insert(product.id.clone(), document);
        }

        let product_index = VectorIndex::build(product_entries, provider.as_ref())
            .await
            .map_err(RetrievalError::Embedding)?;
        let pattern_index = VectorIndex::build(pattern_entries, provider.as_ref())
            .await
            .map_err(RetrievalError::Embedding)?;

        Ok(Self {
            provider,
            products: catalog,
            product_index,
            pattern_index,
            pattern_docs,
        })
    }

    pub fn product_count(&self) -> usize {
        self.product_index.len()
    }

    pub fn pattern_count(&self) -> usize {
        self.pattern_index.len()
    }

    pub fn get_product(&self, id: &str) -> Option<&Product> {
        self.products.get(id)
    }

    /// Search the product index for the most similar products.
    pub async fn search_similar(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<(String, f32)>, RetrievalError> {
        let query_vec = self
            .provider
            .embed(query)
            .await
            .map_err(RetrievalError::Embedding)?;
        Ok(self.product_index.query(&query_vec, k))
    }

    /// Search the pattern index for the most relevant co-purchase patterns.
    pub async fn search_patterns(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<(String, f32)>, RetrievalError> {
        if self.pattern_index.is_empty() {
            return Ok(Vec::new());
        }
        let query_vec = self
            .provider
            .embed(query)
            .await
            .map_err(RetrievalError::Embedding)?;
        Ok(self.pattern_index.query(&query_vec, k))
    }

    /// Assemble the ranked evidence bundle for a purchased product.
    ///
    /// The product index is queried with `product_k + 1` because the product
    /// always appears as its own best match; that hit is filtered out before
    /// truncating to `product_k`. Fails with [`RetrievalError::ProductNotFound`]
    /// before any embedding call when the id does not resolve.
    pub async fn retrieve_context(
        &self,
        product_id: &str,
        pattern_k: usize,
        product_k: usize,
    ) -> Result<RetrievalContext, RetrievalError> {
        let product = self
            .products
            .get(product_id)
            .ok_or_else(|| RetrievalError::ProductNotFound(product_id.to_string()))?
            .clone();

        let query_vec = self
            .provider
            .embed(&product.canonical_text())
            .await
            .map_err(RetrievalError::Embedding)?;

        let patterns: Vec<PatternMatch> = self
            .pattern_index
            .query(&query_vec, pattern_k)
            .into_iter()
            .map(|(id, score)| PatternMatch {
                document: self.pattern_docs.get(&id).cloned().unwrap_or_default(),
                source_product_id: id,
                score,
            })
            .collect();

        let similar: Vec<SimilarMatch> = self
            .product_index
            .query(&query_vec, product_k + 1)
            .into_iter()
            .filter(|(id, _)| id != product_id)
            .take(product_k)
            .filter_map(|(id, score)| {
                self.products.get(&id).map(|p| SimilarMatch {
                    product_id: id.clone(),
                    name: p.name.clone(),
                    price: p.price,
                    description: p.description.clone(),
                    score,
                })
            })
            .collect();

        Ok(RetrievalContext {
            product,
            patterns,
            similar,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Provider that derives a deterministic unit vector from text content
    /// and counts how many embedding calls were made.
    struct HashProvider {
        calls: Arc<AtomicUsize>,
    }

    impl HashProvider {
        fn new() -> (Self, Arc<AtomicUsize>) {
            let calls = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    calls: calls.clone(),
                },
                calls,
            )
        }
    }

    #[async_trait]
    impl EmbeddingProvider for HashProvider {
        fn model_name(&self) -> &str {
            "hash"
        }
        fn dims(&self) -> usize {
            4
        }
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|text| {
                    let mut vec = [0.0f32; 4];
                    for (i, byte) in text.bytes().enumerate() {
                        vec[i % 4] += byte as f32;
                    }
                    let mut vec = vec.to_vec();
                    crate::embedding::normalize(&mut vec);
                    vec
                })
                .collect())
        }
    }

    /// Provider that can be switched into a failure mode after a successful
    /// build, simulating an upstream API outage.
    struct OutageProvider {
        down: Arc<AtomicBool>,
    }

    #[async_trait]
    impl EmbeddingProvider for OutageProvider {
        fn model_name(&self) -> &str {
            "outage"
        }
        fn dims(&self) -> usize {
            4
        }
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            if self.down.load(Ordering::SeqCst) {
                anyhow::bail!("embeddings API unreachable");
            }
            Ok(texts.iter().map(|_| vec![0.5, 0.5, 0.5, 0.5]).collect())
        }
    }

    fn product(id: &str, name: &str) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            category: "Fitness".to_string(),
            description: format!("Description of {}.", name),
            price: 42.0,
            tags: vec!["fitness".to_string()],
        }
    }

    fn record(user: &str, ids: &[&str]) -> PurchaseRecord {
        PurchaseRecord {
            user_id: user.to_string(),
            username: user.to_string(),
            product_ids: ids.iter().map(|s| s.to_string()).collect(),
        }
    }

    async fn sample_store() -> VectorStore {
        let products = vec![
            product("P001", "Kettlebell"),
            product("P002", "Yoga Mat"),
            product("P003", "Resistance Bands"),
        ];
        let purchases = vec![
            record("U1", &["P001", "P002"]),
            record("U2", &["P001", "P002", "P003"]),
            record("U3", &["P003"]),
        ];
        let (provider, _) = HashProvider::new();
        VectorStore::build(products, &purchases, Box::new(provider))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_build_indexes_products_and_patterns() {
        let store = sample_store().await;
        assert_eq!(store.product_count(), 3);
        // All three products co-occur with something
        assert_eq!(store.pattern_count(), 3);
    }

    #[tokio::test]
    async fn test_products_without_co_purchases_get_no_pattern() {
        let products = vec![product("P001", "Kettlebell"), product("P002", "Yoga Mat")];
        let purchases = vec![record("U1", &["P001"])];
        let (provider, _) = HashProvider::new();
        let store = VectorStore::build(products, &purchases, Box::new(provider))
            .await
            .unwrap();
        assert_eq!(store.product_count(), 2);
        assert_eq!(store.pattern_count(), 0);

        // Pattern search over an empty index returns nothing, not an error
        let patterns = store.search_patterns("kettlebell", 3).await.unwrap();
        assert!(patterns.is_empty());
    }

    #[tokio::test]
    async fn test_retrieve_context_excludes_queried_product() {
        let store = sample_store().await;
        let context = store.retrieve_context("P001", 3, 5).await.unwrap();

        assert_eq!(context.product.id, "P001");
        assert!(context.similar.iter().all(|s| s.product_id != "P001"));
        // Two other products in the catalog
        assert_eq!(context.similar.len(), 2);
    }

    #[tokio::test]
    async fn test_retrieve_context_respects_product_k() {
        let store = sample_store().await;
        let context = store.retrieve_context("P001", 3, 1).await.unwrap();
        assert_eq!(context.similar.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_product_fails_without_embedding_calls() {
        let products = vec![product("P001", "Kettlebell")];
        let purchases = vec![record("U1", &["P001", "P002"])];
        let (provider, calls) = HashProvider::new();
        let store = VectorStore::build(products, &purchases, Box::new(provider))
            .await
            .unwrap();

        let calls_after_build = calls.load(Ordering::SeqCst);
        let err = store.retrieve_context("UNKNOWN_ID", 3, 5).await.unwrap_err();
        assert!(matches!(err, RetrievalError::ProductNotFound(ref id) if id == "UNKNOWN_ID"));
        assert_eq!(calls.load(Ordering::SeqCst), calls_after_build);
    }

    #[tokio::test]
    async fn test_provider_failure_surfaces_as_embedding_error() {
        let down = Arc::new(AtomicBool::new(false));
        let provider = OutageProvider { down: down.clone() };
        let products = vec![product("P001", "Kettlebell"), product("P002", "Yoga Mat")];
        let purchases = vec![record("U1", &["P001", "P002"])];
        let store = VectorStore::build(products, &purchases, Box::new(provider))
            .await
            .unwrap();

        down.store(true, Ordering::SeqCst);

        // A known product id must abort with the provider error, not return
        // an empty context that looks like "no matches".
        let err = store.retrieve_context("P001", 3, 5).await.unwrap_err();
        assert!(matches!(err, RetrievalError::Embedding(_)));

        let err = store.search_similar("kettlebell", 3).await.unwrap_err();
        assert!(matches!(err, RetrievalError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_render_omits_empty_sections() {
        let products = vec![product("P001", "Kettlebell")];
        let (provider, _) = HashProvider::new();
        let store = VectorStore::build(products, &[], Box::new(provider))
            .await
            .unwrap();

        let context = store.retrieve_context("P001", 3, 5).await.unwrap();
        let rendered = context.render();
        assert!(rendered.contains("=== PURCHASED PRODUCT ==="));
        assert!(rendered.contains("Product: Kettlebell"));
        assert!(!rendered.contains("CO-PURCHASE PATTERNS"));
        assert!(!rendered.contains("SIMILAR PRODUCTS"));
    }

    #[tokio::test]
    async fn test_render_includes_scored_sections() {
        let store = sample_store().await;
        let context = store.retrieve_context("P001", 3, 5).await.unwrap();
        let rendered = context.render();
        assert!(rendered.contains("=== CO-PURCHASE PATTERNS (from user history) ==="));
        assert!(rendered.contains("[Relevance:"));
        assert!(rendered.contains("=== SIMILAR PRODUCTS (by embedding similarity) ==="));
        assert!(rendered.contains("[Similarity:"));
    }

    #[tokio::test]
    async fn test_rebuild_from_unchanged_snapshot_is_identical() {
        let first = sample_store().await;
        let second = sample_store().await;

        let a = first.search_similar("yoga", 3).await.unwrap();
        let b = second.search_similar("yoga", 3).await.unwrap();
        assert_eq!(a, b);
    }
}
