//! Exact-search similarity index.
//!
//! A brute-force inner-product index over parallel id/vector arrays.
//! Exact linear scan is correct and sufficient at catalog scale (tens to low
//! thousands of entries); the narrow build/query surface leaves room to swap
//! in an approximate structure later without touching callers.

use anyhow::{bail, Result};
use std::cmp::Ordering;

use crate::embedding::{dot, EmbeddingProvider};

/// Immutable vector index. `ids[i]` always labels `vectors[i]`; the two
/// arrays are built together and never mutated afterwards. Rebuilding means
/// constructing a new index and replacing the old one wholesale.
pub struct VectorIndex {
    ids: Vec<String>,
    vectors: Vec<Vec<f32>>,
    dims: usize,
}

impl VectorIndex {
    /// An index with no entries. Valid and queryable; every query returns
    /// an empty result.
    pub fn empty(dims: usize) -> Self {
        Self {
            ids: Vec::new(),
            vectors: Vec::new(),
            dims,
        }
    }

    /// Embed every entry's text and store the vectors alongside their ids
    /// in entry order.
    ///
    /// The returned index is fully built; no partial state is ever observable.
    pub async fn build(
        entries: Vec<(String, String)>,
        provider: &dyn EmbeddingProvider,
    ) -> Result<Self> {
        let dims = provider.dims();
        if entries.is_empty() {
            return Ok(Self::empty(dims));
        }

        let texts: Vec<String> = entries.iter().map(|(_, text)| text.clone()).collect();
        let ids: Vec<String> = entries.into_iter().map(|(id, _)| id).collect();

        let vectors = provider.embed_batch(&texts).await?;
        if vectors.len() != ids.len() {
            bail!(
                "Embedding provider returned {} vectors for {} texts",
                vectors.len(),
                ids.len()
            );
        }
        for vec in &vectors {
            if vec.len() != dims {
                bail!(
                    "Embedding dimension mismatch: expected {}, got {}",
                    dims,
                    vec.len()
                );
            }
        }

        Ok(Self { ids, vectors, dims })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Top-k entries by inner product against `query`, descending.
    ///
    /// Inner product equals cosine similarity here since all stored vectors
    /// and the query are unit-normalized. Ties are broken by ascending build
    /// position (first indexed wins). Returns fewer than `k` results when the
    /// index holds fewer entries; an empty index yields an empty vec.
    ///
    /// # Panics
    ///
    /// Panics if the query dimension does not match the index dimension;
    /// that is a caller contract violation, not a recoverable condition.
    pub fn query(&self, query: &[f32], k: usize) -> Vec<(String, f32)> {
        if self.vectors.is_empty() || k == 0 {
            return Vec::new();
        }
        assert_eq!(
            query.len(),
            self.dims,
            "query dimension {} does not match index dimension {}",
            query.len(),
            self.dims
        );

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, vec)| (position, dot(query, vec)))
            .collect();

        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(position, score)| (self.ids[position].clone(), score))
            .collect()
    }
}
