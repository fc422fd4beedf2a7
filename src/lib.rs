//! # shoprec
//!
//! A co-purchase retrieval engine with RAG product recommendations.
//!
//! shoprec turns a purchase event into a ranked evidence bundle for an LLM:
//! it finds products whose embedding is similar to a query, aggregates
//! historical co-purchase patterns from the purchase history, and merges both
//! signal types into a single ranked, deduplicated context document.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌───────────────┐
//! │   SQLite     │──▶│  Co-Purchase  │──▶│ Pattern Docs  │
//! │ catalog +    │   │  Aggregator   │   └──────┬────────┘
//! │ purchases    │   └───────────────┘          ▼
//! └──────┬───────┘                       ┌───────────────┐
//!        │ canonical texts               │  Embeddings   │
//!        └──────────────────────────────▶│   Provider    │
//!                                        └──────┬────────┘
//!                                               ▼
//!                                   ┌───────────────────────┐
//!                                   │ VectorStore           │
//!                                   │ product + pattern idx │
//!                                   └──────┬────────────────┘
//!                                          ▼
//!                              retrieve_context → LLM agent
//! ```
//!
//! Both indices are built wholesale from a catalog/purchase snapshot before
//! any query is served; recording new purchases does not retroactively
//! update an existing index.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`store`] | Catalog and purchase-history store (SQLite) |
//! | [`seed`] | Demo catalog and purchase fixtures |
//! | [`copurchase`] | Co-purchase aggregation and pattern documents |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`index`] | Exact-search similarity index |
//! | [`retrieval`] | Dual-index retrieval orchestration |
//! | [`agent`] | LLM recommendation agent |
//! | [`migrate`] | Schema migrations |

pub mod agent;
pub mod config;
pub mod copurchase;
pub mod embedding;
pub mod index;
pub mod migrate;
pub mod models;
pub mod retrieval;
pub mod seed;
pub mod store;
