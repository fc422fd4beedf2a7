//! # shoprec CLI
//!
//! Command-line interface for the co-purchase recommendation engine.
//!
//! ## Usage
//!
//! ```bash
//! shoprec --config ./config/shoprec.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `shoprec init` | Create the SQLite database and run schema migrations |
//! | `shoprec seed` | Load the demo catalog and purchase histories |
//! | `shoprec catalog` | List all products |
//! | `shoprec purchases --user <name>` | Show a user's purchase history |
//! | `shoprec search "<query>"` | Semantic product search |
//! | `shoprec context <product-id>` | Print the assembled retrieval context |
//! | `shoprec buy <product-id> --user <name>` | Record a purchase and get recommendations |
//! | `shoprec chat "<message>"` | Ask the recommendation agent a question |
//!
//! Search, context, buy, and chat require an embedding provider; buy and
//! chat additionally require the LLM API key configured in `[llm]`.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use shoprec::agent::RecommendationAgent;
use shoprec::config::{self, Config};
use shoprec::retrieval::{RetrievalError, VectorStore};
use shoprec::store::Store;
use shoprec::{embedding, seed};

/// shoprec — a co-purchase retrieval engine with RAG product recommendations.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file with `[db]`, `[embedding]`, `[retrieval]`, and `[llm]` sections.
#[derive(Parser)]
#[command(
    name = "shoprec",
    about = "shoprec — a co-purchase retrieval engine with RAG product recommendations",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/shoprec.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and all required tables (products,
    /// users, purchases). Idempotent — running it multiple times is safe.
    Init,

    /// Load the demo catalog and purchase histories.
    ///
    /// Inserts 30 demo products and 17 purchase histories. Idempotent;
    /// existing rows are left untouched.
    Seed,

    /// List all products in the catalog.
    Catalog,

    /// Show a user's purchase history with a running total.
    Purchases {
        /// Username (case-insensitive).
        #[arg(long)]
        user: String,
    },

    /// Search products by semantic similarity.
    ///
    /// Embeds the query and ranks every product by inner-product similarity.
    Search {
        /// The search query string.
        query: String,

        /// Maximum number of results to return.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Print the assembled retrieval context for a product.
    ///
    /// This is the evidence bundle handed to the LLM: the purchased-product
    /// summary, ranked co-purchase patterns, and ranked similar products.
    Context {
        /// Product id (e.g. P001).
        product_id: String,

        /// Number of co-purchase patterns to retrieve.
        #[arg(long)]
        patterns: Option<usize>,

        /// Number of similar products to retrieve.
        #[arg(long)]
        products: Option<usize>,
    },

    /// Record a purchase and print an LLM-generated recommendation.
    Buy {
        /// Product id (e.g. P001).
        product_id: String,

        /// Username to record the purchase for (created if absent).
        #[arg(long)]
        user: String,
    },

    /// Ask the recommendation agent a free-form question.
    Chat {
        /// The message to send.
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            let store = Store::open(&cfg.db).await?;
            store.migrate().await?;
            store.close().await;
            println!("Database initialized successfully.");
        }
        Commands::Seed => {
            let store = Store::open(&cfg.db).await?;
            let (products, users) = seed::run_seed(&store).await?;
            store.close().await;
            println!("Seeded {} products and {} purchase histories.", products, users);
        }
        Commands::Catalog => {
            let store = Store::open(&cfg.db).await?;
            run_catalog(&store).await?;
            store.close().await;
        }
        Commands::Purchases { user } => {
            let store = Store::open(&cfg.db).await?;
            run_purchases(&store, &user).await?;
            store.close().await;
        }
        Commands::Search { query, limit } => {
            let store = Store::open(&cfg.db).await?;
            let vectors = build_vector_store(&cfg, &store, "search").await?;
            let limit = limit.unwrap_or(cfg.retrieval.search_limit);
            run_search(&vectors, &query, limit).await?;
            store.close().await;
        }
        Commands::Context {
            product_id,
            patterns,
            products,
        } => {
            let store = Store::open(&cfg.db).await?;
            let vectors = build_vector_store(&cfg, &store, "context").await?;
            let pattern_k = patterns.unwrap_or(cfg.retrieval.pattern_k);
            let product_k = products.unwrap_or(cfg.retrieval.product_k);

            match vectors.retrieve_context(&product_id, pattern_k, product_k).await {
                Ok(context) => println!("{}", context.render()),
                Err(RetrievalError::ProductNotFound(id)) => {
                    eprintln!("Error: product not found: {}", id);
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            }
            store.close().await;
        }
        Commands::Buy { product_id, user } => {
            let store = Store::open(&cfg.db).await?;

            let product = match store.get_product(&product_id).await? {
                Some(p) => p,
                None => {
                    eprintln!(
                        "Error: product not found: {}. Use 'catalog' to see all products.",
                        product_id
                    );
                    std::process::exit(1);
                }
            };

            let vectors = build_vector_store(&cfg, &store, "buy").await?;

            println!(
                "Purchase confirmed! You bought: {} (${:.2})",
                product.name, product.price
            );
            println!("Generating recommendations...");
            println!();

            let mut agent = RecommendationAgent::new(cfg.llm.clone())?;
            let reply = agent
                .recommend_after_purchase(
                    &store,
                    &vectors,
                    &user,
                    &product_id,
                    cfg.retrieval.pattern_k,
                    cfg.retrieval.product_k,
                )
                .await?;
            println!("{}", reply);
            store.close().await;
        }
        Commands::Chat { message } => {
            let store = Store::open(&cfg.db).await?;
            let vectors = build_vector_store(&cfg, &store, "chat").await?;

            let mut agent = RecommendationAgent::new(cfg.llm.clone())?;
            let reply = agent.chat(&vectors, &message).await?;
            println!("{}", reply);
            store.close().await;
        }
    }

    Ok(())
}

/// Build both similarity indices from the current catalog/purchase snapshot.
///
/// Construction happens once, up front, before any query is served.
async fn build_vector_store(cfg: &Config, store: &Store, command: &str) -> Result<VectorStore> {
    if !cfg.embedding.is_enabled() {
        bail!(
            "Command '{}' requires embeddings. Set [embedding] provider in config.",
            command
        );
    }

    let provider = embedding::create_provider(&cfg.embedding)?;
    let products = store.list_products().await?;
    let purchases = store.list_purchases().await?;

    let vectors = VectorStore::build(products, &purchases, provider).await?;
    println!(
        "Indexed {} products and {} co-purchase patterns.",
        vectors.product_count(),
        vectors.pattern_count()
    );
    Ok(vectors)
}

async fn run_catalog(store: &Store) -> Result<()> {
    let products = store.list_products().await?;
    if products.is_empty() {
        println!("Catalog is empty. Run 'shoprec seed' to load the demo catalog.");
        return Ok(());
    }

    for product in &products {
        println!(
            "{:<6} {:<40} {:<12} {:>8}",
            product.id,
            product.name,
            product.category,
            format!("${:.2}", product.price)
        );
        println!("       {}", product.description);
    }
    println!();
    println!("{} products.", products.len());
    Ok(())
}

async fn run_purchases(store: &Store, username: &str) -> Result<()> {
    let user = store.get_user_by_name(username).await?;
    let Some((user_id, username)) = user else {
        println!("No purchases recorded for {}.", username);
        return Ok(());
    };

    let product_ids = store.purchases_for_user(&user_id).await?;
    if product_ids.is_empty() {
        println!("No purchases recorded for {}.", username);
        return Ok(());
    }

    println!("Purchases for {} ({}):", username, user_id);
    let mut total = 0.0;
    for product_id in &product_ids {
        // Purchases may reference products removed from the catalog
        if let Some(product) = store.get_product(product_id).await? {
            println!(
                "  {:<6} {:<40} {:>8}",
                product.id,
                product.name,
                format!("${:.2}", product.price)
            );
            total += product.price;
        }
    }
    println!("  TOTAL: ${:.2}", total);
    Ok(())
}

async fn run_search(vectors: &VectorStore, query: &str, limit: usize) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let results = vectors.search_similar(query, limit).await?;
    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, (product_id, score)) in results.iter().enumerate() {
        if let Some(product) = vectors.get_product(product_id) {
            println!(
                "{}. [{:.3}] {} - {} - ${:.2}",
                i + 1,
                score,
                product.id,
                product.name,
                product.price
            );
            println!("    {}", product.description);
        }
    }
    Ok(())
}
