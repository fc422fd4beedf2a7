//! LLM recommendation agent.
//!
//! Wraps an OpenAI-compatible chat-completions endpoint (Groq by default).
//! The agent consumes the assembled retrieval context, not raw scores: the
//! vector store produces the evidence bundle and the agent turns it into a
//! natural-language recommendation, keeping a per-session conversation
//! history for follow-up questions.

use anyhow::{anyhow, bail, Result};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::retrieval::VectorStore;
use crate::store::Store;

const SYSTEM_PROMPT: &str = "You are a friendly and knowledgeable shopping assistant AI.
Your job is to recommend products to users based on what other customers
who bought the same item have also purchased.

You will receive:
1. The product the user just bought.
2. Co-purchase patterns retrieved from a vector index showing what other
   users who bought the same or similar products also purchased.
3. A list of similar products by embedding similarity.

RULES:
- Recommend 3 to 5 products maximum.
- Present recommendations under the heading \"Other users also bought...\"
- For each recommendation, briefly explain WHY it is relevant
  (e.g., \"popular among runners\", \"great complement for gym workouts\").
- Include the product name and price.
- Be conversational but concise.
- Do NOT recommend the product the user just bought.
- If possible, recommend products from different categories to offer variety.
- Answer in the same language the user writes in. Default to English.";

#[derive(Debug, Clone, serde::Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

pub struct RecommendationAgent {
    config: LlmConfig,
    client: reqwest::Client,
    history: Vec<ChatMessage>,
}

impl RecommendationAgent {
    pub fn new(config: LlmConfig) -> Result<Self> {
        // One client for the agent's lifetime; follow-up turns reuse the
        // connection.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            config,
            client,
            history: Vec::new(),
        })
    }

    /// Process a purchase end to end: record it, retrieve the evidence
    /// bundle from the vector store, and ask the LLM for recommendations.
    ///
    /// The vector store reflects the snapshot as of its last build; the
    /// purchase recorded here shows up in co-purchase patterns only after
    /// the next rebuild.
    pub async fn recommend_after_purchase(
        &mut self,
        store: &Store,
        vectors: &VectorStore,
        username: &str,
        product_id: &str,
        pattern_k: usize,
        product_k: usize,
    ) -> Result<String> {
        let product = store
            .get_product(product_id)
            .await?
            .ok_or_else(|| anyhow!("product not found: {}", product_id))?;

        store.record_purchase(username, product_id).await?;

        let context = vectors
            .retrieve_context(product_id, pattern_k, product_k)
            .await?;

        let user_message = format!(
            "I just bought: {} (${:.2}).\n\n\
             Based on the following purchase data and product similarities, \
             please recommend other products I might like.\n\n\
             --- RETRIEVED CONTEXT ---\n{}\n--- END CONTEXT ---",
            product.name,
            product.price,
            context.render()
        );

        let reply = self.complete(&user_message).await?;

        self.history.push(ChatMessage::new("user", user_message));
        self.history.push(ChatMessage::new("assistant", reply.as_str()));

        Ok(reply)
    }

    /// Handle a free-form question, grounding it with semantically related
    /// products when any are found.
    pub async fn chat(&mut self, vectors: &VectorStore, message: &str) -> Result<String> {
        let extra_context = self.related_products_context(vectors, message).await?;

        let full_message = if extra_context.is_empty() {
            message.to_string()
        } else {
            format!(
                "{}\n\n--- ADDITIONAL CONTEXT ---\n{}\n--- END ---",
                message, extra_context
            )
        };

        let reply = self.complete(&full_message).await?;

        self.history.push(ChatMessage::new("user", message));
        self.history.push(ChatMessage::new("assistant", reply.as_str()));

        Ok(reply)
    }

    /// Clear conversation history for a fresh session.
    pub fn reset(&mut self) {
        self.history.clear();
    }

    async fn related_products_context(
        &self,
        vectors: &VectorStore,
        text: &str,
    ) -> Result<String> {
        let results = vectors.search_similar(text, 3).await?;
        let lines: Vec<String> = results
            .iter()
            .filter_map(|(id, _)| vectors.get_product(id))
            .map(|p| {
                format!(
                    "- {} (${:.2}, {}): {}",
                    p.name, p.price, p.category, p.description
                )
            })
            .collect();
        Ok(lines.join("\n"))
    }

    /// One chat-completion call with retry/backoff on transient errors,
    /// mirroring the embeddings client.
    async fn complete(&self, user_message: &str) -> Result<String> {
        let api_key = std::env::var(&self.config.api_key_env)
            .map_err(|_| anyhow!("{} environment variable not set", self.config.api_key_env))?;

        let mut messages = vec![ChatMessage::new("system", SYSTEM_PROMPT)];
        messages.extend(self.history.iter().cloned());
        messages.push(ChatMessage::new("user", user_message));

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );

        let mut last_err = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .client
                .post(url.as_str())
                .header("Authorization", format!("Bearer {}", api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json().await?;
                        return parse_chat_response(&json);
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err = Some(anyhow!("Chat API error {}: {}", status, body_text));
                        continue;
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    bail!("Chat API error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow!("Chat completion failed after retries")))
    }
}

/// Extract `choices[0].message.content` from a chat-completions response.
fn parse_chat_response(json: &serde_json::Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow!("Invalid chat response: missing choices[0].message.content"))
}
