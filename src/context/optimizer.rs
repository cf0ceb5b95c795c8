//! Rewrites raw user input into a keyword-rich retrieval query.

use crate::llm::LlmProvider;

pub fn build_optimizer_prompt(message: &str, image_context: &str) -> String {
    format!(
        "You are an expert at refining search queries for an Ayurvedic knowledge base.\n\
Rewrite the following user input (text and/or image description) into a specific, keyword-rich search query.\n\
\n\
User Question: {}\n\
Image Context: {}\n\
\n\
Goal: Create a search query to find Ayurvedic treatments for the condition or herb identified.\n\
\n\
Optimized Query (just the text):",
        message, image_context
    )
}

/// Query used when the model cannot be asked or returns nothing.
pub fn naive_query(message: &str, image_context: &str) -> String {
    format!("{} {}", message, image_context)
}

/// Never fails: any model error degrades to [`naive_query`].
pub async fn optimize_query(llm: &dyn LlmProvider, message: &str, image_context: &str) -> String {
    let prompt = build_optimizer_prompt(message, image_context);
    match llm.generate_text(&prompt).await {
        Ok(text) if !text.trim().is_empty() => {
            let optimized = text.trim().to_string();
            tracing::debug!("Original query: {}", message);
            tracing::debug!("Optimized query: {}", optimized);
            optimized
        }
        Ok(_) => {
            tracing::warn!("Query optimization returned no text, using raw input");
            naive_query(message, image_context)
        }
        Err(e) => {
            tracing::warn!("Query optimization failed: {}", e);
            naive_query(message, image_context)
        }
    }
}
