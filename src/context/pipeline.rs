//! Chat turn dispatcher.
//!
//! validate → greeting short-circuit → image analysis → query
//! optimization → retrieval → answer generation → memory commit.
//! Only validation, image analysis and generation can fail a request.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::image::{decode_image_payload, describe_image};
use super::memory::{ChatTurn, ConversationStore};
use super::optimizer::{naive_query, optimize_query};
use super::prompt::{build_answer_prompt, is_greeting, AnswerPromptInput, GREETING_REPLY};
use super::retrieval::{RetrievalOrchestrator, SourceLabel};
use crate::core::errors::ApiError;
use crate::llm::LlmProvider;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    /// Base64 image, optionally with a `data:<mime>;base64,` prefix.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub source: SourceLabel,
}

pub struct ChatPipeline {
    llm: Arc<dyn LlmProvider>,
    retrieval: RetrievalOrchestrator,
    conversations: ConversationStore,
    optimize: bool,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

impl ChatPipeline {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        retrieval: RetrievalOrchestrator,
        conversations: ConversationStore,
        optimize: bool,
    ) -> Self {
        Self {
            llm,
            retrieval,
            conversations,
            optimize,
        }
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    pub async fn handle(&self, request: ChatRequest) -> Result<ChatResponse, ApiError> {
        let message = non_blank(request.message.as_deref());
        let image = non_blank(request.image.as_deref());

        if message.is_none() && image.is_none() {
            return Err(ApiError::Validation(
                "No message or image provided".to_string(),
            ));
        }

        if image.is_none() && message.map(is_greeting).unwrap_or(false) {
            return Ok(ChatResponse {
                response: GREETING_REPLY.to_string(),
                source: SourceLabel::Greeting,
            });
        }

        let session_id = ConversationStore::resolve_id(request.session_id.as_deref());
        let log = self.conversations.get_or_create(&session_id).await;
        let mut log = log.lock().await;

        let image_context = match image {
            Some(payload) => {
                let decoded = decode_image_payload(payload)?;
                describe_image(self.llm.as_ref(), &decoded).await?
            }
            None => String::new(),
        };
        let message = message.unwrap_or_default();

        let query = if self.optimize {
            optimize_query(self.llm.as_ref(), message, &image_context).await
        } else {
            naive_query(message, &image_context)
        };

        let retrieved = self.retrieval.retrieve(&query).await;
        let source = match retrieved.source {
            SourceLabel::DirectKnowledge if !image_context.is_empty() => SourceLabel::VisionDirect,
            other => other,
        };
        tracing::debug!(session = %session_id, source = %source, "context selected");

        let mut pending = Vec::with_capacity(2);
        if !message.is_empty() {
            pending.push(ChatTurn::user(message));
        }
        if !image_context.is_empty() {
            pending.push(ChatTurn::image_context(image_context.as_str()));
        }
        let history = log.render_with(&pending);

        let prompt = build_answer_prompt(&AnswerPromptInput {
            history: &history,
            context: &retrieved.context,
            image_context: &image_context,
            question: message,
        });

        let answer = self
            .llm
            .generate_text(&prompt)
            .await
            .map_err(ApiError::generation)?;

        for turn in pending {
            log.append(turn);
        }
        log.append(ChatTurn::assistant(answer.as_str()));

        Ok(ChatResponse {
            response: answer,
            source,
        })
    }
}
