//! Chat orchestration.
//!
//! Conversation memory, image analysis, query optimization, retrieval
//! strategies and answer prompt assembly, tied together by `ChatPipeline`.

pub mod image;
pub mod memory;
pub mod optimizer;
pub mod pipeline;
pub mod prompt;
pub mod retrieval;


pub use memory::{ChatTurn, ConversationLog, ConversationStore};
pub use pipeline::{ChatPipeline, ChatRequest, ChatResponse};
pub use retrieval::{RetrievalOrchestrator, RetrievalResult, RetrievalStrategy, SourceLabel};
