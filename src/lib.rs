//! AyurWell: retrieval-augmented Ayurvedic health assistant backend.

pub mod context;
pub mod core;
pub mod llm;
pub mod rag;
pub mod server;
pub mod state;
pub mod tools;
