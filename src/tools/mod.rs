pub mod search;
pub mod vector_math;

pub use search::{SearchResult, TavilySearch, WebSearchProvider};
