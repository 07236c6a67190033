//! Storage implementations for the extraction runtime.
//!
//! - `MemoryStore` - In-memory trained example vectors
//! - `LlmCache` - Short-TTL cache of LLM completions

pub mod llm_cache;
pub mod memory;

pub use llm_cache::LlmCache;
pub use memory::MemoryStore;
