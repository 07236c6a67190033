//! Provider implementations for the extraction runtime.
//!
//! This module provides reference implementations of the provider traits.
//! Users can use these directly or implement their own.

#[cfg(feature = "openai")]
mod openai;

#[cfg(feature = "openai")]
pub use openai::OpenAI;
