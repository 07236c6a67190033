//! The extraction engine abstraction.

use async_trait::async_trait;

use crate::types::{engine::EngineType, result::EngineOutcome};

/// Produces raw captured values from text.
///
/// Engines are built once per loaded template and hold only read-only
/// state, so the same engine may serve concurrent requests.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Which kind of engine this is.
    fn engine_type(&self) -> EngineType;

    /// Run the engine against the text.
    ///
    /// Failures are reported as [`EngineOutcome::Error`], never by panicking.
    async fn apply(&self, text: &str) -> EngineOutcome;
}
