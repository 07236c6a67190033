//! Core trait abstractions for the extraction runtime.
//!
//! These traits define the interfaces that applications implement
//! to provide external services and storage.

pub mod engine;
pub mod provider;
pub mod store;
