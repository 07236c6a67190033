//! Contract model and runtime data types.

pub mod config;
pub mod contract;
pub mod embedding;
pub mod engine;
pub mod policy;
pub mod result;
pub mod template;
