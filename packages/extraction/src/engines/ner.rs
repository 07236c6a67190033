//! NER engine: maps recognized entity labels onto contract keys.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::traits::engine::Engine;
use crate::traits::provider::{NerEntity, NerProvider};
use crate::types::engine::{EngineType, NerSettings};
use crate::types::result::{EngineOutcome, Values};

/// Named-entity engine backed by an external recognizer.
pub struct NerEngine {
    provider: Arc<dyn NerProvider>,

    /// Lowercased entity label -> subTaskKey
    mapping: HashMap<String, String>,
}

impl NerEngine {
    pub fn new(provider: Arc<dyn NerProvider>, settings: &NerSettings) -> Self {
        let mapping = settings
            .ner_entity_types
            .iter()
            .map(|(label, key)| (label.to_lowercase(), key.clone()))
            .collect();

        Self { provider, mapping }
    }

    /// Assign candidates to keys. Candidates are taken in document order;
    /// the first one per key wins.
    pub fn assign(&self, mut entities: Vec<NerEntity>) -> Values {
        // stable: entities without an offset keep provider order, after the rest
        entities.sort_by_key(|e| (e.start.is_none(), e.start));

        let mut values = Values::new();
        for entity in entities {
            let Some(key) = self.mapping.get(&entity.label.to_lowercase()) else {
                continue;
            };
            let span = entity.span.trim();
            if span.is_empty() || values.contains_key(key) {
                continue;
            }
            values.insert(key.clone(), span.to_string());
        }
        values
    }
}

#[async_trait]
impl Engine for NerEngine {
    fn engine_type(&self) -> EngineType {
        EngineType::Ner
    }

    async fn apply(&self, text: &str) -> EngineOutcome {
        match self.provider.recognize(text).await {
            Ok(entities) => {
                debug!(candidates = entities.len(), "NER candidates");
                EngineOutcome::from_values(self.assign(entities))
            }
            Err(e) => EngineOutcome::Error(e),
        }
    }
}
