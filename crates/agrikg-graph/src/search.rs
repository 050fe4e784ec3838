//! Entity search
//!
//! Case-insensitive substring scoring over name, description and type
//! code, plus the literal mention lookup used by question handlers.

use agrikg_core::Entity;
use serde::{Deserialize, Serialize};

use crate::KnowledgeGraph;

/// Score for a match in the entity name
pub const NAME_SCORE: u32 = 10;
/// Score for a match in the description
pub const DESCRIPTION_SCORE: u32 = 5;
/// Score for a match in the type code
pub const TYPE_SCORE: u32 = 3;

/// An entity matched by a search, with its accumulated score
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub entity: Entity,
    pub score: u32,
}

impl KnowledgeGraph {
    /// Search entities by substring.
    ///
    /// Scores add up across fields. Hits are ordered by score descending;
    /// equal scores keep store order.
    pub fn search_entities(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        let query = query.to_lowercase();

        let mut hits: Vec<SearchHit> = self
            .entities()
            .filter_map(|entity| {
                let score = score_entity(entity, &query);
                (score > 0).then(|| SearchHit {
                    entity: entity.clone(),
                    score,
                })
            })
            .collect();

        // sort_by is stable
        hits.sort_by(|a, b| b.score.cmp(&a.score));
        hits.truncate(limit);

        tracing::debug!(hits = hits.len(), limit, "entity search finished");
        hits
    }

    /// Entities whose name occurs literally in the question.
    ///
    /// Longer names rank first so that specific terms beat shorter names
    /// they contain; equal lengths keep store order.
    pub fn mentioned_entities(&self, question: &str) -> Vec<&Entity> {
        let mut mentioned: Vec<&Entity> = self
            .entities()
            .filter(|e| question.contains(e.name.as_str()))
            .collect();

        mentioned.sort_by_key(|e| std::cmp::Reverse(e.name.chars().count()));
        mentioned
    }
}

/// Score one entity against a lower-cased query
fn score_entity(entity: &Entity, query: &str) -> u32 {
    let mut score = 0;
    if entity.name.to_lowercase().contains(query) {
        score += NAME_SCORE;
    }
    if entity.description.to_lowercase().contains(query) {
        score += DESCRIPTION_SCORE;
    }
    if entity.entity_type.as_str().contains(query) {
        score += TYPE_SCORE;
    }
    score
}

// ============================================================================
// Tests
// ============================================================================
