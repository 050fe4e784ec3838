//! Neighbour lookup over relation triples

use agrikg_core::RelationType;
use serde::{Deserialize, Serialize};

use crate::KnowledgeGraph;

/// Edge direction relative to the queried entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Queried entity is the source
    Outgoing,
    /// Queried entity is the target
    Incoming,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Outgoing => "outgoing",
            Self::Incoming => "incoming",
        }
    }

    /// Arrow used when printing neighbour lists
    pub fn arrow(&self) -> &'static str {
        match self {
            Self::Outgoing => "→",
            Self::Incoming => "←",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry of a neighbour listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Name at the other end of the triple
    pub entity: String,
    pub relation: RelationType,
    pub direction: Direction,
}

impl KnowledgeGraph {
    /// List neighbours of an entity name.
    ///
    /// Name comparison is exact and case-sensitive. Entries follow relation
    /// insertion order; a self-loop is reported once outgoing and once incoming.
    pub fn get_neighbors(&self, entity_name: &str) -> Vec<Neighbor> {
        let Some(positions) = self.adjacency.get(entity_name) else {
            return Vec::new();
        };

        let mut neighbors = Vec::new();
        for &position in positions {
            let relation = &self.relations[position];

            if relation.source == entity_name {
                neighbors.push(Neighbor {
                    entity: relation.target.clone(),
                    relation: relation.relation_type,
                    direction: Direction::Outgoing,
                });
            }
            if relation.target == entity_name {
                neighbors.push(Neighbor {
                    entity: relation.source.clone(),
                    relation: relation.relation_type,
                    direction: Direction::Incoming,
                });
            }
        }

        neighbors
    }

    /// Neighbours filtered by relation type and direction, names only
    pub fn neighbors_by(
        &self,
        entity_name: &str,
        relation: RelationType,
        direction: Direction,
    ) -> Vec<String> {
        self.get_neighbors(entity_name)
            .into_iter()
            .filter(|n| n.relation == relation && n.direction == direction)
            .map(|n| n.entity)
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
