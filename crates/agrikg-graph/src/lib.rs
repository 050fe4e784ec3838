//! agrikg Graph - In-memory knowledge graph
//!
//! Owns an entity store keyed by id and an append-only sequence of
//! relation triples. Relations reference entities by name, so entities
//! with equal names from different batches are one node for traversal.
//!
//! The graph has no internal locking. A concurrent host must serialize
//! mutations (`add_entity`, `add_relation`, `build_from_data`) against reads.

use std::collections::{BTreeMap, HashMap};

use agrikg_core::{Entity, EntityType, ExtractionResult, Relation};
use serde::{Deserialize, Serialize};

pub mod search;
pub mod traversal;

pub use search::SearchHit;
pub use traversal::{Direction, Neighbor};

// ============================================================================
// Knowledge Graph
// ============================================================================

/// In-memory knowledge graph
#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    /// Entities in first-insertion order
    entities: Vec<Entity>,
    /// Entity id -> slot in `entities`
    id_index: HashMap<String, usize>,
    /// Relation triples in insertion order
    relations: Vec<Relation>,
    /// Entity name -> positions in `relations` where it is source or target
    adjacency: HashMap<String, Vec<usize>>,
}

impl KnowledgeGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entity by id.
    ///
    /// A replaced entity keeps its original position in iteration order.
    pub fn add_entity(&mut self, entity: Entity) {
        match self.id_index.get(&entity.id) {
            Some(&slot) => self.entities[slot] = entity,
            None => {
                self.id_index.insert(entity.id.clone(), self.entities.len());
                self.entities.push(entity);
            }
        }
    }

    /// Append a relation. Source and target are not checked against entities.
    pub fn add_relation(&mut self, relation: Relation) {
        let position = self.relations.len();

        self.adjacency
            .entry(relation.source.clone())
            .or_default()
            .push(position);
        if relation.target != relation.source {
            self.adjacency
                .entry(relation.target.clone())
                .or_default()
                .push(position);
        }

        self.relations.push(relation);
    }

    /// Merge an extraction result: every entity, then every relation
    pub fn build_from_data(&mut self, data: &ExtractionResult) -> bool {
        for entity in &data.entities {
            self.add_entity(entity.clone());
        }
        for relation in &data.relations {
            self.add_relation(relation.clone());
        }

        tracing::debug!(
            method = data.method.as_str(),
            entities = data.entities.len(),
            relations = data.relations.len(),
            total_entities = self.entities.len(),
            "merged extraction result into graph"
        );

        true
    }

    /// Get entity by id
    pub fn get_entity(&self, id: &str) -> Option<&Entity> {
        self.id_index.get(id).map(|&slot| &self.entities[slot])
    }

    /// Iterate entities in store order
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// Relations in insertion order
    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    /// Number of entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relations.is_empty()
    }

    /// Drop every entity and relation
    pub fn clear(&mut self) {
        self.entities.clear();
        self.id_index.clear();
        self.relations.clear();
        self.adjacency.clear();
    }

    /// Entity and relation counts, recomputed from the stores
    pub fn get_stats(&self) -> GraphStats {
        let mut entity_types = BTreeMap::new();
        for entity in &self.entities {
            *entity_types.entry(entity.entity_type).or_insert(0) += 1;
        }

        GraphStats {
            total_entities: self.entities.len(),
            total_relations: self.relations.len(),
            entity_types,
        }
    }
}

/// Graph statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_entities: usize,
    pub total_relations: usize,
    /// Counts for observed types only
    pub entity_types: BTreeMap<EntityType, usize>,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use agrikg_core::{DomainOntology, ExtractionMethod, RelationType};

    fn entity(id: &str, name: &str, entity_type: EntityType) -> Entity {
        Entity::new(id, name, entity_type, &DomainOntology::default())
    }

    #[test]
    fn test_add_entity_upserts_in_place() {
        let mut graph = KnowledgeGraph::new();
        graph.add_entity(entity("crop_001", "水稻", EntityType::Crop));
        graph.add_entity(entity("disease_002", "稻瘟病", EntityType::Disease));
        graph.add_entity(entity("crop_001", "小麦", EntityType::Crop));

        let names: Vec<&str> = graph.entities().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["小麦", "稻瘟病"]);
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.get_entity("crop_001").unwrap().name, "小麦");
        assert!(graph.get_entity("crop_009").is_none());
    }

    #[test]
    fn test_relations_may_dangle() {
        let mut graph = KnowledgeGraph::new();
        graph.add_relation(Relation::new("大豆", RelationType::GrowsIn, "黑土"));
        graph.add_relation(Relation::new("大豆", RelationType::GrowsIn, "黑土"));

        assert_eq!(graph.relations().len(), 2);
        assert_eq!(graph.len(), 0);
        assert!(!graph.is_empty());
    }

    #[test]
    fn test_build_from_data_is_additive() {
        let mut first = ExtractionResult::empty(ExtractionMethod::RuleBasedExtraction);
        first.entities.push(entity("crop_001", "水稻", EntityType::Crop));
        first
            .relations
            .push(Relation::new("水稻", RelationType::InfectedBy, "稻瘟病"));

        let mut second = ExtractionResult::empty(ExtractionMethod::StructuredDataMapping);
        second.entities.push(entity("soil_001", "水田", EntityType::Soil));
        second
            .relations
            .push(Relation::new("水田", RelationType::SuitableFor, "水稻"));

        let mut graph = KnowledgeGraph::new();
        assert!(graph.build_from_data(&first));
        assert!(graph.build_from_data(&second));

        let stats = graph.get_stats();
        assert_eq!(stats.total_entities, 2);
        assert_eq!(stats.total_relations, 2);
    }

    #[test]
    fn test_stats_only_observed_types() {
        let mut graph = KnowledgeGraph::new();
        graph.add_entity(entity("crop_001", "水稻", EntityType::Crop));
        graph.add_entity(entity("crop_002", "小麦", EntityType::Crop));
        graph.add_entity(entity("fertilizer_003", "尿素", EntityType::Fertilizer));

        let stats = graph.get_stats();
        assert_eq!(stats.entity_types.len(), 2);
        assert_eq!(stats.entity_types[&EntityType::Crop], 2);
        assert_eq!(stats.entity_types[&EntityType::Fertilizer], 1);
        assert!(!stats.entity_types.contains_key(&EntityType::Pest));
    }

    #[test]
    fn test_clear() {
        let mut graph = KnowledgeGraph::new();
        graph.add_entity(entity("crop_001", "水稻", EntityType::Crop));
        graph.add_relation(Relation::new("水稻", RelationType::InfectedBy, "稻瘟病"));
        graph.clear();

        assert!(graph.is_empty());
        assert!(graph.get_neighbors("水稻").is_empty());
        assert_eq!(graph.get_stats().total_entities, 0);
    }
}
