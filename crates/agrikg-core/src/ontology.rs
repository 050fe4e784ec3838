//! Agricultural domain ontology
//!
//! Closed sets of entity and relation types plus the display labels
//! used when rendering descriptions and answers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Label returned for codes the ontology does not know
pub const UNKNOWN_LABEL: &str = "未知类型";

// ============================================================================
// Entity Types
// ============================================================================

/// Entity types of the agricultural domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Crop,
    Disease,
    Pest,
    Fertilizer,
    Pesticide,
    Soil,
    Climate,
    Technology,
    Equipment,
}

impl EntityType {
    /// All entity types in declaration order
    pub const ALL: [EntityType; 9] = [
        Self::Crop,
        Self::Disease,
        Self::Pest,
        Self::Fertilizer,
        Self::Pesticide,
        Self::Soil,
        Self::Climate,
        Self::Technology,
        Self::Equipment,
    ];

    /// Get the type code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crop => "crop",
            Self::Disease => "disease",
            Self::Pest => "pest",
            Self::Fertilizer => "fertilizer",
            Self::Pesticide => "pesticide",
            Self::Soil => "soil",
            Self::Climate => "climate",
            Self::Technology => "technology",
            Self::Equipment => "equipment",
        }
    }

    /// Parse a type code
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        let code = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|t| t.as_str() == code)
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Relation Types
// ============================================================================

/// Relation types between agricultural entities
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    GrowsIn,     // Crop -> Soil/Climate
    InfectedBy,  // Crop -> Disease
    DamagedBy,   // Crop -> Pest
    Uses,        // Fertilizer -> Crop
    Prevents,    // Pesticide -> Disease
    SuitableFor, // Soil/Climate -> Crop
}

impl RelationType {
    /// All relation types in declaration order
    pub const ALL: [RelationType; 6] = [
        Self::GrowsIn,
        Self::InfectedBy,
        Self::DamagedBy,
        Self::Uses,
        Self::Prevents,
        Self::SuitableFor,
    ];

    /// Get the relation code
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GrowsIn => "grows_in",
            Self::InfectedBy => "infected_by",
            Self::DamagedBy => "damaged_by",
            Self::Uses => "uses",
            Self::Prevents => "prevents",
            Self::SuitableFor => "suitable_for",
        }
    }

    /// Parse a relation code
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        let code = s.trim().to_lowercase();
        Self::ALL.into_iter().find(|r| r.as_str() == code)
    }
}

impl std::fmt::Display for RelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Ontology
// ============================================================================

/// Display labels for entity and relation types.
///
/// Built once and never mutated afterwards. Lookups of codes outside the
/// closed type sets resolve to [`UNKNOWN_LABEL`] instead of failing.
#[derive(Debug, Clone)]
pub struct DomainOntology {
    entity_labels: HashMap<EntityType, String>,
    relation_labels: HashMap<RelationType, String>,
}

impl DomainOntology {
    /// Create an ontology from explicit label tables
    pub fn new(
        entity_labels: HashMap<EntityType, String>,
        relation_labels: HashMap<RelationType, String>,
    ) -> Self {
        Self {
            entity_labels,
            relation_labels,
        }
    }

    /// Label for an entity type code (e.g. "crop" -> "作物")
    pub fn entity_type_label(&self, code: &str) -> &str {
        EntityType::from_str(code)
            .map(|t| self.entity_label(t))
            .unwrap_or(UNKNOWN_LABEL)
    }

    /// Label for a relation type code (e.g. "prevents" -> "防治")
    pub fn relation_type_label(&self, code: &str) -> &str {
        RelationType::from_str(code)
            .map(|r| self.relation_label(r))
            .unwrap_or(UNKNOWN_LABEL)
    }

    pub fn entity_label(&self, entity_type: EntityType) -> &str {
        self.entity_labels
            .get(&entity_type)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_LABEL)
    }

    pub fn relation_label(&self, relation: RelationType) -> &str {
        self.relation_labels
            .get(&relation)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_LABEL)
    }

    /// Render the display description `<label>: <name>`
    pub fn describe(&self, entity_type: EntityType, name: &str) -> String {
        format!("{}: {}", self.entity_label(entity_type), name)
    }
}

impl Default for DomainOntology {
    fn default() -> Self {
        let entity_labels = [
            (EntityType::Crop, "作物"),
            (EntityType::Disease, "病害"),
            (EntityType::Pest, "虫害"),
            (EntityType::Fertilizer, "肥料"),
            (EntityType::Pesticide, "农药"),
            (EntityType::Soil, "土壤"),
            (EntityType::Climate, "气候"),
            (EntityType::Technology, "技术"),
            (EntityType::Equipment, "设备"),
        ]
        .into_iter()
        .map(|(t, label)| (t, label.to_string()))
        .collect();

        let relation_labels = [
            (RelationType::GrowsIn, "生长在"),
            (RelationType::InfectedBy, "感染"),
            (RelationType::DamagedBy, "危害"),
            (RelationType::Uses, "使用"),
            (RelationType::Prevents, "防治"),
            (RelationType::SuitableFor, "适用于"),
        ]
        .into_iter()
        .map(|(r, label)| (r, label.to_string()))
        .collect();

        Self::new(entity_labels, relation_labels)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_codes() {
        assert_eq!(EntityType::Pesticide.to_string(), "pesticide");
        assert_eq!(EntityType::from_str("Crop"), Some(EntityType::Crop));
        assert_eq!(EntityType::from_str("weed"), None);
    }

    #[test]
    fn test_relation_type_codes() {
        assert_eq!(RelationType::InfectedBy.as_str(), "infected_by");
        assert_eq!(
            RelationType::from_str("suitable_for"),
            Some(RelationType::SuitableFor)
        );
        assert_eq!(RelationType::from_str("affects"), None);
    }

    #[test]
    fn test_default_labels() {
        let ontology = DomainOntology::default();
        assert_eq!(ontology.entity_type_label("crop"), "作物");
        assert_eq!(ontology.entity_type_label("equipment"), "设备");
        assert_eq!(ontology.relation_type_label("prevents"), "防治");
        assert_eq!(ontology.relation_type_label("grows_in"), "生长在");
    }

    #[test]
    fn test_unknown_code_returns_sentinel() {
        let ontology = DomainOntology::default();
        assert_eq!(ontology.entity_type_label("weed"), UNKNOWN_LABEL);
        assert_eq!(ontology.relation_type_label(""), UNKNOWN_LABEL);
    }

    #[test]
    fn test_missing_label_returns_sentinel() {
        let ontology = DomainOntology::new(
            HashMap::from([(EntityType::Crop, "Crop".to_string())]),
            HashMap::new(),
        );
        assert_eq!(ontology.entity_label(EntityType::Crop), "Crop");
        assert_eq!(ontology.entity_label(EntityType::Soil), UNKNOWN_LABEL);
        assert_eq!(ontology.relation_label(RelationType::Uses), UNKNOWN_LABEL);
    }

    #[test]
    fn test_describe() {
        let ontology = DomainOntology::default();
        assert_eq!(ontology.describe(EntityType::Disease, "稻瘟病"), "病害: 稻瘟病");
    }
}
