//! agrikg Core - Domain models, ontology, and shared traits
//!
//! This crate defines the core abstractions used throughout agrikg:
//! - Domain ontology (entity types, relation types, display labels)
//! - Knowledge graph data model (entities, relation triples, records)
//! - Common error types
//! - Collaborator traits (LLM answer generation, similarity search)
//! - Configuration management

pub mod config;
pub mod ontology;

pub use config::{
    AppConfig, ConfigError, ExtractionConfig, IdScheme, LoggingConfig, QaConfig, RelationScope,
    SearchConfig,
};
pub use ontology::{DomainOntology, EntityType, RelationType, UNKNOWN_LABEL};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Error types for the fallible edges of agrikg.
///
/// Extraction, graph operations and question routing never fail; these
/// errors come from configuration, rule files and external collaborators.
#[derive(Error, Debug)]
pub enum KgError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid knowledge rules: {0}")]
    Rules(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Similarity search error: {0}")]
    Similarity(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, KgError>;

// ============================================================================
// Knowledge Graph Entities
// ============================================================================

/// A typed, named node in the knowledge graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// `<type>_<sequence>` within one extraction batch
    pub id: String,

    /// Surface form
    pub name: String,

    #[serde(rename = "type")]
    pub entity_type: EntityType,

    /// `<type label>: <name>`
    pub description: String,

    /// Originating column for entities mapped from structured records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_field: Option<String>,
}

impl Entity {
    /// Create a new entity with its description rendered by the ontology
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        entity_type: EntityType,
        ontology: &DomainOntology,
    ) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            description: ontology.describe(entity_type, &name),
            name,
            entity_type,
            source_field: None,
        }
    }

    /// Set the originating field name
    pub fn with_source_field(mut self, field: impl Into<String>) -> Self {
        self.source_field = Some(field.into());
        self
    }
}

/// A directed, typed edge between two entities identified by name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relation {
    pub source: String,
    pub relation_type: RelationType,
    pub target: String,
}

impl Relation {
    pub fn new(
        source: impl Into<String>,
        relation_type: RelationType,
        target: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            relation_type,
            target: target.into(),
        }
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> {} -> {}",
            self.source, self.relation_type, self.target
        )
    }
}

impl<S: Into<String>, T: Into<String>> From<(S, RelationType, T)> for Relation {
    fn from((source, relation_type, target): (S, RelationType, T)) -> Self {
        Self::new(source, relation_type, target)
    }
}

// ============================================================================
// Extraction Results
// ============================================================================

/// How an extraction result was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    RuleBasedExtraction,
    StructuredDataMapping,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RuleBasedExtraction => "rule_based_extraction",
            Self::StructuredDataMapping => "structured_data_mapping",
        }
    }
}

/// Entities and relations produced by one extraction call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub entities: Vec<Entity>,
    pub relations: Vec<Relation>,

    /// Input length in characters (text extraction)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_length: Option<usize>,

    /// Number of input records (structured extraction)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_count: Option<usize>,

    #[serde(rename = "processing_method")]
    pub method: ExtractionMethod,
}

impl ExtractionResult {
    /// Create an empty result for the given method
    pub fn empty(method: ExtractionMethod) -> Self {
        Self {
            entities: Vec::new(),
            relations: Vec::new(),
            text_length: None,
            record_count: None,
            method,
        }
    }

    /// Check if nothing was extracted
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relations.is_empty()
    }
}

// ============================================================================
// Structured Records
// ============================================================================

/// One tabular record: field name -> value, in source column order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field, replacing the value if the field already exists
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        let field = field.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(f, _)| *f == field) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((field, value)),
        }
    }

    /// Builder-style insert
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(f, _)| f == field)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate fields in column order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(f, v)| (f.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<F: Into<String>, V: Into<String>> FromIterator<(F, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (F, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (field, value) in iter {
            record.insert(field, value);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, value) in &self.fields {
            map.serialize_entry(field, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let object = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;

        Ok(object
            .into_iter()
            .map(|(field, value)| {
                let value = match value {
                    serde_json::Value::Null => String::new(),
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (field, value)
            })
            .collect())
    }
}

// ============================================================================
// Collaborators
// ============================================================================

/// Entry returned by an embedding/vector similarity collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarEntity {
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    pub similarity: f32,
}

/// Trait for LLM clients used to enrich templated answers
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a response
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Trait for embedding-based entity similarity backends
#[async_trait::async_trait]
pub trait SimilaritySearch: Send + Sync {
    /// Return up to `k` entities ranked by similarity to the query
    async fn search_similar(&self, query: &str, k: usize) -> Result<Vec<SimilarEntity>>;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_description() {
        let ontology = DomainOntology::default();
        let entity = Entity::new("crop_001", "水稻", EntityType::Crop, &ontology);

        assert_eq!(entity.description, "作物: 水稻");
        assert!(entity.source_field.is_none());

        let entity = entity.with_source_field("crop_name");
        assert_eq!(entity.source_field.as_deref(), Some("crop_name"));
    }

    #[test]
    fn test_entity_json_shape() {
        let ontology = DomainOntology::default();
        let entity = Entity::new("pesticide_003", "三环唑", EntityType::Pesticide, &ontology);
        let json = serde_json::to_value(&entity).unwrap();

        assert_eq!(json["type"], "pesticide");
        assert_eq!(json["description"], "农药: 三环唑");
        assert!(json.get("source_field").is_none());
    }

    #[test]
    fn test_relation_display_and_from_tuple() {
        let relation: Relation = ("三环唑", RelationType::Prevents, "稻瘟病").into();
        assert_eq!(relation.to_string(), "三环唑 -> prevents -> 稻瘟病");
    }

    #[test]
    fn test_extraction_result_roundtrip_keeps_method_tag() {
        let result = ExtractionResult::empty(ExtractionMethod::StructuredDataMapping);
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"processing_method\":\"structured_data_mapping\""));

        let back: ExtractionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
        assert!(back.is_empty());
    }

    #[test]
    fn test_record_preserves_column_order() {
        let record: Record =
            serde_json::from_str(r#"{"soil": "水田", "crop_name": "水稻", "yield": 500}"#).unwrap();

        let fields: Vec<&str> = record.iter().map(|(f, _)| f).collect();
        assert_eq!(fields, vec!["soil", "crop_name", "yield"]);
        assert_eq!(record.get("yield"), Some("500"));
    }

    #[test]
    fn test_record_insert_replaces_existing_field() {
        let record = Record::new().with("crop", "水稻").with("crop", "小麦");
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("crop"), Some("小麦"));
    }

    #[test]
    fn test_record_null_becomes_empty() {
        let record: Record = serde_json::from_str(r#"{"pest": null}"#).unwrap();
        assert_eq!(record.get("pest"), Some(""));
    }
}
