//! agrikg Extractor - Knowledge extraction pipeline
//!
//! Turns raw text or tabular records into typed entities and
//! relation triples using a hand-curated rule table.

use agrikg_core::{
    DomainOntology, Entity, EntityType, ExtractionConfig, IdScheme, RelationScope, Result,
};
use uuid::Uuid;

pub mod rules;
pub mod structured;
pub mod text;

pub use rules::{Association, KnowledgeRule, KnowledgeRules, TypeInferenceRules, TypeKeywords};

/// Behavioural switches for the extraction engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionOptions {
    pub id_scheme: IdScheme,
    pub relation_scope: RelationScope,
}

impl From<&ExtractionConfig> for ExtractionOptions {
    fn from(config: &ExtractionConfig) -> Self {
        Self {
            id_scheme: config.id_scheme,
            relation_scope: config.relation_scope,
        }
    }
}

/// Rule-based extraction engine.
///
/// All rule data is immutable after construction. Extraction is pure:
/// the same input always yields the same entities, ids and relations.
#[derive(Debug, Clone)]
pub struct ExtractionEngine {
    ontology: DomainOntology,
    rules: KnowledgeRules,
    inference: TypeInferenceRules,
    options: ExtractionOptions,
}

impl ExtractionEngine {
    /// Create an engine from explicit rule tables
    pub fn new(
        ontology: DomainOntology,
        rules: KnowledgeRules,
        inference: TypeInferenceRules,
        options: ExtractionOptions,
    ) -> Self {
        Self {
            ontology,
            rules,
            inference,
            options,
        }
    }

    /// Create an engine from application config, loading the rule file if one is set
    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        let rules = match &config.rules_file {
            Some(path) => KnowledgeRules::from_file(path)?,
            None => KnowledgeRules::default(),
        };

        Ok(Self::new(
            DomainOntology::default(),
            rules,
            TypeInferenceRules::default(),
            ExtractionOptions::from(config),
        ))
    }

    /// Replace the options
    pub fn with_options(mut self, options: ExtractionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn ontology(&self) -> &DomainOntology {
        &self.ontology
    }

    pub fn rules(&self) -> &KnowledgeRules {
        &self.rules
    }

    pub fn inference_rules(&self) -> &TypeInferenceRules {
        &self.inference
    }

    pub fn options(&self) -> ExtractionOptions {
        self.options
    }

    /// Build an entity whose id reflects its position in the current batch
    fn make_entity(&self, position: usize, name: &str, entity_type: EntityType) -> Entity {
        let id = entity_id(self.options.id_scheme, position, name, entity_type);
        Entity::new(id, name, entity_type, &self.ontology)
    }
}

impl Default for ExtractionEngine {
    fn default() -> Self {
        Self::new(
            DomainOntology::default(),
            KnowledgeRules::default(),
            TypeInferenceRules::default(),
            ExtractionOptions::default(),
        )
    }
}

/// Assign an entity id.
///
/// `position` is the 1-based index of the entity within its extraction call.
pub fn entity_id(scheme: IdScheme, position: usize, name: &str, entity_type: EntityType) -> String {
    match scheme {
        IdScheme::PerBatch => format!("{}_{:03}", entity_type.as_str(), position),
        IdScheme::Stable => {
            let key = format!("{}:{}", entity_type.as_str(), name);
            let uuid = Uuid::new_v5(&Uuid::NAMESPACE_OID, key.as_bytes());
            format!("{}_{}", entity_type.as_str(), uuid.simple())
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
