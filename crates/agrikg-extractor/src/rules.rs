//! Knowledge rules and type inference tables
//!
//! Both tables are plain data. The curated defaults cover the rice,
//! wheat and maize examples; a TOML file can replace the knowledge rules.

use std::path::Path;

use serde::{Deserialize, Serialize};

use agrikg_core::{EntityType, KgError, RelationType, Result};

// ============================================================================
// Knowledge Rules
// ============================================================================

/// Typed association from a rule's name to other canonical names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    pub relation: RelationType,
    pub targets: Vec<String>,
}

/// Curated knowledge about one canonical term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeRule {
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    #[serde(default)]
    pub associations: Vec<Association>,
}

impl KnowledgeRule {
    pub fn new(name: impl Into<String>, entity_type: EntityType) -> Self {
        Self {
            name: name.into(),
            entity_type,
            associations: Vec::new(),
        }
    }

    /// Add an association
    pub fn with_association(mut self, relation: RelationType, targets: &[&str]) -> Self {
        self.associations.push(Association {
            relation,
            targets: targets.iter().map(|s| s.to_string()).collect(),
        });
        self
    }
}

/// Ordered knowledge-rule table.
///
/// Iteration order is the declaration order and drives entity id sequence
/// numbers, so it must never depend on hashing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeRules {
    #[serde(rename = "rule", default)]
    rules: Vec<KnowledgeRule>,
}

impl KnowledgeRules {
    /// Create a table from rules, validating that every name is non-empty
    pub fn new(rules: Vec<KnowledgeRule>) -> Result<Self> {
        for rule in &rules {
            if rule.name.trim().is_empty() {
                return Err(KgError::Rules("rule name must not be empty".to_string()));
            }
            if let Some(assoc) = rule
                .associations
                .iter()
                .find(|a| a.targets.iter().any(|t| t.trim().is_empty()))
            {
                return Err(KgError::Rules(format!(
                    "rule '{}' has an empty {} target",
                    rule.name, assoc.relation
                )));
            }
        }
        Ok(Self { rules })
    }

    /// Parse a TOML rule table (`[[rule]]` entries)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let parsed: KnowledgeRules =
            toml::from_str(content).map_err(|e| KgError::Rules(e.to_string()))?;
        Self::new(parsed.rules)
    }

    /// Load a TOML rule table from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn iter(&self) -> impl Iterator<Item = &KnowledgeRule> {
        self.rules.iter()
    }

    pub fn get(&self, name: &str) -> Option<&KnowledgeRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for KnowledgeRules {
    fn default() -> Self {
        use EntityType::*;
        use RelationType::*;

        let rules = vec![
            KnowledgeRule::new("水稻", Crop).with_association(InfectedBy, &["稻瘟病"]),
            KnowledgeRule::new("小麦", Crop).with_association(InfectedBy, &["小麦锈病"]),
            KnowledgeRule::new("玉米", Crop).with_association(InfectedBy, &["玉米螟"]),
            KnowledgeRule::new("稻瘟病", Disease),
            KnowledgeRule::new("三环唑", Pesticide).with_association(Prevents, &["稻瘟病"]),
            KnowledgeRule::new("尿素", Fertilizer).with_association(Uses, &["水稻", "小麦"]),
            KnowledgeRule::new("水田", Soil),
            KnowledgeRule::new("温带", Climate),
        ];

        Self { rules }
    }
}

// ============================================================================
// Type Inference
// ============================================================================

/// Keywords that indicate an entity type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeKeywords {
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub keywords: Vec<String>,
}

impl TypeKeywords {
    pub fn new(entity_type: EntityType, keywords: &[&str]) -> Self {
        Self {
            entity_type,
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    fn matches(&self, haystack: &str) -> bool {
        self.keywords
            .iter()
            .any(|k| haystack.contains(&k.to_lowercase()))
    }
}

/// Type inference tables for structured records.
///
/// Field keywords are checked first, then value keywords, each in
/// declaration order; the first match wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeInferenceRules {
    pub field_keywords: Vec<TypeKeywords>,
    pub value_keywords: Vec<TypeKeywords>,
    pub default_type: EntityType,
}

impl TypeInferenceRules {
    /// Infer the entity type of a field value
    pub fn infer(&self, field: &str, value: &str) -> EntityType {
        let field_lower = field.to_lowercase();
        let value_lower = value.to_lowercase();

        self.field_keywords
            .iter()
            .find(|k| k.matches(&field_lower))
            .or_else(|| self.value_keywords.iter().find(|k| k.matches(&value_lower)))
            .map(|k| k.entity_type)
            .unwrap_or(self.default_type)
    }
}

impl Default for TypeInferenceRules {
    fn default() -> Self {
        use EntityType::*;

        Self {
            field_keywords: vec![
                TypeKeywords::new(Crop, &["crop", "作物"]),
                TypeKeywords::new(Disease, &["disease", "病"]),
                TypeKeywords::new(Pest, &["pest", "虫"]),
                TypeKeywords::new(Fertilizer, &["fertilizer", "肥"]),
                TypeKeywords::new(Soil, &["soil", "土"]),
                TypeKeywords::new(Climate, &["climate", "气候"]),
            ],
            value_keywords: vec![
                TypeKeywords::new(Disease, &["病", "疫", "霉"]),
                TypeKeywords::new(Pest, &["虫", "螟", "蚜"]),
                TypeKeywords::new(Fertilizer, &["肥", "素"]),
            ],
            default_type: Crop,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
