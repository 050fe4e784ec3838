//! Rule-based extraction from unstructured text
//!
//! Every knowledge rule whose name occurs in the text yields an entity;
//! every association target that also occurs yields a relation.

use agrikg_core::{ExtractionMethod, ExtractionResult, Relation};

use crate::ExtractionEngine;

impl ExtractionEngine {
    /// Extract entities and relations from free text.
    ///
    /// Matching is plain substring containment. Names that overlap (one rule
    /// name inside another) both fire; nothing is deduplicated.
    pub fn extract_from_text(&self, text: &str) -> ExtractionResult {
        let mut result = ExtractionResult::empty(ExtractionMethod::RuleBasedExtraction);
        result.text_length = Some(text.chars().count());

        for rule in self.rules().iter() {
            if !text.contains(rule.name.as_str()) {
                continue;
            }

            let position = result.entities.len() + 1;
            result
                .entities
                .push(self.make_entity(position, &rule.name, rule.entity_type));

            for association in &rule.associations {
                for target in &association.targets {
                    if text.contains(target.as_str()) {
                        result.relations.push(Relation::new(
                            rule.name.as_str(),
                            association.relation,
                            target.as_str(),
                        ));
                    }
                }
            }
        }

        tracing::debug!(
            entities = result.entities.len(),
            relations = result.relations.len(),
            "text extraction finished"
        );

        result
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExtractionOptions, KnowledgeRule, KnowledgeRules, TypeInferenceRules};
    use agrikg_core::{DomainOntology, EntityType, IdScheme, RelationType};

    const RICE_TEXT: &str = "水稻是重要的粮食作物，容易感染稻瘟病。稻瘟病是由真菌引起的病害，\
        会导致叶片出现病斑。防治稻瘟病可以使用三环唑农药。水稻生长需要\
        充足的水分，适合在水田中种植。在温带气候条件下生长良好。";

    #[test]
    fn test_rice_text_entities() {
        let engine = ExtractionEngine::default();
        let result = engine.extract_from_text(RICE_TEXT);

        let entities: Vec<(&str, &str, EntityType)> = result
            .entities
            .iter()
            .map(|e| (e.id.as_str(), e.name.as_str(), e.entity_type))
            .collect();

        assert_eq!(
            entities,
            vec![
                ("crop_001", "水稻", EntityType::Crop),
                ("disease_002", "稻瘟病", EntityType::Disease),
                ("pesticide_003", "三环唑", EntityType::Pesticide),
                ("soil_004", "水田", EntityType::Soil),
                ("climate_005", "温带", EntityType::Climate),
            ]
        );
        assert_eq!(result.entities[2].description, "农药: 三环唑");
        assert_eq!(result.method, ExtractionMethod::RuleBasedExtraction);
    }

    #[test]
    fn test_rice_text_relations() {
        let engine = ExtractionEngine::default();
        let result = engine.extract_from_text(RICE_TEXT);

        assert_eq!(
            result.relations,
            vec![
                Relation::new("水稻", RelationType::InfectedBy, "稻瘟病"),
                Relation::new("三环唑", RelationType::Prevents, "稻瘟病"),
            ]
        );
    }

    #[test]
    fn test_association_requires_target_in_text() {
        let engine = ExtractionEngine::default();
        let result = engine.extract_from_text("尿素适合水稻追肥");

        assert_eq!(result.entities.len(), 2);
        assert_eq!(
            result.relations,
            vec![Relation::new("尿素", RelationType::Uses, "水稻")]
        );
    }

    #[test]
    fn test_text_length_counts_characters() {
        let engine = ExtractionEngine::default();
        let result = engine.extract_from_text("小麦锈病");
        assert_eq!(result.text_length, Some(4));
    }

    #[test]
    fn test_empty_text() {
        let engine = ExtractionEngine::default();
        let result = engine.extract_from_text("");

        assert!(result.is_empty());
        assert_eq!(result.text_length, Some(0));
    }

    #[test]
    fn test_overlapping_names_both_fire() {
        let rules = KnowledgeRules::new(vec![
            KnowledgeRule::new("小麦", EntityType::Crop),
            KnowledgeRule::new("小麦锈病", EntityType::Disease),
        ])
        .unwrap();
        let engine = ExtractionEngine::new(
            DomainOntology::default(),
            rules,
            TypeInferenceRules::default(),
            ExtractionOptions::default(),
        );

        let result = engine.extract_from_text("小麦锈病高发");
        let names: Vec<&str> = result.entities.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["小麦", "小麦锈病"]);
    }

    #[test]
    fn test_stable_ids_match_across_calls() {
        let engine = ExtractionEngine::default().with_options(ExtractionOptions {
            id_scheme: IdScheme::Stable,
            ..Default::default()
        });

        let first = engine.extract_from_text("稻瘟病");
        let second = engine.extract_from_text("水稻和稻瘟病");

        let disease_first = &first.entities[0];
        let disease_second = second
            .entities
            .iter()
            .find(|e| e.name == "稻瘟病")
            .unwrap();
        assert_eq!(disease_first.id, disease_second.id);
    }
}
