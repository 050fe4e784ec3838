//! Structured record mapping
//!
//! Each non-blank field of a record becomes one entity whose type is
//! inferred from the field name and value. Crops and diseases are then
//! paired into `infected_by` relations.

use agrikg_core::{
    Entity, EntityType, ExtractionMethod, ExtractionResult, Record, Relation, RelationScope,
    RelationType,
};

use crate::ExtractionEngine;

impl ExtractionEngine {
    /// Map tabular records to entities and relations
    pub fn extract_from_structured(&self, records: &[Record]) -> ExtractionResult {
        let mut result = ExtractionResult::empty(ExtractionMethod::StructuredDataMapping);
        result.record_count = Some(records.len());

        for record in records {
            let record_start = result.entities.len();

            for (field, value) in record.iter() {
                if value.trim().is_empty() {
                    continue;
                }

                let entity_type = self.inference_rules().infer(field, value);
                let position = result.entities.len() + 1;
                let entity = self
                    .make_entity(position, value, entity_type)
                    .with_source_field(field);
                result.entities.push(entity);
            }

            match self.options().relation_scope {
                RelationScope::PerRecord => {
                    let pairs = crop_disease_pairs(&result.entities[record_start..]);
                    result.relations.extend(pairs);
                }
                RelationScope::Cumulative => {
                    if result.entities.len() > 1 {
                        let pairs = crop_disease_pairs(&result.entities);
                        result.relations.extend(pairs);
                    }
                }
            }
        }

        tracing::debug!(
            records = records.len(),
            entities = result.entities.len(),
            relations = result.relations.len(),
            "structured extraction finished"
        );

        result
    }
}

/// Cross every crop with every disease, crops in outer order
fn crop_disease_pairs(entities: &[Entity]) -> Vec<Relation> {
    let diseases: Vec<&Entity> = entities
        .iter()
        .filter(|e| e.entity_type == EntityType::Disease)
        .collect();

    entities
        .iter()
        .filter(|e| e.entity_type == EntityType::Crop)
        .flat_map(|crop| {
            diseases.iter().map(move |disease| {
                Relation::new(crop.name.as_str(), RelationType::InfectedBy, disease.name.as_str())
            })
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExtractionOptions;

    fn sample_records() -> Vec<Record> {
        vec![
            Record::new()
                .with("crop_name", "水稻")
                .with("disease", "稻瘟病")
                .with("fertilizer", "尿素")
                .with("soil", "水田"),
            Record::new()
                .with("crop_name", "小麦")
                .with("disease", "小麦锈病")
                .with("fertilizer", "磷酸二铵")
                .with("soil", "旱地"),
        ]
    }

    fn cumulative_engine() -> ExtractionEngine {
        ExtractionEngine::default().with_options(ExtractionOptions {
            relation_scope: RelationScope::Cumulative,
            ..Default::default()
        })
    }

    #[test]
    fn test_single_record() {
        let engine = ExtractionEngine::default();
        let records = vec![Record::new()
            .with("crop_name", "水稻")
            .with("disease", "稻瘟病")];

        let result = engine.extract_from_structured(&records);

        assert_eq!(result.entities.len(), 2);
        assert_eq!(result.entities[0].id, "crop_001");
        assert_eq!(result.entities[0].entity_type, EntityType::Crop);
        assert_eq!(result.entities[1].id, "disease_002");
        assert_eq!(result.entities[1].source_field.as_deref(), Some("disease"));
        assert_eq!(
            result.relations,
            vec![Relation::new("水稻", RelationType::InfectedBy, "稻瘟病")]
        );
        assert_eq!(result.record_count, Some(1));
        assert_eq!(result.method, ExtractionMethod::StructuredDataMapping);
    }

    #[test]
    fn test_ids_continue_across_records() {
        let engine = ExtractionEngine::default();
        let result = engine.extract_from_structured(&sample_records());

        let ids: Vec<&str> = result.entities.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "crop_001",
                "disease_002",
                "fertilizer_003",
                "soil_004",
                "crop_005",
                "disease_006",
                "fertilizer_007",
                "soil_008",
            ]
        );
        assert_eq!(result.entities[7].description, "土壤: 旱地");
    }

    #[test]
    fn test_blank_values_skipped() {
        let engine = ExtractionEngine::default();
        let records = vec![Record::new()
            .with("crop_name", "玉米")
            .with("disease", "   ")
            .with("pest", "")];

        let result = engine.extract_from_structured(&records);
        assert_eq!(result.entities.len(), 1);
        assert!(result.relations.is_empty());
    }

    #[test]
    fn test_per_record_pairs_stay_in_record() {
        let engine = ExtractionEngine::default();
        let result = engine.extract_from_structured(&sample_records());

        assert_eq!(
            result.relations,
            vec![
                Relation::new("水稻", RelationType::InfectedBy, "稻瘟病"),
                Relation::new("小麦", RelationType::InfectedBy, "小麦锈病"),
            ]
        );
    }

    #[test]
    fn test_cumulative_pairs_accumulated_entities() {
        let result = cumulative_engine().extract_from_structured(&sample_records());

        // First record adds 1 pair, second record re-crosses everything seen so far
        assert_eq!(
            result.relations,
            vec![
                Relation::new("水稻", RelationType::InfectedBy, "稻瘟病"),
                Relation::new("水稻", RelationType::InfectedBy, "稻瘟病"),
                Relation::new("水稻", RelationType::InfectedBy, "小麦锈病"),
                Relation::new("小麦", RelationType::InfectedBy, "稻瘟病"),
                Relation::new("小麦", RelationType::InfectedBy, "小麦锈病"),
            ]
        );
    }

    #[test]
    fn test_cumulative_needs_more_than_one_entity() {
        let records = vec![Record::new().with("crop_name", "水稻")];
        let result = cumulative_engine().extract_from_structured(&records);
        assert!(result.relations.is_empty());
    }

    #[test]
    fn test_no_records() {
        let engine = ExtractionEngine::default();
        let result = engine.extract_from_structured(&[]);

        assert!(result.is_empty());
        assert_eq!(result.record_count, Some(0));
    }
}
