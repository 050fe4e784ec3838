//! LLM-assisted answering
//!
//! Wraps the [`QuestionRouter`] with optional collaborators. The templated
//! rule answer is always computed; an LLM reply replaces it only when the
//! call succeeds with non-blank text. Collaborator failures are logged and
//! never reach the caller.

use std::collections::HashSet;
use std::sync::Arc;

use agrikg_core::{DomainOntology, Entity, LlmClient, QaConfig, SimilaritySearch};
use agrikg_graph::{Direction, KnowledgeGraph};
use serde::{Deserialize, Serialize};

use crate::{Intent, PromptBuilder, QuestionRouter};

const SYSTEM_INSTRUCTION: &str =
    "你是一名农业知识助手。请根据给出的知识图谱事实回答用户的问题。";

/// Where the final answer text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerSource {
    Llm,
    Rules,
}

/// Which lookup surfaced a related entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelatedOrigin {
    /// Named literally in the question
    Mention,
    /// Graph substring search
    Search,
    Similarity,
}

/// Entity shown alongside an answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedEntity {
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    /// Search score or similarity; none for mentions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    pub origin: RelatedOrigin,
}

/// Answer with provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistedAnswer {
    pub answer: String,
    pub source: AnswerSource,
    pub intent: Intent,
    pub related: Vec<RelatedEntity>,
}

/// Router plus optional LLM and similarity collaborators
pub struct AssistedAnswerer {
    router: QuestionRouter,
    ontology: DomainOntology,
    llm_client: Option<Arc<dyn LlmClient>>,
    similarity: Option<Arc<dyn SimilaritySearch>>,
    related_limit: usize,
}

impl AssistedAnswerer {
    /// Create an answerer with no collaborators
    pub fn new(router: QuestionRouter) -> Self {
        Self {
            router,
            ontology: DomainOntology::default(),
            llm_client: None,
            similarity: None,
            related_limit: 5,
        }
    }

    pub fn from_config(config: &QaConfig) -> Self {
        Self::new(QuestionRouter::from_config(config)).with_related_limit(config.related_limit)
    }

    /// Set LLM client
    pub fn with_llm(mut self, client: Arc<dyn LlmClient>) -> Self {
        self.llm_client = Some(client);
        self
    }

    /// Set similarity backend
    pub fn with_similarity(mut self, backend: Arc<dyn SimilaritySearch>) -> Self {
        self.similarity = Some(backend);
        self
    }

    /// Set ontology used to label prompt facts
    pub fn with_ontology(mut self, ontology: DomainOntology) -> Self {
        self.ontology = ontology;
        self
    }

    pub fn with_related_limit(mut self, limit: usize) -> Self {
        self.related_limit = limit;
        self
    }

    pub fn router(&self) -> &QuestionRouter {
        &self.router
    }

    /// Answer a question, enriching the rule answer when collaborators allow
    pub async fn answer(&self, question: &str, graph: &KnowledgeGraph) -> AssistedAnswer {
        let (intent, rule_answer) = self.router.answer_with_intent(question, graph);
        let related = self.related_entities(question, graph).await;

        let Some(llm) = &self.llm_client else {
            return AssistedAnswer {
                answer: rule_answer,
                source: AnswerSource::Rules,
                intent,
                related,
            };
        };

        let prompt = self.build_prompt(question, graph, &rule_answer);
        tracing::debug!(prompt_chars = prompt.chars().count(), "calling LLM");

        let (answer, source) = match llm.generate(&prompt).await {
            Ok(reply) if !reply.trim().is_empty() => (reply.trim().to_string(), AnswerSource::Llm),
            Ok(_) => {
                tracing::warn!("LLM returned an empty reply, using rule answer");
                (rule_answer, AnswerSource::Rules)
            }
            Err(e) => {
                tracing::warn!(error = %e, "LLM generation failed, using rule answer");
                (rule_answer, AnswerSource::Rules)
            }
        };

        AssistedAnswer {
            answer,
            source,
            intent,
            related,
        }
    }

    /// Entities named in the question, then graph search hits, then
    /// similarity hits. Names appear once.
    async fn related_entities(&self, question: &str, graph: &KnowledgeGraph) -> Vec<RelatedEntity> {
        let mut seen = HashSet::new();
        let mut related = Vec::new();

        let mentioned = graph
            .mentioned_entities(question)
            .into_iter()
            .take(self.related_limit)
            .map(|entity| (entity.clone(), None, RelatedOrigin::Mention));
        let searched = graph
            .search_entities(question, self.related_limit)
            .into_iter()
            .map(|hit| (hit.entity, Some(hit.score as f32), RelatedOrigin::Search));

        for (entity, score, origin) in mentioned.chain(searched) {
            if seen.insert(entity.name.clone()) {
                related.push(RelatedEntity {
                    name: entity.name,
                    entity_type: entity.entity_type.as_str().to_string(),
                    score,
                    origin,
                });
            }
        }

        let Some(backend) = &self.similarity else {
            return related;
        };

        match backend.search_similar(question, self.related_limit).await {
            Ok(similar) => {
                for entity in similar {
                    if seen.insert(entity.name.clone()) {
                        related.push(RelatedEntity {
                            name: entity.name,
                            entity_type: entity.entity_type,
                            score: Some(entity.similarity),
                            origin: RelatedOrigin::Similarity,
                        });
                    }
                }
            }
            Err(e) => {
                tracing::warn!(backend = backend.name(), error = %e, "similarity search failed");
            }
        }

        related
    }

    fn build_prompt(&self, question: &str, graph: &KnowledgeGraph, rule_answer: &str) -> String {
        PromptBuilder::new()
            .system(SYSTEM_INSTRUCTION)
            .facts(self.graph_facts(question, graph))
            .hint(rule_answer)
            .question(question)
            .add_instruction("只依据上面的事实作答，不要编造知识库中没有的信息")
            .add_instruction("如果事实不足，请参考给出的参考答案")
            .add_instruction("用简洁的中文回答")
            .build()
    }

    /// One line per entity mentioned in the question, then its triples
    fn graph_facts(&self, question: &str, graph: &KnowledgeGraph) -> Vec<String> {
        let mut facts = Vec::new();
        for entity in graph.mentioned_entities(question) {
            facts.push(self.label_entity(entity));
            for neighbor in graph.get_neighbors(&entity.name) {
                let relation = self.ontology.relation_label(neighbor.relation);
                let fact = match neighbor.direction {
                    Direction::Outgoing => {
                        format!("{} {} {}", entity.name, relation, neighbor.entity)
                    }
                    Direction::Incoming => {
                        format!("{} {} {}", neighbor.entity, relation, entity.name)
                    }
                };
                facts.push(fact);
            }
        }
        facts
    }

    fn label_entity(&self, entity: &Entity) -> String {
        format!(
            "{}（{}）",
            entity.name,
            self.ontology.entity_label(entity.entity_type)
        )
    }
}

impl std::fmt::Debug for AssistedAnswerer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistedAnswerer")
            .field("router", &self.router)
            .field("llm", &self.llm_client.is_some())
            .field("similarity", &self.similarity.as_ref().map(|s| s.name()))
            .field("related_limit", &self.related_limit)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use agrikg_core::{EntityType, KgError, Relation, RelationType, Result, SimilarEntity};
    use std::sync::Mutex;

    fn graph() -> KnowledgeGraph {
        let ontology = DomainOntology::default();
        let mut graph = KnowledgeGraph::new();
        graph.add_entity(Entity::new("disease_001", "稻瘟病", EntityType::Disease, &ontology));
        graph.add_entity(Entity::new("pesticide_002", "三环唑", EntityType::Pesticide, &ontology));
        graph.add_relation(Relation::new("三环唑", RelationType::Prevents, "稻瘟病"));
        graph
    }

    /// Records the last prompt and replies with a fixed result
    struct MockLlm {
        reply: std::result::Result<String, String>,
        last_prompt: Mutex<Option<String>>,
    }

    impl MockLlm {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                last_prompt: Mutex::new(None),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err("connection refused".to_string()),
                last_prompt: Mutex::new(None),
            }
        }
    }

    #[async_trait::async_trait]
    impl LlmClient for MockLlm {
        async fn generate(&self, prompt: &str) -> Result<String> {
            *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
            self.reply.clone().map_err(KgError::Llm)
        }
    }

    struct MockSimilarity {
        fail: bool,
    }

    #[async_trait::async_trait]
    impl SimilaritySearch for MockSimilarity {
        async fn search_similar(&self, _query: &str, _k: usize) -> Result<Vec<SimilarEntity>> {
            if self.fail {
                return Err(KgError::Similarity("index offline".to_string()));
            }
            Ok(vec![
                SimilarEntity {
                    name: "稻瘟病".to_string(),
                    entity_type: "disease".to_string(),
                    similarity: 0.98,
                },
                SimilarEntity {
                    name: "稻曲病".to_string(),
                    entity_type: "disease".to_string(),
                    similarity: 0.81,
                },
            ])
        }

        fn name(&self) -> &str {
            "mock"
        }
    }

    #[tokio::test]
    async fn test_rules_only() {
        let answerer = AssistedAnswerer::new(QuestionRouter::default());
        let result = answerer.answer("如何防治稻瘟病？", &graph()).await;

        assert_eq!(result.answer, "稻瘟病可以使用三环唑进行防治。");
        assert_eq!(result.source, AnswerSource::Rules);
        assert_eq!(result.intent, Intent::Prevention);
        assert_eq!(result.related[0].name, "稻瘟病");
        assert_eq!(result.related[0].origin, RelatedOrigin::Mention);
        assert_eq!(result.related[0].score, None);
    }

    #[tokio::test]
    async fn test_llm_reply_used_and_prompt_grounded() {
        let llm = Arc::new(MockLlm::replying("  建议在发病初期喷施三环唑。 "));
        let answerer = AssistedAnswerer::new(QuestionRouter::default()).with_llm(llm.clone());

        let result = answerer.answer("如何防治稻瘟病？", &graph()).await;
        assert_eq!(result.answer, "建议在发病初期喷施三环唑。");
        assert_eq!(result.source, AnswerSource::Llm);

        let prompt = llm.last_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains("稻瘟病（病害）"));
        assert!(prompt.contains("三环唑 防治 稻瘟病"));
        assert!(prompt.contains("稻瘟病可以使用三环唑进行防治。"));
        assert!(prompt.contains("如何防治稻瘟病？"));
    }

    #[tokio::test]
    async fn test_llm_failure_degrades_to_rules() {
        let answerer = AssistedAnswerer::new(QuestionRouter::default())
            .with_llm(Arc::new(MockLlm::failing()));
        let result = answerer.answer("如何防治稻瘟病？", &graph()).await;

        assert_eq!(result.answer, "稻瘟病可以使用三环唑进行防治。");
        assert_eq!(result.source, AnswerSource::Rules);
    }

    #[tokio::test]
    async fn test_blank_llm_reply_degrades_to_rules() {
        let answerer = AssistedAnswerer::new(QuestionRouter::default())
            .with_llm(Arc::new(MockLlm::replying("   ")));
        let result = answerer.answer("什么是三环唑？", &graph()).await;

        assert_eq!(result.answer, "三环唑是一种农药: 三环唑。");
        assert_eq!(result.source, AnswerSource::Rules);
    }

    #[tokio::test]
    async fn test_similarity_hits_deduplicated() {
        let answerer = AssistedAnswerer::new(QuestionRouter::default())
            .with_similarity(Arc::new(MockSimilarity { fail: false }));
        let result = answerer.answer("稻瘟病", &graph()).await;

        let names: Vec<&str> = result.related.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["稻瘟病", "稻曲病"]);
        assert_eq!(result.related[1].origin, RelatedOrigin::Similarity);
    }

    #[tokio::test]
    async fn test_similarity_failure_ignored() {
        let answerer = AssistedAnswerer::new(QuestionRouter::default())
            .with_similarity(Arc::new(MockSimilarity { fail: true }))
            .with_related_limit(1);
        let result = answerer.answer("稻瘟病", &graph()).await;

        assert_eq!(result.related.len(), 1);
        assert_eq!(result.intent, Intent::Search);
    }

    #[tokio::test]
    async fn test_answer_serializes_with_lowercase_tags() {
        let answerer = AssistedAnswerer::new(QuestionRouter::default());
        let result = answerer.answer("什么是稻瘟病？", &graph()).await;

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["source"], "rules");
        assert_eq!(json["intent"], "definition");
        assert_eq!(json["related"][0]["origin"], "mention");
        assert_eq!(json["related"][0]["type"], "disease");
        assert!(json["related"][0].get("score").is_none());
    }
}
