//! Answer handlers
//!
//! Every handler turns a question plus the graph into one sentence. Missing
//! data is reported with a templated sentence, never an error.

use agrikg_core::RelationType;
use agrikg_graph::{Direction, KnowledgeGraph};

/// Separator between listed neighbour names
pub const LIST_SEPARATOR: &str = ", ";

/// A single answer-synthesis capability
pub trait AnswerHandler: Send + Sync {
    fn answer(&self, question: &str, graph: &KnowledgeGraph) -> String;
}

/// Substitute `{name}`, `{description}` and `{items}` in one left-to-right
/// pass. Inserted values are never scanned again.
fn render(template: &str, name: &str, description: &str, items: &str) -> String {
    let placeholders = [
        ("{name}", name),
        ("{description}", description),
        ("{items}", items),
    ];

    let mut out = String::with_capacity(template.len() + name.len() + description.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match placeholders.iter().find(|(key, _)| tail.starts_with(key)) {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

// ============================================================================
// Definition
// ============================================================================

/// Describes the most specific entity named in the question
#[derive(Debug, Clone)]
pub struct DefinitionHandler {
    found: String,
    unclear: String,
}

impl DefinitionHandler {
    pub fn new(found: impl Into<String>, unclear: impl Into<String>) -> Self {
        Self {
            found: found.into(),
            unclear: unclear.into(),
        }
    }
}

impl Default for DefinitionHandler {
    fn default() -> Self {
        Self::new(
            "{name}是一种{description}。",
            "抱歉，我无法理解您询问的具体内容。",
        )
    }
}

impl AnswerHandler for DefinitionHandler {
    fn answer(&self, question: &str, graph: &KnowledgeGraph) -> String {
        match graph.mentioned_entities(question).first() {
            Some(entity) => render(&self.found, &entity.name, &entity.description, ""),
            None => self.unclear.clone(),
        }
    }
}

// ============================================================================
// Neighbour listing
// ============================================================================

/// Lists neighbours of the mentioned entity along one relation and direction.
///
/// Three outcomes: neighbours found, entity known but no neighbours, and no
/// entity mentioned at all.
#[derive(Debug, Clone)]
pub struct NeighborListHandler {
    relation: RelationType,
    direction: Direction,
    found: String,
    empty: String,
    unclear: String,
}

impl NeighborListHandler {
    pub fn new(relation: RelationType, direction: Direction) -> Self {
        Self {
            relation,
            direction,
            found: "{name}: {items}".to_string(),
            empty: "{name}: -".to_string(),
            unclear: "?".to_string(),
        }
    }

    /// Replace the three answer templates
    pub fn with_templates(
        mut self,
        found: impl Into<String>,
        empty: impl Into<String>,
        unclear: impl Into<String>,
    ) -> Self {
        self.found = found.into();
        self.empty = empty.into();
        self.unclear = unclear.into();
        self
    }

    /// Who prevents the mentioned disease or pest
    pub fn prevention() -> Self {
        Self::new(RelationType::Prevents, Direction::Incoming).with_templates(
            "{name}可以使用{items}进行防治。",
            "目前知识库中暂无{name}的具体防治方案，建议咨询农业专家。",
            "请明确您要防治的具体病害或虫害。",
        )
    }

    /// Which diseases infect the mentioned crop
    pub fn diseases() -> Self {
        Self::new(RelationType::InfectedBy, Direction::Outgoing).with_templates(
            "{name}常见的病害包括：{items}。",
            "知识库中暂无{name}的病害信息。",
            "请明确您询问的作物名称。",
        )
    }

    /// What is used for the mentioned entity
    pub fn usage() -> Self {
        Self::new(RelationType::Uses, Direction::Incoming).with_templates(
            "{name}可以使用{items}。",
            "知识库中暂无{name}的使用信息。",
            "请明确您询问的具体内容。",
        )
    }
}

impl AnswerHandler for NeighborListHandler {
    fn answer(&self, question: &str, graph: &KnowledgeGraph) -> String {
        let Some(entity) = graph.mentioned_entities(question).first().copied() else {
            return self.unclear.clone();
        };

        let names = graph.neighbors_by(&entity.name, self.relation, self.direction);
        if names.is_empty() {
            render(&self.empty, &entity.name, &entity.description, "")
        } else {
            let items = names.join(LIST_SEPARATOR);
            render(&self.found, &entity.name, &entity.description, &items)
        }
    }
}

// ============================================================================
// Solution
// ============================================================================

/// "What to do" questions, answered as prevention questions
#[derive(Debug, Clone)]
pub struct SolutionHandler {
    prevention: NeighborListHandler,
}

impl SolutionHandler {
    pub fn new(prevention: NeighborListHandler) -> Self {
        Self { prevention }
    }
}

impl Default for SolutionHandler {
    fn default() -> Self {
        Self::new(NeighborListHandler::prevention())
    }
}

impl AnswerHandler for SolutionHandler {
    fn answer(&self, question: &str, graph: &KnowledgeGraph) -> String {
        self.prevention.answer(question, graph)
    }
}

// ============================================================================
// Search fallback
// ============================================================================

/// Names the best search hit for the raw question
#[derive(Debug, Clone)]
pub struct SearchHandler {
    limit: usize,
    found: String,
    not_found: String,
}

impl SearchHandler {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            found: "根据知识库，与您的问题相关的是：{name}({description})。".to_string(),
            not_found: "抱歉，我在知识库中没有找到相关信息，建议您咨询农业专家或查阅专业资料。"
                .to_string(),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }
}

impl Default for SearchHandler {
    fn default() -> Self {
        Self::new(3)
    }
}

impl AnswerHandler for SearchHandler {
    fn answer(&self, question: &str, graph: &KnowledgeGraph) -> String {
        match graph.search_entities(question, self.limit).first() {
            Some(hit) => render(&self.found, &hit.entity.name, &hit.entity.description, ""),
            None => self.not_found.clone(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
