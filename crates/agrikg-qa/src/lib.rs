//! agrikg QA - Intent-routed question answering
//!
//! A question is lower-cased and tested against an ordered list of
//! substring patterns. The first matching route's handler answers it; when
//! nothing matches, a search handler names the closest entity.
//!
//! Route order is significant: a broader pattern listed earlier shadows a
//! more specific one listed later.

use agrikg_core::QaConfig;
use agrikg_graph::KnowledgeGraph;
use serde::{Deserialize, Serialize};

pub mod assisted;
pub mod handlers;
pub mod prompt;

pub use assisted::{AnswerSource, AssistedAnswer, AssistedAnswerer, RelatedEntity, RelatedOrigin};
pub use handlers::{
    AnswerHandler, DefinitionHandler, NeighborListHandler, SearchHandler, SolutionHandler,
};
pub use prompt::PromptBuilder;

// ============================================================================
// Intents
// ============================================================================

/// Which kind of answer a question asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// "什么是X"
    Definition,
    /// "如何防治X"
    Prevention,
    /// "X什么病"
    Diseases,
    /// "X用什么"
    Usage,
    /// "X怎么办"
    Solution,
    /// No pattern matched
    Search,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Definition => "definition",
            Self::Prevention => "prevention",
            Self::Diseases => "diseases",
            Self::Usage => "usage",
            Self::Solution => "solution",
            Self::Search => "search",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Routes
// ============================================================================

/// A substring pattern bound to an intent and its handler
pub struct Route {
    pattern: String,
    intent: Intent,
    handler: Box<dyn AnswerHandler>,
}

impl Route {
    pub fn new(
        pattern: impl Into<String>,
        intent: Intent,
        handler: impl AnswerHandler + 'static,
    ) -> Self {
        Self {
            pattern: pattern.into().to_lowercase(),
            intent,
            handler: Box::new(handler),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn intent(&self) -> Intent {
        self.intent
    }

    /// Test against an already lower-cased question
    fn matches(&self, lowered: &str) -> bool {
        lowered.contains(self.pattern.as_str())
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern)
            .field("intent", &self.intent)
            .finish_non_exhaustive()
    }
}

/// The built-in route table, in matching order
pub fn default_routes() -> Vec<Route> {
    vec![
        Route::new("什么是", Intent::Definition, DefinitionHandler::default()),
        Route::new(
            "如何防治",
            Intent::Prevention,
            NeighborListHandler::prevention(),
        ),
        Route::new("什么病", Intent::Diseases, NeighborListHandler::diseases()),
        Route::new("用什么", Intent::Usage, NeighborListHandler::usage()),
        Route::new("怎么办", Intent::Solution, SolutionHandler::default()),
    ]
}

// ============================================================================
// Question Router
// ============================================================================

/// Ordered pattern router with a search fallback
pub struct QuestionRouter {
    routes: Vec<Route>,
    fallback: Box<dyn AnswerHandler>,
}

impl QuestionRouter {
    /// Create a router from an explicit route table and fallback handler
    pub fn new(routes: Vec<Route>, fallback: impl AnswerHandler + 'static) -> Self {
        Self {
            routes,
            fallback: Box::new(fallback),
        }
    }

    /// Default routes with the search fallback limit from config
    pub fn from_config(config: &QaConfig) -> Self {
        Self::new(
            default_routes(),
            SearchHandler::new(config.fallback_search_limit),
        )
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Intent the question would be routed to
    pub fn classify(&self, question: &str) -> Intent {
        self.select(question)
            .map(Route::intent)
            .unwrap_or(Intent::Search)
    }

    /// Answer a question against the graph. Always returns a sentence.
    pub fn answer(&self, question: &str, graph: &KnowledgeGraph) -> String {
        self.answer_with_intent(question, graph).1
    }

    /// Answer a question and report which intent handled it
    pub fn answer_with_intent(&self, question: &str, graph: &KnowledgeGraph) -> (Intent, String) {
        let (intent, handler) = match self.select(question) {
            Some(route) => (route.intent, route.handler.as_ref()),
            None => (Intent::Search, self.fallback.as_ref()),
        };

        let answer = handler.answer(question, graph);
        tracing::debug!(intent = intent.as_str(), "question routed");
        (intent, answer)
    }

    fn select(&self, question: &str) -> Option<&Route> {
        let lowered = question.to_lowercase();
        self.routes.iter().find(|route| route.matches(&lowered))
    }
}

impl Default for QuestionRouter {
    fn default() -> Self {
        Self::new(default_routes(), SearchHandler::default())
    }
}

impl std::fmt::Debug for QuestionRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestionRouter")
            .field("routes", &self.routes)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
