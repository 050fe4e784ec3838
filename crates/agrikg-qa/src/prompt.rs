//! Prompt assembly for LLM-assisted answers

/// Builder for LLM prompts grounded in graph facts
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    system_instruction: String,
    facts: Vec<String>,
    hint: Option<String>,
    question: String,
    instructions: Vec<String>,
}

impl PromptBuilder {
    /// Create a new prompt builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set system instruction
    pub fn system(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    /// Add one graph fact line
    pub fn add_fact(mut self, fact: impl Into<String>) -> Self {
        self.facts.push(fact.into());
        self
    }

    /// Add several graph fact lines
    pub fn facts<I, S>(mut self, facts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.facts.extend(facts.into_iter().map(Into::into));
        self
    }

    /// Templated answer the model may refine
    pub fn hint(mut self, answer: impl Into<String>) -> Self {
        self.hint = Some(answer.into());
        self
    }

    /// Set the question
    pub fn question(mut self, q: impl Into<String>) -> Self {
        self.question = q.into();
        self
    }

    /// Add an instruction
    pub fn add_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instructions.push(instruction.into());
        self
    }

    /// Build the final prompt. Empty sections are left out.
    pub fn build(self) -> String {
        let mut prompt = String::new();

        if !self.system_instruction.is_empty() {
            prompt.push_str("<s>\n");
            prompt.push_str(&self.system_instruction);
            prompt.push_str("\n</s>\n\n");
        }

        if !self.facts.is_empty() {
            prompt.push_str("<facts>\n");
            for fact in &self.facts {
                prompt.push_str("- ");
                prompt.push_str(fact);
                prompt.push('\n');
            }
            prompt.push_str("</facts>\n\n");
        }

        if let Some(hint) = self.hint.as_deref().filter(|h| !h.is_empty()) {
            prompt.push_str("<reference_answer>\n");
            prompt.push_str(hint);
            prompt.push_str("\n</reference_answer>\n\n");
        }

        if !self.question.is_empty() {
            prompt.push_str("<question>\n");
            prompt.push_str(&self.question);
            prompt.push_str("\n</question>\n\n");
        }

        if !self.instructions.is_empty() {
            prompt.push_str("<instructions>\n");
            for (i, inst) in self.instructions.iter().enumerate() {
                prompt.push_str(&format!("{}. {}\n", i + 1, inst));
            }
            prompt.push_str("</instructions>\n");
        }

        prompt
    }
}
