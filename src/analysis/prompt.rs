//! Instruction prompt for document analysis.

/// Builds the prompt sent to the chat model for each query.
///
/// The first entity is treated as the client whose interests the analysis
/// protects; all entities are listed when asking the model to consider the
/// relationship between the parties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptBuilder {
    entities: Vec<String>,
    objective: String,
    language: String,
}

impl PromptBuilder {
    pub fn new(entities: Vec<String>, objective: impl Into<String>, language: impl Into<String>) -> Self {
        let entities = entities
            .into_iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();
        Self {
            entities,
            objective: objective.into().trim().to_string(),
            language: language.into().trim().to_string(),
        }
    }

    fn client(&self) -> &str {
        self.entities.first().map(String::as_str).unwrap_or("the client")
    }

    fn parties(&self) -> String {
        if self.entities.is_empty() {
            "the parties involved".to_string()
        } else {
            self.entities.join(", ")
        }
    }

    pub fn build(&self, query: &str, context: &str) -> String {
        let client = self.client();
        let objective = if self.objective.is_empty() {
            "Not specified"
        } else {
            &self.objective
        };
        let language = if self.language.is_empty() {
            "English"
        } else {
            &self.language
        };

        format!(
            "You are an AI assistant helping {client} analyze legal documents and generate responses.\n\
             Objective: {objective}\n\
             Focus on protecting {client}'s interests while maintaining a professional and collaborative relationship.\n\
             RESPOND IN {language_upper} ONLY.\n\
             \n\
             Context: {context}\n\
             \n\
             Question: {query}\n\
             \n\
             Please provide a detailed analysis and suggested response that:\n\
             1. Identifies key issues and concerns\n\
             2. Suggests specific changes or compromises\n\
             3. Maintains a constructive tone\n\
             4. Protects {client}'s interests\n\
             5. Considers the relationship between {parties}\n\
             \n\
             Format your response in clear sections:\n\
             - Key Issues\n\
             - Proposed Changes\n\
             - Recommendations",
            language_upper = language.to_uppercase(),
            parties = self.parties(),
        )
    }
}
