//! Interactive run configuration.
//!
//! Asks for the parties, the objective, the response language and any extra
//! queries before the session starts. Answers are folded into the loaded
//! configuration, so the analysis itself never prompts.

use dialoguer::{Confirm, Input};

use crate::types::{AppError, Result};
use crate::utils::toml_config::LexaConfig;

/// What the user entered
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunAnswers {
    pub entities: Vec<String>,
    pub objective: String,
    pub language: String,
    pub queries: Vec<String>,
}

impl RunAnswers {
    /// Overwrite the analysis settings with non-blank answers and return the
    /// extra queries
    pub fn apply(self, config: &mut LexaConfig) -> Vec<String> {
        if !self.entities.is_empty() {
            config.analysis.entities = self.entities;
        }
        if !self.objective.trim().is_empty() {
            config.analysis.objective = self.objective.trim().to_string();
        }
        if !self.language.trim().is_empty() {
            config.analysis.language = self.language.trim().to_string();
        }
        self.queries
    }
}

/// Split a comma-separated list of entity names, dropping blanks
pub fn parse_entities(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect()
}

fn prompt_error(e: dialoguer::Error) -> AppError {
    AppError::InvalidInput(format!("interactive prompt failed: {}", e))
}

/// Prompt for run settings, offering the configured values as defaults
pub fn collect(config: &LexaConfig) -> Result<RunAnswers> {
    let entities: String = Input::new()
        .with_prompt("Entities involved (comma-separated, client first)")
        .default(config.analysis.entities.join(", "))
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_error)?;

    let objective: String = Input::new()
        .with_prompt("Objective of the analysis")
        .default(config.analysis.objective.clone())
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_error)?;

    let language: String = Input::new()
        .with_prompt("Response language")
        .default(config.analysis.language.clone())
        .interact_text()
        .map_err(prompt_error)?;

    let mut queries = Vec::new();
    while Confirm::new()
        .with_prompt("Add a query?")
        .default(queries.is_empty())
        .interact()
        .map_err(prompt_error)?
    {
        let query: String = Input::new()
            .with_prompt("Query")
            .allow_empty(true)
            .interact_text()
            .map_err(prompt_error)?;
        if !query.trim().is_empty() {
            queries.push(query.trim().to_string());
        }
    }

    Ok(RunAnswers {
        entities: parse_entities(&entities),
        objective,
        language,
        queries,
    })
}
