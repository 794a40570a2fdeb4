//! Answer synthesis: single-hop and two-hop (clarifying query) strategies.

use crate::config::RetrievalConfig;
use crate::retriever::{Retriever, CONTEXT_SEPARATOR};
use crate::vector_index::VectorIndex;
use docqa_core::{AppError, AppResult};
use docqa_llm::{LlmClient, LlmRequest};
use docqa_prompt::{build_prompt, PromptDefinition};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Phrase the model is told to use when the context lacks the answer.
pub const FALLBACK_ANSWER: &str = "I couldn't find an answer in the document.";

/// How an answer is produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnswerStrategy {
    /// Retrieve once, answer once.
    SingleHop,
    /// Retrieve, ask for a clarifying query, retrieve again, answer from both.
    #[default]
    MultiHop,
}

impl AnswerStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SingleHop => "single-hop",
            Self::MultiHop => "multi-hop",
        }
    }
}

impl fmt::Display for AnswerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnswerStrategy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single-hop" | "single" => Ok(Self::SingleHop),
            "multi-hop" | "multi" => Ok(Self::MultiHop),
            other => Err(AppError::InvalidInput(format!(
                "Unknown strategy '{}'. Expected single-hop or multi-hop",
                other
            ))),
        }
    }
}

/// The three prompt definitions the pipeline renders.
#[derive(Debug, Clone)]
pub struct PromptSet {
    pub answer_single: PromptDefinition,
    pub clarify: PromptDefinition,
    pub answer_multi: PromptDefinition,
}

impl PromptSet {
    /// Built-in prompts with any `.docqa/prompts` overrides applied.
    pub fn load(workspace: &Path) -> AppResult<Self> {
        Ok(Self {
            answer_single: docqa_prompt::load_prompt(workspace, docqa_prompt::ANSWER_SINGLE)?,
            clarify: docqa_prompt::load_prompt(workspace, docqa_prompt::CLARIFY)?,
            answer_multi: docqa_prompt::load_prompt(workspace, docqa_prompt::ANSWER_MULTI)?,
        })
    }

    pub fn builtin() -> AppResult<Self> {
        Ok(Self {
            answer_single: docqa_prompt::load_builtin(docqa_prompt::ANSWER_SINGLE)?,
            clarify: docqa_prompt::load_builtin(docqa_prompt::CLARIFY)?,
            answer_multi: docqa_prompt::load_builtin(docqa_prompt::ANSWER_MULTI)?,
        })
    }
}

/// Models used for the two kinds of language-model call.
#[derive(Debug, Clone)]
pub struct ModelSelection {
    pub answer_model: String,
    pub clarify_model: String,
}

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub answer: String,
    pub strategy: AnswerStrategy,

    /// Sub-query used for the second retrieval (multi-hop only)
    pub clarifying_query: Option<String>,
}

pub struct AnswerPipeline {
    retriever: Retriever,
    llm: Arc<dyn LlmClient>,
    prompts: PromptSet,
    models: ModelSelection,
    retrieval: RetrievalConfig,
}

impl AnswerPipeline {
    pub fn new(
        retriever: Retriever,
        llm: Arc<dyn LlmClient>,
        prompts: PromptSet,
        models: ModelSelection,
        retrieval: RetrievalConfig,
    ) -> Self {
        Self {
            retriever,
            llm,
            prompts,
            models,
            retrieval,
        }
    }

    /// Answer `query` against `index` with the given strategy.
    pub async fn answer(
        &self,
        index: &dyn VectorIndex,
        query: &str,
        strategy: AnswerStrategy,
    ) -> AppResult<AnswerOutcome> {
        tracing::info!("Answering with strategy {}", strategy);

        match strategy {
            AnswerStrategy::SingleHop => self.single_hop(index, query).await,
            AnswerStrategy::MultiHop => self.multi_hop(index, query).await,
        }
    }

    async fn single_hop(&self, index: &dyn VectorIndex, query: &str) -> AppResult<AnswerOutcome> {
        let context = self
            .retriever
            .retrieve_context(index, query, self.retrieval.single_hop)
            .await?;

        let answer = self
            .generate(
                &self.prompts.answer_single,
                &context,
                query,
                &self.models.answer_model,
            )
            .await?;

        Ok(AnswerOutcome {
            answer,
            strategy: AnswerStrategy::SingleHop,
            clarifying_query: None,
        })
    }

    async fn multi_hop(&self, index: &dyn VectorIndex, query: &str) -> AppResult<AnswerOutcome> {
        let depth = self.retrieval.multi_hop;

        let initial_context = self.retriever.retrieve_context(index, query, depth).await?;

        let clarifying = self
            .generate(
                &self.prompts.clarify,
                &initial_context,
                query,
                &self.models.clarify_model,
            )
            .await?;
        let clarifying_query = if clarifying.trim().is_empty() {
            tracing::warn!("Empty clarifying query, reusing the original question");
            query.to_string()
        } else {
            clarifying.trim().to_string()
        };
        tracing::debug!("Clarifying query: {}", clarifying_query);

        let secondary_context = self
            .retriever
            .retrieve_context(index, &clarifying_query, depth)
            .await?;

        let combined = format!(
            "{}{}{}",
            initial_context, CONTEXT_SEPARATOR, secondary_context
        );

        let answer = self
            .generate(
                &self.prompts.answer_multi,
                &combined,
                query,
                &self.models.answer_model,
            )
            .await?;

        Ok(AnswerOutcome {
            answer,
            strategy: AnswerStrategy::MultiHop,
            clarifying_query: Some(clarifying_query),
        })
    }

    #[tracing::instrument(skip(self, prompt, context, query), fields(prompt_id = %prompt.id))]
    async fn generate(
        &self,
        prompt: &PromptDefinition,
        context: &str,
        query: &str,
        model: &str,
    ) -> AppResult<String> {
        let mut variables = HashMap::new();
        variables.insert("context".to_string(), context.to_string());
        variables.insert("query".to_string(), query.to_string());
        variables.insert("fallback".to_string(), FALLBACK_ANSWER.to_string());

        let built = build_prompt(prompt, variables)?;
        let mut request = LlmRequest::new(built.user, model);
        if let Some(system) = built.system {
            request = request.with_system(system);
        }

        let response = self.llm.complete(&request).await?;
        tracing::debug!(
            "{} returned {} chars ({} tokens)",
            self.llm.provider_name(),
            response.content.len(),
            response.usage.total_tokens
        );

        Ok(response.content)
    }
}
