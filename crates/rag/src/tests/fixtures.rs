//! Test fixtures: in-memory PDFs, a scripted language model, service setup.

use crate::config::RagConfig;
use crate::embeddings::providers::TrigramProvider;
use crate::embeddings::{Embedder, EmbeddingProvider};
use crate::pipeline::{ModelSelection, PromptSet};
use crate::rerank::LexicalReranker;
use crate::service::{DocumentService, ServiceParts};
use docqa_core::AppResult;
use docqa_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Build a PDF with one text line per page; `None` leaves a page blank.
fn build_pdf(pages: &[Option<&str>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Resources" => resources_id,
        };
        if let Some(text) = text {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            page.set("Contents", content_id);
        }
        kids.push(doc.add_object(page).into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

pub(crate) fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    let pages: Vec<Option<&str>> = pages.iter().map(|p| Some(*p)).collect();
    build_pdf(&pages)
}

/// A PDF whose pages carry no text operators at all.
pub(crate) fn image_only_pdf() -> Vec<u8> {
    build_pdf(&[None, None])
}

/// Trigram vectors reported under another provider and model name.
#[derive(Debug)]
pub(crate) struct RenamedProvider(pub(crate) TrigramProvider);

#[async_trait::async_trait]
impl EmbeddingProvider for RenamedProvider {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        "all-minilm"
    }

    fn dimensions(&self) -> usize {
        self.0.dimensions()
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        self.0.embed_batch(texts).await
    }
}

/// Language model double.
///
/// Clarify calls (system prompt mentions clarifying queries) return the
/// scripted reply. Every other call answers with the first passage of the
/// `Context:` block, which makes the answer traceable to retrieval.
#[derive(Debug, Default)]
pub(crate) struct ScriptedLlm {
    clarify_reply: String,
    fail: bool,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedLlm {
    pub(crate) fn new(clarify_reply: &str) -> Self {
        Self {
            clarify_reply: clarify_reply.to_string(),
            ..Default::default()
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub(crate) fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn is_clarify(request: &LlmRequest) -> bool {
        request
            .system
            .as_deref()
            .is_some_and(|s| s.contains("clarifying queries"))
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());

        if self.fail {
            return Err(docqa_core::AppError::UpstreamModel(
                "model unavailable".to_string(),
            ));
        }

        let content = if Self::is_clarify(request) {
            self.clarify_reply.clone()
        } else {
            request
                .prompt
                .split_once("Context: ")
                .and_then(|(_, rest)| rest.split("\n\n").next())
                .unwrap_or(crate::FALLBACK_ANSWER)
                .to_string()
        };

        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: LlmUsage::new(10, 5),
        })
    }
}

pub(crate) fn models() -> ModelSelection {
    ModelSelection {
        answer_model: "answer-model".to_string(),
        clarify_model: "clarify-model".to_string(),
    }
}

/// A service over `workspace` with offline embedder and reranker.
pub(crate) fn service_with(
    workspace: &Path,
    config: RagConfig,
    llm: Arc<ScriptedLlm>,
) -> DocumentService {
    let embedder = Embedder::new(
        Arc::new(TrigramProvider::new(config.embedding.dimensions)),
        config.embedding.batch_size,
    );
    service_with_embedder(workspace, config, embedder, llm)
}

pub(crate) fn service_with_embedder(
    workspace: &Path,
    config: RagConfig,
    embedder: Embedder,
    llm: Arc<ScriptedLlm>,
) -> DocumentService {
    let storage = config.storage.resolve(workspace);

    DocumentService::from_parts(ServiceParts {
        config,
        storage,
        embedder,
        reranker: Arc::new(LexicalReranker),
        llm,
        prompts: PromptSet::builtin().unwrap(),
        models: models(),
    })
    .unwrap()
}

pub(crate) fn service(workspace: &Path, llm: Arc<ScriptedLlm>) -> DocumentService {
    service_with(workspace, RagConfig::default(), llm)
}
