//! RAG (Retrieval-Augmented Generation) over page-level multimodal
//! embeddings.
//!
//! - [`vector_store`] — the `VectorStoreClient` adapter (Qdrant +
//!   multimodal embedding endpoint).
//! - [`document_analyzer`] — per-page relevance scoring and
//!   key-finding extraction.
//! - [`iterative_evaluator`] — aggregates document evaluations, decides
//!   sufficiency, and refines tasks across search iterations.

pub mod document_analyzer;
pub mod iterative_evaluator;
pub mod vector_store;

pub use document_analyzer::DocumentAnalyzer;
pub use iterative_evaluator::IterativeEvaluator;
pub use vector_store::QdrantVectorStore;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("vector store error: {0}")]
    VectorStore(String),

    #[error("search error: {0}")]
    Search(String),

    #[error("connection error: {0}")]
    Connection(String),
}

impl From<RagError> for research_core::Error {
    fn from(err: RagError) -> Self {
        research_core::Error::VectorStore(err.to_string())
    }
}
