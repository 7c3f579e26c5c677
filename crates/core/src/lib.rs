//! Core traits and types for the research orchestrator
//!
//! This crate provides the request-scoped data model shared by every
//! other crate: queries, complexity/specialist classification, tasks,
//! evaluations, results, and the capability traits (`VectorStoreClient`,
//! `LanguageModel`, `SharedStore`) that concrete adapters implement.

pub mod decomposition;
pub mod error;
pub mod evaluation;
pub mod page;
pub mod query;
pub mod result;
pub mod sanitize;
pub mod task;
pub mod traits;

pub use decomposition::{Decomposition, Strategy, SynthesisInstructions};
pub use error::{Error, Result};
pub use evaluation::{DocumentEvaluation, Relevance, SearchEvaluation};
pub use page::PageRecord;
pub use query::{Complexity, Query, SpecialistType};
pub use result::{
    CacheEntry, CitedSource, FinalResult, QualityMetrics, RunStatus, SharedDiscovery,
    SubagentResult,
};
pub use task::{Priority, SubagentTask, MAX_CANDIDATES_RANGE, MAX_KEYWORDS, SIMILARITY_THRESHOLD_RANGE};
pub use traits::{ChatMessage, ChatParams, LanguageModel, Role, SharedStore, StoreMetadata, VectorStoreClient};
